// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use loadmark_core::{AssetKind, LoadError, Settlement};
use tokio::sync::oneshot;

/// The deferred completion signal of an imperative load.
///
/// Resolves to the [`Settlement`] when the resource loaded, and to
/// [`LoadError::Failed`] when it did not. Dropping it does not stop the
/// tracking: the outcome is still counted.
#[derive(Debug)]
pub struct PendingLoad {
    kind: AssetKind,
    id: String,
    receiver: oneshot::Receiver<Result<Settlement, LoadError>>,
}

impl PendingLoad {
    pub(crate) fn new(
        kind: AssetKind,
        id: String,
        receiver: oneshot::Receiver<Result<Settlement, LoadError>>,
    ) -> Self {
        Self { kind, id, receiver }
    }

    /// Kind of the requested resource.
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Identifier of the requested resource.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Future for PendingLoad {
    type Output = Result<Settlement, LoadError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(LoadError::Abandoned {
                kind: this.kind,
                id: this.id.clone(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}
