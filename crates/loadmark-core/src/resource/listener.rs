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

use super::ResourceEvent;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

type Registration = (Vec<ResourceEvent>, oneshot::Sender<ResourceEvent>);

/// A registry of one-shot listeners attached to a single resource.
///
/// A listener waits on a set of events and fires once, for whichever of them
/// is dispatched first; it is removed as it fires.
#[derive(Debug, Default)]
pub struct EventTarget {
    listeners: Mutex<Vec<Registration>>,
}

impl EventTarget {
    /// Creates a target with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a one-shot listener for the first of `events` to fire.
    pub fn listen(&self, events: &[ResourceEvent]) -> Listener {
        let (sender, receiver) = oneshot::channel();
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        // Listeners whose future was dropped are pruned here.
        listeners.retain(|(_, sender)| !sender.is_closed());
        listeners.push((events.to_vec(), sender));
        Listener {
            receiver,
            orphaned: false,
        }
    }

    /// Fires and removes every listener waiting on `event`.
    ///
    /// Returns the number of live listeners that were notified.
    pub fn dispatch(&self, event: ResourceEvent) -> usize {
        let fired: Vec<Registration> = {
            let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            let (fired, kept) = listeners
                .drain(..)
                .partition(|(events, _)| events.contains(&event));
            *listeners = kept;
            fired
        };

        let notified = fired
            .into_iter()
            .map(|(_, sender)| sender.send(event).is_ok())
            .filter(|notified| *notified)
            .count();
        log::trace!("Dispatched '{event}' to {notified} listener(s).");
        notified
    }

    /// Number of listeners still waiting to fire.
    pub fn listener_count(&self) -> usize {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|(_, sender)| !sender.is_closed());
        listeners.len()
    }
}

/// A future resolving to the first event that fired.
///
/// If the target is dropped first no event can fire any more, and the
/// listener stays pending forever.
#[derive(Debug)]
pub struct Listener {
    receiver: oneshot::Receiver<ResourceEvent>,
    orphaned: bool,
}

impl Future for Listener {
    type Output = ResourceEvent;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<ResourceEvent> {
        if self.orphaned {
            return Poll::Pending;
        }
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(event)) => Poll::Ready(event),
            Poll::Ready(Err(_)) => {
                self.orphaned = true;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const LOAD_OR_ERROR: [ResourceEvent; 2] = [ResourceEvent::Load, ResourceEvent::Error];

    #[tokio::test]
    async fn dispatch_fires_only_matching_listeners() {
        let target = EventTarget::new();
        let load = target.listen(&[ResourceEvent::Load]);
        let _error = target.listen(&[ResourceEvent::Error]);

        assert_eq!(target.dispatch(ResourceEvent::Load), 1);
        assert_eq!(load.await, ResourceEvent::Load);
        assert_eq!(target.listener_count(), 1);
    }

    #[tokio::test]
    async fn first_event_wins_and_listener_is_removed() {
        let target = EventTarget::new();
        let listener = target.listen(&LOAD_OR_ERROR);

        assert_eq!(target.dispatch(ResourceEvent::Error), 1);
        assert_eq!(target.dispatch(ResourceEvent::Load), 0);
        assert_eq!(listener.await, ResourceEvent::Error);
        assert_eq!(target.listener_count(), 0);
    }

    #[test]
    fn dropped_listeners_are_released() {
        let target = EventTarget::new();
        let listener = target.listen(&[ResourceEvent::CanPlayThrough]);
        assert_eq!(target.listener_count(), 1);

        drop(listener);
        assert_eq!(target.listener_count(), 0);
        assert_eq!(target.dispatch(ResourceEvent::CanPlayThrough), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn orphaned_listener_never_resolves() {
        let target = EventTarget::new();
        let listener = target.listen(&LOAD_OR_ERROR);
        drop(target);

        let raced = tokio::time::timeout(Duration::from_secs(60), listener).await;
        assert!(raced.is_err());
    }
}
