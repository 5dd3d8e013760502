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

//! Terminal outcomes of resource tracking.

use crate::kind::AssetKind;
use crate::progress::ProgressSnapshot;
use std::fmt;
use std::time::Duration;

/// The terminal outcome of a tracked resource. Never revised once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The resource became usable.
    Loaded,
    /// The resource did not become usable (error, decode failure, timeout).
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Loaded => write!(f, "loaded"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// Which branch of the settlement routine produced the outcome.
///
/// Diagnostic only: counters never look at it, so a timeout and a load error
/// are counted identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettlePath {
    /// The resource was already settled when it was inspected.
    FastPath,
    /// A success or failure event fired.
    Event,
    /// The settle timer expired first.
    Timeout,
}

/// The settled state of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Kind of the resource.
    pub kind: AssetKind,
    /// Identifier of the resource.
    pub id: String,
    /// Terminal outcome.
    pub outcome: Outcome,
    /// Branch that produced the outcome.
    pub path: SettlePath,
    /// Time from arming to settlement.
    pub elapsed: Duration,
}

/// Published on the settlement bus after a settlement has been counted.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementEvent {
    /// The settlement that was counted.
    pub settlement: Settlement,
    /// Progress right after the settlement was applied.
    pub snapshot: ProgressSnapshot,
}
