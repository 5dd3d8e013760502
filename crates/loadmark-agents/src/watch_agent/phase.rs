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

use std::fmt;

/// Lifecycle of a [`WatchAgent`](super::WatchAgent).
///
/// Only `Uninitialized` accepts a mount; every later phase ignores repeated
/// mount requests, which is what keeps the scan to exactly one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WatchPhase {
    /// Created, not mounted yet.
    #[default]
    Uninitialized,
    /// Enumerating resources and arming trackers.
    Scanning,
    /// Trackers are running or have finished.
    Tracking,
    /// Torn down; pending trackers were released.
    Detached,
}

impl WatchPhase {
    /// Returns `true` if a mount request would start a scan.
    pub fn accepts_mount(self) -> bool {
        self == WatchPhase::Uninitialized
    }
}

impl fmt::Display for WatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchPhase::Uninitialized => write!(f, "Uninitialized"),
            WatchPhase::Scanning => write!(f, "Scanning"),
            WatchPhase::Tracking => write!(f, "Tracking"),
            WatchPhase::Detached => write!(f, "Detached"),
        }
    }
}
