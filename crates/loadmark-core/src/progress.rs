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

//! Counters and the progress values derived from them.
//!
//! [`Counters`] is the only mutable state shared between trackers. It keeps
//! the invariant `loaded + failed <= total` for the whole document and for
//! every kind: a settlement that would break it is refused.
//! [`ProgressSnapshot`] is a pure function of the counters.

use crate::kind::AssetKind;
use crate::settlement::Outcome;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Total, loaded, and failed counts for a set of resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Resources being tracked.
    pub total: u32,
    /// Resources settled as loaded.
    pub loaded: u32,
    /// Resources settled as failed.
    pub failed: u32,
}

impl Tally {
    /// Resources that reached a terminal outcome.
    pub fn settled(&self) -> u32 {
        self.loaded + self.failed
    }

    /// Resources still waiting for an outcome.
    pub fn pending(&self) -> u32 {
        self.total.saturating_sub(self.settled())
    }

    /// Settled share of the total in `[0, 100]`; `0` when nothing is tracked.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.settled()) / f64::from(self.total) * 100.0
    }

    /// `true` once something is tracked and everything has settled.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.settled() == self.total
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Loaded => self.loaded += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// Shared counters of a tracking session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    overall: Tally,
    by_kind: BTreeMap<AssetKind, Tally>,
    epoch: u64,
}

impl Counters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts across every kind.
    pub fn overall(&self) -> Tally {
        self.overall
    }

    /// Counts for a single kind.
    pub fn kind(&self, kind: AssetKind) -> Tally {
        self.by_kind.get(&kind).copied().unwrap_or_default()
    }

    /// Incremented by every [`reset`](Self::reset).
    ///
    /// Trackers remember the epoch they were counted in so that outcomes
    /// started before a reset can be told apart from current ones.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Adds `count` resources of `kind` to the totals.
    ///
    /// A zero count leaves the counters untouched, so a kind only shows up in
    /// the breakdown once something of it is tracked.
    pub fn expect(&mut self, kind: AssetKind, count: u32) {
        if count == 0 {
            return;
        }
        self.overall.total += count;
        self.by_kind.entry(kind).or_default().total += count;
    }

    /// Counts one outcome for `kind`.
    ///
    /// Returns `false`, leaving the counters untouched, if every expected
    /// resource of `kind` has already settled.
    pub fn record(&mut self, kind: AssetKind, outcome: Outcome) -> bool {
        let Some(tally) = self.by_kind.get_mut(&kind) else {
            return false;
        };
        if tally.pending() == 0 {
            return false;
        }
        tally.record(outcome);
        self.overall.record(outcome);
        true
    }

    /// Zeroes every count and starts a new epoch.
    pub fn reset(&mut self) {
        self.overall = Tally::default();
        self.by_kind.clear();
        self.epoch += 1;
    }

    /// Derives the published progress values.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_count: self.overall.total,
            loaded_count: self.overall.loaded,
            failed_count: self.overall.failed,
            progress: self.overall.percent(),
            is_complete: self.overall.is_complete(),
            by_kind: self.by_kind.clone(),
        }
    }
}

/// The read-only view handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Resources being tracked.
    pub total_count: u32,
    /// Resources settled as loaded.
    pub loaded_count: u32,
    /// Resources settled as failed.
    pub failed_count: u32,
    /// Settled percentage in `[0, 100]`.
    pub progress: f64,
    /// `true` once something is tracked and everything has settled.
    pub is_complete: bool,
    /// Per-kind breakdown of the counts.
    pub by_kind: BTreeMap<AssetKind, Tally>,
}

impl ProgressSnapshot {
    /// Resources still waiting for an outcome.
    pub fn pending_count(&self) -> u32 {
        self.total_count
            .saturating_sub(self.loaded_count + self.failed_count)
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} settled ({} failed), {:.1}%",
            self.loaded_count + self.failed_count,
            self.total_count,
            self.failed_count,
            self.progress
        )?;
        if self.is_complete {
            write!(f, ", complete")?;
        }
        Ok(())
    }
}
