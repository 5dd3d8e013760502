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

//! Counting settlements and publishing progress.
//!
//! The counters live in a `tokio::sync::watch` channel. Every change is a
//! single read-modify-write performed under the channel's lock, so outcomes
//! resolving in the same scheduling pass cannot lose updates, and every
//! subscriber observes the new value.
//!
//! Closing the session is part of the same state, so a subscriber waiting
//! for completion also wakes up when the session is torn down.

use loadmark_core::event::EventBus;
use loadmark_core::{AssetKind, Counters, ProgressSnapshot, Settlement, SettlementEvent};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Default)]
struct Session {
    counters: Counters,
    closed: bool,
}

/// Proof that resources were counted in a given epoch.
///
/// Handed out by [`CounterAggregator::expect`] and presented back with each
/// settlement. Settlements carrying a ticket from before a reset are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
}

/// Receives settlement outcomes and applies them to the shared counters.
#[derive(Debug, Clone)]
pub struct CounterAggregator {
    state: Arc<watch::Sender<Session>>,
    events: Arc<EventBus<SettlementEvent>>,
}

impl CounterAggregator {
    /// Creates zeroed counters publishing counted settlements on `events`.
    pub fn new(events: Arc<EventBus<SettlementEvent>>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            state: Arc::new(state),
            events,
        }
    }

    /// Adds the given per-kind counts to the totals in one update.
    pub fn expect(&self, counts: &[(AssetKind, u32)]) -> Ticket {
        let mut epoch = 0;
        self.state.send_modify(|session| {
            for (kind, count) in counts {
                session.counters.expect(*kind, *count);
            }
            epoch = session.counters.epoch();
        });
        Ticket { epoch }
    }

    /// Counts one settlement.
    ///
    /// Returns `false` when the settlement was discarded: its ticket predates
    /// a reset, the kind has nothing left pending, or the session is closed.
    pub fn record(&self, ticket: Ticket, settlement: Settlement) -> bool {
        let mut snapshot = None;
        self.state.send_if_modified(|session| {
            if session.closed || session.counters.epoch() != ticket.epoch {
                return false;
            }
            if !session.counters.record(settlement.kind, settlement.outcome) {
                return false;
            }
            snapshot = Some(session.counters.snapshot());
            true
        });

        let Some(snapshot) = snapshot else {
            log::warn!(
                "Discarded settlement of {} '{}' ({}).",
                settlement.kind,
                settlement.id,
                settlement.outcome
            );
            return false;
        };

        if snapshot.is_complete {
            log::info!("All tracked resources settled: {snapshot}.");
        }
        self.events.publish(SettlementEvent {
            settlement,
            snapshot,
        });
        true
    }

    /// Zeroes every counter and invalidates outstanding tickets.
    pub fn reset(&self) {
        self.state.send_modify(|session| session.counters.reset());
        log::info!("Counters reset.");
    }

    /// Ends the session: no further settlement is counted and every feed
    /// waiting for completion is released.
    pub fn close(&self) {
        self.state.send_if_modified(|session| !std::mem::replace(&mut session.closed, true));
    }

    /// Returns `true` once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// The current progress values.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.borrow().counters.snapshot()
    }

    /// A live view of the progress values.
    pub fn feed(&self) -> ProgressFeed {
        ProgressFeed {
            receiver: self.state.subscribe(),
        }
    }
}

/// A subscription to the progress of a tracking session.
///
/// This is the hook for a presentation layer: read [`current`](Self::current)
/// to render, await [`changed`](Self::changed) to re-render.
#[derive(Debug, Clone)]
pub struct ProgressFeed {
    receiver: watch::Receiver<Session>,
}

impl ProgressFeed {
    /// The latest progress values.
    pub fn current(&mut self) -> ProgressSnapshot {
        self.receiver.borrow_and_update().counters.snapshot()
    }

    /// Waits for the next change. Returns `None` once the session is closed
    /// or gone.
    pub async fn changed(&mut self) -> Option<ProgressSnapshot> {
        if self.receiver.borrow().closed {
            return None;
        }
        self.receiver.changed().await.ok()?;
        let session = self.receiver.borrow_and_update();
        if session.closed {
            return None;
        }
        Some(session.counters.snapshot())
    }

    /// Waits until every tracked resource has settled.
    ///
    /// Returns `None` if the session is closed or gone first.
    pub async fn wait_complete(&mut self) -> Option<ProgressSnapshot> {
        let session = self
            .receiver
            .wait_for(|session| session.closed || session.counters.overall().is_complete())
            .await
            .ok()?;
        let snapshot = session.counters.snapshot();
        snapshot.is_complete.then_some(snapshot)
    }
}
