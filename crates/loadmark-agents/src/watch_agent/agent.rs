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

//! The WatchAgent scans a document once and tracks every resource it finds.

use std::sync::Arc;

use loadmark_core::event::EventBus;
use loadmark_core::{
    AssetKind, ProgressSnapshot, Resource, ResourceSource, SettlementEvent, WatchConfig,
};
use loadmark_lanes::SettlementLane;
use tokio::task::JoinSet;

use super::WatchPhase;
use crate::aggregator::{CounterAggregator, ProgressFeed};

/// Passive-mode accessor.
///
/// Mounting enumerates the configured kinds from the [`ResourceSource`],
/// counts everything found, and spawns one tracker per resource on the
/// ambient tokio runtime. The counters then only move as trackers settle.
pub struct WatchAgent {
    source: Arc<dyn ResourceSource>,
    config: WatchConfig,
    lane: SettlementLane,
    aggregator: CounterAggregator,
    bus: Arc<EventBus<SettlementEvent>>,
    phase: WatchPhase,
    trackers: JoinSet<()>,
}

impl WatchAgent {
    /// Creates an unmounted agent.
    pub fn new(source: Arc<dyn ResourceSource>, config: WatchConfig) -> Self {
        let bus = Arc::new(EventBus::new());
        Self {
            source,
            lane: SettlementLane::new(config.settle_timeout),
            config,
            aggregator: CounterAggregator::new(bus.clone()),
            bus,
            phase: WatchPhase::Uninitialized,
            trackers: JoinSet::new(),
        }
    }

    /// Scans the document and starts tracking.
    ///
    /// Only the first call does anything; later calls return `false`.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn mount(&mut self) -> bool {
        if !self.phase.accepts_mount() {
            log::debug!("WatchAgent: mount ignored in phase {}.", self.phase);
            return false;
        }

        self.phase = WatchPhase::Scanning;
        let kinds = self.config.tracked_kinds();
        log::info!("WatchAgent: scanning {kinds:?}.");

        let discovered: Vec<(AssetKind, Vec<Arc<dyn Resource>>)> = kinds
            .into_iter()
            .map(|kind| (kind, self.source.enumerate(kind)))
            .collect();

        // Totals are published in a single update before any tracker runs.
        let counts: Vec<(AssetKind, u32)> = discovered
            .iter()
            .map(|(kind, resources)| (*kind, u32::try_from(resources.len()).unwrap_or(u32::MAX)))
            .collect();
        let ticket = self.aggregator.expect(&counts);

        let mut already_settled = 0usize;
        for (kind, resources) in discovered {
            log::debug!("WatchAgent: tracking {} {kind}.", resources.len());
            for resource in resources {
                let armed = self.lane.arm(resource);
                if let Some(outcome) = armed.decided() {
                    already_settled += 1;
                    log::trace!(
                        "WatchAgent: {} '{}' is already {outcome}.",
                        armed.kind(),
                        armed.id()
                    );
                }
                let aggregator = self.aggregator.clone();
                self.trackers.spawn(async move {
                    let settlement = armed.settle().await;
                    aggregator.record(ticket, settlement);
                });
            }
        }

        self.phase = WatchPhase::Tracking;
        let total = self.aggregator.snapshot().total_count;
        log::info!("WatchAgent: tracking {total} resource(s), {already_settled} already settled.");
        if total == 0 {
            // Nothing can settle any more.
            self.aggregator.close();
        }
        true
    }

    /// Releases every pending tracker. Counts already committed are kept.
    pub fn detach(&mut self) {
        if self.phase == WatchPhase::Detached {
            return;
        }
        self.trackers.abort_all();
        self.aggregator.close();
        self.phase = WatchPhase::Detached;
        let snapshot = self.aggregator.snapshot();
        log::info!(
            "WatchAgent: detached at {snapshot}; {} left pending.",
            snapshot.pending_count()
        );
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> WatchPhase {
        self.phase
    }

    /// The configuration the agent was built with.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Current progress values.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.aggregator.snapshot()
    }

    /// A live subscription to the progress values.
    pub fn progress_feed(&self) -> ProgressFeed {
        self.aggregator.feed()
    }

    /// The stream of counted settlements.
    pub fn settlements(&self) -> &flume::Receiver<SettlementEvent> {
        self.bus.receiver()
    }

    /// Takes the settlements counted since the last call without waiting.
    pub fn drain_settlements(&self) -> Vec<SettlementEvent> {
        self.bus.drain()
    }

    /// Waits until every tracked resource has settled.
    ///
    /// Resolves immediately with the current values when there is nothing to
    /// wait for: the agent is not tracking, or tracks no resource at all.
    pub async fn wait_complete(&self) -> ProgressSnapshot {
        let snapshot = self.snapshot();
        if self.phase != WatchPhase::Tracking || snapshot.total_count == 0 {
            return snapshot;
        }
        self.progress_feed()
            .wait_complete()
            .await
            .unwrap_or_else(|| self.snapshot())
    }
}

impl std::fmt::Debug for WatchAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchAgent")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadmark_core::{Document, Element, FontStatus, MediaReadyState};
    use std::time::Duration;

    fn document() -> Arc<Document> {
        let document = Document::new();
        document.insert(Element::decoded_image("logo.png", 10, 10));
        document.insert(Element::video("intro.mp4", MediaReadyState::HaveEnoughData));
        document.insert(Element::font("Inter", FontStatus::Loaded));
        Arc::new(document)
    }

    #[tokio::test(start_paused = true)]
    async fn mount_runs_exactly_once() {
        let mut agent = WatchAgent::new(document(), WatchConfig::default());
        assert_eq!(agent.phase(), WatchPhase::Uninitialized);

        assert!(agent.mount());
        assert_eq!(agent.phase(), WatchPhase::Tracking);
        assert!(!agent.mount());
        assert!(!agent.mount());

        let snapshot = agent.wait_complete().await;
        assert_eq!(snapshot.total_count, 3);
        assert_eq!(snapshot.loaded_count, 3);
        assert!(snapshot.is_complete);
    }

    #[tokio::test(start_paused = true)]
    async fn totals_are_known_before_anything_settles() {
        let mut agent = WatchAgent::new(document(), WatchConfig::default());
        agent.mount();

        let snapshot = agent.snapshot();
        assert_eq!(snapshot.total_count, 3);
        assert_eq!(snapshot.loaded_count + snapshot.failed_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unmounted_agent_reports_zero() {
        let agent = WatchAgent::new(document(), WatchConfig::default());
        let snapshot = agent.wait_complete().await;
        assert_eq!(snapshot.total_count, 0);
        assert!(!snapshot.is_complete);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_releases_pending_listeners() {
        let document = Document::new();
        let stuck = document.insert(Element::image("stuck.png"));
        let mut agent = WatchAgent::new(
            Arc::new(document),
            WatchConfig::default().with_settle_timeout(Duration::from_secs(7)),
        );
        agent.mount();
        assert_eq!(stuck.listener_count(), 1);

        agent.detach();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(agent.phase(), WatchPhase::Detached);
        assert_eq!(stuck.listener_count(), 0);
        assert!(!agent.mount());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(agent.snapshot().failed_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_releases_feeds_waiting_for_completion() {
        let document = Document::new();
        document.insert(Element::image("stuck.png"));
        let mut agent = WatchAgent::new(Arc::new(document), WatchConfig::default());
        agent.mount();
        let mut feed = agent.progress_feed();

        let started = tokio::time::Instant::now();
        agent.detach();
        assert_eq!(feed.wait_complete().await, None);
        assert_eq!(started.elapsed(), Duration::ZERO);

        let snapshot = agent.wait_complete().await;
        assert_eq!(snapshot.total_count, 1);
        assert!(!snapshot.is_complete);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_scan_releases_feeds_immediately() {
        let mut agent = WatchAgent::new(
            Arc::new(Document::new()),
            WatchConfig::default().with_scan([AssetKind::Audio]),
        );
        agent.mount();

        let mut feed = agent.progress_feed();
        assert_eq!(feed.wait_complete().await, None);
        assert_eq!(feed.changed().await, None);
        let snapshot = agent.snapshot();
        assert_eq!(snapshot.total_count, 0);
        assert!(snapshot.by_kind.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drained_settlements_are_taken_once() {
        let mut agent = WatchAgent::new(document(), WatchConfig::default());
        agent.mount();
        agent.wait_complete().await;

        assert_eq!(agent.drain_settlements().len(), 3);
        assert!(agent.drain_settlements().is_empty());
    }
}
