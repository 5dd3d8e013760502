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

//! The LoaderAgent tracks resources the caller asks for, one at a time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use loadmark_core::event::EventBus;
use loadmark_core::{
    LoadError, LoadRequest, Outcome, ProgressSnapshot, ResourceFactory, SettlementEvent,
};
use loadmark_lanes::SettlementLane;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

use super::PendingLoad;
use crate::aggregator::{CounterAggregator, ProgressFeed};

/// Imperative-mode accessor.
///
/// Every `load_*` call asks the [`ResourceFactory`] for a resource, adds one
/// to the total and spawns a tracker on the ambient tokio runtime. The
/// returned [`PendingLoad`] resolves with the outcome of that one resource.
///
/// Dropping or [detaching](Self::detach) the agent aborts its trackers; their
/// pending loads then resolve to [`LoadError::Abandoned`].
pub struct LoaderAgent {
    factory: Arc<dyn ResourceFactory>,
    lane: SettlementLane,
    aggregator: CounterAggregator,
    bus: Arc<EventBus<SettlementEvent>>,
    trackers: Mutex<JoinSet<()>>,
}

impl LoaderAgent {
    /// Creates a loader with zeroed counters and the default settle timeout.
    pub fn new(factory: Arc<dyn ResourceFactory>) -> Self {
        let bus = Arc::new(EventBus::new());
        Self {
            factory,
            lane: SettlementLane::default(),
            aggregator: CounterAggregator::new(bus.clone()),
            bus,
            trackers: Mutex::new(JoinSet::new()),
        }
    }

    /// Replaces the settle timeout used by subsequent loads.
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.lane = SettlementLane::new(timeout);
        self
    }

    /// Starts tracking the resource described by `request`.
    ///
    /// Once the agent is detached nothing is created or counted, and the
    /// returned load resolves to [`LoadError::Abandoned`].
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn load(&self, request: LoadRequest) -> PendingLoad {
        let kind = request.kind();
        let id = request.id().to_string();
        let (sender, receiver) = oneshot::channel();
        if self.is_detached() {
            log::warn!("LoaderAgent: {kind} '{id}' requested after detach; abandoned.");
            drop(sender);
            return PendingLoad::new(kind, id, receiver);
        }

        let resource = self.factory.create(&request);
        let ticket = self.aggregator.expect(&[(kind, 1)]);
        let armed = self.lane.arm(resource);
        log::debug!("LoaderAgent: loading {} '{}'.", armed.kind(), armed.id());

        let aggregator = self.aggregator.clone();
        let mut trackers = self.trackers.lock().unwrap_or_else(PoisonError::into_inner);
        while trackers.try_join_next().is_some() {}
        trackers.spawn(async move {
            let settlement = armed.settle().await;
            let result = match settlement.outcome {
                Outcome::Loaded => Ok(settlement.clone()),
                Outcome::Failed => Err(LoadError::Failed {
                    kind: settlement.kind,
                    id: settlement.id.clone(),
                }),
            };
            aggregator.record(ticket, settlement);
            // The caller may have dropped its handle; the count stands either way.
            let _ = sender.send(result);
        });

        PendingLoad::new(kind, id, receiver)
    }

    /// Loads an image from `url`.
    pub fn load_image(&self, url: &str) -> PendingLoad {
        self.load(LoadRequest::Image {
            url: url.to_string(),
        })
    }

    /// Loads a video from `url`. Settles once it can play through.
    pub fn load_video(&self, url: &str) -> PendingLoad {
        self.load(LoadRequest::Video {
            url: url.to_string(),
        })
    }

    /// Loads the font `family`, declaring it from `url` when given.
    pub fn load_font(&self, family: &str, url: Option<&str>) -> PendingLoad {
        self.load(LoadRequest::Font {
            family: family.to_string(),
            url: url.map(str::to_string),
        })
    }

    /// Zeroes every counter.
    ///
    /// Loads still in flight keep running and still resolve their
    /// [`PendingLoad`], but their outcomes are no longer counted.
    pub fn reset(&self) {
        self.aggregator.reset();
    }

    /// Aborts every in-flight load and ends the session.
    ///
    /// Counts already committed are kept. Later loads are abandoned right away
    /// and [`wait_complete`](Self::wait_complete) no longer waits.
    pub fn detach(&self) {
        if self.is_detached() {
            return;
        }
        self.trackers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
        self.aggregator.close();
        let snapshot = self.aggregator.snapshot();
        log::info!(
            "LoaderAgent: detached at {snapshot}; {} left pending.",
            snapshot.pending_count()
        );
    }

    /// Returns `true` once [`detach`](Self::detach) was called.
    pub fn is_detached(&self) -> bool {
        self.aggregator.is_closed()
    }

    /// Resources that loaded.
    pub fn loaded_count(&self) -> u32 {
        self.snapshot().loaded_count
    }

    /// Resources that failed or timed out.
    pub fn failed_count(&self) -> u32 {
        self.snapshot().failed_count
    }

    /// Resources requested since creation or the last reset.
    pub fn total_count(&self) -> u32 {
        self.snapshot().total_count
    }

    /// Settled percentage, `0.0` when nothing was requested.
    pub fn progress(&self) -> f64 {
        self.snapshot().progress
    }

    /// `true` once every requested resource has settled.
    pub fn is_complete(&self) -> bool {
        self.snapshot().is_complete
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

    /// Waits until every requested resource has settled.
    ///
    /// Resolves immediately with the current values when nothing was
    /// requested or the agent is detached.
    pub async fn wait_complete(&self) -> ProgressSnapshot {
        let snapshot = self.snapshot();
        if self.is_detached() || snapshot.total_count == 0 || snapshot.is_complete {
            return snapshot;
        }
        self.progress_feed()
            .wait_complete()
            .await
            .unwrap_or_else(|| self.snapshot())
    }
}

impl std::fmt::Debug for LoaderAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderAgent")
            .field("timeout", &self.lane.timeout())
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadmark_core::{AssetKind, Document, SettlePath};

    fn loader() -> (Arc<Document>, LoaderAgent) {
        let document = Arc::new(Document::new());
        let agent = LoaderAgent::new(document.clone());
        (document, agent)
    }

    #[tokio::test(start_paused = true)]
    async fn each_load_increments_the_total_immediately() {
        let (_document, agent) = loader();
        assert_eq!(agent.total_count(), 0);
        assert!(!agent.is_complete());

        let _a = agent.load_image("a.png");
        let _b = agent.load_video("b.mp4");
        assert_eq!(agent.total_count(), 2);
        assert_eq!(agent.loaded_count(), 0);
        assert_eq!(agent.progress(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn a_finished_image_resolves_the_pending_load() {
        let (document, agent) = loader();
        let pending = agent.load_image("hero.png");
        assert_eq!(pending.kind(), AssetKind::Image);
        assert_eq!(pending.id(), "hero.png");

        document
            .get(AssetKind::Image, "hero.png")
            .expect("image was created")
            .finish();

        let settlement = pending.await.expect("image loads");
        assert_eq!(settlement.path, SettlePath::Event);
        assert_eq!(agent.loaded_count(), 1);
        assert!(agent.is_complete());
        assert_eq!(agent.progress(), 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_agent_abandons_pending_loads() {
        let (_document, agent) = loader();
        let pending = agent.load_video("never.mp4");
        drop(agent);

        let error = pending.await.expect_err("tracker was aborted");
        assert_eq!(
            error,
            LoadError::Abandoned {
                kind: AssetKind::Video,
                id: "never.mp4".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn custom_timeout_applies_to_later_loads() {
        let document = Arc::new(Document::new());
        let agent = LoaderAgent::new(document).with_settle_timeout(Duration::from_secs(1));
        let started = tokio::time::Instant::now();

        let error = agent.load_video("slow.mp4").await.expect_err("times out");
        assert!(matches!(error, LoadError::Failed { .. }));
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(agent.failed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_stops_waiting_for_completion() {
        let (document, agent) = loader();
        let pending = agent.load_video("v.mp4");
        agent.detach();
        assert!(agent.is_detached());

        let started = tokio::time::Instant::now();
        let snapshot = agent.wait_complete().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(snapshot.total_count, 1);
        assert!(!snapshot.is_complete);

        let mut feed = agent.progress_feed();
        assert_eq!(feed.wait_complete().await, None);
        assert!(matches!(pending.await, Err(LoadError::Abandoned { .. })));
        assert_eq!(document.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn loads_after_detach_are_abandoned_uncounted() {
        let (document, agent) = loader();
        agent.detach();

        let error = agent.load_image("late.png").await.expect_err("agent is detached");
        assert_eq!(
            error,
            LoadError::Abandoned {
                kind: AssetKind::Image,
                id: "late.png".to_string(),
            }
        );
        assert_eq!(agent.total_count(), 0);
        assert!(document.is_empty());
        assert!(agent.drain_settlements().is_empty());
    }
}
