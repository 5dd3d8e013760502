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

//! The generic settlement routine.
//!
//! Settling a resource happens in two steps. [`SettlementLane::arm`] runs
//! synchronously: it attaches a listener for the kind's success and failure
//! events, starts the settle timer, and runs the kind's fast path. [`ArmedSettlement::settle`]
//! then resolves the outcome: immediately if the fast path decided it,
//! otherwise from whichever of the two events or the timer fires first.
//!
//! The listener is attached before the fast path inspects the status, so an
//! event fired in between cannot be missed. When the fast path decides, the
//! listener is dropped unfired and only that path produces the outcome. The
//! listener resolves for the first of the two events only, so a resource that
//! fails and later loads stays failed.

mod profile;

pub use profile::{profile_for, FastPath, SettlementProfile, SETTLEMENT_PROFILES};

use loadmark_core::resource::Listener;
use loadmark_core::{
    AssetKind, Outcome, Resource, ResourceEvent, SettlePath, Settlement, DEFAULT_SETTLE_TIMEOUT,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Runs the settlement routine with a fixed timeout.
#[derive(Debug, Clone, Copy)]
pub struct SettlementLane {
    timeout: Duration,
}

impl Default for SettlementLane {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_TIMEOUT)
    }
}

impl SettlementLane {
    /// Creates a lane that fails resources still pending after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The settle timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Attaches listeners, starts the timer, and runs the fast path.
    pub fn arm(&self, resource: Arc<dyn Resource>) -> ArmedSettlement {
        let profile = profile_for(resource.kind());
        let started = Instant::now();

        let listener = resource.listen(&[profile.success, profile.failure]);

        let state = match (profile.fast_path)(&resource.status()) {
            Some(outcome) => Armed::Decided(outcome),
            None => Armed::Waiting {
                listener,
                success: profile.success,
                deadline: started + self.timeout,
            },
        };

        ArmedSettlement {
            resource,
            started,
            state,
        }
    }

    /// Arms `resource` and waits for its settlement.
    pub async fn settle(&self, resource: Arc<dyn Resource>) -> Settlement {
        self.arm(resource).settle().await
    }
}

#[derive(Debug)]
enum Armed {
    Decided(Outcome),
    Waiting {
        listener: Listener,
        success: ResourceEvent,
        deadline: Instant,
    },
}

/// A resource whose listeners and timer are in place.
///
/// Dropping it before it settles releases its listener.
#[derive(Debug)]
pub struct ArmedSettlement {
    resource: Arc<dyn Resource>,
    started: Instant,
    state: Armed,
}

impl ArmedSettlement {
    /// Kind of the armed resource.
    pub fn kind(&self) -> AssetKind {
        self.resource.kind()
    }

    /// Identifier of the armed resource.
    pub fn id(&self) -> &str {
        self.resource.id()
    }

    /// The outcome, if the fast path already decided it.
    pub fn decided(&self) -> Option<Outcome> {
        match self.state {
            Armed::Decided(outcome) => Some(outcome),
            Armed::Waiting { .. } => None,
        }
    }

    /// Resolves the terminal outcome.
    pub async fn settle(self) -> Settlement {
        let (outcome, path) = match self.state {
            Armed::Decided(outcome) => (outcome, SettlePath::FastPath),
            Armed::Waiting {
                listener,
                success,
                deadline,
            } => {
                tokio::select! {
                    biased;
                    fired = listener => {
                        let outcome = if fired == success {
                            Outcome::Loaded
                        } else {
                            Outcome::Failed
                        };
                        (outcome, SettlePath::Event)
                    }
                    _ = tokio::time::sleep_until(deadline) => (Outcome::Failed, SettlePath::Timeout),
                }
            }
        };

        let settlement = Settlement {
            kind: self.resource.kind(),
            id: self.resource.id().to_string(),
            outcome,
            path,
            elapsed: self.started.elapsed(),
        };

        if path == SettlePath::Timeout {
            log::warn!(
                "{} '{}' did not settle within {:?}; counting it as failed.",
                settlement.kind,
                settlement.id,
                settlement.elapsed
            );
        } else {
            log::debug!(
                "{} '{}' settled as {} via {:?} after {:?}.",
                settlement.kind,
                settlement.id,
                settlement.outcome,
                settlement.path,
                settlement.elapsed
            );
        }
        settlement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadmark_core::{Element, FontStatus, MediaReadyState};

    const TIMEOUT: Duration = Duration::from_secs(7);

    #[tokio::test(start_paused = true)]
    async fn fast_path_settles_without_waiting() {
        let lane = SettlementLane::new(TIMEOUT);
        let image = Arc::new(Element::decoded_image("logo.png", 32, 32));

        let armed = lane.arm(image.clone());
        assert_eq!(armed.decided(), Some(Outcome::Loaded));
        assert_eq!(image.listener_count(), 0);

        let settlement = armed.settle().await;
        assert_eq!(settlement.path, SettlePath::FastPath);
        assert_eq!(settlement.elapsed, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn errored_font_fails_immediately() {
        let lane = SettlementLane::new(TIMEOUT);
        let font = Arc::new(Element::font("Broken Sans", FontStatus::Error));

        let settlement = lane.settle(font).await;
        assert_eq!(settlement.outcome, Outcome::Failed);
        assert_eq!(settlement.path, SettlePath::FastPath);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_resources_attach_a_single_listener() {
        let lane = SettlementLane::new(TIMEOUT);
        let video = Arc::new(Element::video("clip.mp4", MediaReadyState::HaveMetadata));

        let armed = lane.arm(video.clone());
        assert_eq!(armed.decided(), None);
        assert_eq!(video.listener_count(), 1);

        drop(armed);
        assert_eq!(video.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn success_event_settles_as_loaded() {
        let lane = SettlementLane::new(TIMEOUT);
        let image = Arc::new(Element::image("hero.png"));

        let armed = lane.arm(image.clone());
        let task = tokio::spawn(armed.settle());
        tokio::time::sleep(Duration::from_millis(300)).await;
        image.finish();

        let settlement = task.await.unwrap();
        assert_eq!(settlement.outcome, Outcome::Loaded);
        assert_eq!(settlement.path, SettlePath::Event);
        assert_eq!(settlement.elapsed, Duration::from_millis(300));
        assert_eq!(image.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_event_settles_as_failed() {
        let lane = SettlementLane::new(TIMEOUT);
        let audio = Arc::new(Element::audio("theme.ogg", MediaReadyState::HaveNothing));

        let armed = lane.arm(audio.clone());
        audio.fail();

        let settlement = armed.settle().await;
        assert_eq!(settlement.outcome, Outcome::Failed);
        assert_eq!(settlement.path, SettlePath::Event);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_resource_times_out_exactly_at_the_deadline() {
        let lane = SettlementLane::new(TIMEOUT);
        let image = Arc::new(Element::image("stuck.png"));

        let task = tokio::spawn(lane.arm(image.clone()).settle());

        tokio::time::sleep(TIMEOUT - Duration::from_millis(1)).await;
        assert!(!task.is_finished());

        let settlement = task.await.unwrap();
        assert_eq!(settlement.outcome, Outcome::Failed);
        assert_eq!(settlement.path, SettlePath::Timeout);
        assert_eq!(settlement.elapsed, TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn first_settlement_is_permanent() {
        let lane = SettlementLane::new(TIMEOUT);
        let image = Arc::new(Element::image("flaky.png"));

        let armed = lane.arm(image.clone());
        image.fail();
        image.finish();

        let settlement = armed.settle().await;
        assert_eq!(settlement.outcome, Outcome::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn event_fired_between_listen_and_check_is_not_lost() {
        let lane = SettlementLane::new(TIMEOUT);
        let font = Arc::new(Element::font("Inter", FontStatus::Loading));

        let armed = lane.arm(font.clone());
        font.finish();

        let settlement = armed.settle().await;
        assert_eq!(settlement.outcome, Outcome::Loaded);
        assert_eq!(settlement.path, SettlePath::Event);
    }
}
