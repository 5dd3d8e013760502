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

//! A simulated document whose resources load, fail or stall on a schedule.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use loadmark_sdk::prelude::*;

/// What happens to one simulated resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    /// Already usable when it is first inspected.
    Cached,
    /// Becomes usable after the delay.
    Loads(Duration),
    /// Fires its error event after the delay.
    Fails(Duration),
    /// Never fires anything.
    Stalls,
}

/// One resource of the simulated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planned {
    pub kind: AssetKind,
    pub id: String,
    pub fate: Fate,
}

/// Shape of the simulated document.
///
/// Fates are assigned by position: every `stall_every`-th resource stalls,
/// every `fail_every`-th fails, every `cache_every`-th is cached. Zero
/// disables a rule. Latencies are derived from `seed`, so a scenario always
/// plays out the same way.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub counts: BTreeMap<AssetKind, u32>,
    pub fail_every: u32,
    pub stall_every: u32,
    pub cache_every: u32,
    pub max_latency: Duration,
    pub seed: u64,
}

impl Scenario {
    pub fn plan(&self) -> Vec<Planned> {
        let mut plan = Vec::new();
        let mut position = 0u64;
        for (kind, count) in &self.counts {
            for n in 0..*count {
                position += 1;
                plan.push(Planned {
                    kind: *kind,
                    id: resource_id(*kind, n),
                    fate: self.fate(position),
                });
            }
        }
        plan
    }

    fn fate(&self, position: u64) -> Fate {
        let hits = |every: u32| every > 0 && position % u64::from(every) == 0;
        if hits(self.stall_every) {
            Fate::Stalls
        } else if hits(self.fail_every) {
            Fate::Fails(self.latency(position))
        } else if hits(self.cache_every) {
            Fate::Cached
        } else {
            Fate::Loads(self.latency(position))
        }
    }

    fn latency(&self, position: u64) -> Duration {
        let span = u64::try_from(self.max_latency.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        let mut x = self.seed ^ position.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        x ^= x >> 31;
        x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        x ^= x >> 27;
        Duration::from_millis(x % span)
    }
}

fn resource_id(kind: AssetKind, n: u32) -> String {
    match kind {
        AssetKind::Image => format!("img/{n:03}.png"),
        AssetKind::Video => format!("video/{n:03}.mp4"),
        AssetKind::Audio => format!("audio/{n:03}.ogg"),
        AssetKind::Font => format!("Family {n}"),
    }
}

/// Inserts the planned resources into `document` in their starting state.
pub fn populate(document: &Document, plan: &[Planned]) -> Vec<(Arc<Element>, Fate)> {
    plan.iter()
        .map(|planned| {
            let id = planned.id.as_str();
            let cached = planned.fate == Fate::Cached;
            let element = match planned.kind {
                AssetKind::Image if cached => Element::decoded_image(id, 64, 64),
                AssetKind::Image => Element::image(id).with_size(64, 64),
                AssetKind::Video if cached => Element::video(id, MediaReadyState::HaveEnoughData),
                AssetKind::Video => Element::video(id, MediaReadyState::HaveMetadata),
                AssetKind::Audio if cached => Element::audio(id, MediaReadyState::HaveEnoughData),
                AssetKind::Audio => Element::audio(id, MediaReadyState::HaveNothing),
                AssetKind::Font if cached => Element::font(id, FontStatus::Loaded),
                AssetKind::Font => Element::font(id, FontStatus::Loading),
            };
            (document.insert(element), planned.fate)
        })
        .collect()
}

/// Builds the imperative request for a planned resource.
///
/// Cached fonts are declared up front and requested by family only. Audio
/// has no imperative loader and yields `None`.
pub fn request(document: &Document, planned: &Planned) -> Option<LoadRequest> {
    let url = planned.id.clone();
    match planned.kind {
        AssetKind::Image => Some(LoadRequest::Image { url }),
        AssetKind::Video => Some(LoadRequest::Video { url }),
        AssetKind::Audio => None,
        AssetKind::Font if planned.fate == Fate::Cached => {
            document.insert(Element::font(url.as_str(), FontStatus::Loaded));
            Some(LoadRequest::Font {
                family: url,
                url: None,
            })
        }
        AssetKind::Font => Some(LoadRequest::Font {
            url: Some(format!("fonts/{}.woff2", url.replace(' ', "-"))),
            family: url,
        }),
    }
}

/// Plays out `fate` for `element` on the ambient runtime.
pub fn drive(element: Arc<Element>, fate: Fate) {
    match fate {
        Fate::Cached | Fate::Stalls => {}
        Fate::Loads(after) => {
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                element.finish();
            });
        }
        Fate::Fails(after) => {
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                element.fail();
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Scenario {
        Scenario {
            counts: BTreeMap::from([(AssetKind::Image, 6), (AssetKind::Video, 2)]),
            fail_every: 3,
            stall_every: 8,
            cache_every: 2,
            max_latency: Duration::from_millis(500),
            seed: 42,
        }
    }

    #[test]
    fn plans_are_deterministic() {
        assert_eq!(scenario().plan(), scenario().plan());
    }

    #[test]
    fn fates_follow_position() {
        let plan = scenario().plan();
        assert_eq!(plan.len(), 8);
        assert_eq!(plan[0].id, "img/000.png");
        assert_eq!(plan[1].fate, Fate::Cached);
        assert!(matches!(plan[2].fate, Fate::Fails(_)));
        assert!(matches!(plan[5].fate, Fate::Fails(_)));
        assert_eq!(plan[7].fate, Fate::Stalls);
        for planned in &plan {
            if let Fate::Loads(after) | Fate::Fails(after) = planned.fate {
                assert!(after < Duration::from_millis(500));
            }
        }
    }

    #[test]
    fn cached_fonts_are_declared_before_the_request() {
        let document = Document::new();
        let planned = Planned {
            kind: AssetKind::Font,
            id: "Family 0".to_string(),
            fate: Fate::Cached,
        };
        let request = request(&document, &planned);
        assert_eq!(
            request,
            Some(LoadRequest::Font {
                family: "Family 0".to_string(),
                url: None
            })
        );
        assert!(document.get(AssetKind::Font, "Family 0").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_document_settles_every_resource() {
        let document = Arc::new(Document::new());
        let elements = populate(&document, &scenario().plan());
        let watcher = watch_assets(document, None);
        for (element, fate) in elements {
            drive(element, fate);
        }

        let snapshot = watcher.wait_complete().await;
        assert_eq!(snapshot.total_count, 8);
        assert_eq!(snapshot.failed_count, 3);
        assert_eq!(snapshot.loaded_count, 5);
    }
}
