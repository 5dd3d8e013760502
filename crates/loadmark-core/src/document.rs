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

//! An in-memory document: the reference [`ResourceSource`] and [`ResourceFactory`].
//!
//! A [`Document`] holds media elements and a font-face registry whose status
//! is driven explicitly: whoever plays the role of the network calls
//! [`Element::finish`] or [`Element::fail`], or simply never does.
//!
//! ```
//! use loadmark_core::{AssetKind, Document, Element, ResourceSource};
//!
//! let document = Document::new();
//! let hero = document.insert(Element::image("hero.png"));
//! document.insert(Element::decoded_image("logo.svg", 64, 64));
//!
//! assert_eq!(document.enumerate(AssetKind::Image).len(), 2);
//! hero.finish();
//! ```

use crate::kind::AssetKind;
use crate::resource::{
    EventTarget, FontStatus, Listener, LoadRequest, MediaReadyState, Resource, ResourceEvent,
    ResourceFactory, ResourceSource, ResourceStatus,
};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// A media element or font face living in a [`Document`].
#[derive(Debug)]
pub struct Element {
    id: String,
    kind: AssetKind,
    intrinsic_size: (u32, u32),
    status: Mutex<ResourceStatus>,
    target: EventTarget,
}

impl Element {
    fn new(kind: AssetKind, id: impl Into<String>, status: ResourceStatus) -> Self {
        Self {
            id: id.into(),
            kind,
            intrinsic_size: (1, 1),
            status: Mutex::new(status),
            target: EventTarget::new(),
        }
    }

    /// An image that has not decoded yet.
    pub fn image(src: impl Into<String>) -> Self {
        Self::new(AssetKind::Image, src, ResourceStatus::pending(AssetKind::Image))
    }

    /// An image whose natural dimensions are already known.
    pub fn decoded_image(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(
            AssetKind::Image,
            src,
            ResourceStatus::Image {
                natural_size: Some((width, height)),
            },
        )
        .with_size(width, height)
    }

    /// A video element at the given buffering level.
    pub fn video(src: impl Into<String>, ready_state: MediaReadyState) -> Self {
        Self::new(AssetKind::Video, src, ResourceStatus::Media { ready_state })
    }

    /// An audio element at the given buffering level.
    pub fn audio(src: impl Into<String>, ready_state: MediaReadyState) -> Self {
        Self::new(AssetKind::Audio, src, ResourceStatus::Media { ready_state })
    }

    /// A font face with the given registry status.
    pub fn font(family: impl Into<String>, status: FontStatus) -> Self {
        Self::new(AssetKind::Font, family, ResourceStatus::Font { status })
    }

    /// Sets the size an image reports once it decodes.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.intrinsic_size = (width, height);
        self
    }

    /// Replaces the status without firing any event.
    pub fn set_status(&self, status: ResourceStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Fires `event` at the element's listeners.
    pub fn dispatch(&self, event: ResourceEvent) -> usize {
        self.target.dispatch(event)
    }

    /// Completes loading: the element becomes usable and fires its success event.
    pub fn finish(&self) {
        let (status, event) = match self.kind {
            AssetKind::Image => (
                ResourceStatus::Image {
                    natural_size: Some(self.intrinsic_size),
                },
                ResourceEvent::Load,
            ),
            AssetKind::Video | AssetKind::Audio => (
                ResourceStatus::Media {
                    ready_state: MediaReadyState::HaveEnoughData,
                },
                ResourceEvent::CanPlayThrough,
            ),
            AssetKind::Font => (
                ResourceStatus::Font {
                    status: FontStatus::Loaded,
                },
                ResourceEvent::Load,
            ),
        };
        self.set_status(status);
        self.dispatch(event);
    }

    /// Aborts loading: the element fires its error event.
    ///
    /// Images and media keep their status, fonts move to [`FontStatus::Error`].
    pub fn fail(&self) {
        if self.kind == AssetKind::Font {
            self.set_status(ResourceStatus::Font {
                status: FontStatus::Error,
            });
        }
        self.dispatch(ResourceEvent::Error);
    }

    /// Listeners still attached to the element.
    pub fn listener_count(&self) -> usize {
        self.target.listener_count()
    }
}

impl Resource for Element {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> AssetKind {
        self.kind
    }

    fn status(&self) -> ResourceStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listen(&self, events: &[ResourceEvent]) -> Listener {
        self.target.listen(events)
    }
}

/// An in-memory document holding elements of every kind.
#[derive(Debug, Default)]
pub struct Document {
    elements: RwLock<Vec<Arc<Element>>>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element and returns a shared handle to it.
    pub fn insert(&self, element: Element) -> Arc<Element> {
        let element = Arc::new(element);
        self.elements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(element.clone());
        element
    }

    /// The most recently inserted element of `kind` with the given id.
    pub fn get(&self, kind: AssetKind, id: &str) -> Option<Arc<Element>> {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|element| element.kind == kind && element.id == id)
            .cloned()
    }

    /// Every element of `kind`, in insertion order.
    pub fn elements(&self, kind: AssetKind) -> Vec<Arc<Element>> {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|element| element.kind == kind)
            .cloned()
            .collect()
    }

    /// Number of elements of every kind.
    pub fn len(&self) -> usize {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the document holds no element.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceSource for Document {
    fn enumerate(&self, kind: AssetKind) -> Vec<Arc<dyn Resource>> {
        self.elements(kind)
            .into_iter()
            .map(|element| element as Arc<dyn Resource>)
            .collect()
    }
}

impl ResourceFactory for Document {
    fn create(&self, request: &LoadRequest) -> Arc<dyn Resource> {
        let element = match request {
            LoadRequest::Image { url } => self.insert(Element::image(url.as_str())),
            LoadRequest::Video { url } => {
                self.insert(Element::video(url.as_str(), MediaReadyState::HaveNothing))
            }
            LoadRequest::Font {
                family,
                url: Some(_),
            } => self.insert(Element::font(family.as_str(), FontStatus::Loading)),
            LoadRequest::Font { family, url: None } => self
                .get(AssetKind::Font, family)
                .unwrap_or_else(|| self.insert(Element::font(family.as_str(), FontStatus::Unloaded))),
        };
        log::trace!("Created {} resource '{}'.", request.kind(), request.id());
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerate_filters_by_kind() {
        let document = Document::new();
        document.insert(Element::image("a.png"));
        document.insert(Element::video("clip.mp4", MediaReadyState::HaveMetadata));
        document.insert(Element::image("b.png"));
        document.insert(Element::font("Inter", FontStatus::Loaded));

        let ids: Vec<_> = document
            .enumerate(AssetKind::Image)
            .iter()
            .map(|resource| resource.id().to_string())
            .collect();
        assert_eq!(ids, vec!["a.png", "b.png"]);
        assert!(document.enumerate(AssetKind::Audio).is_empty());
        assert_eq!(document.len(), 4);
    }

    #[test]
    fn finish_makes_the_element_usable() {
        let image = Element::image("a.png").with_size(320, 200);
        image.finish();
        assert_eq!(
            image.status(),
            ResourceStatus::Image {
                natural_size: Some((320, 200))
            }
        );

        let audio = Element::audio("theme.ogg", MediaReadyState::HaveNothing);
        audio.finish();
        assert_eq!(
            audio.status(),
            ResourceStatus::Media {
                ready_state: MediaReadyState::HaveEnoughData
            }
        );
    }

    #[test]
    fn fail_only_changes_font_status() {
        let image = Element::image("broken.png");
        image.fail();
        assert_eq!(image.status(), ResourceStatus::Image { natural_size: None });

        let font = Element::font("Inter", FontStatus::Loading);
        font.fail();
        assert_eq!(
            font.status(),
            ResourceStatus::Font {
                status: FontStatus::Error
            }
        );
    }

    #[tokio::test]
    async fn finish_notifies_success_listeners() {
        let document = Document::new();
        let video = document.insert(Element::video("clip.mp4", MediaReadyState::HaveNothing));
        let listener = video.listen(&[ResourceEvent::CanPlayThrough, ResourceEvent::Error]);

        video.finish();
        assert_eq!(listener.await, ResourceEvent::CanPlayThrough);
        assert_eq!(video.listener_count(), 0);
    }

    #[test]
    fn factory_reuses_declared_fonts_without_a_url() {
        let document = Document::new();
        document.insert(Element::font("Inter", FontStatus::Loaded));

        let reused = document.create(&LoadRequest::Font {
            family: "Inter".to_string(),
            url: None,
        });
        assert_eq!(
            reused.status(),
            ResourceStatus::Font {
                status: FontStatus::Loaded
            }
        );
        assert_eq!(document.len(), 1);

        let declared = document.create(&LoadRequest::Font {
            family: "Inter".to_string(),
            url: Some("/fonts/inter.woff2".to_string()),
        });
        assert_eq!(
            declared.status(),
            ResourceStatus::Font {
                status: FontStatus::Loading
            }
        );
        assert_eq!(document.len(), 2);
    }

    #[test]
    fn factory_creates_pending_elements() {
        let document = Document::new();
        let image = document.create(&LoadRequest::Image {
            url: "a.png".to_string(),
        });
        assert_eq!(image.kind(), AssetKind::Image);
        assert_eq!(image.status(), ResourceStatus::pending(AssetKind::Image));
        assert!(document.get(AssetKind::Image, "a.png").is_some());
    }
}
