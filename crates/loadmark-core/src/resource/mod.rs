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

//! The resource model and the capabilities used to discover and create resources.
//!
//! Loadmark never talks to a rendering environment directly. Everything it
//! needs is expressed through three seams:
//!
//! - [`Resource`]: one trackable entity exposing its current [`ResourceStatus`]
//!   and a one-shot [`Listener`] for its [`ResourceEvent`]s.
//! - [`ResourceSource`]: enumerates the resources of a kind present in a document.
//! - [`ResourceFactory`]: creates a resource on demand for an imperative load.
//!
//! The in-memory [`Document`](crate::Document) implements both capabilities.

mod listener;

pub use listener::{EventTarget, Listener};

use crate::kind::AssetKind;
use std::fmt;
use std::sync::Arc;

/// Buffering level of a media element, mirroring `HTMLMediaElement.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MediaReadyState {
    /// No information about the media is available.
    #[default]
    HaveNothing,
    /// Duration and dimensions are known.
    HaveMetadata,
    /// Data for the current playback position is available.
    HaveCurrentData,
    /// Enough data to advance playback a little.
    HaveFutureData,
    /// Enough data to play through to the end without stalling.
    HaveEnoughData,
}

/// Status of an entry of the font-face registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStatus {
    /// Declared but not in use; nothing has been downloaded.
    #[default]
    Unloaded,
    /// A download is in progress.
    Loading,
    /// The face is ready to render.
    Loaded,
    /// The face failed to load.
    Error,
}

/// Point-in-time status of a resource, inspected by the settlement fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    /// An image. `natural_size` is present once the image has decoded.
    Image {
        /// Intrinsic `(width, height)` of the decoded image.
        natural_size: Option<(u32, u32)>,
    },
    /// A video or audio element.
    Media {
        /// Current buffering level.
        ready_state: MediaReadyState,
    },
    /// A font face.
    Font {
        /// Current registry status.
        status: FontStatus,
    },
}

impl ResourceStatus {
    /// The initial, not-yet-usable status for a resource of `kind`.
    pub fn pending(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Image => ResourceStatus::Image { natural_size: None },
            AssetKind::Video | AssetKind::Audio => ResourceStatus::Media {
                ready_state: MediaReadyState::HaveNothing,
            },
            AssetKind::Font => ResourceStatus::Font {
                status: FontStatus::Loading,
            },
        }
    }
}

/// An event a resource can fire while it loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceEvent {
    /// The resource finished loading (images, fonts).
    Load,
    /// Enough media data is buffered to play through (video, audio).
    CanPlayThrough,
    /// The resource failed to load or decode.
    Error,
}

impl fmt::Display for ResourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceEvent::Load => write!(f, "load"),
            ResourceEvent::CanPlayThrough => write!(f, "canplaythrough"),
            ResourceEvent::Error => write!(f, "error"),
        }
    }
}

/// A single trackable resource.
pub trait Resource: Send + Sync + fmt::Debug {
    /// A stable identifier: the source URL for elements, the family for fonts.
    fn id(&self) -> &str;

    /// The kind of the resource.
    fn kind(&self) -> AssetKind;

    /// The current status.
    fn status(&self) -> ResourceStatus;

    /// Registers a one-shot listener resolving to the first of `events` to fire.
    ///
    /// The listener is removed after it fires once. Dropping the returned
    /// [`Listener`] removes it as well.
    ///
    /// ## Arguments
    /// * `events` - The events that resolve the listener.
    ///
    /// ## Returns
    /// A [`Listener`] resolving to the event that fired first.
    fn listen(&self, events: &[ResourceEvent]) -> Listener;
}

/// Discovers the resources present in a document.
pub trait ResourceSource: Send + Sync {
    /// Lists the candidate resources of `kind`. An empty list is valid.
    ///
    /// ## Arguments
    /// * `kind` - The kind to enumerate.
    ///
    /// ## Returns
    /// The resources of `kind` in document order.
    fn enumerate(&self, kind: AssetKind) -> Vec<Arc<dyn Resource>>;
}

/// A request for a resource created on demand by an imperative load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoadRequest {
    /// Load an image from a URL.
    Image {
        /// Source URL.
        url: String,
    },
    /// Load a video from a URL.
    Video {
        /// Source URL.
        url: String,
    },
    /// Load a font family, optionally declaring it from a URL first.
    Font {
        /// Font family name.
        family: String,
        /// Source URL when the face is not declared yet.
        url: Option<String>,
    },
}

impl LoadRequest {
    /// The kind of resource this request creates.
    pub fn kind(&self) -> AssetKind {
        match self {
            LoadRequest::Image { .. } => AssetKind::Image,
            LoadRequest::Video { .. } => AssetKind::Video,
            LoadRequest::Font { .. } => AssetKind::Font,
        }
    }

    /// The identifier the created resource will carry.
    pub fn id(&self) -> &str {
        match self {
            LoadRequest::Image { url } | LoadRequest::Video { url } => url,
            LoadRequest::Font { family, .. } => family,
        }
    }
}

/// Creates resources for imperative loads.
pub trait ResourceFactory: Send + Sync {
    /// Creates (or looks up) the resource described by `request` and starts
    /// loading it.
    ///
    /// ## Arguments
    /// * `request` - What to load.
    ///
    /// ## Returns
    /// The resource to track. Its status may already be settled.
    fn create(&self, request: &LoadRequest) -> Arc<dyn Resource>;
}
