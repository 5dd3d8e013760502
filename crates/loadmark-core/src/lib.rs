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

//! # Loadmark Core
//!
//! Foundational crate containing the contracts shared by every Loadmark layer:
//! asset kinds, the resource status model and its one-shot event listeners,
//! the injected [`ResourceSource`](resource::ResourceSource) capability,
//! counters and the derived progress snapshot, and configuration.

#![warn(missing_docs)]

pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod kind;
pub mod progress;
pub mod resource;
pub mod settlement;

pub use config::{ScanSelection, WatchConfig, DEFAULT_SETTLE_TIMEOUT};
pub use document::{Document, Element};
pub use error::{ConfigError, LoadError};
pub use kind::AssetKind;
pub use progress::{Counters, ProgressSnapshot, Tally};
pub use resource::{
    FontStatus, LoadRequest, MediaReadyState, Resource, ResourceEvent, ResourceFactory,
    ResourceSource, ResourceStatus,
};
pub use settlement::{Outcome, SettlePath, Settlement, SettlementEvent};
