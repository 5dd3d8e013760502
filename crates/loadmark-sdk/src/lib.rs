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

//! The public-facing API of Loadmark.
//!
//! Two entry points cover the two ways of tracking:
//!
//! - [`watch_assets`] scans a document once and tracks every image, video,
//!   audio element and font face it finds, minus what the configuration
//!   leaves out.
//! - [`asset_loader`] hands back a loader whose `load_*` calls each track one
//!   resource and return a future for its outcome.
//!
//! Both need a running tokio runtime.
//!
//! ```no_run
//! use loadmark_sdk::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let document = Arc::new(Document::new());
//! document.insert(Element::decoded_image("logo.png", 64, 64));
//!
//! let watcher = watch_assets(document, None);
//! let done = watcher.wait_complete().await;
//! println!("{done}");
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use loadmark_agents::{LoaderAgent, WatchAgent};
use loadmark_core::{ResourceFactory, ResourceSource, WatchConfig};

pub mod prelude {
    //! The types most callers need.
    pub use crate::{asset_loader, load_watch_config, watch_assets};
    pub use loadmark_agents::{LoaderAgent, PendingLoad, ProgressFeed, WatchAgent, WatchPhase};
    pub use loadmark_core::config::parse_kind_list;
    pub use loadmark_core::{
        AssetKind, Document, Element, FontStatus, LoadError, LoadRequest, MediaReadyState,
        Outcome, ProgressSnapshot, ScanSelection, SettlePath, Settlement, SettlementEvent,
        WatchConfig,
    };
}

/// Starts a passive watch over `source`.
///
/// Without a configuration every kind is scanned and the default settle
/// timeout applies. The returned agent is already mounted.
///
/// # Panics
/// Panics if called outside of a tokio runtime.
pub fn watch_assets(source: Arc<dyn ResourceSource>, config: Option<WatchConfig>) -> WatchAgent {
    let mut agent = WatchAgent::new(source, config.unwrap_or_default());
    agent.mount();
    agent
}

/// Creates an imperative loader backed by `factory`.
pub fn asset_loader(factory: Arc<dyn ResourceFactory>) -> LoaderAgent {
    LoaderAgent::new(factory)
}

/// Reads a watch configuration from a RON file.
pub fn load_watch_config(path: impl AsRef<Path>) -> Result<WatchConfig> {
    let path = path.as_ref();
    let config = WatchConfig::load(path)
        .with_context(|| format!("Failed to load watch configuration from {}", path.display()))?;
    log::info!("Loaded watch configuration from {}.", path.display());
    Ok(config)
}
