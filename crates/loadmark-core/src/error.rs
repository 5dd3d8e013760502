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

//! Error types surfaced by Loadmark.
//!
//! Resource failures never escape the passive watcher: they are absorbed into
//! the `failed` counter. [`LoadError`] only reaches callers through the
//! deferred signal returned by an imperative load.

use crate::kind::AssetKind;
use std::path::PathBuf;
use thiserror::Error;

/// Why an imperatively requested resource did not become usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The resource failed to load, failed to decode, or did not settle
    /// before the timeout. The causes are not distinguished.
    #[error("{kind} resource '{id}' did not become usable")]
    Failed {
        /// Kind of the resource.
        kind: AssetKind,
        /// Identifier (URL or font family) of the resource.
        id: String,
    },
    /// The tracker was torn down before the resource settled.
    #[error("tracking of {kind} resource '{id}' was abandoned before it settled")]
    Abandoned {
        /// Kind of the resource.
        kind: AssetKind,
        /// Identifier (URL or font family) of the resource.
        id: String,
    },
}

/// An error raised while building a [`WatchConfig`](crate::WatchConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A kind name did not match any entry of the kind table.
    #[error("unknown asset kind '{0}' (expected one of: images, videos, audios, fonts)")]
    UnknownKind(String),
    /// The configuration text is not valid RON for a `WatchConfig`.
    #[error("invalid watch configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    Io {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_messages_name_the_resource() {
        let err = LoadError::Failed {
            kind: AssetKind::Image,
            id: "hero.png".to_string(),
        };
        assert_eq!(err.to_string(), "images resource 'hero.png' did not become usable");

        let err = LoadError::Abandoned {
            kind: AssetKind::Font,
            id: "Inter".to_string(),
        };
        assert!(err.to_string().contains("abandoned"));
    }
}
