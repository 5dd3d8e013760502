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

//! The closed table of asset kinds Loadmark knows how to track.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A category of media resource whose readiness can be tracked.
///
/// The set is explicit: every supported kind is listed in [`AssetKind::ALL`],
/// and configuration refers to them by their plural names
/// (`images`, `videos`, `audios`, `fonts`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetKind {
    /// `<img>`-like elements.
    #[serde(rename = "images", alias = "image")]
    Image,
    /// `<video>`-like elements.
    #[serde(rename = "videos", alias = "video")]
    Video,
    /// `<audio>`-like elements.
    #[serde(rename = "audios", alias = "audio")]
    Audio,
    /// Entries of the document's font-face registry.
    #[serde(rename = "fonts", alias = "font")]
    Font,
}

impl AssetKind {
    /// Every supported kind, in scan order.
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Image,
        AssetKind::Video,
        AssetKind::Audio,
        AssetKind::Font,
    ];

    /// The configuration name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Image => "images",
            AssetKind::Video => "videos",
            AssetKind::Audio => "audios",
            AssetKind::Font => "fonts",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "images" | "image" => Ok(AssetKind::Image),
            "videos" | "video" => Ok(AssetKind::Video),
            "audios" | "audio" => Ok(AssetKind::Audio),
            "fonts" | "font" => Ok(AssetKind::Font),
            other => Err(ConfigError::UnknownKind(other.to_string())),
        }
    }
}
