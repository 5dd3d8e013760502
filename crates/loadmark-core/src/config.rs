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

//! Configuration of the passive watcher.
//!
//! A kind is tracked iff it is selected by [`WatchConfig::scan`] and absent
//! from [`WatchConfig::ignore`]. Configurations can be built in code or read
//! from RON:
//!
//! ```
//! use loadmark_core::{AssetKind, WatchConfig};
//!
//! let config = WatchConfig::from_ron_str(
//!     "(scan: Kinds([images, videos]), ignore: [videos], settle_timeout_ms: 2500)",
//! )
//! .unwrap();
//! assert_eq!(config.tracked_kinds(), vec![AssetKind::Image]);
//! ```

use crate::error::ConfigError;
use crate::kind::AssetKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

/// How long a resource may stay pending before it is settled as failed.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(7);

/// Which kinds a scan selects before `ignore` is applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanSelection {
    /// Every kind of the kind table.
    #[default]
    All,
    /// Only the listed kinds.
    Kinds(BTreeSet<AssetKind>),
}

impl ScanSelection {
    /// Returns `true` if `kind` is selected.
    pub fn selects(&self, kind: AssetKind) -> bool {
        match self {
            ScanSelection::All => true,
            ScanSelection::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

/// Configuration of a passive watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Kinds selected for scanning.
    pub scan: ScanSelection,
    /// Kinds removed from the selection after `scan` is applied.
    pub ignore: BTreeSet<AssetKind>,
    /// Time after which a pending resource settles as failed.
    #[serde(rename = "settle_timeout_ms", with = "duration_millis")]
    pub settle_timeout: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            scan: ScanSelection::All,
            ignore: BTreeSet::new(),
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
        }
    }
}

impl WatchConfig {
    /// Restricts the scan to the given kinds.
    ///
    /// ## Arguments
    /// * `kinds` - The kinds to select, replacing any earlier selection.
    pub fn with_scan(mut self, kinds: impl IntoIterator<Item = AssetKind>) -> Self {
        self.scan = ScanSelection::Kinds(kinds.into_iter().collect());
        self
    }

    /// Adds kinds to the ignore set.
    pub fn with_ignore(mut self, kinds: impl IntoIterator<Item = AssetKind>) -> Self {
        self.ignore.extend(kinds);
        self
    }

    /// Overrides the settle timeout.
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Returns `true` if `kind` is selected by `scan` and not ignored.
    pub fn is_tracked(&self, kind: AssetKind) -> bool {
        self.scan.selects(kind) && !self.ignore.contains(&kind)
    }

    /// The tracked kinds, in the order of [`AssetKind::ALL`].
    pub fn tracked_kinds(&self) -> Vec<AssetKind> {
        AssetKind::ALL
            .into_iter()
            .filter(|kind| self.is_tracked(*kind))
            .collect()
    }

    /// Parses a configuration from RON text. Missing fields take their defaults.
    ///
    /// ## Arguments
    /// * `text` - A RON struct such as `(scan: Kinds([images]), ignore: [fonts])`.
    ///
    /// ## Returns
    /// The parsed configuration, or [`ConfigError::Parse`] with the failing span.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads and parses a RON configuration file.
    ///
    /// ## Arguments
    /// * `path` - Location of the `.ron` file.
    ///
    /// ## Returns
    /// The parsed configuration, [`ConfigError::Io`] if the file cannot be read,
    /// or [`ConfigError::Parse`] if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        log::debug!(
            "Loaded watch configuration from '{}': {:?}",
            path.display(),
            config.tracked_kinds()
        );
        Ok(config)
    }
}

/// Parses a comma-separated list of kind names (`"images, fonts"`).
///
/// Empty entries are skipped, so an empty string yields an empty set.
///
/// ## Returns
/// The named kinds, or [`ConfigError::UnknownKind`] for the first unknown name.
pub fn parse_kind_list(list: &str) -> Result<BTreeSet<AssetKind>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::parse)
        .collect()
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_tracks_every_kind() {
        let config = WatchConfig::default();
        assert_eq!(config.tracked_kinds(), AssetKind::ALL.to_vec());
        assert_eq!(config.settle_timeout, DEFAULT_SETTLE_TIMEOUT);
    }

    #[test]
    fn ignore_applies_after_scan() {
        let config = WatchConfig::default()
            .with_scan([AssetKind::Image])
            .with_ignore([AssetKind::Image]);
        assert!(config.tracked_kinds().is_empty());

        let config = WatchConfig::default().with_ignore([AssetKind::Font, AssetKind::Audio]);
        assert_eq!(
            config.tracked_kinds(),
            vec![AssetKind::Image, AssetKind::Video]
        );
    }

    #[test]
    fn ignoring_an_unscanned_kind_is_harmless() {
        let config = WatchConfig::default()
            .with_scan([AssetKind::Video])
            .with_ignore([AssetKind::Image]);
        assert_eq!(config.tracked_kinds(), vec![AssetKind::Video]);
    }

    #[test]
    fn ron_fields_default_when_missing() {
        let config = WatchConfig::from_ron_str("(ignore: [fonts])").unwrap();
        assert_eq!(config.scan, ScanSelection::All);
        assert_eq!(config.settle_timeout, DEFAULT_SETTLE_TIMEOUT);
        assert!(!config.is_tracked(AssetKind::Font));
    }

    #[test]
    fn ron_rejects_unknown_kinds() {
        let result = WatchConfig::from_ron_str("(scan: Kinds([stylesheets]))");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_reads_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.ron");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "(scan: Kinds([images, fonts]), settle_timeout_ms: 1500)").unwrap();

        let config = WatchConfig::load(&path).unwrap();
        assert_eq!(
            config.tracked_kinds(),
            vec![AssetKind::Image, AssetKind::Font]
        );
        assert_eq!(config.settle_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn load_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ron");
        match WatchConfig::load(&path) {
            Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[test]
    fn kind_lists_parse_with_whitespace_and_empties() {
        let kinds = parse_kind_list(" images, ,fonts ").unwrap();
        assert_eq!(
            kinds.into_iter().collect::<Vec<_>>(),
            vec![AssetKind::Image, AssetKind::Font]
        );
        assert!(parse_kind_list("").unwrap().is_empty());
        assert!(parse_kind_list("images,scripts").is_err());
    }
}
