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

//! Per-kind parameters of the settlement routine.

use loadmark_core::{
    AssetKind, FontStatus, MediaReadyState, Outcome, ResourceEvent, ResourceStatus,
};

/// Decides from a status alone whether a resource is already settled.
///
/// `None` means the resource is still pending and must be listened to.
pub type FastPath = fn(&ResourceStatus) -> Option<Outcome>;

/// What the settlement routine needs to know about one asset kind.
#[derive(Debug, Clone, Copy)]
pub struct SettlementProfile {
    /// The kind this profile applies to.
    pub kind: AssetKind,
    /// Event that settles the resource as loaded.
    pub success: ResourceEvent,
    /// Event that settles the resource as failed.
    pub failure: ResourceEvent,
    /// Immediate settlement check run when the resource is armed.
    pub fast_path: FastPath,
}

/// The settlement table, one row per entry of [`AssetKind::ALL`].
pub static SETTLEMENT_PROFILES: [SettlementProfile; 4] = [
    SettlementProfile {
        kind: AssetKind::Image,
        success: ResourceEvent::Load,
        failure: ResourceEvent::Error,
        fast_path: image_fast_path,
    },
    SettlementProfile {
        kind: AssetKind::Video,
        success: ResourceEvent::CanPlayThrough,
        failure: ResourceEvent::Error,
        fast_path: media_fast_path,
    },
    SettlementProfile {
        kind: AssetKind::Audio,
        success: ResourceEvent::CanPlayThrough,
        failure: ResourceEvent::Error,
        fast_path: media_fast_path,
    },
    SettlementProfile {
        kind: AssetKind::Font,
        success: ResourceEvent::Load,
        failure: ResourceEvent::Error,
        fast_path: font_fast_path,
    },
];

/// Looks up the settlement profile of `kind`.
pub fn profile_for(kind: AssetKind) -> &'static SettlementProfile {
    match kind {
        AssetKind::Image => &SETTLEMENT_PROFILES[0],
        AssetKind::Video => &SETTLEMENT_PROFILES[1],
        AssetKind::Audio => &SETTLEMENT_PROFILES[2],
        AssetKind::Font => &SETTLEMENT_PROFILES[3],
    }
}

/// Decoded images report their natural dimensions.
fn image_fast_path(status: &ResourceStatus) -> Option<Outcome> {
    match status {
        ResourceStatus::Image {
            natural_size: Some((width, height)),
        } if *width > 0 && *height > 0 => Some(Outcome::Loaded),
        _ => None,
    }
}

fn media_fast_path(status: &ResourceStatus) -> Option<Outcome> {
    match status {
        ResourceStatus::Media {
            ready_state: MediaReadyState::HaveEnoughData,
        } => Some(Outcome::Loaded),
        _ => None,
    }
}

/// Unloaded faces are declared but unused: available at no download cost.
fn font_fast_path(status: &ResourceStatus) -> Option<Outcome> {
    match status {
        ResourceStatus::Font { status } => match status {
            FontStatus::Loaded | FontStatus::Unloaded => Some(Outcome::Loaded),
            FontStatus::Error => Some(Outcome::Failed),
            FontStatus::Loading => None,
        },
        _ => None,
    }
}
