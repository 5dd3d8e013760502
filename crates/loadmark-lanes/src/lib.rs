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

//! # Loadmark Lanes
//!
//! Hot-path pipelines that turn a single resource into a terminal
//! [`Settlement`](loadmark_core::Settlement).
//!
//! The [`SettlementLane`] runs one generic routine for every kind. What
//! differs between kinds lives in a [`SettlementProfile`]: a fast-path
//! predicate and the success/failure event pair to listen for.

#![warn(missing_docs)]

pub mod settlement_lane;

pub use settlement_lane::{
    profile_for, ArmedSettlement, FastPath, SettlementLane, SettlementProfile, SETTLEMENT_PROFILES,
};
