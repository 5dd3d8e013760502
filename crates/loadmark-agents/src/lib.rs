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

//! # Loadmark Agents
//!
//! Agents own a tracking session: they feed resources to the
//! [`SettlementLane`](loadmark_lanes::SettlementLane), count the outcomes
//! through a [`CounterAggregator`], and expose the resulting progress.
//!
//! - [`WatchAgent`]: passive mode. Scans a document once and tracks every
//!   resource of the configured kinds.
//! - [`LoaderAgent`]: imperative mode. Tracks the resources the caller asks
//!   for, one `load_*` call at a time, and can be reset.
//!
//! Both spawn their trackers on the ambient tokio runtime.

#![warn(missing_docs)]

pub mod aggregator;
pub mod loader_agent;
pub mod watch_agent;

pub use aggregator::{CounterAggregator, ProgressFeed, Ticket};
pub use loader_agent::{LoaderAgent, PendingLoad};
pub use watch_agent::{WatchAgent, WatchPhase};
