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

// Loadmark Sandbox
// Plays a simulated document through the trackers and reports the progress.

mod scenario;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use loadmark_sdk::prelude::*;

use scenario::{drive, populate, request, Fate, Scenario};

#[derive(Parser, Debug)]
#[command(name = "sandbox", version)]
#[command(about = "Tracks the loading progress of a simulated document")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Print the final snapshot as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the document once and track everything in it
    Watch(WatchArgs),
    /// Request resources one at a time through the imperative loader
    Load(LoadArgs),
}

#[derive(Args, Debug)]
struct Simulation {
    /// Every Nth resource fails (0 disables)
    #[arg(long, default_value_t = 0)]
    fail_every: u32,
    /// Every Nth resource never fires an event (0 disables)
    #[arg(long, default_value_t = 0)]
    stall_every: u32,
    /// Every Nth resource is usable from the start (0 disables)
    #[arg(long, default_value_t = 4)]
    cache_every: u32,
    /// Upper bound of the simulated latencies
    #[arg(long, default_value_t = 1500)]
    max_latency_ms: u64,
    /// Seed of the simulated latencies
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Settle timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Simulation {
    fn scenario(&self, counts: impl IntoIterator<Item = (AssetKind, u32)>) -> Scenario {
        Scenario {
            counts: counts.into_iter().collect::<BTreeMap<_, _>>(),
            fail_every: self.fail_every,
            stall_every: self.stall_every,
            cache_every: self.cache_every,
            max_latency: Duration::from_millis(self.max_latency_ms),
            seed: self.seed,
        }
    }
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long, default_value_t = 6)]
    images: u32,
    #[arg(long, default_value_t = 2)]
    videos: u32,
    #[arg(long, default_value_t = 1)]
    audios: u32,
    #[arg(long, default_value_t = 2)]
    fonts: u32,
    /// Comma-separated kinds to scan, e.g. "images,videos"
    #[arg(long)]
    scan: Option<String>,
    /// Comma-separated kinds to leave out
    #[arg(long)]
    ignore: Option<String>,
    /// RON watch configuration; the flags above override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    simulation: Simulation,
}

#[derive(Args, Debug)]
struct LoadArgs {
    #[arg(long, default_value_t = 4)]
    images: u32,
    #[arg(long, default_value_t = 1)]
    videos: u32,
    #[arg(long, default_value_t = 2)]
    fonts: u32,
    /// Reset the counters right before the Nth request (zero-based)
    #[arg(long)]
    reset_before: Option<usize>,
    #[command(flatten)]
    simulation: Simulation,
}

async fn run_watch(args: WatchArgs) -> Result<ProgressSnapshot> {
    let mut config = match &args.config {
        Some(path) => load_watch_config(path)?,
        None => WatchConfig::default(),
    };
    if let Some(scan) = &args.scan {
        config.scan = ScanSelection::Kinds(parse_kind_list(scan)?);
    }
    if let Some(ignore) = &args.ignore {
        config.ignore = parse_kind_list(ignore)?;
    }
    if let Some(ms) = args.simulation.timeout_ms {
        config.settle_timeout = Duration::from_millis(ms);
    }

    let plan = args
        .simulation
        .scenario([
            (AssetKind::Image, args.images),
            (AssetKind::Video, args.videos),
            (AssetKind::Audio, args.audios),
            (AssetKind::Font, args.fonts),
        ])
        .plan();
    let document = Arc::new(Document::new());
    let elements = populate(&document, &plan);
    log::info!("Simulated document holds {} resource(s).", document.len());

    let watcher = watch_assets(document, Some(config));
    for (element, fate) in elements {
        drive(element, fate);
    }

    let snapshot = follow(watcher.progress_feed()).await;
    report(watcher.settlements().try_iter());
    Ok(snapshot)
}

async fn run_load(args: LoadArgs) -> Result<ProgressSnapshot> {
    let plan = args
        .simulation
        .scenario([
            (AssetKind::Image, args.images),
            (AssetKind::Video, args.videos),
            (AssetKind::Font, args.fonts),
        ])
        .plan();
    let document = Arc::new(Document::new());
    let mut loader = asset_loader(document.clone());
    if let Some(ms) = args.simulation.timeout_ms {
        loader = loader.with_settle_timeout(Duration::from_millis(ms));
    }

    let mut pending = Vec::with_capacity(plan.len());
    for (index, planned) in plan.iter().enumerate() {
        if args.reset_before == Some(index) {
            loader.reset();
        }
        let Some(load_request) = request(&document, planned) else {
            log::warn!("No imperative loader for {} '{}'; skipped.", planned.kind, planned.id);
            continue;
        };
        pending.push(loader.load(load_request));

        let element = document
            .get(planned.kind, &planned.id)
            .with_context(|| format!("{} '{}' was not created", planned.kind, planned.id))?;
        // Image and media requests always start out pending.
        let fate = match (planned.kind, planned.fate) {
            (AssetKind::Font, fate) => fate,
            (_, Fate::Cached) => Fate::Loads(Duration::ZERO),
            (_, fate) => fate,
        };
        drive(element, fate);
    }

    for load in pending {
        match load.await {
            Ok(settlement) => log::debug!("'{}' resolved after {:?}.", settlement.id, settlement.elapsed),
            Err(error) => log::warn!("{error}"),
        }
    }

    report(loader.drain_settlements());
    Ok(loader.snapshot())
}

/// Logs every progress change until the session completes.
async fn follow(mut feed: ProgressFeed) -> ProgressSnapshot {
    let mut last = feed.current();
    log::info!("Progress: {last}");
    while last.total_count > 0 && !last.is_complete {
        match feed.changed().await {
            Some(snapshot) => {
                log::info!("Progress: {snapshot}");
                last = snapshot;
            }
            None => break,
        }
    }
    last
}

fn report(settlements: impl IntoIterator<Item = SettlementEvent>) {
    for event in settlements {
        let settlement = event.settlement;
        log::info!(
            "{:<6} {:<20} {:<6} via {:?} after {:?}",
            settlement.kind.name(),
            settlement.id,
            settlement.outcome.to_string(),
            settlement.path,
            settlement.elapsed
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let snapshot = match cli.command {
        Command::Watch(args) => run_watch(args).await?,
        Command::Load(args) => run_load(args).await?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{snapshot}");
    }
    Ok(())
}
