//! fathom-run: headless sonar scenario runner.
//!
//! Usage:
//!   fathom-run scenario.json
//!   fathom-run scenario.json --output final.json --demon
//!
//! The runner plays the kinematics host: it dead-reckons targets, applies
//! maneuver orders, feeds the sonar engine every tick, and optionally
//! drives the DEMON analyzer with a synthetic blade-rate signal for the
//! selected target. The final snapshot is written as JSON.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use fathom_core::commands::SonarCommand;
use fathom_core::enums::{AnalysisSource, TrackState};
use fathom_core::events::{ManeuverOrder, SonarEvent};
use fathom_core::state::SonarSnapshot;
use fathom_core::target::{Target, TargetId};
use fathom_core::types::OwnShipPose;
use fathom_demon::{BladeRateSignal, DemonConfig, DemonEngine, DemonReadout};
use fathom_sim::{SimConfig, SonarEngine};
use fathom_behavior::get_profile;
use fathom_terrain::{FlatSeabed, HeightGrid};

/// Hold time of the ping transient on the DEMON composite bus (s).
const PING_TRANSIENT_SECS: f64 = 1.2;

#[derive(Debug, Error)]
enum ScenarioError {
    #[error("scenario has no targets")]
    NoTargets,
    #[error("duplicate target id {0:?}")]
    DuplicateTarget(TargetId),
    #[error("duration must be positive and finite, got {0}")]
    BadDuration(f64),
    #[error("tick length must be positive and finite, got {0}")]
    BadTick(f64),
    #[error("bathymetry grid has {got} heights, header describes {expected}")]
    BadGrid { expected: usize, got: usize },
}

/// A command injected at a scenario time.
#[derive(Debug, Clone, Deserialize)]
struct TimedCommand {
    at: f64,
    #[serde(flatten)]
    command: SonarCommand,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    config: SimConfig,
    /// DEMON settings; the analyzer also runs when `--demon` is passed.
    #[serde(default)]
    demon: Option<DemonConfig>,
    #[serde(default)]
    own_ship: OwnShipPose,
    /// Gridded bathymetry. Takes precedence over `seabed_depth`.
    #[serde(default)]
    terrain: Option<HeightGrid>,
    /// Flat seabed depth (m). No terrain when neither is given.
    #[serde(default)]
    seabed_depth: Option<f64>,
    duration_secs: f64,
    targets: Vec<Target>,
    #[serde(default)]
    commands: Vec<TimedCommand>,
}

impl Scenario {
    fn validate(&self) -> Result<(), ScenarioError> {
        if self.targets.is_empty() {
            return Err(ScenarioError::NoTargets);
        }
        let mut seen = HashSet::new();
        for t in &self.targets {
            if !seen.insert(t.id.as_str()) {
                return Err(ScenarioError::DuplicateTarget(t.id.clone()));
            }
        }
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(ScenarioError::BadDuration(self.duration_secs));
        }
        let tick = self.config.tick_secs;
        if !(tick.is_finite() && tick > 0.0) {
            return Err(ScenarioError::BadTick(tick));
        }
        if let Some(grid) = &self.terrain {
            if !grid.is_consistent() {
                return Err(ScenarioError::BadGrid {
                    expected: grid.expected_len(),
                    got: grid.heights.len(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RunReport {
    snapshot: SonarSnapshot,
    targets: Vec<Target>,
    demon: Option<DemonReadout>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || matches!(args[1].as_str(), "help" | "--help" | "-h") {
        print_usage();
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let scenario_path = PathBuf::from(&args[1]);
    let output = parse_flag_value(&args[2..], "--output").map(PathBuf::from);
    let force_demon = args[2..].iter().any(|a| a == "--demon");

    if let Err(e) = run(&scenario_path, output.as_deref(), force_demon) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!(
        "fathom-run: FATHOM headless sonar scenario runner\n\
         \n\
         Usage: fathom-run <scenario.json> [options]\n\
         \n\
           --output <path>  Write the final report here instead of stdout\n\
           --demon          Run the DEMON analyzer with default settings\n\
         \n\
         Logging is controlled with RUST_LOG (default: info).\n"
    );
}

fn parse_flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&text)
        .with_context(|| format!("parsing scenario {}", path.display()))?;
    scenario.validate()?;
    Ok(scenario)
}

fn run(path: &Path, output: Option<&Path>, force_demon: bool) -> Result<()> {
    let mut scenario = load_scenario(path)?;
    let tick_secs = scenario.config.tick_secs;
    let ticks = (scenario.duration_secs / tick_secs).ceil() as u64;
    info!(
        targets = scenario.targets.len(),
        ticks,
        ocean = ?scenario.config.ocean,
        "scenario loaded"
    );

    let mut engine = SonarEngine::new(scenario.config.clone());
    match (scenario.terrain.take(), scenario.seabed_depth) {
        (Some(grid), _) => {
            info!(
                width = grid.header.width,
                height = grid.header.height,
                peak = grid.max_height(),
                "bathymetry grid loaded"
            );
            engine.set_terrain(Some(Box::new(grid)));
        }
        (None, Some(depth)) => engine.set_terrain(Some(Box::new(FlatSeabed { depth }))),
        (None, None) => {}
    }

    let demon_config = match scenario.demon.take() {
        Some(cfg) => Some(cfg),
        None if force_demon => Some(DemonConfig::default()),
        None => None,
    };
    let mut demon = demon_config.map(DemonHost::new);

    scenario.commands.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut pending = scenario.commands.into_iter().peekable();
    let mut targets = scenario.targets;
    let own_ship = scenario.own_ship;

    let mut last = None;
    for tick in 0..ticks {
        let now = tick as f64 * tick_secs;
        while let Some(cmd) = pending.next_if(|c| c.at <= now) {
            debug!(at = cmd.at, command = ?cmd.command, "injecting command");
            engine.queue_command(cmd.command);
        }

        let snapshot = engine.tick(&targets, own_ship);
        for (target, result) in targets.iter_mut().zip(&snapshot.detections) {
            target.apply_detection(result);
        }
        for event in &snapshot.events {
            if let SonarEvent::Maneuver(order) = event {
                apply_maneuver(&mut targets, order);
            }
        }
        if let Some(host) = demon.as_mut() {
            host.step(&snapshot, &targets, tick_secs);
        }
        dead_reckon(&mut targets, tick_secs);

        if tick % (1.0 / tick_secs).round().max(1.0) as u64 == 0 {
            let tracked = snapshot
                .detections
                .iter()
                .filter(|d| d.track_state == TrackState::Tracked)
                .count();
            debug!(time = snapshot.time.elapsed_secs, tracked, contacts = snapshot.contacts.len(), "tick");
        }
        last = Some(snapshot);
    }

    let Some(snapshot) = last else {
        return Ok(());
    };
    info!(
        contacts = snapshot.contacts.len(),
        time = snapshot.time.elapsed_secs,
        "scenario complete"
    );

    let report = RunReport {
        snapshot,
        targets,
        demon: demon.map(|h| h.engine.readout()),
    };
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

/// Apply a reaction (or its reversion) to the matching target.
fn apply_maneuver(targets: &mut [Target], order: &ManeuverOrder) {
    if let Some(t) = targets.iter_mut().find(|t| t.id == order.target_id) {
        info!(target_id = %t.id, reaction = ?order.reaction, course = order.course, speed = order.speed, "maneuver");
        t.course = order.course;
        t.speed = order.speed;
    }
}

/// Straight-line motion: course 0 is north (+z), clockwise.
fn dead_reckon(targets: &mut [Target], dt: f64) {
    for t in targets {
        let rad = t.course.to_radians();
        t.position.x += t.speed * rad.sin() * dt;
        t.position.z += t.speed * rad.cos() * dt;
    }
}

/// Feeds the DEMON analyzer with synthetic audio for the selected target.
struct DemonHost {
    engine: DemonEngine,
    signal: Option<(TargetId, BladeRateSignal)>,
    seed: u64,
}

impl DemonHost {
    fn new(config: DemonConfig) -> Self {
        let mut engine = DemonEngine::new(config);
        engine.set_source(AnalysisSource::Selected);
        Self {
            engine,
            signal: None,
            seed: 1,
        }
    }

    fn step(&mut self, snapshot: &SonarSnapshot, targets: &[Target], dt: f64) {
        let now = snapshot.time.elapsed_secs;
        if snapshot
            .events
            .iter()
            .any(|e| matches!(e, SonarEvent::PingStarted { .. }))
        {
            self.engine.begin_ping_transient(now, PING_TRANSIENT_SECS);
        }

        let selected = snapshot.selected_target.clone();
        if self.signal.as_ref().map(|(id, _)| id) != selected.as_ref() {
            self.engine.select_target(selected.clone());
            self.signal = selected.and_then(|id| {
                let target = targets.iter().find(|t| t.id == id)?;
                self.seed += 1;
                let rate = self.engine.config().effective_sample_rate();
                let bpf = get_profile(target.kind).blade_passing_hz(target.rpm, target.blade_count);
                Some((id, BladeRateSignal::new(rate, bpf, self.seed)))
            });
        }

        let Some((id, signal)) = self.signal.as_mut() else {
            return;
        };
        let audible = targets
            .iter()
            .any(|t| t.id == *id && t.track_state == TrackState::Tracked);
        let n = (self.engine.config().effective_sample_rate() * dt).round() as usize;
        let samples = if audible {
            signal.generate(n)
        } else {
            vec![0.0; n]
        };
        self.engine.update(&samples, now);
    }
}
