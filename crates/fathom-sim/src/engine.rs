//! Sonar engine: the per-tick entry point of the simulation core.
//!
//! `SonarEngine` owns the detection engine and the contact registry,
//! processes operator commands at tick boundaries, and produces a
//! `SonarSnapshot` for the host. Headless; the host supplies target
//! kinematics and own-ship pose every tick.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fathom_core::commands::SonarCommand;
use fathom_core::constants::TICK_SECS;
use fathom_core::contact::{Contact, ManualSolution};
use fathom_core::enums::{ContactFilter, ContactSort, OceanPreset};
use fathom_core::events::SonarEvent;
use fathom_core::state::SonarSnapshot;
use fathom_core::target::{Target, TargetId};
use fathom_core::types::{OwnShipPose, SimTime};
use fathom_terrain::TerrainOracle;

use crate::contacts::{ContactRegistry, ManualSolutionError, RegistryConfig, RelabelError};
use crate::detection::{DetectionConfig, DetectionEngine, TickInputs};
use crate::environment::{OceanEnvironment, OceanProfile};

/// Configuration for a sonar simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds per tick.
    pub tick_secs: f64,
    /// Ocean preset, used when no custom profile is given.
    pub ocean: OceanPreset,
    /// Custom ocean profile overriding the preset.
    pub ocean_profile: Option<OceanProfile>,
    pub detection: DetectionConfig,
    pub registry: RegistryConfig,
    /// Target selected for focused classification at start.
    pub selected_target: Option<TargetId>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_secs: TICK_SECS,
            ocean: OceanPreset::default(),
            ocean_profile: None,
            detection: DetectionConfig::default(),
            registry: RegistryConfig::default(),
            selected_target: None,
        }
    }
}

impl SimConfig {
    fn environment(&self) -> OceanEnvironment {
        match &self.ocean_profile {
            Some(profile) => OceanEnvironment::new(profile.clone()),
            None => OceanEnvironment::from_preset(self.ocean),
        }
    }
}

/// The sonar simulation core.
pub struct SonarEngine {
    time: SimTime,
    tick_secs: f64,
    own_ship: OwnShipPose,
    detection: DetectionEngine,
    registry: ContactRegistry,
    terrain: Option<Box<dyn TerrainOracle>>,
    command_queue: VecDeque<SonarCommand>,
    events: Vec<SonarEvent>,
}

impl SonarEngine {
    pub fn new(config: SimConfig) -> Self {
        let tick_secs = if config.tick_secs.is_finite() && config.tick_secs > 0.0 {
            config.tick_secs
        } else {
            TICK_SECS
        };
        let mut detection = DetectionEngine::new(config.detection.clone(), config.environment());
        detection.select_target(config.selected_target.clone());
        Self {
            time: SimTime::default(),
            tick_secs,
            own_ship: OwnShipPose::default(),
            detection,
            registry: ContactRegistry::new(config.registry),
            terrain: None,
            command_queue: VecDeque::new(),
            events: Vec::new(),
        }
    }

    /// Attach a terrain oracle for depth clamping and line-of-sight.
    pub fn with_terrain(mut self, terrain: impl TerrainOracle + 'static) -> Self {
        self.terrain = Some(Box::new(terrain));
        self
    }

    pub fn set_terrain(&mut self, terrain: Option<Box<dyn TerrainOracle>>) {
        self.terrain = terrain;
    }

    /// Queue an operator command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: SonarCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = SonarCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance one tick against the host's current targets and own-ship pose.
    pub fn tick(&mut self, targets: &[Target], own_ship: OwnShipPose) -> SonarSnapshot {
        self.own_ship = own_ship;
        self.process_commands();
        self.time.advance(self.tick_secs);
        let now = self.time.elapsed_secs;

        let detections = self.detection.update(
            targets,
            TickInputs {
                own_ship: &self.own_ship,
                now,
                dt: self.tick_secs,
                terrain: self.terrain.as_deref(),
            },
            &mut self.events,
        );
        self.registry.update(&detections, now, &mut self.events);
        let echoes = self.detection.flush_echoes(now);

        SonarSnapshot {
            time: self.time,
            own_ship: self.own_ship,
            detections,
            contacts: self.registry.all().to_vec(),
            ping: self.detection.ping_view(),
            selected_target: self.detection.selected_target().map(str::to_string),
            echoes,
            events: std::mem::take(&mut self.events),
        }
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn detection(&self) -> &DetectionEngine {
        &self.detection
    }

    pub fn registry(&self) -> &ContactRegistry {
        &self.registry
    }

    /// Filtered, sorted view of the contact list.
    pub fn contacts(&self, filter: ContactFilter, sort: ContactSort) -> Vec<&Contact> {
        self.registry.contacts(filter, sort)
    }

    pub fn relabel(&mut self, target_id: &str, alias: &str) -> Result<(), RelabelError> {
        self.registry.relabel(target_id, alias)
    }

    pub fn set_manual_solution(
        &mut self,
        target_id: &str,
        solution: ManualSolution,
    ) -> Result<u8, ManualSolutionError> {
        self.registry.set_manual_solution(target_id, solution)
    }

    pub fn clear_lost_contacts(&mut self) -> Vec<TargetId> {
        self.registry.clear_lost_contacts()
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single operator command.
    fn handle_command(&mut self, command: SonarCommand) {
        match command {
            SonarCommand::SelectTarget { target_id } => {
                self.detection.select_target(target_id);
            }
            SonarCommand::StartPing => {
                let pulse_id = self
                    .detection
                    .start_ping(&self.own_ship, self.terrain.as_deref());
                self.events.push(SonarEvent::PingStarted { pulse_id });
            }
            SonarCommand::SetManualSolution {
                target_id,
                solution,
            } => {
                if let Err(err) = self.registry.set_manual_solution(&target_id, solution) {
                    warn!(%target_id, %err, "manual solution rejected");
                }
            }
            SonarCommand::ClearManualSolution { target_id } => {
                if !self.registry.clear_manual_solution(&target_id) {
                    warn!(%target_id, "clear manual solution: unknown contact");
                }
            }
            SonarCommand::Relabel { target_id, alias } => {
                if let Err(err) = self.registry.relabel(&target_id, &alias) {
                    warn!(%target_id, reason = err.reason_code(), "relabel rejected");
                }
            }
            SonarCommand::SetPinned { target_id, pinned } => {
                if !self.registry.set_pinned(&target_id, pinned) {
                    warn!(%target_id, "pin: unknown contact");
                }
            }
            SonarCommand::ClearLostContacts => {
                let removed = self.registry.clear_lost_contacts();
                info!(count = removed.len(), "cleared lost contacts");
            }
        }
    }
}
