//! Detection engine.
//!
//! Evaluates the passive sonar equation for every target each tick, runs
//! the active ping wavefront, and advances track and classification
//! state. Per-target state is keyed by target id and owned here; results
//! come back index-parallel to the target slice the caller passed in.

pub mod active;
pub mod classification;
pub mod passive;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fathom_behavior::{get_profile, react_to_ping, ReactionContext, ReactionTracker};
use fathom_core::constants::*;
use fathom_core::enums::TrackState;
use fathom_core::events::{EchoEvent, SonarEvent};
use fathom_core::state::PingView;
use fathom_core::target::{ClassificationInfo, DetectionResult, Target, TargetId};
use fathom_core::types::{finite_or, OwnShipPose, Position};
use fathom_terrain::los::has_line_of_sight_sampled;
use fathom_terrain::TerrainOracle;

use crate::echo::EchoScheduler;
use crate::environment::OceanEnvironment;

use self::active::{echo_delay, echo_intensity, PingWavefront};
use self::classification::update_classification;
use self::passive::{passive_snr, update_track_state, PassiveInputs, TrackTransition};

/// Detection tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// SNR (dB) above which a target is detected.
    pub threshold_db: f64,
    /// Seconds without detection before a track is lost.
    pub lost_timeout_secs: f64,
    /// Interior samples along each line-of-sight check.
    pub los_samples: usize,
    /// Ping wavefront growth per tick (simulation units).
    pub ping_radius_step: f64,
    /// Ping range (simulation units).
    pub ping_max_radius: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold_db: DETECTION_THRESHOLD_DB,
            lost_timeout_secs: LOST_TRACK_TIMEOUT_SECS,
            los_samples: LOS_SAMPLES,
            ping_radius_step: PING_RADIUS_STEP,
            ping_max_radius: PING_MAX_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TrackRecord {
    track_state: TrackState,
    last_detected_time: Option<f64>,
    last_pulse_id: Option<u32>,
    classification: ClassificationInfo,
}

/// Per-tick inputs shared by every target evaluation.
#[derive(Clone, Copy)]
pub struct TickInputs<'a> {
    pub own_ship: &'a OwnShipPose,
    /// Simulation time after this tick (seconds).
    pub now: f64,
    /// Tick length (seconds).
    pub dt: f64,
    pub terrain: Option<&'a dyn TerrainOracle>,
}

pub struct DetectionEngine {
    config: DetectionConfig,
    environment: OceanEnvironment,
    tracks: HashMap<TargetId, TrackRecord>,
    ping: Option<PingWavefront>,
    next_pulse_id: u32,
    selected: Option<TargetId>,
    reactions: ReactionTracker,
    echoes: EchoScheduler,
}

impl DetectionEngine {
    pub fn new(config: DetectionConfig, environment: OceanEnvironment) -> Self {
        Self {
            config,
            environment,
            tracks: HashMap::new(),
            ping: None,
            next_pulse_id: 0,
            selected: None,
            reactions: ReactionTracker::new(),
            echoes: EchoScheduler::new(),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn environment(&self) -> &OceanEnvironment {
        &self.environment
    }

    /// Target receiving focused classification.
    pub fn selected_target(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select_target(&mut self, target_id: Option<TargetId>) {
        self.selected = target_id;
    }

    /// Open a new wavefront at own-ship, replacing any ping in flight.
    pub fn start_ping(&mut self, own_ship: &OwnShipPose, terrain: Option<&dyn TerrainOracle>) -> u32 {
        self.next_pulse_id += 1;
        let pulse_id = self.next_pulse_id;
        let pos = own_ship.position.sanitized();
        let origin = Position::new(pos.x, -self.own_depth(own_ship, terrain), pos.z);
        self.ping = Some(PingWavefront::new(
            pulse_id,
            origin,
            self.config.ping_radius_step,
            self.config.ping_max_radius,
        ));
        debug!(pulse_id, "ping transmitted");
        pulse_id
    }

    pub fn ping_view(&self) -> Option<PingView> {
        self.ping.as_ref().map(PingWavefront::view)
    }

    /// Echoes arriving at or before `now`.
    pub fn flush_echoes(&mut self, now: f64) -> Vec<EchoEvent> {
        self.echoes.flush(now)
    }

    pub fn pending_echoes(&self) -> usize {
        self.echoes.pending_count()
    }

    pub fn reactions(&self) -> &ReactionTracker {
        &self.reactions
    }

    /// Own-ship depth, kept above the seabed when terrain is known.
    fn own_depth(&self, own: &OwnShipPose, terrain: Option<&dyn TerrainOracle>) -> f64 {
        let depth = finite_or(own.depth, DEFAULT_OWN_SHIP_DEPTH);
        match terrain {
            Some(t) => {
                let water = t.water_depth_at(own.position.x, own.position.z);
                depth.min(water - SEABED_CLEARANCE).max(0.0)
            }
            None => depth.max(0.0),
        }
    }

    /// Operating depth for a target: its nominal depth, clamped above the seabed.
    fn target_depth(&self, target: &Target, position: &Position, terrain: Option<&dyn TerrainOracle>) -> f64 {
        match terrain {
            Some(t) => {
                let water = t.water_depth_at(position.x, position.z);
                get_profile(target.kind)
                    .nominal_depth
                    .min(water - SEABED_CLEARANCE)
                    .max(0.0)
            }
            None => DEFAULT_TARGET_DEPTH,
        }
    }

    fn line_of_sight(&self, terrain: Option<&dyn TerrainOracle>, from: &Position, to: &Position) -> bool {
        match terrain {
            Some(t) => has_line_of_sight_sampled(t, from, to, self.config.los_samples),
            None => true,
        }
    }

    /// Run one detection tick. Events are appended to `events`.
    pub fn update(
        &mut self,
        targets: &[Target],
        inputs: TickInputs<'_>,
        events: &mut Vec<SonarEvent>,
    ) -> Vec<DetectionResult> {
        let TickInputs {
            own_ship,
            now,
            dt,
            terrain,
        } = inputs;

        // Forget state for targets the host no longer reports.
        let alive: HashSet<&str> = targets.iter().map(|t| t.id.as_str()).collect();
        self.tracks.retain(|id, _| alive.contains(id.as_str()));
        self.reactions.retain_targets(|id| alive.contains(id));

        let own_pos = own_ship.position.sanitized();
        let own_depth = self.own_depth(own_ship, terrain);
        let own_eye = Position::new(own_pos.x, -own_depth, own_pos.z);

        let mut ping = self.ping.take();
        if let Some(p) = ping.as_mut() {
            p.advance();
        }

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let pos = target.position.sanitized();
            let distance = own_pos.horizontal_range_to(&pos);
            let bearing = own_pos.bearing_to(&pos);
            let range_meters = distance * RANGE_SCALE_METERS;
            let target_depth = self.target_depth(target, &pos, terrain);
            let target_eye = Position::new(pos.x, -target_depth, pos.z);
            let line_of_sight = self.line_of_sight(terrain, &own_eye, &target_eye);

            let snr = passive_snr(
                &self.environment,
                &PassiveInputs {
                    kind: target.kind,
                    speed: target.speed,
                    rpm: target.rpm,
                    range_meters,
                    own_depth,
                    target_depth,
                    line_of_sight,
                },
            );

            let threshold = self.config.threshold_db;
            let lost_timeout = self.config.lost_timeout_secs;
            let mut record = self.tracks.remove(&target.id).unwrap_or_default();

            match update_track_state(
                &mut record.track_state,
                &mut record.last_detected_time,
                snr,
                now,
                threshold,
                lost_timeout,
            ) {
                Some(TrackTransition::Acquired) => {
                    info!(target_id = %target.id, snr, "target detected")
                }
                Some(TrackTransition::Reacquired) => {
                    info!(target_id = %target.id, snr, "target reacquired")
                }
                Some(TrackTransition::Lost) => info!(target_id = %target.id, "track lost"),
                None => {}
            }

            if let Some(p) = ping.as_ref() {
                let from_origin = p.origin.horizontal_range_to(&pos);
                if record.last_pulse_id != Some(p.pulse_id) && p.reaches(from_origin) {
                    record.last_pulse_id = Some(p.pulse_id);
                    if self.line_of_sight(terrain, &p.origin, &target_eye) {
                        self.register_ping_hit(
                            p,
                            target,
                            &pos,
                            &mut record,
                            PingHitGeometry {
                                bearing,
                                range_meters,
                                own_depth,
                                target_depth,
                            },
                            now,
                            events,
                        );
                    } else {
                        debug!(target_id = %target.id, pulse_id = p.pulse_id, "ping blocked by terrain");
                    }
                }
            }

            if !matches!(record.track_state, TrackState::Undetected | TrackState::Lost) {
                let selected = self.selected.as_deref() == Some(target.id.as_str());
                let before = record.classification.state;
                if update_classification(
                    &mut record.classification,
                    snr,
                    threshold,
                    selected,
                    dt,
                    &target.class_id,
                ) {
                    debug!(
                        target_id = %target.id,
                        from = ?before,
                        to = ?record.classification.state,
                        "classification changed"
                    );
                }
            }

            results.push(DetectionResult {
                target_id: target.id.clone(),
                kind: target.kind,
                snr,
                bearing,
                distance,
                range_meters,
                track_state: record.track_state,
                last_detected_time: record.last_detected_time,
                last_pulse_id: record.last_pulse_id,
                classification: record.classification.clone(),
                course: target.course,
                speed: target.speed,
            });
            self.tracks.insert(target.id.clone(), record);
        }
        self.ping = match ping {
            Some(p) if p.is_final() => {
                info!(pulse_id = p.pulse_id, "ping complete");
                events.push(SonarEvent::PingComplete {
                    pulse_id: p.pulse_id,
                });
                None
            }
            other => other,
        };

        for order in self.reactions.expire(now) {
            debug!(target_id = %order.target_id, "evasion expired");
            events.push(SonarEvent::Maneuver(order));
        }

        results
    }

    #[allow(clippy::too_many_arguments)]
    fn register_ping_hit(
        &mut self,
        ping: &PingWavefront,
        target: &Target,
        position: &Position,
        record: &mut TrackRecord,
        geometry: PingHitGeometry,
        now: f64,
        events: &mut Vec<SonarEvent>,
    ) {
        if record.track_state != TrackState::Tracked {
            info!(target_id = %target.id, pulse_id = ping.pulse_id, "target detected by ping");
        }
        record.track_state = TrackState::Tracked;
        record.last_detected_time = Some(now);
        events.push(SonarEvent::PingHit {
            pulse_id: ping.pulse_id,
            target_id: target.id.clone(),
        });

        let ctx = ReactionContext {
            target_id: target.id.clone(),
            kind: target.kind,
            position: *position,
            course: target.course,
            speed: target.speed,
            ping_origin: ping.origin,
            now,
        };
        if let Some(order) = react_to_ping(&ctx) {
            self.reactions.record(&order, target.course, target.speed);
            events.push(SonarEvent::Maneuver(order));
        }

        let mods = self.environment.acoustic_modifiers(
            geometry.own_depth,
            geometry.target_depth,
            geometry.range_meters,
        );
        let echo = EchoEvent {
            pulse_id: ping.pulse_id,
            target_id: target.id.clone(),
            bearing: geometry.bearing,
            intensity: echo_intensity(geometry.range_meters, ping.max_radius, mods.echo_gain),
            arrival_time: now + echo_delay(geometry.range_meters),
        };
        debug!(
            target_id = %target.id,
            intensity = echo.intensity,
            arrival = echo.arrival_time,
            "echo scheduled"
        );
        self.echoes.schedule(echo);
    }
}

#[derive(Clone, Copy)]
struct PingHitGeometry {
    bearing: f64,
    range_meters: f64,
    own_depth: f64,
    target_depth: f64,
}
