//! Passive sonar equation and track-state transitions.
//!
//! `SNR = SL - TL - NL + environment - shadow + multipath - occlusion`, in dB.

use fathom_behavior::get_profile;
use fathom_core::constants::*;
use fathom_core::enums::{TargetKind, TrackState};
use fathom_core::types::finite_or;

use crate::environment::OceanEnvironment;

/// Geometry and kinematics feeding one passive evaluation.
#[derive(Debug, Clone, Copy)]
pub struct PassiveInputs {
    pub kind: TargetKind,
    pub speed: f64,
    pub rpm: f64,
    pub range_meters: f64,
    pub own_depth: f64,
    pub target_depth: f64,
    /// Terrain leaves the sight line clear.
    pub line_of_sight: bool,
}

/// Radiated source level (dB): base by kind, plus flow and machinery terms.
pub fn source_level(kind: TargetKind, speed: f64, rpm: f64) -> f64 {
    let speed = finite_or(speed, 0.0).max(0.0);
    let profile = get_profile(kind);
    let rpm = profile.shaft_rpm(rpm);
    profile.base_source_level_db
        + 20.0 * (1.0 + speed * 10.0).log10()
        + 5.0 * (1.0 + rpm / 60.0).log10()
}

/// Spherical spreading loss (dB). Ranges under one meter count as one meter.
pub fn transmission_loss(range_meters: f64) -> f64 {
    20.0 * finite_or(range_meters, 1.0).max(1.0).log10()
}

/// Deterministic multipath interference term (dB).
pub fn multipath_db(range_meters: f64) -> f64 {
    (finite_or(range_meters, 0.0) * MULTIPATH_FREQUENCY).sin() * MULTIPATH_STRENGTH_DB
}

/// Signal excess over ambient noise for one target.
pub fn passive_snr(env: &OceanEnvironment, inputs: &PassiveInputs) -> f64 {
    let sl = source_level(inputs.kind, inputs.speed, inputs.rpm);
    let tl = transmission_loss(inputs.range_meters);
    let nl = env.ambient_noise(inputs.target_depth, PASSIVE_ANALYSIS_FREQ_HZ);
    let mods = env.acoustic_modifiers(inputs.own_depth, inputs.target_depth, inputs.range_meters);

    let mut snr = sl - tl - nl + mods.snr_modifier_db + multipath_db(inputs.range_meters);
    if env.is_thermocline_between(inputs.own_depth, inputs.target_depth) {
        snr -= SHADOW_ZONE_ATTENUATION_DB;
    }
    if !inputs.line_of_sight {
        snr -= OCCLUSION_ATTENUATION_DB;
    }
    snr
}

/// A change in track state worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackTransition {
    Acquired,
    Reacquired,
    Lost,
}

/// Apply one passive observation to a track.
///
/// Above threshold the track is (re)asserted Tracked. A Tracked track that
/// goes quiet holds until `lost_timeout` passes, then drops to Lost once.
pub fn update_track_state(
    state: &mut TrackState,
    last_detected_time: &mut Option<f64>,
    snr: f64,
    now: f64,
    threshold_db: f64,
    lost_timeout: f64,
) -> Option<TrackTransition> {
    if snr > threshold_db {
        let transition = match *state {
            TrackState::Tracked => None,
            TrackState::Lost => Some(TrackTransition::Reacquired),
            _ => Some(TrackTransition::Acquired),
        };
        *state = TrackState::Tracked;
        *last_detected_time = Some(now);
        return transition;
    }

    if *state == TrackState::Tracked {
        let last = last_detected_time.unwrap_or(now);
        if now - last > lost_timeout {
            *state = TrackState::Lost;
            return Some(TrackTransition::Lost);
        }
    }
    None
}
