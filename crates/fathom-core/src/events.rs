//! Events emitted by the simulation for the presentation and kinematics hosts.

use serde::{Deserialize, Serialize};

use crate::enums::ReactionKind;
use crate::target::TargetId;

/// Discrete sonar events for the UI and sound cues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SonarEvent {
    /// A contact was created for a newly detected target.
    NewContact {
        label: String,
        target_id: TargetId,
        bearing: f64,
    },
    /// A contact timed out.
    ContactLost { label: String },
    /// A lost contact was detected again.
    ContactReacquired { label: String, reacquire_count: u32 },
    /// An active transmission began.
    PingStarted { pulse_id: u32 },
    /// The wavefront reached a visible target.
    PingHit { pulse_id: u32, target_id: TargetId },
    /// The wavefront passed its maximum range.
    PingComplete { pulse_id: u32 },
    /// A target reacted to being pinged, or reverted from a reaction.
    Maneuver(ManeuverOrder),
}

/// A scheduled echo return for the audio/presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoEvent {
    pub pulse_id: u32,
    pub target_id: TargetId,
    /// True bearing of the return (degrees).
    pub bearing: f64,
    /// Normalized intensity in [0, 1].
    pub intensity: f64,
    /// Simulation time at which the echo arrives (seconds).
    pub arrival_time: f64,
}

/// Course/speed change for the kinematics host to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverOrder {
    pub target_id: TargetId,
    pub reaction: ReactionKind,
    /// New course (degrees).
    pub course: f64,
    pub speed: f64,
    /// Time at which the target should resume its prior course and speed.
    pub revert_at: Option<f64>,
}
