//! Target records exchanged between the kinematics host and the sonar core.
//!
//! The host owns `Target` and advances its kinematics. The detection engine
//! never writes into it; it returns `DetectionResult`s that the host merges
//! with [`Target::apply_detection`].

use serde::{Deserialize, Serialize};

use crate::enums::{ClassificationState, TargetKind, TrackState};
use crate::types::Position;

/// Stable identifier assigned by the host (e.g. `"target-01"`).
pub type TargetId = String;

/// Kinematic and acoustic description of one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub kind: TargetKind,
    /// World position; `y` is ignored by the detection engine, which derives depth.
    pub position: Position,
    /// Course in degrees (0 = North, clockwise).
    pub course: f64,
    /// Speed in simulation units per second.
    pub speed: f64,
    pub rpm: f64,
    pub blade_count: u32,
    /// Class name revealed when classification completes.
    pub class_id: String,

    // --- Merged detection output ---
    #[serde(default)]
    pub snr: f64,
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub track_state: TrackState,
    #[serde(default)]
    pub classification: ClassificationInfo,
}

/// Classification progress for one target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationInfo {
    pub state: ClassificationState,
    /// Progress toward confirmation, in [0, 1].
    pub progress: f64,
    pub identified_class: Option<String>,
    pub confirmed: bool,
}

/// Per-tick detection output for one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub target_id: TargetId,
    pub kind: TargetKind,
    /// Signal-to-noise ratio (dB).
    pub snr: f64,
    /// True bearing from own ship (degrees).
    pub bearing: f64,
    /// Horizontal distance from own ship (simulation units).
    pub distance: f64,
    /// Horizontal distance from own ship (meters).
    pub range_meters: f64,
    pub track_state: TrackState,
    pub last_detected_time: Option<f64>,
    pub last_pulse_id: Option<u32>,
    pub classification: ClassificationInfo,
    /// Target course (degrees), copied for manual solution scoring.
    pub course: f64,
    /// Target speed, copied for manual solution scoring.
    pub speed: f64,
}

impl Target {
    pub fn new(id: impl Into<TargetId>, kind: TargetKind, position: Position) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            course: 0.0,
            speed: 0.0,
            rpm: 0.0,
            blade_count: 0,
            class_id: String::new(),
            snr: 0.0,
            bearing: 0.0,
            distance: 0.0,
            track_state: TrackState::Undetected,
            classification: ClassificationInfo::default(),
        }
    }

    /// Merge a detection result produced for this target.
    pub fn apply_detection(&mut self, result: &DetectionResult) {
        if result.target_id != self.id {
            return;
        }
        self.snr = result.snr;
        self.bearing = result.bearing;
        self.distance = result.distance;
        self.track_state = result.track_state;
        self.classification = result.classification.clone();
    }

    /// True blade-passing frequency (Hz) from shaft rpm and blade count.
    pub fn blade_passing_hz(&self) -> f64 {
        self.rpm.max(0.0) / 60.0 * self.blade_count as f64
    }
}

impl DetectionResult {
    /// Whether the target currently holds a detection.
    pub fn is_detected(&self) -> bool {
        self.track_state == TrackState::Tracked
    }
}
