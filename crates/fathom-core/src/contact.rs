//! Contact records maintained by the contact registry.
//!
//! Plain data; registry logic lives in `fathom-sim::contacts`.

use serde::{Deserialize, Serialize};

use crate::enums::{ContactStatus, TargetKind};
use crate::target::TargetId;

/// Operator-entered target motion analysis solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualSolution {
    /// Bearing (degrees).
    pub bearing: f64,
    /// Range (meters).
    pub range: f64,
    /// Course (degrees).
    pub course: f64,
    pub speed: f64,
}

/// A sonar contact tied to one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub target_id: TargetId,
    /// Stable label (`S1`, `S2`, ...), never reassigned while the contact lives.
    pub label: String,
    /// Sequence number behind the label.
    pub label_index: u32,
    pub alias: Option<String>,
    pub pinned: bool,
    pub status: ContactStatus,
    pub last_seen_at: f64,
    pub range_meters: f64,
    pub bearing: f64,
    pub snr: f64,
    pub kind: TargetKind,
    pub merged_group_id: Option<u32>,
    pub reacquire_count: u32,
    pub manual_solution: Option<ManualSolution>,
    /// 0..=100.
    pub manual_confidence: u8,
    pub threat_score: f64,
}

impl ManualSolution {
    /// All fields are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.bearing.is_finite()
            && self.range.is_finite()
            && self.course.is_finite()
            && self.speed.is_finite()
    }
}

impl Contact {
    /// Alias if set, otherwise the label.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.label)
    }
}
