//! Kind-specific acoustic and kinematic profiles.
//!
//! Consolidates every per-kind table used by detection and behavior.

use fathom_core::enums::{ReactionKind, TargetKind};

/// Profile for a target kind.
#[derive(Debug, Clone, Copy)]
pub struct TargetProfile {
    /// Base radiated source level before speed/machinery terms (dB).
    pub base_source_level_db: f64,
    /// Preferred operating depth (meters, positive down).
    pub nominal_depth: f64,
    /// Default shaft rpm when the host does not provide one.
    pub default_rpm: f64,
    pub default_blade_count: u32,
    /// Default cruise speed (simulation units per second).
    pub default_speed: f64,
    /// Response to being pinged.
    pub reaction: ReactionKind,
}

impl TargetProfile {
    /// Host-supplied shaft rpm, or this kind's default when missing or invalid.
    pub fn shaft_rpm(&self, rpm: f64) -> f64 {
        if rpm.is_finite() && rpm > 0.0 {
            rpm
        } else {
            self.default_rpm
        }
    }

    /// Host-supplied blade count, or this kind's default when zero.
    pub fn blade_count(&self, blades: u32) -> u32 {
        if blades > 0 {
            blades
        } else {
            self.default_blade_count
        }
    }

    /// Blade-passing frequency (Hz) after filling in missing machinery values.
    pub fn blade_passing_hz(&self, rpm: f64, blades: u32) -> f64 {
        self.shaft_rpm(rpm) / 60.0 * self.blade_count(blades) as f64
    }
}

/// Get the profile for a given kind.
pub fn get_profile(kind: TargetKind) -> TargetProfile {
    match kind {
        TargetKind::Ship => TargetProfile {
            base_source_level_db: 155.0,
            nominal_depth: 4.0,
            default_rpm: 140.0,
            default_blade_count: 4,
            default_speed: 1.2,
            reaction: ReactionKind::Evade,
        },
        TargetKind::Submarine => TargetProfile {
            base_source_level_db: 130.0,
            nominal_depth: 120.0,
            default_rpm: 90.0,
            default_blade_count: 7,
            default_speed: 0.8,
            reaction: ReactionKind::Evade,
        },
        TargetKind::Biological => TargetProfile {
            base_source_level_db: 140.0,
            nominal_depth: 30.0,
            default_rpm: 0.0,
            default_blade_count: 0,
            default_speed: 0.4,
            reaction: ReactionKind::None,
        },
        TargetKind::Static => TargetProfile {
            base_source_level_db: 110.0,
            // Clamped to the seabed by the water column.
            nominal_depth: f64::INFINITY,
            default_rpm: 0.0,
            default_blade_count: 0,
            default_speed: 0.0,
            reaction: ReactionKind::None,
        },
        TargetKind::Torpedo => TargetProfile {
            base_source_level_db: 170.0,
            nominal_depth: 40.0,
            default_rpm: 1200.0,
            default_blade_count: 6,
            default_speed: 4.5,
            reaction: ReactionKind::Intercept,
        },
    }
}
