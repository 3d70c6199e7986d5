//! Active sonar: expanding ping wavefront and echo strength.

use fathom_core::constants::*;
use fathom_core::state::PingView;
use fathom_core::types::{finite_or, Position};

/// One transmitted pulse expanding from its origin.
#[derive(Debug, Clone)]
pub struct PingWavefront {
    pub pulse_id: u32,
    /// Transmit position; `y` holds the transducer altitude.
    pub origin: Position,
    /// Current radius (simulation units).
    pub radius: f64,
    pub step: f64,
    pub max_radius: f64,
}

impl PingWavefront {
    pub fn new(pulse_id: u32, origin: Position, step: f64, max_radius: f64) -> Self {
        Self {
            pulse_id,
            origin,
            radius: 0.0,
            step: finite_or(step, PING_RADIUS_STEP).max(f64::EPSILON),
            max_radius: finite_or(max_radius, PING_MAX_RADIUS).max(0.0),
        }
    }

    /// Grow by one tick, stopping at max range.
    pub fn advance(&mut self) {
        self.radius = (self.radius + self.step).min(self.max_radius);
    }

    /// The front sits at max range: the current sweep is the last one.
    pub fn is_final(&self) -> bool {
        self.radius >= self.max_radius
    }

    /// Whether the front has reached a point at horizontal `distance`.
    pub fn reaches(&self, distance: f64) -> bool {
        distance.is_finite() && self.radius >= distance
    }

    pub fn view(&self) -> PingView {
        PingView {
            pulse_id: self.pulse_id,
            radius: self.radius,
            max_radius: self.max_radius,
        }
    }
}

/// Normalized echo strength at `range_meters` for a ping of `max_radius` units.
pub fn echo_intensity(range_meters: f64, max_radius: f64, echo_gain: f64) -> f64 {
    let max_meters = (max_radius * RANGE_SCALE_METERS).max(1.0);
    let falloff = 1.0 - finite_or(range_meters, max_meters) / max_meters;
    (falloff * finite_or(echo_gain, 1.0)).clamp(ECHO_MIN_INTENSITY, 1.0)
}

/// Two-way travel time for an echo from `range_meters`.
pub fn echo_delay(range_meters: f64) -> f64 {
    2.0 * finite_or(range_meters, 0.0).max(0.0) / ECHO_SOUND_SPEED
}
