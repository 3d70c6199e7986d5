//! Fundamental geometric and simulation types.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Position in simulation space.
/// x = East, z = North (horizontal plane), y = Up (negative below the surface).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Own-ship pose supplied by the host each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OwnShipPose {
    pub position: Position,
    /// Heading in degrees (0 = North, clockwise).
    pub heading_deg: f64,
    /// Keel depth in meters (positive down).
    pub depth: f64,
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Surface position at (x, z).
    pub fn on_surface(x: f64, z: f64) -> Self {
        Self { x, y: 0.0, z }
    }

    /// Horizontal components as a vector (x, z).
    pub fn horizontal(&self) -> DVec2 {
        DVec2::new(self.x, self.z)
    }

    /// Horizontal range to another position in simulation units.
    pub fn horizontal_range_to(&self, other: &Position) -> f64 {
        self.horizontal().distance(other.horizontal())
    }

    /// True bearing to another position in degrees (0 = North, clockwise).
    pub fn bearing_to(&self, other: &Position) -> f64 {
        let d = other.horizontal() - self.horizontal();
        d.x.atan2(d.y).to_degrees().rem_euclid(360.0)
    }

    /// Replace non-finite components with zero.
    pub fn sanitized(&self) -> Position {
        Position {
            x: finite_or(self.x, 0.0),
            y: finite_or(self.y, 0.0),
            z: finite_or(self.z, 0.0),
        }
    }
}

impl Default for OwnShipPose {
    fn default() -> Self {
        Self {
            position: Position::default(),
            heading_deg: 0.0,
            depth: crate::constants::DEFAULT_OWN_SHIP_DEPTH,
        }
    }
}

impl SimTime {
    /// Advance by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}

/// `value` if finite, else `fallback`.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Smallest absolute difference between two angles in degrees, in [0, 180].
pub fn angle_diff_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}
