//! Terrain height oracle supplied by the spatial collaborator.

/// Answers terrain height queries in simulation space.
///
/// Heights are meters relative to the sea surface; the seabed is negative.
pub trait TerrainOracle {
    /// Terrain height at horizontal position (x, z).
    fn height_at(&self, x: f64, z: f64) -> f64;

    /// Water column depth at (x, z), zero on land.
    fn water_depth_at(&self, x: f64, z: f64) -> f64 {
        let h = self.height_at(x, z);
        if h.is_finite() {
            (-h).max(0.0)
        } else {
            0.0
        }
    }
}

impl<F> TerrainOracle for F
where
    F: Fn(f64, f64) -> f64,
{
    fn height_at(&self, x: f64, z: f64) -> f64 {
        self(x, z)
    }
}

/// Uniform seabed at a fixed depth.
#[derive(Debug, Clone, Copy)]
pub struct FlatSeabed {
    /// Depth of the seabed (meters, positive down).
    pub depth: f64,
}

impl TerrainOracle for FlatSeabed {
    fn height_at(&self, _x: f64, _z: f64) -> f64 {
        -self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_oracle() {
        let ridge = |x: f64, _z: f64| if x.abs() < 10.0 { -5.0 } else { -200.0 };
        assert!((ridge.height_at(0.0, 0.0) + 5.0).abs() < 1e-12);
        assert!((ridge.water_depth_at(50.0, 0.0) - 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_water_depth_zero_on_land_and_nan() {
        let island = |_x: f64, _z: f64| 30.0;
        assert_eq!(island.water_depth_at(0.0, 0.0), 0.0);
        let broken = |_x: f64, _z: f64| f64::NAN;
        assert_eq!(broken.water_depth_at(0.0, 0.0), 0.0);
    }
}
