//! Line-of-sight calculation with terrain occlusion.
//!
//! Samples the straight sight line between two points and compares it
//! against terrain height at each intermediate sample.

use fathom_core::constants::LOS_SAMPLES;
use fathom_core::types::Position;

use crate::oracle::TerrainOracle;

/// Check line-of-sight between two sim-space points with the default sample count.
pub fn has_line_of_sight<T: TerrainOracle + ?Sized>(
    terrain: &T,
    from: &Position,
    to: &Position,
) -> bool {
    has_line_of_sight_sampled(terrain, from, to, LOS_SAMPLES)
}

/// Check line-of-sight using `samples` evenly spaced interior points.
///
/// Returns false as soon as terrain at a sample rises above the sight line.
/// The endpoints themselves are never tested, so a target resting on the
/// seabed is not occluded by the bottom it sits on.
pub fn has_line_of_sight_sampled<T: TerrainOracle + ?Sized>(
    terrain: &T,
    from: &Position,
    to: &Position,
    samples: usize,
) -> bool {
    let from = from.sanitized();
    let to = to.sanitized();
    let a = from.horizontal();
    let b = to.horizontal();

    for i in 1..=samples {
        let t = i as f64 / (samples + 1) as f64;
        let p = a.lerp(b, t);
        let sight_height = from.y + (to.y - from.y) * t;

        let terrain_height = terrain.height_at(p.x, p.y);
        if terrain_height.is_finite() && terrain_height > sight_height {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{HeightGrid, HeightGridHeader};
    use crate::oracle::FlatSeabed;

    /// 100x100 grid of 10-unit cells, seabed at -200m with a ridge spanning x in [-100, 100).
    fn make_ridge_grid(ridge_height: f32) -> HeightGrid {
        let width = 100u32;
        let height = 100u32;
        let mut heights = vec![-200.0f32; (width * height) as usize];
        for r in 0..height as usize {
            for c in 40..60 {
                heights[r * width as usize + c] = ridge_height;
            }
        }
        HeightGrid::new(
            HeightGridHeader {
                origin_x: -500.0,
                origin_z: -500.0,
                cell_size: 10.0,
                width,
                height,
            },
            heights,
            -200.0,
        )
    }

    #[test]
    fn test_los_flat_seabed() {
        let seabed = FlatSeabed { depth: 200.0 };
        let from = Position::new(-300.0, -5.0, 0.0);
        let to = Position::new(300.0, -10.0, 0.0);
        assert!(
            has_line_of_sight(&seabed, &from, &to),
            "LOS should be clear over a flat seabed"
        );
    }

    #[test]
    fn test_los_blocked_by_ridge() {
        let grid = make_ridge_grid(-20.0);
        let from = Position::new(-300.0, -100.0, 0.0);
        let to = Position::new(300.0, -100.0, 0.0);
        assert!(
            !has_line_of_sight(&grid, &from, &to),
            "LOS at 100m depth should be blocked by a ridge cresting at 20m"
        );
    }

    #[test]
    fn test_los_over_ridge() {
        let grid = make_ridge_grid(-120.0);
        let from = Position::new(-300.0, -100.0, 0.0);
        let to = Position::new(300.0, -100.0, 0.0);
        assert!(
            has_line_of_sight(&grid, &from, &to),
            "LOS at 100m depth should clear a ridge cresting at 120m"
        );
    }

    #[test]
    fn test_los_endpoints_not_sampled() {
        // Terrain is high everywhere except that only the endpoints matter.
        let shallow = |x: f64, _z: f64| if x.abs() > 90.0 { 0.0 } else { -500.0 };
        let from = Position::new(-100.0, -10.0, 0.0);
        let to = Position::new(100.0, -10.0, 0.0);
        assert!(has_line_of_sight_sampled(&shallow, &from, &to, 10));
    }

    #[test]
    fn test_los_zero_samples_is_clear() {
        let wall = |_x: f64, _z: f64| 1000.0;
        let from = Position::new(0.0, -10.0, 0.0);
        let to = Position::new(100.0, -10.0, 0.0);
        assert!(has_line_of_sight_sampled(&wall, &from, &to, 0));
        assert!(!has_line_of_sight_sampled(&wall, &from, &to, 1));
    }
}
