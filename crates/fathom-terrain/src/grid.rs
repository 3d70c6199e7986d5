//! HeightGrid: gridded bathymetry with bilinear height queries.

use serde::{Deserialize, Serialize};

use crate::oracle::TerrainOracle;

/// Grid header metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightGridHeader {
    /// West edge (simulation x of column 0).
    pub origin_x: f64,
    /// South edge (simulation z of row 0).
    pub origin_z: f64,
    /// Simulation units per grid cell.
    pub cell_size: f64,
    /// Number of columns (west to east).
    pub width: u32,
    /// Number of rows (south to north).
    pub height: u32,
}

impl HeightGridHeader {
    /// East edge x coordinate.
    pub fn east_x(&self) -> f64 {
        self.origin_x + self.width as f64 * self.cell_size
    }

    /// North edge z coordinate.
    pub fn north_z(&self) -> f64 {
        self.origin_z + self.height as f64 * self.cell_size
    }
}

/// Terrain heights in meters, row-major (south-to-north, west-to-east).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightGrid {
    pub header: HeightGridHeader,
    pub heights: Vec<f32>,
    /// Height reported outside the grid.
    pub outside_height: f64,
}

impl HeightGrid {
    /// Create a grid from pre-loaded heights. Missing cells read as `outside_height`.
    pub fn new(header: HeightGridHeader, heights: Vec<f32>, outside_height: f64) -> Self {
        Self {
            header,
            heights,
            outside_height,
        }
    }

    /// Uniform grid at a single height.
    pub fn flat(header: HeightGridHeader, height: f32) -> Self {
        let n = (header.width * header.height) as usize;
        Self::new(header, vec![height; n], height as f64)
    }

    /// Cells the header describes.
    pub fn expected_len(&self) -> usize {
        self.header.width as usize * self.header.height as usize
    }

    /// Header and height data agree, and the cell size is usable.
    pub fn is_consistent(&self) -> bool {
        self.heights.len() == self.expected_len()
            && self.header.cell_size.is_finite()
            && self.header.cell_size > 0.0
    }

    /// Convert a sim-space position to grid row/col (fractional).
    /// Returns None if outside grid bounds.
    fn sim_to_grid(&self, x: f64, z: f64) -> Option<(f64, f64)> {
        let h = &self.header;
        if !x.is_finite() || !z.is_finite() || h.cell_size <= 0.0 {
            return None;
        }
        let col = (x - h.origin_x) / h.cell_size;
        let row = (z - h.origin_z) / h.cell_size;

        if col < 0.0 || row < 0.0 || col >= h.width as f64 || row >= h.height as f64 {
            return None;
        }

        Some((row, col))
    }

    /// Raw height at integer grid coordinates.
    fn raw_height(&self, row: usize, col: usize) -> f64 {
        let h = &self.header;
        if row >= h.height as usize || col >= h.width as usize {
            return self.outside_height;
        }
        self.heights
            .get(row * h.width as usize + col)
            .map(|&v| v as f64)
            .unwrap_or(self.outside_height)
    }

    /// Height at a sim-space position with bilinear interpolation.
    /// Returns None if the position is outside the grid.
    pub fn height_in_grid(&self, x: f64, z: f64) -> Option<f64> {
        let (row, col) = self.sim_to_grid(x, z)?;
        Some(self.bilinear(row, col))
    }

    /// Bilinear interpolation at fractional row/col.
    fn bilinear(&self, row: f64, col: f64) -> f64 {
        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.header.height as usize - 1);
        let c1 = (c0 + 1).min(self.header.width as usize - 1);

        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let e00 = self.raw_height(r0, c0);
        let e01 = self.raw_height(r0, c1);
        let e10 = self.raw_height(r1, c0);
        let e11 = self.raw_height(r1, c1);

        let bottom = e00 * (1.0 - fc) + e01 * fc;
        let top = e10 * (1.0 - fc) + e11 * fc;
        bottom * (1.0 - fr) + top * fr
    }

    /// Highest terrain point in the grid.
    pub fn max_height(&self) -> f64 {
        self.heights
            .iter()
            .fold(self.outside_height, |m, &v| m.max(v as f64))
    }
}

impl TerrainOracle for HeightGrid {
    fn height_at(&self, x: f64, z: f64) -> f64 {
        self.height_in_grid(x, z).unwrap_or(self.outside_height)
    }
}
