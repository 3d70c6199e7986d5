//! Terrain system for FATHOM.
//!
//! Seabed height queries, gridded bathymetry, and
//! line-of-sight checks for acoustic occlusion.

pub use fathom_core as core;

pub mod grid;
pub mod los;
pub mod oracle;

// Re-export key types for convenience.
pub use grid::{HeightGrid, HeightGridHeader};
pub use los::has_line_of_sight;
pub use oracle::{FlatSeabed, TerrainOracle};
