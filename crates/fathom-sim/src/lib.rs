//! Sonar simulation core for FATHOM.
//!
//! Ocean environment model, passive and active detection, contact
//! registry, and the tick-driven `SonarEngine` that ties them together.

pub mod contacts;
pub mod detection;
pub mod echo;
pub mod engine;
pub mod environment;

pub use fathom_core as core;
pub use engine::{SimConfig, SonarEngine};
