//! DEMON (Detection of Envelope Modulation On Noise) analysis for FATHOM.
//!
//! Recovers the blade-passing frequency of a propeller from the amplitude
//! envelope of broadband cavitation noise, and maintains a hysteretic lock
//! on it per analysis target.

pub mod buffer;
pub mod comb;
pub mod config;
pub mod engine;
pub mod filters;
pub mod lock;
pub mod peaks;
pub mod signal;
pub mod spectrum;

pub use fathom_core as core;

pub use comb::{score_comb, CombScore};
pub use config::DemonConfig;
pub use engine::{DemonEngine, DemonReadout, OwnSignature};
pub use lock::DemonLock;
pub use signal::BladeRateSignal;

#[cfg(test)]
mod tests;
