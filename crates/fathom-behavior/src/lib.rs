//! Target behavior tables for FATHOM.
//!
//! Per-kind acoustic and kinematic profiles, and the reactive
//! maneuvers targets adopt when illuminated by active sonar.

pub mod fsm;
pub mod profiles;
pub mod tracker;

pub use fathom_core as core;

pub use fsm::{react_to_ping, ReactionContext};
pub use profiles::{get_profile, TargetProfile};
pub use tracker::ReactionTracker;
