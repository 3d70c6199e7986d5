//! Sonar state snapshot: the complete visible state handed to the host each tick.

use serde::{Deserialize, Serialize};

use crate::contact::Contact;
use crate::events::{EchoEvent, SonarEvent};
use crate::target::DetectionResult;
use crate::types::{OwnShipPose, SimTime};

/// Complete sonar state produced after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SonarSnapshot {
    pub time: SimTime,
    pub own_ship: OwnShipPose,
    /// Detection results, index-parallel to the target slice of the tick.
    pub detections: Vec<DetectionResult>,
    /// Contacts in label order.
    pub contacts: Vec<Contact>,
    pub ping: Option<PingView>,
    pub selected_target: Option<String>,
    /// Echoes whose arrival time passed during this tick.
    pub echoes: Vec<EchoEvent>,
    pub events: Vec<SonarEvent>,
}

/// Active ping wavefront for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingView {
    pub pulse_id: u32,
    /// Current wavefront radius (simulation units).
    pub radius: f64,
    pub max_radius: f64,
}
