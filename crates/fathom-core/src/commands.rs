//! Operator commands sent from the host to the simulation.
//!
//! Commands are queued and processed at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::contact::ManualSolution;
use crate::target::TargetId;

/// All operator actions the sonar core understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SonarCommand {
    // --- Sensor control ---
    /// Select (or clear) the target that receives focused classification.
    SelectTarget { target_id: Option<TargetId> },
    /// Transmit an active ping from the current own-ship position.
    StartPing,

    // --- Contact management ---
    /// Enter a target motion analysis solution for a contact.
    SetManualSolution {
        target_id: TargetId,
        solution: ManualSolution,
    },
    /// Remove a contact's manual solution.
    ClearManualSolution { target_id: TargetId },
    /// Give a contact a user alias.
    Relabel { target_id: TargetId, alias: String },
    /// Pin or unpin a contact.
    SetPinned { target_id: TargetId, pinned: bool },
    /// Remove every lost contact.
    ClearLostContacts,
}
