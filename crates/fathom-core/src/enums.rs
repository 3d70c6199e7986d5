//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Acoustic target category. Every per-kind table matches on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    Ship,
    Submarine,
    Biological,
    Static,
    Torpedo,
}

/// Detection lifecycle of a target as seen by own-ship sonar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackState {
    #[default]
    Undetected,
    Ambiguous,
    Classified,
    Confirmed,
    Tracked,
    Lost,
}

/// Classification progress stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationState {
    #[default]
    Undetected,
    /// Enough signal to suspect a contact but not to identify it.
    Ambiguous,
    /// Class identified.
    Classified,
    /// Class identified with high certainty.
    Confirmed,
}

/// Contact status in the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    #[default]
    Tracked,
    /// Part of a bearing/range-coincident group that cannot be resolved.
    Ambiguous,
    Lost,
}

/// Contact list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactFilter {
    #[default]
    All,
    Tracked,
    Ambiguous,
    Lost,
    Pinned,
}

/// Contact list sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactSort {
    /// Highest threat score first.
    #[default]
    Threat,
    /// Closest first.
    Range,
    /// Label creation order.
    Label,
    /// Highest manual-solution confidence first.
    Confidence,
}

/// DEMON lock stage for one analysis target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    #[default]
    Searching,
    Tentative,
    Locked,
    Lost,
}

/// Which audio bus feeds the DEMON analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisSource {
    /// Own-ship self noise, all contacts and ping transients mixed.
    #[default]
    Composite,
    /// Isolated bus carrying only the selected contact.
    Selected,
}

/// Ocean profile preset selected once per scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OceanPreset {
    #[default]
    Temperate,
    Tropical,
    Arctic,
    Littoral,
}

/// Reactive maneuver a target adopts after being pinged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionKind {
    /// Ignores active transmissions.
    None,
    /// Turns away and speeds up, reverting after a timeout.
    Evade,
    /// Steers toward the ping origin.
    Intercept,
}
