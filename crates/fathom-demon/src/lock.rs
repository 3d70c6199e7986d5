//! Hysteretic lock on a target's blade-passing frequency.

use serde::{Deserialize, Serialize};

use fathom_core::enums::LockState;
use fathom_core::target::TargetId;

use crate::config::DemonConfig;

/// Quality below which confidence releases twice as fast.
const POOR_QUALITY: f64 = 0.3;
/// Longest gap between updates that confidence integrates over (s).
const MAX_STEP_SECS: f64 = 1.0;

/// Lock state for one analysis target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemonLock {
    pub target_id: TargetId,
    pub bpf_estimate_hz: Option<f64>,
    /// 0..=1.
    pub confidence: f64,
    pub harmonic_hits: u32,
    pub harmonic_count: u32,
    pub state: LockState,
    pub last_update_time: f64,
}

impl DemonLock {
    pub fn new(target_id: impl Into<TargetId>, now: f64) -> Self {
        Self {
            target_id: target_id.into(),
            bpf_estimate_hz: None,
            confidence: 0.0,
            harmonic_hits: 0,
            harmonic_count: 0,
            state: LockState::Searching,
            last_update_time: now,
        }
    }

    /// Move confidence toward `evidence` with first-order dynamics.
    pub fn integrate(&mut self, evidence: f64, quality: f64, now: f64, config: &DemonConfig) {
        let evidence = if evidence.is_finite() {
            evidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let dt = if now.is_finite() {
            (now - self.last_update_time).clamp(0.0, MAX_STEP_SECS)
        } else {
            0.0
        };

        let tau = if evidence > self.confidence {
            config.attack_secs
        } else if quality < POOR_QUALITY {
            config.release_secs * 0.5
        } else {
            config.release_secs
        };
        let k = if tau > 0.0 { 1.0 - (-dt / tau).exp() } else { 1.0 };

        self.confidence = (self.confidence + (evidence - self.confidence) * k).clamp(0.0, 1.0);
        if now.is_finite() {
            self.last_update_time = now;
        }
    }

    /// Apply the threshold state machine. Returns the previous state on a change.
    pub fn advance_state(&mut self, config: &DemonConfig) -> Option<LockState> {
        let before = self.state;
        let conf = self.confidence;
        let hits = self.harmonic_hits;

        self.state = if conf < config.tentative_off {
            LockState::Searching
        } else {
            match before {
                LockState::Searching | LockState::Lost
                    if conf >= config.tentative_on && hits >= 1 =>
                {
                    LockState::Tentative
                }
                LockState::Tentative if conf >= config.lock_on && hits >= 2 => LockState::Locked,
                LockState::Locked if conf < config.lock_off || hits < 2 => LockState::Lost,
                other => other,
            }
        };

        (self.state != before).then_some(before)
    }

    /// No update within `timeout` seconds of `now`.
    pub fn is_stale(&self, now: f64, timeout: f64) -> bool {
        now - self.last_update_time > timeout
    }
}
