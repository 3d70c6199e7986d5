//! Timed reversion of evasive maneuvers.

use std::collections::HashMap;

use fathom_core::enums::ReactionKind;
use fathom_core::events::ManeuverOrder;
use fathom_core::target::TargetId;

/// Course and speed a target held before it started evading.
#[derive(Debug, Clone, Copy)]
struct ActiveEvasion {
    prior_course: f64,
    prior_speed: f64,
    revert_at: f64,
}

/// Remembers pre-evasion kinematics and issues revert orders when evasions expire.
#[derive(Debug, Default)]
pub struct ReactionTracker {
    active: HashMap<TargetId, ActiveEvasion>,
}

impl ReactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an order issued to a target whose current course/speed are given.
    ///
    /// A repeat evasion keeps the original pre-evasion kinematics and
    /// extends the revert time.
    pub fn record(&mut self, order: &ManeuverOrder, current_course: f64, current_speed: f64) {
        let Some(revert_at) = order.revert_at else {
            // Open-ended reactions replace any pending evasion.
            self.active.remove(&order.target_id);
            return;
        };
        self.active
            .entry(order.target_id.clone())
            .and_modify(|e| e.revert_at = revert_at)
            .or_insert(ActiveEvasion {
                prior_course: current_course,
                prior_speed: current_speed,
                revert_at,
            });
    }

    /// Number of targets currently evading.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether a target is currently evading.
    pub fn is_evading(&self, target_id: &str) -> bool {
        self.active.contains_key(target_id)
    }

    /// Emit revert orders for every evasion that expired by `now`.
    pub fn expire(&mut self, now: f64) -> Vec<ManeuverOrder> {
        let mut expired: Vec<TargetId> = self
            .active
            .iter()
            .filter(|(_, e)| e.revert_at <= now)
            .map(|(id, _)| id.clone())
            .collect();
        expired.sort();

        expired
            .into_iter()
            .filter_map(|id| {
                let e = self.active.remove(&id)?;
                Some(ManeuverOrder {
                    target_id: id,
                    reaction: ReactionKind::None,
                    course: e.prior_course,
                    speed: e.prior_speed,
                    revert_at: None,
                })
            })
            .collect()
    }

    /// Forget targets that no longer exist.
    pub fn retain_targets(&mut self, alive: impl Fn(&str) -> bool) {
        self.active.retain(|id, _| alive(id.as_str()));
    }
}
