//! Reactive behavior evaluation.
//!
//! Pure functions that decide how a target responds when an active ping
//! reaches it. No engine dependency; operates on plain data.

use fathom_core::constants::*;
use fathom_core::enums::{ReactionKind, TargetKind};
use fathom_core::events::ManeuverOrder;
use fathom_core::target::TargetId;
use fathom_core::types::Position;

use crate::profiles::get_profile;

/// Input to the reaction FSM for a single pinged target.
pub struct ReactionContext {
    pub target_id: TargetId,
    pub kind: TargetKind,
    pub position: Position,
    pub course: f64,
    pub speed: f64,
    /// Where the ping was transmitted from.
    pub ping_origin: Position,
    pub now: f64,
}

/// Evaluate the reaction for one pinged target. None means no maneuver.
pub fn react_to_ping(ctx: &ReactionContext) -> Option<ManeuverOrder> {
    let profile = get_profile(ctx.kind);
    let speed = if ctx.speed.is_finite() && ctx.speed > 0.0 {
        ctx.speed
    } else {
        profile.default_speed
    };

    match profile.reaction {
        ReactionKind::None => None,
        ReactionKind::Evade => Some(ManeuverOrder {
            target_id: ctx.target_id.clone(),
            reaction: ReactionKind::Evade,
            course: evasion_course(ctx),
            speed: speed * EVASION_SPEED_FACTOR,
            revert_at: Some(ctx.now + EVASION_DURATION_SECS),
        }),
        ReactionKind::Intercept => Some(ManeuverOrder {
            target_id: ctx.target_id.clone(),
            reaction: ReactionKind::Intercept,
            course: ctx.position.bearing_to(&ctx.ping_origin),
            speed: speed * INTERCEPT_SPEED_FACTOR,
            revert_at: None,
        }),
    }
}

/// Course that opens range from the ping origin.
///
/// Targets already heading away keep running down the opening bearing;
/// targets closing turn beam-on, toward whichever side is nearer their
/// current course.
fn evasion_course(ctx: &ReactionContext) -> f64 {
    let opening = ctx.ping_origin.bearing_to(&ctx.position);
    let course = if ctx.course.is_finite() {
        ctx.course
    } else {
        opening
    };
    let off = signed_diff(course, opening);
    if off.abs() <= EVASION_TURN_DEG {
        opening
    } else {
        (opening + EVASION_TURN_DEG * off.signum()).rem_euclid(360.0)
    }
}

/// Signed difference `a - b` in degrees, in (-180, 180].
fn signed_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}
