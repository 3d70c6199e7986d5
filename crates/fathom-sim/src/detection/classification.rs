//! Classification progress for detected targets.

use fathom_core::constants::*;
use fathom_core::enums::ClassificationState;
use fathom_core::target::ClassificationInfo;

fn rank(state: ClassificationState) -> u8 {
    match state {
        ClassificationState::Undetected => 0,
        ClassificationState::Ambiguous => 1,
        ClassificationState::Classified => 2,
        ClassificationState::Confirmed => 3,
    }
}

/// Stage implied by a progress value alone.
pub fn stage_for_progress(progress: f64) -> ClassificationState {
    if progress >= CLASSIFY_CONFIRMED_AT {
        ClassificationState::Confirmed
    } else if progress >= CLASSIFY_CLASSIFIED_AT {
        ClassificationState::Classified
    } else if progress > CLASSIFY_AMBIGUOUS_AT {
        ClassificationState::Ambiguous
    } else {
        ClassificationState::Undetected
    }
}

/// Advance or decay classification by `dt` seconds.
///
/// Strong signal advances progress (faster for the operator-selected
/// target) and re-derives the stage from progress. Weak signal decays
/// progress without touching the stage, and forgets the classification
/// once progress falls below the floor.
///
/// Returns true when the stage changed.
pub fn update_classification(
    info: &mut ClassificationInfo,
    snr: f64,
    threshold_db: f64,
    selected: bool,
    dt: f64,
    class_id: &str,
) -> bool {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let before = info.state;

    if snr > threshold_db + CLASSIFICATION_MARGIN_DB {
        let rate = if selected {
            CLASSIFY_RATE_SELECTED
        } else {
            CLASSIFY_RATE_BACKGROUND
        };
        info.progress = (info.progress + rate * dt).clamp(0.0, 1.0);

        info.state = stage_for_progress(info.progress);
        if rank(info.state) >= rank(ClassificationState::Classified)
            && info.identified_class.is_none()
        {
            info.identified_class = Some(class_id.to_string());
        }
        if info.state == ClassificationState::Confirmed {
            info.confirmed = true;
        }
    } else {
        info.progress = (info.progress - CLASSIFY_DECAY_RATE * dt).clamp(0.0, 1.0);
        if info.progress < CLASSIFY_FORGET_BELOW {
            info.state = ClassificationState::Undetected;
            info.identified_class = None;
            info.confirmed = false;
        }
    }

    info.state != before
}
