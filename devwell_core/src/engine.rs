//! Recommendation engine for choosing the next break.
//!
//! This module implements an ordered decision list over the latest wellness
//! sample and the user's preferred break types:
//! - High stress calls for a calming break
//! - A sedentary afternoon calls for movement
//! - A long coding session calls for a change of focus
//! - Otherwise rotate through the preferred types by hour

use crate::{BreakType, StressLevel, UserPreferences, WellnessSample};

/// Steps below which an afternoon counts as sedentary
const SEDENTARY_STEP_THRESHOLD: u32 = 2000;
/// Local hour after which the sedentary rule applies
const AFTERNOON_AFTER_HOUR: u32 = 12;
/// Coding session length (seconds) that triggers a focus break
const LONG_SESSION_SECONDS: f64 = 5400.0;

/// Recommend the next break type
///
/// ## Decision list (first match wins)
///
/// 1. **Stress**: high stress → Mindfulness if preferred, else Stretch
/// 2. **Movement**: fewer than 2000 steps after 12:00 → Walk if preferred,
///    else Stretch
/// 3. **Focus**: coding for more than 90 minutes → Music if preferred,
///    else Water
/// 4. **Round-robin**: `preferred[local_hour % preferred.len()]`
///
pub fn recommend_break(
    sample: &WellnessSample,
    preferences: &UserPreferences,
    local_hour: u32,
) -> BreakType {
    if sample.stress_level == StressLevel::High {
        tracing::debug!("High stress reading, recommending a calming break");
        return preferred_or(preferences, BreakType::Mindfulness, BreakType::Stretch);
    }

    if sample.step_count < SEDENTARY_STEP_THRESHOLD && local_hour > AFTERNOON_AFTER_HOUR {
        tracing::debug!(
            "Only {} steps by {}:00, recommending movement",
            sample.step_count,
            local_hour
        );
        return preferred_or(preferences, BreakType::Walk, BreakType::Stretch);
    }

    if sample.code_session_seconds > LONG_SESSION_SECONDS {
        tracing::debug!(
            "Coding for {} minutes, recommending a focus break",
            (sample.code_session_seconds / 60.0) as u64
        );
        return preferred_or(preferences, BreakType::Music, BreakType::Water);
    }

    let preferred = preferences.preferred_break_types();
    debug_assert!(!preferred.is_empty(), "preferred break types must never be empty");
    // Release builds fall back to Stretch rather than panic
    let next = preferred
        .get(local_hour as usize % preferred.len().max(1))
        .copied()
        .unwrap_or(BreakType::Stretch);
    tracing::debug!("Round-robin recommendation for hour {}: {:?}", local_hour, next);
    next
}

fn preferred_or(preferences: &UserPreferences, wanted: BreakType, fallback: BreakType) -> BreakType {
    if preferences.prefers(wanted) {
        wanted
    } else {
        fallback
    }
}
