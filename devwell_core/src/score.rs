//! Wellness score calculation.
//!
//! Additive model over a base of 50, clamped to `0..=100` once at the end.
//! Integer division truncates exactly as stored scores were computed, so
//! historical scores stay comparable.

use crate::{StressLevel, WellnessSample};

const BASE_SCORE: i32 = 50;

/// Score a sample. Pure and deterministic.
pub fn wellness_score(sample: &WellnessSample) -> u8 {
    let score = BASE_SCORE
        + heart_rate_delta(sample.heart_rate)
        + hrv_delta(sample.hrv_ms)
        + step_delta(sample.step_count)
        + stand_delta(sample.stand_hours)
        + code_session_delta(sample.code_session_seconds)
        + stress_delta(sample.stress_level);

    score.clamp(0, 100) as u8
}

fn heart_rate_delta(bpm: u32) -> i32 {
    match bpm {
        0..=59 => 5,
        60..=69 => 4,
        70..=79 => 2,
        80..=100 => 0,
        _ => -5,
    }
}

fn hrv_delta(hrv_ms: f64) -> i32 {
    if hrv_ms > 50.0 {
        5
    } else if hrv_ms > 30.0 {
        3
    } else if hrv_ms < 15.0 {
        -3
    } else {
        0
    }
}

fn step_delta(steps: u32) -> i32 {
    (steps / 2000).min(5) as i32
}

fn stand_delta(stand_hours: u32) -> i32 {
    (stand_hours / 2).min(5) as i32
}

fn code_session_delta(seconds: f64) -> i32 {
    if seconds > 7200.0 {
        -3
    } else if seconds > 3600.0 {
        -1
    } else {
        0
    }
}

fn stress_delta(level: StressLevel) -> i32 {
    match level {
        StressLevel::Low => 5,
        StressLevel::Medium => 0,
        StressLevel::High => -5,
    }
}
