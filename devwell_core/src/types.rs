//! Core domain types for the DevWell system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Break types, moods and stress levels
//! - Break records
//! - Wellness samples and their per-day aggregates
//! - User preferences

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

/// Kind of break the user can take
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    Mindfulness,
    Walk,
    Water,
    Stretch,
    Music,
    Custom,
}

impl BreakType {
    /// Every break type, in canonical order
    pub const ALL: [BreakType; 6] = [
        BreakType::Mindfulness,
        BreakType::Walk,
        BreakType::Water,
        BreakType::Stretch,
        BreakType::Music,
        BreakType::Custom,
    ];

    /// Suggested length of a break of this type
    pub fn recommended_duration(self) -> Duration {
        let seconds = match self {
            BreakType::Mindfulness => 180,
            BreakType::Walk => 300,
            BreakType::Water => 60,
            BreakType::Stretch => 120,
            BreakType::Music => 300,
            BreakType::Custom => 300,
        };
        Duration::seconds(seconds)
    }
}

/// Post-break self-report
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Tired,
    Stressed,
}

/// Stress tag attached to a wellness sample
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

// ============================================================================
// Breaks
// ============================================================================

/// A single break, in progress or completed
///
/// `ended_at` is `Some` exactly when `is_completed` is true.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BreakRecord {
    pub id: Uuid,
    pub break_type: BreakType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
    pub is_completed: bool,
}

impl BreakRecord {
    /// Begin a new, uncompleted break
    pub fn start(break_type: BreakType, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            break_type,
            started_at: now,
            ended_at: None,
            mood: None,
            notes: None,
            is_completed: false,
        }
    }

    /// Close out the break. Consumes the in-progress record so a completed
    /// record can never be completed twice.
    pub fn complete(mut self, mood: Mood, notes: Option<String>, now: DateTime<Utc>) -> Self {
        self.ended_at = Some(now);
        self.mood = Some(mood);
        self.notes = notes;
        self.is_completed = true;
        self
    }

    /// A finished record as it may appear in history: completed, with an end
    /// no earlier than its start
    pub fn is_valid_history_entry(&self) -> bool {
        match self.ended_at {
            Some(end) => self.is_completed && end >= self.started_at,
            None => false,
        }
    }

    /// Elapsed time; live (`now - start`) while the break is still running
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        match self.ended_at {
            Some(end) => end - self.started_at,
            None => now - self.started_at,
        }
    }
}

// ============================================================================
// Wellness samples
// ============================================================================

/// One resolved reading of the user's physiological proxies
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WellnessSample {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    /// Beats per minute
    pub heart_rate: u32,
    /// Heart-rate variability in milliseconds
    pub hrv_ms: f64,
    pub step_count: u32,
    /// Hours with standing activity today (0-24)
    pub stand_hours: u32,
    /// Length of the current coding session in seconds
    pub code_session_seconds: f64,
    pub stress_level: StressLevel,
}

impl WellnessSample {
    /// Sample with neutral readings, used before any real sample arrives
    pub fn neutral(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: now,
            heart_rate: 75,
            hrv_ms: 25.0,
            step_count: 5000,
            stand_hours: 6,
            code_session_seconds: 3600.0,
            stress_level: StressLevel::Medium,
        }
    }

    /// Wellness score in `0..=100`
    pub fn wellness_score(&self) -> u8 {
        crate::score::wellness_score(self)
    }
}

/// All samples recorded on one local calendar day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyAggregate {
    pub id: Uuid,
    pub day: NaiveDate,
    pub samples: Vec<WellnessSample>,
}

impl DailyAggregate {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            day,
            samples: Vec::new(),
        }
    }

    /// Integer mean of the sample scores, truncating; 0 when empty
    pub fn average_score(&self) -> u8 {
        if self.samples.is_empty() {
            return 0;
        }
        let total: u32 = self
            .samples
            .iter()
            .map(|s| u32::from(s.wellness_score()))
            .sum();
        // mean of values <= 100 always fits
        (total / self.samples.len() as u32) as u8
    }
}

// ============================================================================
// Preferences
// ============================================================================

/// User-facing settings. `preferred_break_types` is never empty.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    pub break_notifications: bool,
    pub stress_notifications: bool,
    pub inactivity_notifications: bool,
    preferred_break_types: Vec<BreakType>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            break_notifications: true,
            stress_notifications: true,
            inactivity_notifications: true,
            preferred_break_types: BreakType::ALL.to_vec(),
        }
    }
}

impl UserPreferences {
    /// Preferred types in round-robin order
    pub fn preferred_break_types(&self) -> &[BreakType] {
        &self.preferred_break_types
    }

    pub fn prefers(&self, break_type: BreakType) -> bool {
        self.preferred_break_types.contains(&break_type)
    }

    /// Append a type if it is not already preferred. Returns whether
    /// anything changed.
    pub fn add_preferred(&mut self, break_type: BreakType) -> bool {
        if self.prefers(break_type) {
            return false;
        }
        self.preferred_break_types.push(break_type);
        true
    }

    /// Remove a type. Rejected when it is the only one left.
    pub fn remove_preferred(&mut self, break_type: BreakType) -> bool {
        if !self.prefers(break_type) {
            return false;
        }
        if self.preferred_break_types.iter().all(|t| *t == break_type) {
            tracing::warn!(
                "Refusing to remove {:?}: at least one preferred break type is required",
                break_type
            );
            return false;
        }
        self.preferred_break_types.retain(|t| *t != break_type);
        true
    }

    /// Remove the type if preferred (subject to the non-empty rule),
    /// otherwise append it.
    pub fn toggle_preferred(&mut self, break_type: BreakType) -> bool {
        if self.prefers(break_type) {
            self.remove_preferred(break_type)
        } else {
            self.add_preferred(break_type)
        }
    }

    /// Replace the whole list. Duplicates are dropped, keeping first
    /// occurrence; an empty list is rejected.
    pub fn set_preferred(&mut self, types: &[BreakType]) -> bool {
        let deduped = dedup_keep_first(types);
        if deduped.is_empty() {
            tracing::warn!("Refusing to clear preferred break types");
            return false;
        }
        self.preferred_break_types = deduped;
        true
    }

    /// Restore the non-empty invariant on a record built from outside data.
    /// Duplicates are dropped (first occurrence wins) and an empty list is
    /// replaced by every break type. Returns whether a repair was needed.
    pub(crate) fn repair(&mut self) -> bool {
        let deduped = dedup_keep_first(&self.preferred_break_types);
        let mut repaired = deduped.len() != self.preferred_break_types.len();
        self.preferred_break_types = deduped;

        if self.preferred_break_types.is_empty() {
            self.preferred_break_types = BreakType::ALL.to_vec();
            repaired = true;
        }
        repaired
    }
}

fn dedup_keep_first(types: &[BreakType]) -> Vec<BreakType> {
    let mut deduped: Vec<BreakType> = Vec::with_capacity(types.len());
    for t in types {
        if !deduped.contains(t) {
            deduped.push(*t);
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_type_serializes_snake_case() {
        let json = serde_json::to_string(&BreakType::Mindfulness).unwrap();
        assert_eq!(json, "\"mindfulness\"");
        let parsed: Mood = serde_json::from_str("\"stressed\"").unwrap();
        assert_eq!(parsed, Mood::Stressed);
    }

    #[test]
    fn test_recommended_durations() {
        assert_eq!(BreakType::Water.recommended_duration(), Duration::seconds(60));
        assert_eq!(BreakType::Stretch.recommended_duration(), Duration::minutes(2));
        assert_eq!(BreakType::Walk.recommended_duration(), Duration::minutes(5));
    }

    #[test]
    fn test_complete_sets_end_and_flag() {
        let start = Utc::now();
        let record = BreakRecord::start(BreakType::Walk, start);
        assert!(!record.is_completed);
        assert!(record.ended_at.is_none());

        let end = start + Duration::minutes(4);
        let done = record.complete(Mood::Good, Some("around the block".into()), end);
        assert!(done.is_completed);
        assert_eq!(done.ended_at, Some(end));
        assert_eq!(done.mood, Some(Mood::Good));
        assert_eq!(done.duration(end + Duration::hours(1)), Duration::minutes(4));
    }

    #[test]
    fn test_in_progress_duration_is_live() {
        let start = Utc::now();
        let record = BreakRecord::start(BreakType::Water, start);
        assert_eq!(record.duration(start + Duration::seconds(42)), Duration::seconds(42));
    }

    #[test]
    fn test_empty_aggregate_average_is_zero() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(DailyAggregate::new(day).average_score(), 0);
    }

    #[test]
    fn test_default_preferences() {
        let prefs = UserPreferences::default();
        assert!(prefs.break_notifications);
        assert!(prefs.stress_notifications);
        assert!(prefs.inactivity_notifications);
        assert_eq!(prefs.preferred_break_types(), &BreakType::ALL);
    }

    #[test]
    fn test_cannot_remove_last_preferred_type() {
        let mut prefs = UserPreferences::default();
        assert!(prefs.set_preferred(&[BreakType::Water]));

        assert!(!prefs.remove_preferred(BreakType::Water));
        assert!(!prefs.toggle_preferred(BreakType::Water));
        assert_eq!(prefs.preferred_break_types(), &[BreakType::Water]);
    }

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut prefs = UserPreferences::default();
        assert!(prefs.toggle_preferred(BreakType::Music));
        assert!(!prefs.prefers(BreakType::Music));
        assert!(prefs.toggle_preferred(BreakType::Music));
        assert_eq!(prefs.preferred_break_types().last(), Some(&BreakType::Music));
    }

    #[test]
    fn test_set_preferred_rejects_empty_and_dedupes() {
        let mut prefs = UserPreferences::default();
        assert!(!prefs.set_preferred(&[]));
        assert_eq!(prefs.preferred_break_types().len(), 6);

        assert!(prefs.set_preferred(&[BreakType::Walk, BreakType::Walk, BreakType::Water]));
        assert_eq!(prefs.preferred_break_types(), &[BreakType::Walk, BreakType::Water]);
    }

    #[test]
    fn test_repair_dedupes_before_empty_check() {
        let mut prefs: UserPreferences = serde_json::from_str(
            r#"{"break_notifications":true,"stress_notifications":true,"inactivity_notifications":true,"preferred_break_types":["walk","water","walk"]}"#,
        )
        .unwrap();

        assert!(prefs.repair());
        assert_eq!(prefs.preferred_break_types(), &[BreakType::Walk, BreakType::Water]);
        assert!(!prefs.repair());
    }

    #[test]
    fn test_remove_refuses_when_only_duplicates_remain() {
        let mut prefs: UserPreferences = serde_json::from_str(
            r#"{"break_notifications":true,"stress_notifications":true,"inactivity_notifications":true,"preferred_break_types":["walk","walk"]}"#,
        )
        .unwrap();

        assert!(!prefs.remove_preferred(BreakType::Walk));
        assert!(!prefs.preferred_break_types().is_empty());
    }

    #[test]
    fn test_history_entry_validity() {
        let start = Utc::now();
        let running = BreakRecord::start(BreakType::Walk, start);
        assert!(!running.is_valid_history_entry());

        let done = running.clone().complete(Mood::Good, None, start + Duration::minutes(1));
        assert!(done.is_valid_history_entry());

        let ended_early = BreakRecord {
            ended_at: Some(start - Duration::hours(1)),
            ..done.clone()
        };
        assert!(!ended_early.is_valid_history_entry());

        let end_without_flag = BreakRecord {
            is_completed: false,
            ..done
        };
        assert!(!end_without_flag.is_valid_history_entry());
    }

    #[test]
    fn test_add_preferred_ignores_duplicates() {
        let mut prefs = UserPreferences::default();
        assert!(!prefs.add_preferred(BreakType::Walk));
        assert_eq!(prefs.preferred_break_types().len(), 6);
    }
}
