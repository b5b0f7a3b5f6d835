//! The wellness state store.
//!
//! [`WellnessStore`] owns every piece of mutable state: the active break,
//! the break history, the per-day wellness aggregates, the latest sample and
//! the user's preferences. Operations are synchronous and never fail; each
//! mutation ends by handing a snapshot to the debounced autosaver.
//!
//! The store is meant for a single owner. It is not shared between threads.

use crate::autosave::Autosaver;
use crate::blob::{BlobStore, FileBlobStore};
use crate::breaks::BreakSession;
use crate::clock::{Clock, SystemClock};
use crate::engine::recommend_break;
use crate::history::{self, TodayStats, DEFAULT_STREAK_LOOKBACK_DAYS};
use crate::persistence::{PersistedState, Persistence};
use crate::{
    BreakRecord, BreakType, Config, DailyAggregate, Mood, Result, UserPreferences,
    WellnessSample,
};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

/// Tuning knobs for a store
#[derive(Clone, Debug)]
pub struct StoreOptions {
    pub debounce: std::time::Duration,
    pub streak_lookback_days: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            debounce: std::time::Duration::from_secs(1),
            streak_lookback_days: DEFAULT_STREAK_LOOKBACK_DAYS,
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            debounce: config.persistence.debounce(),
            streak_lookback_days: config.stats.streak_lookback_days,
        }
    }
}

pub struct WellnessStore {
    clock: Arc<dyn Clock>,
    options: StoreOptions,
    session: BreakSession,
    break_history: Vec<BreakRecord>,
    historical_data: Vec<DailyAggregate>,
    current_sample: WellnessSample,
    preferences: UserPreferences,
    autosaver: Autosaver,
}

impl WellnessStore {
    /// Open the file-backed store under the configured data directory
    pub fn open(config: &Config) -> Result<Self> {
        let blobs = FileBlobStore::open(&config.data.data_dir)?;
        Ok(Self::with_store(
            Arc::new(blobs),
            Arc::new(SystemClock),
            StoreOptions::from(config),
        ))
    }

    /// Build a store over any blob backend. Loads persisted state
    /// synchronously before returning.
    pub fn with_store(
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        options: StoreOptions,
    ) -> Self {
        let persistence = Persistence::new(blobs);
        let PersistedState {
            historical_data,
            break_history,
            preferences,
        } = persistence.load();

        let autosaver = Autosaver::spawn(persistence, options.debounce);
        let current_sample = WellnessSample::neutral(clock.now());

        Self {
            clock,
            options,
            session: BreakSession::new(),
            break_history,
            historical_data,
            current_sample,
            preferences,
            autosaver,
        }
    }

    fn snapshot(&self) -> PersistedState {
        PersistedState {
            historical_data: self.historical_data.clone(),
            break_history: self.break_history.clone(),
            preferences: self.preferences.clone(),
        }
    }

    fn schedule_persist(&self) {
        self.autosaver.schedule(self.snapshot());
    }

    // ------------------------------------------------------------------
    // Breaks
    // ------------------------------------------------------------------

    /// Start a break of the given type. Replaces any running break.
    pub fn start_break(&mut self, break_type: BreakType) -> &BreakRecord {
        let now = self.clock.now();
        self.session.start(break_type, now)
    }

    /// Complete the running break and append it to history. Does nothing
    /// when no break is running.
    pub fn complete_break(&mut self, mood: Mood, notes: Option<String>) {
        let now = self.clock.now();
        if let Some(record) = self.session.complete(mood, notes, now) {
            self.break_history.push(record);
            self.schedule_persist();
        }
    }

    /// Drop the running break without recording it
    pub fn cancel_break(&mut self) {
        self.session.cancel();
    }

    pub fn active_break(&self) -> Option<&BreakRecord> {
        self.session.active()
    }

    /// Live elapsed time of the running break
    pub fn active_break_elapsed(&self) -> Option<Duration> {
        self.session.elapsed(self.clock.now())
    }

    /// Completed breaks in completion order
    pub fn break_history(&self) -> &[BreakRecord] {
        &self.break_history
    }

    pub fn completed_breaks(&self, filter: Option<BreakType>) -> Vec<&BreakRecord> {
        history::completed_breaks(&self.break_history, filter)
    }

    pub fn breaks_on(&self, day: NaiveDate, filter: Option<BreakType>) -> Vec<&BreakRecord> {
        history::breaks_on(&self.break_history, day, filter)
    }

    pub fn breaks_by_day(&self, filter: Option<BreakType>) -> Vec<(NaiveDate, Vec<&BreakRecord>)> {
        history::breaks_by_day(&self.break_history, filter)
    }

    // ------------------------------------------------------------------
    // Wellness samples
    // ------------------------------------------------------------------

    /// Make `sample` the current reading and fold it into its day's aggregate
    pub fn record_wellness_sample(&mut self, sample: WellnessSample) {
        self.current_sample = sample.clone();
        history::record_sample(&mut self.historical_data, sample);
        self.schedule_persist();
    }

    /// Latest recorded sample (neutral readings until one arrives)
    pub fn current_sample(&self) -> &WellnessSample {
        &self.current_sample
    }

    pub fn historical_data(&self) -> &[DailyAggregate] {
        &self.historical_data
    }

    pub fn aggregate_for(&self, day: NaiveDate) -> Option<&DailyAggregate> {
        history::aggregate_for(&self.historical_data, day)
    }

    // ------------------------------------------------------------------
    // Stats and recommendation
    // ------------------------------------------------------------------

    pub fn current_streak(&self) -> u32 {
        history::current_streak(
            &self.break_history,
            self.clock.today(),
            self.options.streak_lookback_days,
        )
    }

    pub fn total_breaks_today(&self) -> usize {
        history::total_breaks_on(&self.break_history, self.clock.today())
    }

    pub fn total_break_minutes_today(&self) -> i64 {
        history::total_break_minutes_on(&self.break_history, self.clock.today())
    }

    pub fn today_stats(&self) -> TodayStats {
        history::today_stats(
            &self.break_history,
            self.clock.today(),
            self.options.streak_lookback_days,
        )
    }

    /// Suggested next break for the current sample and local hour
    pub fn recommendation(&self) -> BreakType {
        recommend_break(
            &self.current_sample,
            &self.preferences,
            self.clock.local_hour(),
        )
    }

    // ------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn set_break_notifications(&mut self, enabled: bool) {
        self.update_preferences(|p| {
            let changed = p.break_notifications != enabled;
            p.break_notifications = enabled;
            changed
        });
    }

    pub fn set_stress_notifications(&mut self, enabled: bool) {
        self.update_preferences(|p| {
            let changed = p.stress_notifications != enabled;
            p.stress_notifications = enabled;
            changed
        });
    }

    pub fn set_inactivity_notifications(&mut self, enabled: bool) {
        self.update_preferences(|p| {
            let changed = p.inactivity_notifications != enabled;
            p.inactivity_notifications = enabled;
            changed
        });
    }

    /// Returns whether the type was added
    pub fn add_preferred_break_type(&mut self, break_type: BreakType) -> bool {
        self.update_preferences(|p| p.add_preferred(break_type))
    }

    /// Returns whether the type was removed; removing the last one is refused
    pub fn remove_preferred_break_type(&mut self, break_type: BreakType) -> bool {
        self.update_preferences(|p| p.remove_preferred(break_type))
    }

    /// Returns whether anything changed
    pub fn toggle_preferred_break_type(&mut self, break_type: BreakType) -> bool {
        self.update_preferences(|p| p.toggle_preferred(break_type))
    }

    /// Returns whether the list was replaced; an empty list is refused
    pub fn set_preferred_break_types(&mut self, types: &[BreakType]) -> bool {
        self.update_preferences(|p| p.set_preferred(types))
    }

    fn update_preferences<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut UserPreferences) -> bool,
    {
        let changed = f(&mut self.preferences);
        if changed {
            self.schedule_persist();
        }
        changed
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Forget everything: history, aggregates, running break, preferences.
    /// Persisted collections are deleted.
    pub fn reset_all_data(&mut self) {
        self.session.clear();
        self.break_history.clear();
        self.historical_data.clear();
        self.preferences = UserPreferences::default();
        self.current_sample = WellnessSample::neutral(self.clock.now());
        self.autosaver.clear();
        tracing::info!("Reset all wellness data");
    }

    /// Wait for any pending write to reach the blob store
    pub fn flush(&self) {
        self.autosaver.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::clock::{local_instant, ManualClock};
    use crate::StressLevel;

    struct Fixture {
        blobs: Arc<MemoryBlobStore>,
        clock: ManualClock,
        store: WellnessStore,
    }

    fn fixture() -> Fixture {
        crate::logging::init_test();
        let blobs = Arc::new(MemoryBlobStore::new());
        let day = NaiveDate::from_ymd_opt(2024, 9, 10).unwrap();
        let clock = ManualClock::new(local_instant(day, 10, 0));
        let store = WellnessStore::with_store(
            blobs.clone(),
            Arc::new(clock.clone()),
            StoreOptions {
                debounce: std::time::Duration::from_secs(60),
                ..StoreOptions::default()
            },
        );
        Fixture { blobs, clock, store }
    }

    #[test]
    fn test_start_complete_appends_one_record() {
        let Fixture { clock, mut store, .. } = fixture();

        store.start_break(BreakType::Walk);
        clock.advance(Duration::minutes(5));
        assert_eq!(store.active_break_elapsed(), Some(Duration::minutes(5)));
        store.complete_break(Mood::Great, Some("fresh air".into()));

        assert!(store.active_break().is_none());
        assert_eq!(store.break_history().len(), 1);
        let record = &store.break_history()[0];
        assert!(record.is_completed);
        assert!(record.ended_at.unwrap() >= record.started_at);
        assert_eq!(record.notes.as_deref(), Some("fresh air"));
        assert_eq!(store.total_breaks_today(), 1);
        assert_eq!(store.total_break_minutes_today(), 5);
    }

    #[test]
    fn test_cancel_appends_nothing() {
        let Fixture { mut store, .. } = fixture();

        store.start_break(BreakType::Music);
        store.cancel_break();

        assert!(store.active_break().is_none());
        assert!(store.break_history().is_empty());
    }

    #[test]
    fn test_complete_without_active_break_is_ignored() {
        let Fixture { blobs, mut store, .. } = fixture();

        store.complete_break(Mood::Tired, None);
        store.cancel_break();
        store.flush();

        assert!(store.break_history().is_empty());
        assert!(blobs.keys().is_empty());
    }

    #[test]
    fn test_samples_aggregate_per_day() {
        let Fixture { clock, mut store, .. } = fixture();
        let today = clock.today();

        store.record_wellness_sample(WellnessSample::neutral(clock.now()));
        clock.advance(Duration::hours(2));
        store.record_wellness_sample(WellnessSample {
            stress_level: StressLevel::Low,
            ..WellnessSample::neutral(clock.now())
        });

        assert_eq!(store.historical_data().len(), 1);
        let aggregate = store.aggregate_for(today).unwrap();
        assert_eq!(aggregate.samples.len(), 2);
        assert_eq!(aggregate.average_score(), (57 + 62) / 2);
        assert_eq!(store.current_sample().stress_level, StressLevel::Low);
    }

    #[test]
    fn test_recommendation_uses_current_sample() {
        let Fixture { clock, mut store, .. } = fixture();

        store.record_wellness_sample(WellnessSample {
            stress_level: StressLevel::High,
            ..WellnessSample::neutral(clock.now())
        });
        assert_eq!(store.recommendation(), BreakType::Mindfulness);

        assert!(store.remove_preferred_break_type(BreakType::Mindfulness));
        assert_eq!(store.recommendation(), BreakType::Stretch);
    }

    #[test]
    fn test_default_recommendation_round_robins_by_hour() {
        let Fixture { mut store, .. } = fixture();

        // Neutral sample: medium stress, 5000 steps, exactly 3600s coding
        assert!(store.set_preferred_break_types(&[BreakType::Water, BreakType::Walk]));
        // 10:00 -> 10 % 2 == 0
        assert_eq!(store.recommendation(), BreakType::Water);
    }

    #[test]
    fn test_last_preferred_type_cannot_be_removed() {
        let Fixture { mut store, .. } = fixture();

        assert!(store.set_preferred_break_types(&[BreakType::Stretch]));
        assert!(!store.remove_preferred_break_type(BreakType::Stretch));
        assert!(!store.toggle_preferred_break_type(BreakType::Stretch));
        assert!(!store.set_preferred_break_types(&[]));
        assert_eq!(store.preferences().preferred_break_types(), &[BreakType::Stretch]);
    }

    #[test]
    fn test_streak_through_store() {
        let Fixture { clock, mut store, .. } = fixture();
        let today = clock.now();

        for days_ago in [2, 1, 0] {
            clock.set(today - Duration::days(days_ago));
            store.start_break(BreakType::Water);
            clock.advance(Duration::minutes(1));
            store.complete_break(Mood::Good, None);
        }
        clock.set(today);

        assert_eq!(store.current_streak(), 3);
        assert_eq!(
            store.today_stats(),
            TodayStats {
                breaks: 1,
                break_minutes: 1,
                streak: 3
            }
        );
    }

    #[test]
    fn test_mutations_persist_after_flush() {
        let Fixture { blobs, clock, mut store } = fixture();

        store.start_break(BreakType::Stretch);
        store.complete_break(Mood::Neutral, None);
        store.record_wellness_sample(WellnessSample::neutral(clock.now()));
        store.set_stress_notifications(false);
        store.flush();

        let reloaded = Persistence::new(blobs).load();
        assert_eq!(reloaded.break_history, store.break_history());
        assert_eq!(reloaded.historical_data, store.historical_data());
        assert!(!reloaded.preferences.stress_notifications);
    }

    #[test]
    fn test_reset_restores_defaults_and_clears_storage() {
        let Fixture { blobs, clock, mut store } = fixture();

        store.start_break(BreakType::Walk);
        store.complete_break(Mood::Good, None);
        store.record_wellness_sample(WellnessSample::neutral(clock.now()));
        store.set_break_notifications(false);
        store.set_preferred_break_types(&[BreakType::Music]);
        store.start_break(BreakType::Water);

        store.reset_all_data();
        store.flush();

        assert!(store.break_history().is_empty());
        assert!(store.historical_data().is_empty());
        assert!(store.active_break().is_none());
        assert_eq!(store.preferences(), &UserPreferences::default());
        assert!(blobs.keys().is_empty());
    }
}
