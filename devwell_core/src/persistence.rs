//! Persistence of the store's durable collections.
//!
//! Each collection is JSON-encoded under its own key. Collections load
//! independently: a blob that fails to decode resets only that collection
//! to its default, with a warning, and the others still load.

use crate::blob::BlobStore;
use crate::{BreakRecord, DailyAggregate, Error, Result, UserPreferences};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Key for the per-day wellness aggregates
pub const HISTORICAL_DATA_KEY: &str = "historical_wellness_data";
/// Key for the completed break history
pub const BREAK_HISTORY_KEY: &str = "break_history";
/// Key for the user preferences record
pub const USER_SETTINGS_KEY: &str = "user_settings";

/// Everything that survives a restart
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PersistedState {
    pub historical_data: Vec<DailyAggregate>,
    pub break_history: Vec<BreakRecord>,
    pub preferences: UserPreferences,
}

/// Reads and writes [`PersistedState`] against a blob store
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn BlobStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Load every collection. Never fails: unreadable or undecodable
    /// collections come back as defaults. Break records that are unfinished
    /// or end before they start are dropped one by one.
    pub fn load(&self) -> PersistedState {
        let historical_data: Vec<DailyAggregate> =
            self.load_collection(HISTORICAL_DATA_KEY).unwrap_or_default();
        let mut break_history: Vec<BreakRecord> =
            self.load_collection(BREAK_HISTORY_KEY).unwrap_or_default();
        let before = break_history.len();
        break_history.retain(|b| {
            let valid = b.is_valid_history_entry();
            if !valid {
                tracing::warn!(
                    "Dropping break {} from history: completed={}, started_at={}, ended_at={:?}",
                    b.id,
                    b.is_completed,
                    b.started_at,
                    b.ended_at
                );
            }
            valid
        });
        if break_history.len() != before {
            tracing::warn!(
                "Dropped {} inconsistent break records",
                before - break_history.len()
            );
        }
        let mut preferences: UserPreferences =
            self.load_collection(USER_SETTINGS_KEY).unwrap_or_default();

        if preferences.repair() {
            tracing::warn!("Repaired stored preferred break types (duplicates or empty list)");
        }

        tracing::info!(
            "Loaded {} daily aggregates and {} breaks",
            historical_data.len(),
            break_history.len()
        );

        PersistedState {
            historical_data,
            break_history,
            preferences,
        }
    }

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("No stored value for {}, using default", key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}. Using default.", key, e);
                return None;
            }
        };

        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Failed to decode {}: {}. Using default.", key, e);
                None
            }
        }
    }

    /// Write every collection. Each key is attempted even if an earlier one
    /// failed; the first failure is returned.
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        let results = [
            self.save_collection(HISTORICAL_DATA_KEY, &state.historical_data),
            self.save_collection(BREAK_HISTORY_KEY, &state.break_history),
            self.save_collection(USER_SETTINGS_KEY, &state.preferences),
        ];

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::debug!(
                    "Persisted {} daily aggregates and {} breaks",
                    state.historical_data.len(),
                    state.break_history.len()
                );
                Ok(())
            }
        }
    }

    fn save_collection<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.put(key, &bytes).map_err(|e| {
            tracing::warn!("Failed to write {}: {}", key, e);
            e
        })
    }

    /// Remove every persisted collection
    pub fn clear(&self) -> Result<()> {
        let mut failed = Vec::new();
        for key in [HISTORICAL_DATA_KEY, BREAK_HISTORY_KEY, USER_SETTINGS_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!("Failed to remove {}: {}", key, e);
                failed.push(key);
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Storage(format!("failed to remove {}", failed.join(", "))))
        }
    }
}
