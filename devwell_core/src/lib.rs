#![forbid(unsafe_code)]

//! Core state and scoring engine for the DevWell break tracker.
//!
//! This crate provides:
//! - Domain types (breaks, moods, wellness samples, daily aggregates)
//! - Wellness scoring and break recommendation
//! - Historical aggregation (per-day averages, streaks, today stats)
//! - Persistence (blob store, debounced autosave)
//! - The [`WellnessStore`] facade tying it together

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod clock;
pub mod score;
pub mod history;
pub mod breaks;
pub mod engine;
pub mod blob;
pub mod persistence;
pub mod autosave;
pub mod state;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use clock::{Clock, ManualClock, SystemClock};
pub use score::wellness_score;
pub use history::TodayStats;
pub use engine::recommend_break;
pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use persistence::{PersistedState, Persistence};
pub use state::{StoreOptions, WellnessStore};
