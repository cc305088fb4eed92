//! Score history and profile persistence contracts.
//!
//! Storage backends implement [`HistoryStore`] and [`ProfileStore`]; the
//! in-memory [`MemoryStore`] backs tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{ScoreRecord, UserProfile};

/// Per-user, append-only list of score records.
pub trait HistoryStore: Send + Sync {
    /// All records for `user_key` in insertion order; empty if there are none.
    fn read(&self, user_key: &str) -> Result<Vec<ScoreRecord>, StoreError>;

    /// Replace the stored sequence for `user_key`.
    fn write(&self, user_key: &str, records: &[ScoreRecord]) -> Result<(), StoreError>;

    /// Append one record, keeping every earlier entry in place.
    fn append(&self, user_key: &str, record: &ScoreRecord) -> Result<(), StoreError> {
        let mut records = self.read(user_key)?;
        records.push(record.clone());
        self.write(user_key, &records)
    }
}

/// Single slot holding the active profile.
pub trait ProfileStore: Send + Sync {
    fn load_profile(&self) -> Result<Option<UserProfile>, StoreError>;

    fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError>;
}

/// History key for a user: `<prefix>_<display name>`.
///
/// Two users with the same display name share a history.
pub fn history_key(prefix: &str, profile: &UserProfile) -> String {
    format!("{prefix}_{}", profile.display_name)
}

/// Stores everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    histories: Mutex<HashMap<String, Vec<ScoreRecord>>>,
    profile: Mutex<Option<UserProfile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryStore {
    fn read(&self, user_key: &str) -> Result<Vec<ScoreRecord>, StoreError> {
        let histories = self
            .histories
            .lock()
            .map_err(|_| StoreError::Unavailable("history lock poisoned".into()))?;
        Ok(histories.get(user_key).cloned().unwrap_or_default())
    }

    fn write(&self, user_key: &str, records: &[ScoreRecord]) -> Result<(), StoreError> {
        self.histories
            .lock()
            .map_err(|_| StoreError::Unavailable("history lock poisoned".into()))?
            .insert(user_key.to_string(), records.to_vec());
        Ok(())
    }
}

impl ProfileStore for MemoryStore {
    fn load_profile(&self) -> Result<Option<UserProfile>, StoreError> {
        let profile = self
            .profile
            .lock()
            .map_err(|_| StoreError::Unavailable("profile lock poisoned".into()))?;
        Ok(profile.clone())
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        *self
            .profile
            .lock()
            .map_err(|_| StoreError::Unavailable("profile lock poisoned".into()))? =
            Some(profile.clone());
        Ok(())
    }
}

/// Aggregate view of a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub attempts: usize,
    pub best_percentage: u32,
    pub latest_percentage: u32,
    pub average_percentage: f64,
}

/// Summarize a history. `None` when there are no records.
pub fn summarize(records: &[ScoreRecord]) -> Option<HistorySummary> {
    let latest = records.last()?;
    let best = records.iter().map(|r| r.percentage).max().unwrap_or(0);
    let sum: u64 = records.iter().map(|r| u64::from(r.percentage)).sum();
    Some(HistorySummary {
        attempts: records.len(),
        best_percentage: best,
        latest_percentage: latest.percentage,
        average_percentage: sum as f64 / records.len() as f64,
    })
}
