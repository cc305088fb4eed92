//! Data directory backed store.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use cbtprep_core::history::{HistoryStore, ProfileStore};
use cbtprep_core::{ScoreRecord, StoreError, UserProfile};

use crate::atomic::{read_optional, write_atomic};

const PROFILE_FILE: &str = "profile.json";
const HISTORY_DIR: &str = "history";

/// Stores the profile and score histories as JSON files under one directory.
///
/// The directory is created lazily on the first write.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profile_path(&self) -> PathBuf {
        self.root.join(PROFILE_FILE)
    }

    /// File holding the history for `user_key`.
    pub fn history_path(&self, user_key: &str) -> PathBuf {
        self.root
            .join(HISTORY_DIR)
            .join(format!("{}.json", file_stem(user_key)))
    }
}

/// Percent-encode everything outside `[A-Za-z0-9_-]`, so distinct keys map to
/// distinct file names and no key can escape the history directory.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            stem.push(byte as char);
        } else {
            let _ = write!(stem, "%{byte:02X}");
        }
    }
    stem
}

impl HistoryStore for LocalStore {
    fn read(&self, user_key: &str) -> Result<Vec<ScoreRecord>, StoreError> {
        let path = self.history_path(user_key);
        match read_optional(&path)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    fn write(&self, user_key: &str, records: &[ScoreRecord]) -> Result<(), StoreError> {
        let path = self.history_path(user_key);
        let json = serde_json::to_vec_pretty(records)?;
        write_atomic(&path, &json)?;
        tracing::debug!(
            key = user_key,
            records = records.len(),
            path = %path.display(),
            "history written"
        );
        Ok(())
    }
}

impl ProfileStore for LocalStore {
    fn load_profile(&self) -> Result<Option<UserProfile>, StoreError> {
        match read_optional(&self.profile_path())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(profile)?;
        write_atomic(&self.profile_path(), &json)?;
        tracing::debug!(name = %profile.display_name, "profile saved");
        Ok(())
    }
}
