//! Persisted reconciliation cursor.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Error, Result};
use crate::models::BookingId;
use crate::util::atomic_write;

/// Highest booking id known to be mirrored (or confirmed already present)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub last_synced_id: BookingId,
}

impl SyncState {
    #[must_use]
    pub const fn new(last_synced_id: BookingId) -> Self {
        Self { last_synced_id }
    }

    /// The cursor after observing `max_seen`; never moves backwards.
    #[must_use]
    pub fn advanced_to(self, max_seen: BookingId) -> Self {
        Self {
            last_synced_id: self.last_synced_id.max(max_seen),
        }
    }
}

/// JSON file holding the [`SyncState`] for one vault
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cursor; an absent file is the start of history.
    pub async fn load(&self) -> Result<SyncState> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(SyncState::default()),
            Err(error) => return Err(error.into()),
        };

        let state: SyncState = serde_json::from_str(&raw).map_err(|error| self.corrupt(error))?;
        if state.last_synced_id < BookingId::ORIGIN {
            return Err(self.corrupt(format!(
                "last_synced_id must not be negative (found {})",
                state.last_synced_id
            )));
        }

        Ok(state)
    }

    /// Atomically replace the persisted cursor.
    pub async fn save(&self, state: &SyncState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut payload = serde_json::to_string_pretty(state)?;
        payload.push('\n');

        let tmp = self.path.with_extension("tmp");
        atomic_write(&self.path, &tmp, payload.as_bytes()).await?;
        Ok(())
    }

    fn corrupt(&self, reason: impl ToString) -> Error {
        Error::CorruptState {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
