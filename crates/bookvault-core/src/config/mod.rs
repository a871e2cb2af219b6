//! Runtime settings for the store, vault mirror and sync cursor.
//!
//! Each field resolves in priority order: explicit override (CLI flag),
//! environment variable, built-in default.

use std::path::PathBuf;
use std::sync::Arc;

use crate::db::database_path_from_url;
use crate::mirror::{InlineMirrorWriter, ObsidianNotifier, RECORD_DIR_NAME};
use crate::sync::{CursorStore, ReconcileJob};
use crate::util::normalize_text_option;

/// Record store connection string (path, `sqlite://` or `file:` URL)
pub const DATABASE_URL_VAR: &str = "BOOKVAULT_DATABASE_URL";
/// Vault root directory
pub const VAULT_PATH_VAR: &str = "OBSIDIAN_VAULT_PATH";
/// Vault name used when signalling the viewer
pub const VAULT_NAME_VAR: &str = "OBSIDIAN_VAULT_NAME";
/// Location of the reconciliation cursor file
pub const STATE_PATH_VAR: &str = "BOOKVAULT_STATE_PATH";
/// Whether inline writes signal the viewer
pub const OPEN_VIEWER_VAR: &str = "BOOKVAULT_OPEN_VIEWER";

const DEFAULT_VAULT_DIR: &str = "Obsidian Vault";
const APP_DIR: &str = "bookvault";

/// Values supplied on the command line; `None` falls through to the env
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub db_path: Option<PathBuf>,
    pub vault_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub vault_path: PathBuf,
    pub vault_name: String,
    pub state_path: PathBuf,
    pub open_viewer: bool,
}

impl Settings {
    /// Resolve settings from overrides and the process environment.
    pub fn resolve(overrides: SettingsOverrides) -> Self {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve settings with a custom variable lookup.
    pub fn resolve_with(
        overrides: SettingsOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let var = |key: &str| normalize_text_option(lookup(key));

        let db_path = overrides
            .db_path
            .or_else(|| var(DATABASE_URL_VAR).map(|url| database_path_from_url(&url)))
            .unwrap_or_else(default_db_path);
        let vault_path = overrides
            .vault_path
            .or_else(|| var(VAULT_PATH_VAR).map(PathBuf::from))
            .unwrap_or_else(default_vault_path);
        let state_path = overrides
            .state_path
            .or_else(|| var(STATE_PATH_VAR).map(PathBuf::from))
            .unwrap_or_else(default_state_path);
        let vault_name = var(VAULT_NAME_VAR).unwrap_or_else(|| {
            vault_path
                .file_name()
                .map_or_else(|| DEFAULT_VAULT_DIR.to_string(), |name| name.to_string_lossy().into_owned())
        });
        let open_viewer = var(OPEN_VIEWER_VAR).is_some_and(|value| parse_flag(&value));

        Self {
            db_path,
            vault_path,
            vault_name,
            state_path,
            open_viewer,
        }
    }

    /// Directory holding the mirror files
    pub fn record_dir(&self) -> PathBuf {
        self.vault_path.join(RECORD_DIR_NAME)
    }

    /// Inline writer for the creation path, signalling the viewer if enabled
    pub fn inline_writer(&self) -> InlineMirrorWriter {
        let writer = InlineMirrorWriter::new(self.record_dir());
        if self.open_viewer {
            writer.with_notifier(Arc::new(ObsidianNotifier::new(self.vault_name.clone())))
        } else {
            writer
        }
    }

    /// Reconciliation job over this vault and cursor file
    pub fn reconcile_job(&self) -> ReconcileJob {
        ReconcileJob::new(self.record_dir(), CursorStore::new(&self.state_path))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_db_path() -> PathBuf {
    app_data_dir().join("bookvault.db")
}

fn default_state_path() -> PathBuf {
    app_data_dir().join("sync-state.json")
}

fn default_vault_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_VAULT_DIR)
}
