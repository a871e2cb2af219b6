//! Best-effort "open this note" signal to the vault viewer.

use std::process::Stdio;

use tokio::process::Command;

use super::codec::{MirrorFile, RECORD_DIR_NAME};

/// Told about each freshly written mirror file. Must never fail the caller.
pub trait ViewerNotifier: Send + Sync {
    fn notify(&self, file: &MirrorFile);
}

/// Does nothing; the default when no viewer is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ViewerNotifier for NoopNotifier {
    fn notify(&self, _file: &MirrorFile) {}
}

/// Opens new mirror files in Obsidian through its URI scheme.
#[derive(Debug, Clone)]
pub struct ObsidianNotifier {
    vault_name: String,
    opener: String,
}

impl ObsidianNotifier {
    pub fn new(vault_name: impl Into<String>) -> Self {
        Self {
            vault_name: vault_name.into(),
            opener: default_opener().to_string(),
        }
    }

    /// Use a specific opener program instead of the platform default
    #[must_use]
    pub fn with_opener(mut self, opener: impl Into<String>) -> Self {
        self.opener = opener.into();
        self
    }

    #[must_use]
    pub fn uri(&self, file: &MirrorFile) -> String {
        let note_path = format!("{RECORD_DIR_NAME}/{}", file.stem());
        format!(
            "obsidian://open?vault={}&file={}",
            urlencoding::encode(&self.vault_name),
            urlencoding::encode(&note_path)
        )
    }
}

impl ViewerNotifier for ObsidianNotifier {
    fn notify(&self, file: &MirrorFile) {
        let uri = self.uri(file);
        // The child is not awaited; tokio reaps it in the background.
        match Command::new(&self.opener)
            .arg(&uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(_child) => tracing::debug!("Signalled viewer: {}", uri),
            Err(error) => tracing::debug!("Viewer signal skipped ({}): {}", self.opener, error),
        }
    }
}

const fn default_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> MirrorFile {
        MirrorFile {
            file_name: name.to_string(),
            content: String::new(),
        }
    }

    #[test]
    fn uri_encodes_vault_and_note_path() {
        let notifier = ObsidianNotifier::new("Obsidian Vault");
        assert_eq!(
            notifier.uri(&file("预约-Maria-10.md")),
            "obsidian://open?vault=Obsidian%20Vault&file=%E8%AE%B0%E5%BD%95%2F%E9%A2%84%E7%BA%A6-Maria-10"
        );
    }

    #[tokio::test]
    async fn notify_with_missing_opener_is_silent() {
        let notifier =
            ObsidianNotifier::new("Vault").with_opener("bookvault-definitely-not-installed");
        notifier.notify(&file("咨询-1.md"));
    }
}
