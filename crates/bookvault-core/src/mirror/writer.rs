//! Mirror file writers.
//!
//! [`InlineMirrorWriter`] runs right after a record is stored and may
//! overwrite; [`write_if_absent`] is the reconciliation path and never does.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

use super::codec::MirrorFile;
use super::viewer::{NoopNotifier, ViewerNotifier};
use crate::error::Result;
use crate::models::Booking;
use crate::util::{atomic_write, compact_text};

/// What happened when a mirror file was offered to the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    AlreadyPresent,
}

/// Create the mirror directory if it is missing.
pub async fn ensure_record_dir(record_dir: &Path) -> Result<()> {
    fs::create_dir_all(record_dir).await?;
    Ok(())
}

/// Write a mirror file, replacing any file of the same name.
///
/// The content lands under a hidden temp name first, so a failed write never
/// leaves a partial file under the mirror name.
pub async fn write_mirror_file(record_dir: &Path, file: &MirrorFile) -> Result<PathBuf> {
    ensure_record_dir(record_dir).await?;
    let path = record_dir.join(&file.file_name);
    let tmp = record_dir.join(format!(".{}.tmp", file.file_name));
    atomic_write(&path, &tmp, file.content.as_bytes()).await?;
    Ok(path)
}

/// Check whether a mirror file with this name is already in the vault.
pub async fn mirror_file_exists(record_dir: &Path, file_name: &str) -> Result<bool> {
    Ok(fs::try_exists(record_dir.join(file_name)).await?)
}

/// Write a mirror file only if no file of that name exists.
///
/// Creation is exclusive, so a file that appears between an existence check
/// and this call is reported as `AlreadyPresent` and left untouched. The
/// file is synced before `Created` is returned.
pub async fn write_if_absent(record_dir: &Path, file: &MirrorFile) -> Result<WriteOutcome> {
    let path = record_dir.join(&file.file_name);
    let mut handle = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
    {
        Ok(handle) => handle,
        Err(error) if error.kind() == ErrorKind::AlreadyExists => {
            return Ok(WriteOutcome::AlreadyPresent);
        }
        Err(error) => return Err(error.into()),
    };

    let written = async {
        handle.write_all(file.content.as_bytes()).await?;
        handle.sync_all().await
    }
    .await;

    if let Err(error) = written {
        // Do not leave a truncated file behind; it would be skipped forever.
        drop(handle);
        fs::remove_file(&path).await.ok();
        return Err(error.into());
    }

    Ok(WriteOutcome::Created)
}

/// Fire-and-forget mirror materialization for freshly stored records.
#[derive(Clone)]
pub struct InlineMirrorWriter {
    record_dir: PathBuf,
    notifier: Arc<dyn ViewerNotifier>,
}

impl InlineMirrorWriter {
    pub fn new(record_dir: impl Into<PathBuf>) -> Self {
        Self {
            record_dir: record_dir.into(),
            notifier: Arc::new(NoopNotifier),
        }
    }

    /// Signal a viewer after each successful write
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ViewerNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn record_dir(&self) -> &Path {
        &self.record_dir
    }

    /// Start writing the booking's mirror file in the background.
    ///
    /// Returns immediately. Failures are logged and dropped; the handle only
    /// exists so callers (and tests) may wait for completion if they choose.
    pub fn dispatch(&self, booking: Booking) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                "No async runtime available; inline mirror write for booking {} skipped",
                booking.id
            );
            return None;
        };

        let writer = self.clone();
        Some(runtime.spawn(async move { writer.write_now(&booking).await }))
    }

    async fn write_now(&self, booking: &Booking) {
        let file = MirrorFile::from_booking(booking);
        match write_mirror_file(&self.record_dir, &file).await {
            Ok(path) => {
                tracing::info!("Mirrored booking {} to {}", booking.id, path.display());
                self.notifier.notify(&file);
            }
            Err(error) => {
                tracing::warn!(
                    "Inline mirror write failed for booking {} ({}): {}",
                    booking.id,
                    file.file_name,
                    compact_text(&error.to_string())
                );
            }
        }
    }
}
