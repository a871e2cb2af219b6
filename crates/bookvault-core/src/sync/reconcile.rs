//! Cursor-based catch-up between the record store and the vault.
//!
//! A run loads the cursor, mirrors every booking past it that has no file
//! yet, and only then persists the new cursor. Any error aborts the run with
//! the cursor untouched, so the next run retries the same range; existing
//! files are skipped, which makes the retry safe.
//!
//! Runs must not overlap. Two concurrent runs can read the same cursor and
//! race on saving it; schedule them with external mutual exclusion.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::cursor::{CursorStore, SyncState};
use crate::db::BookingFeed;
use crate::error::Result;
use crate::mirror::{ensure_record_dir, mirror_file_exists, write_if_absent, MirrorFile, WriteOutcome};
use crate::models::{Booking, BookingId};

/// Per-run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub previous_cursor: BookingId,
    pub cursor: BookingId,
    pub found: usize,
    pub created: usize,
    pub skipped: usize,
    pub dry_run: bool,
}

impl SyncReport {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.found == 0
    }
}

/// The reconciliation job for one vault directory and cursor file
#[derive(Debug, Clone)]
pub struct ReconcileJob {
    record_dir: PathBuf,
    cursor: CursorStore,
    dry_run: bool,
}

impl ReconcileJob {
    pub fn new(record_dir: impl Into<PathBuf>, cursor: CursorStore) -> Self {
        Self {
            record_dir: record_dir.into(),
            cursor,
            dry_run: false,
        }
    }

    /// Report what would be created without touching the vault or cursor
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn record_dir(&self) -> &Path {
        &self.record_dir
    }

    pub const fn cursor(&self) -> &CursorStore {
        &self.cursor
    }

    /// Run one reconciliation pass against `feed`.
    pub async fn run<F>(&self, feed: &F) -> Result<SyncReport>
    where
        F: BookingFeed + ?Sized,
    {
        let state = self.cursor.load().await?;
        let bookings = feed.bookings_after(state.last_synced_id)?;
        self.apply(state, bookings).await
    }

    /// File phase of a pass: mirror `bookings`, fetched past `state`, and
    /// persist the advanced cursor.
    ///
    /// Needs no access to the store, so callers can release it before the
    /// vault IO starts.
    pub async fn apply(&self, state: SyncState, mut bookings: Vec<Booking>) -> Result<SyncReport> {
        tracing::info!(
            "[sync] Starting. Last synced ID: {}",
            state.last_synced_id
        );
        bookings.retain(|booking| booking.id > state.last_synced_id);
        bookings.sort_by_key(|booking| booking.id);

        let mut report = SyncReport {
            previous_cursor: state.last_synced_id,
            cursor: state.last_synced_id,
            found: bookings.len(),
            created: 0,
            skipped: 0,
            dry_run: self.dry_run,
        };

        if bookings.is_empty() {
            tracing::info!("[sync] No new bookings.");
            return Ok(report);
        }
        tracing::info!("[sync] Found {} new record(s).", bookings.len());

        if !self.dry_run {
            ensure_record_dir(&self.record_dir).await?;
        }

        let mut max_seen = state.last_synced_id;
        for booking in &bookings {
            let file = MirrorFile::from_booking(booking);

            if mirror_file_exists(&self.record_dir, &file.file_name).await? {
                tracing::info!("[sync] Skip (exists): {}", file.file_name);
                report.skipped += 1;
            } else if self.dry_run {
                tracing::info!("[sync] Would create: {}", file.file_name);
                report.created += 1;
            } else {
                match write_if_absent(&self.record_dir, &file).await? {
                    WriteOutcome::Created => {
                        tracing::info!("[sync] Created: {}", file.file_name);
                        report.created += 1;
                    }
                    WriteOutcome::AlreadyPresent => {
                        tracing::info!("[sync] Skip (appeared during run): {}", file.file_name);
                        report.skipped += 1;
                    }
                }
            }

            max_seen = max_seen.max(booking.id);
        }

        let next = state.advanced_to(max_seen);
        report.cursor = next.last_synced_id;

        if self.dry_run {
            tracing::info!(
                "[sync] Dry run. Would sync {} file(s). Cursor stays at {}",
                report.created,
                state.last_synced_id
            );
            return Ok(report);
        }

        self.cursor.save(&next).await?;
        tracing::info!(
            "[sync] Done. Synced {} file(s). Last ID: {}",
            report.created,
            next.last_synced_id
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{BookingRepository, Database, SqliteBookingRepository};
    use crate::error::Error;
    use crate::mirror::{write_mirror_file, RECORD_DIR_NAME};
    use crate::models::{NewBooking, NewConsultation};
    use std::collections::BTreeSet;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _vault: TempDir,
        record_dir: PathBuf,
        state_path: PathBuf,
        db: Database,
    }

    impl Fixture {
        fn new() -> Self {
            let vault = tempdir().unwrap();
            let record_dir = vault.path().join(RECORD_DIR_NAME);
            let state_path = vault.path().join(".sync-state.json");
            Self {
                _vault: vault,
                record_dir,
                state_path,
                db: Database::open_in_memory().unwrap(),
            }
        }

        fn repo(&self) -> SqliteBookingRepository<'_> {
            SqliteBookingRepository::new(self.db.connection())
        }

        fn job(&self) -> ReconcileJob {
            ReconcileJob::new(&self.record_dir, CursorStore::new(&self.state_path))
        }

        fn book(&self, name: &str) -> Booking {
            self.repo()
                .create_booking(&NewBooking {
                    name: name.to_string(),
                    contact: "+63 917 000 0000".to_string(),
                    contact_type: None,
                    appointment_time: 1_718_157_600_000,
                    content: "Visa consultation".to_string(),
                    source_slug: None,
                })
                .unwrap()
        }

        fn consult(&self) -> Booking {
            self.repo()
                .create_consultation(&NewConsultation {
                    message: "Question".to_string(),
                    contact: None,
                    source_slug: None,
                })
                .unwrap()
        }

        fn files(&self) -> BTreeSet<String> {
            match std::fs::read_dir(&self.record_dir) {
                Ok(entries) => entries
                    .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                    .collect(),
                Err(_) => BTreeSet::new(),
            }
        }

        async fn cursor(&self) -> BookingId {
            CursorStore::new(&self.state_path)
                .load()
                .await
                .unwrap()
                .last_synced_id
        }
    }

    struct FailingFeed;

    impl BookingFeed for FailingFeed {
        fn bookings_after(&self, _after: BookingId) -> Result<Vec<Booking>> {
            Err(Error::Database("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn empty_store_is_a_noop() {
        let fx = Fixture::new();

        let report = fx.job().run(&fx.repo()).await.unwrap();

        assert!(report.is_noop());
        assert_eq!(report.cursor, BookingId::ORIGIN);
        assert!(!fx.state_path.exists());
        assert!(fx.files().is_empty());
    }

    #[tokio::test]
    async fn mirrors_every_record_and_advances_cursor() {
        let fx = Fixture::new();
        let first = fx.book("Maria");
        let second = fx.consult();

        let report = fx.job().run(&fx.repo()).await.unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.created, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.cursor, second.id);
        assert_eq!(fx.cursor().await, second.id);
        assert_eq!(
            fx.files(),
            BTreeSet::from([
                format!("预约-Maria-{}.md", first.id),
                format!("咨询-{}.md", second.id),
            ])
        );
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let fx = Fixture::new();
        fx.book("Maria");
        fx.book("Jose");

        let first = fx.job().run(&fx.repo()).await.unwrap();
        let files_after_first = fx.files();
        let second = fx.job().run(&fx.repo()).await.unwrap();

        assert!(second.is_noop());
        assert_eq!(second.cursor, first.cursor);
        assert_eq!(fx.cursor().await, first.cursor);
        assert_eq!(fx.files(), files_after_first);
    }

    #[tokio::test]
    async fn crash_before_cursor_save_is_recovered_without_duplicates() {
        let fx = Fixture::new();
        let bookings = [fx.book("Maria"), fx.book("Jose"), fx.consult()];

        // A previous run wrote every file, then died before saving the cursor.
        for booking in &bookings {
            write_mirror_file(&fx.record_dir, &MirrorFile::from_booking(booking))
                .await
                .unwrap();
        }
        let files_before = fx.files();

        let report = fx.job().run(&fx.repo()).await.unwrap();

        assert_eq!(report.found, 3);
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(fx.cursor().await, bookings[2].id);
        assert_eq!(fx.files(), files_before);
    }

    #[tokio::test]
    async fn picks_up_records_stored_after_last_run() {
        let fx = Fixture::new();
        for name in ["A", "B", "C"] {
            fx.book(name);
        }
        fx.job().run(&fx.repo()).await.unwrap();
        assert_eq!(fx.cursor().await, BookingId::new(3));

        let fourth = fx.book("D");
        assert_eq!(fourth.id, BookingId::new(4));

        let report = fx.job().run(&fx.repo()).await.unwrap();

        assert_eq!(report.previous_cursor, BookingId::new(3));
        assert_eq!(report.found, 1);
        assert_eq!(report.created, 1);
        assert_eq!(fx.cursor().await, BookingId::new(4));
        assert!(fx.record_dir.join("预约-D-4.md").exists());
        assert_eq!(fx.files().len(), 4);
    }

    #[tokio::test]
    async fn overlong_name_does_not_stall_later_records() {
        let fx = Fixture::new();
        let long = fx.book(&"玛".repeat(200));
        let next = fx.book("Maria");

        for _ in 0..2 {
            fx.job().run(&fx.repo()).await.unwrap();
        }

        assert_eq!(fx.cursor().await, next.id);
        assert_eq!(
            fx.files(),
            BTreeSet::from([
                format!("预约-{}-{}.md", "玛".repeat(40), long.id),
                format!("预约-Maria-{}.md", next.id),
            ])
        );
    }

    #[tokio::test]
    async fn apply_ignores_records_at_or_below_cursor() {
        let fx = Fixture::new();
        let first = fx.book("Maria");
        let second = fx.book("Jose");

        let report = fx
            .job()
            .apply(SyncState::new(first.id), vec![second.clone(), first])
            .await
            .unwrap();

        assert_eq!(report.found, 1);
        assert_eq!(report.cursor, second.id);
        assert_eq!(
            fx.files(),
            BTreeSet::from([format!("预约-Jose-{}.md", second.id)])
        );
    }

    #[tokio::test]
    async fn same_name_bookings_get_distinct_files() {
        let fx = Fixture::new();
        let first = fx.book("Maria");
        let second = fx.book("Maria");

        fx.job().run(&fx.repo()).await.unwrap();

        assert!(fx
            .record_dir
            .join(format!("预约-Maria-{}.md", first.id))
            .exists());
        assert!(fx
            .record_dir
            .join(format!("预约-Maria-{}.md", second.id))
            .exists());
    }

    #[tokio::test]
    async fn manual_edits_are_never_overwritten() {
        let fx = Fixture::new();
        let booking = fx.book("Maria");
        let path = fx.record_dir.join(format!("预约-Maria-{}.md", booking.id));
        std::fs::create_dir_all(&fx.record_dir).unwrap();
        std::fs::write(&path, "called back, moved to Friday").unwrap();

        let report = fx.job().run(&fx.repo()).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "called back, moved to Friday"
        );
    }

    #[tokio::test]
    async fn cursor_is_monotonic_across_runs() {
        let fx = Fixture::new();
        let mut observed = Vec::new();

        for batch in [2, 0, 3, 1] {
            let mut last = None;
            for index in 0..batch {
                last = Some(fx.book(&format!("guest{index}")).id);
            }
            let report = fx.job().run(&fx.repo()).await.unwrap();
            if let Some(max_id) = last {
                assert_eq!(report.cursor, max_id);
            }
            observed.push(fx.cursor().await);
        }

        assert!(observed.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(observed.last().copied(), Some(BookingId::new(6)));
    }

    #[tokio::test]
    async fn store_failure_leaves_cursor_untouched() {
        let fx = Fixture::new();
        CursorStore::new(&fx.state_path)
            .save(&SyncState::new(BookingId::new(3)))
            .await
            .unwrap();

        let result = fx.job().run(&FailingFeed).await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(fx.cursor().await, BookingId::new(3));
    }

    #[tokio::test]
    async fn unwritable_mirror_aborts_without_advancing() {
        let fx = Fixture::new();
        fx.book("Maria");
        std::fs::write(&fx.record_dir, "a file where the directory should be").unwrap();

        let result = fx.job().run(&fx.repo()).await;

        assert!(result.is_err());
        assert!(!fx.state_path.exists());
    }

    #[tokio::test]
    async fn dry_run_changes_nothing() {
        let fx = Fixture::new();
        fx.book("Maria");
        fx.consult();

        let report = fx.job().with_dry_run(true).run(&fx.repo()).await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.created, 2);
        assert_eq!(report.cursor, BookingId::new(2));
        assert!(fx.files().is_empty());
        assert!(!fx.state_path.exists());
    }

    #[tokio::test]
    async fn deleted_records_past_the_cursor_keep_their_files() {
        let fx = Fixture::new();
        let booking = fx.book("Maria");
        fx.job().run(&fx.repo()).await.unwrap();

        fx.repo().delete(booking.id).unwrap();
        let report = fx.job().run(&fx.repo()).await.unwrap();

        assert!(report.is_noop());
        assert_eq!(fx.files().len(), 1);
    }
}
