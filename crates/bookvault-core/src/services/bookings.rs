//! Booking capture service shared by the CLI and any embedding front end.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

use crate::db::{BookingFeed, BookingRepository, Database, SqliteBookingRepository};
use crate::error::Error;
use crate::mirror::InlineMirrorWriter;
use crate::models::{Booking, BookingId, BookingStatus, NewBooking, NewConsultation};
use crate::sync::{ReconcileJob, SyncReport};
use crate::Result;

/// Thread-safe service over the record store with inline vault mirroring.
///
/// A create call returns as soon as the record is stored. The mirror write
/// runs detached; its outcome never reaches the caller.
#[derive(Clone)]
pub struct BookingService {
    db: Arc<Mutex<Database>>,
    mirror: InlineMirrorWriter,
    mirror_tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BookingService {
    /// Open the store at `db_path`, creating it if needed.
    pub fn open_path(db_path: impl Into<PathBuf>, mirror: InlineMirrorWriter) -> Result<Self> {
        let db_path = db_path.into();
        tracing::debug!("Opening record store at {}", db_path.display());
        Ok(Self::from_database(Database::open(&db_path)?, mirror))
    }

    /// Open the store at `db_path`, failing if it does not exist yet.
    pub fn open_existing(db_path: impl Into<PathBuf>, mirror: InlineMirrorWriter) -> Result<Self> {
        let db_path = db_path.into();
        tracing::debug!("Opening existing record store at {}", db_path.display());
        Ok(Self::from_database(Database::open_existing(&db_path)?, mirror))
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory(mirror: InlineMirrorWriter) -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?, mirror))
    }

    fn from_database(db: Database, mirror: InlineMirrorWriter) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            mirror,
            mirror_tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Store a booking submitted from a landing page.
    pub async fn create_booking(&self, input: NewBooking) -> Result<Booking> {
        let input = input.validate()?;
        let booking = {
            let db = self.db.lock().await;
            SqliteBookingRepository::new(db.connection()).create_booking(&input)?
        };
        tracing::info!("Stored booking {} from {}", booking.id, booking.name);

        self.dispatch_mirror(&booking).await;
        Ok(booking)
    }

    /// Store a consultation message.
    pub async fn create_consultation(&self, input: NewConsultation) -> Result<Booking> {
        let input = input.validate()?;
        let consultation = {
            let db = self.db.lock().await;
            SqliteBookingRepository::new(db.connection()).create_consultation(&input)?
        };
        tracing::info!("Stored consultation {}", consultation.id);

        self.dispatch_mirror(&consultation).await;
        Ok(consultation)
    }

    /// Fetch a booking by id.
    pub async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        let db = self.db.lock().await;
        SqliteBookingRepository::new(db.connection()).get(id)
    }

    /// List bookings newest-first.
    pub async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Booking>> {
        let db = self.db.lock().await;
        SqliteBookingRepository::new(db.connection()).list(limit, offset)
    }

    /// Move a booking through its lifecycle.
    ///
    /// Consultations are terminal, and no booking can become one.
    pub async fn update_status(&self, id: BookingId, status: BookingStatus) -> Result<Booking> {
        if status.is_consultation() {
            return Err(Error::InvalidInput(
                "A booking cannot be turned into a consultation".to_string(),
            ));
        }

        let db = self.db.lock().await;
        let repo = SqliteBookingRepository::new(db.connection());
        let current = repo.get(id)?.ok_or_else(|| Error::NotFound(id.to_string()))?;
        if current.is_consultation() {
            return Err(Error::InvalidInput(format!(
                "Consultation {id} has no status lifecycle"
            )));
        }

        repo.update_status(id, status)
    }

    /// Delete a booking. Its mirror file, if any, is left in the vault.
    pub async fn delete(&self, id: BookingId) -> Result<()> {
        let db = self.db.lock().await;
        SqliteBookingRepository::new(db.connection()).delete(id)
    }

    /// Run a reconciliation pass against this store.
    ///
    /// The store is locked only while the pending records are fetched;
    /// creation calls proceed while the vault files are written.
    pub async fn reconcile(&self, job: &ReconcileJob) -> Result<SyncReport> {
        let state = job.cursor().load().await?;
        let bookings = {
            let db = self.db.lock().await;
            SqliteBookingRepository::new(db.connection()).bookings_after(state.last_synced_id)?
        };
        job.apply(state, bookings).await
    }

    /// Wait up to `limit` for in-flight mirror writes, e.g. before exit.
    ///
    /// Returns the number of writes still running when the limit expired.
    pub async fn settle_mirror_writes(&self, limit: Duration) -> usize {
        let tasks = std::mem::take(&mut *self.mirror_tasks.lock().await);
        let deadline = Instant::now() + limit;
        let mut unfinished = 0;

        for task in tasks {
            if timeout_at(deadline, task).await.is_err() {
                unfinished += 1;
            }
        }

        if unfinished > 0 {
            tracing::warn!("{} inline mirror write(s) still running", unfinished);
        }
        unfinished
    }

    async fn dispatch_mirror(&self, booking: &Booking) {
        let Some(task) = self.mirror.dispatch(booking.clone()) else {
            return;
        };

        let mut tasks = self.mirror_tasks.lock().await;
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::RECORD_DIR_NAME;
    use crate::sync::CursorStore;
    use std::path::Path;
    use tempfile::tempdir;
    use tokio::time::{sleep, timeout};

    fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map_or(0, Iterator::count)
    }

    fn new_booking(name: &str) -> NewBooking {
        NewBooking {
            name: name.to_string(),
            contact: "maria@example.com".to_string(),
            contact_type: Some("email".to_string()),
            appointment_time: 1_718_157_600_000,
            content: "Tourist visa extension".to_string(),
            source_slug: Some("tourist-visa".to_string()),
        }
    }

    #[tokio::test]
    async fn create_booking_mirrors_inline() {
        let vault = tempdir().unwrap();
        let record_dir = vault.path().join(RECORD_DIR_NAME);
        let service = BookingService::open_in_memory(InlineMirrorWriter::new(&record_dir)).unwrap();

        let booking = service.create_booking(new_booking("Maria")).await.unwrap();
        assert_eq!(service.settle_mirror_writes(Duration::from_secs(5)).await, 0);

        let content =
            std::fs::read_to_string(record_dir.join(format!("预约-Maria-{}.md", booking.id)))
                .unwrap();
        assert!(content.contains("status: pending"));
    }

    #[tokio::test]
    async fn create_succeeds_when_mirror_is_unwritable() {
        let vault = tempdir().unwrap();
        let blocker = vault.path().join("read-only");
        std::fs::write(&blocker, "not a directory").unwrap();
        let service =
            BookingService::open_in_memory(InlineMirrorWriter::new(blocker.join(RECORD_DIR_NAME)))
                .unwrap();

        let booking = service.create_booking(new_booking("Maria")).await.unwrap();
        let consultation = service
            .create_consultation(NewConsultation {
                message: "Hello".to_string(),
                contact: None,
                source_slug: None,
            })
            .await
            .unwrap();
        service.settle_mirror_writes(Duration::from_secs(5)).await;

        assert_eq!(booking.id, BookingId::new(1));
        assert_eq!(consultation.id, BookingId::new(2));
        assert!(service.get(booking.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_storage() {
        let vault = tempdir().unwrap();
        let service = BookingService::open_in_memory(InlineMirrorWriter::new(vault.path())).unwrap();

        let mut blank = new_booking("Maria");
        blank.content = "   ".to_string();

        assert!(matches!(
            service.create_booking(blank).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(service.list(10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn consultation_status_is_terminal() {
        let vault = tempdir().unwrap();
        let service = BookingService::open_in_memory(InlineMirrorWriter::new(vault.path())).unwrap();

        let consultation = service
            .create_consultation(NewConsultation {
                message: "Hello".to_string(),
                contact: Some("ana@example.com".to_string()),
                source_slug: None,
            })
            .await
            .unwrap();
        let booking = service.create_booking(new_booking("Jo")).await.unwrap();

        assert!(service
            .update_status(consultation.id, BookingStatus::Confirmed)
            .await
            .is_err());
        assert!(service
            .update_status(booking.id, BookingStatus::Consultation)
            .await
            .is_err());
        assert_eq!(
            service
                .update_status(booking.id, BookingStatus::Completed)
                .await
                .unwrap()
                .status,
            BookingStatus::Completed
        );
    }

    #[tokio::test]
    async fn reconcile_skips_inline_written_files() {
        let vault = tempdir().unwrap();
        let record_dir = vault.path().join(RECORD_DIR_NAME);
        let service = BookingService::open_in_memory(InlineMirrorWriter::new(&record_dir)).unwrap();

        service.create_booking(new_booking("Maria")).await.unwrap();
        service.create_booking(new_booking("Maria")).await.unwrap();
        service.settle_mirror_writes(Duration::from_secs(5)).await;

        let job = ReconcileJob::new(&record_dir, CursorStore::new(vault.path().join("state.json")));
        let report = service.reconcile(&job).await.unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.cursor, BookingId::new(2));
    }

    #[tokio::test]
    async fn reconcile_fills_gap_left_by_failed_inline_write() {
        let vault = tempdir().unwrap();
        let record_dir = vault.path().join(RECORD_DIR_NAME);
        let service = BookingService::open_in_memory(InlineMirrorWriter::new(&record_dir)).unwrap();
        let job = ReconcileJob::new(&record_dir, CursorStore::new(vault.path().join("state.json")));

        for name in ["A", "B", "C"] {
            service.create_booking(new_booking(name)).await.unwrap();
        }
        service.settle_mirror_writes(Duration::from_secs(5)).await;
        assert_eq!(service.reconcile(&job).await.unwrap().cursor, BookingId::new(3));

        // The inline write for booking 4 hits a disk error: its temp path is taken.
        let blocked_tmp = record_dir.join(".预约-D-4.md.tmp");
        std::fs::create_dir(&blocked_tmp).unwrap();
        std::fs::write(blocked_tmp.join("occupied"), "x").unwrap();

        let fourth = service.create_booking(new_booking("D")).await.unwrap();
        service.settle_mirror_writes(Duration::from_secs(5)).await;
        assert_eq!(fourth.id, BookingId::new(4));
        assert!(!record_dir.join("预约-D-4.md").exists());

        let report = service.reconcile(&job).await.unwrap();

        assert_eq!(report.found, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.cursor, BookingId::new(4));
        assert!(record_dir.join("预约-D-4.md").exists());
    }

    #[test]
    fn open_existing_reports_missing_store() {
        let vault = tempdir().unwrap();
        let db_path = vault.path().join("unmounted").join("prod.db");

        let result = BookingService::open_existing(&db_path, InlineMirrorWriter::new(vault.path()));

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(!db_path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn create_proceeds_while_reconcile_writes_files() {
        const BACKLOG: usize = 500;
        let vault = tempdir().unwrap();
        let record_dir = vault.path().join(RECORD_DIR_NAME);
        let blocker = vault.path().join("inline-off");
        std::fs::write(&blocker, "file in the way").unwrap();
        let service =
            BookingService::open_in_memory(InlineMirrorWriter::new(blocker.join(RECORD_DIR_NAME)))
                .unwrap();

        for index in 0..BACKLOG {
            service
                .create_booking(new_booking(&format!("guest{index}")))
                .await
                .unwrap();
        }
        service.settle_mirror_writes(Duration::from_secs(30)).await;

        let job = ReconcileJob::new(&record_dir, CursorStore::new(vault.path().join("state.json")));
        let sync = tokio::spawn({
            let service = service.clone();
            async move { service.reconcile(&job).await }
        });

        timeout(Duration::from_secs(30), async {
            while count_files(&record_dir) == 0 {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();

        let late = timeout(
            Duration::from_secs(5),
            service.create_booking(new_booking("Late")),
        )
        .await
        .unwrap()
        .unwrap();
        let files_when_created = count_files(&record_dir);

        let report = sync.await.unwrap().unwrap();
        assert!(files_when_created < BACKLOG);
        assert_eq!(report.found, BACKLOG);
        assert!(late.id > report.cursor);
    }
}
