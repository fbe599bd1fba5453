//! SQLite-backed persistent store with a single background worker.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, Transaction};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::gate::{Admission, ReadinessGate};
use super::version::StoreVersion;
use crate::domain::errors::StoreError;
use crate::domain::lazy_list::LazyList;
use crate::domain::ports::{FetchRequest, PersistentStore};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type Job = Box<dyn FnOnce(Result<&WorkerContext, StoreError>) + Send>;

struct StoreCore {
    gate: ReadinessGate<Job>,
    reader: Mutex<Option<Connection>>,
}

/// State handed to every job once the store is open.
struct WorkerContext {
    core: Arc<StoreCore>,
    db_path: PathBuf,
}

impl WorkerContext {
    fn read<T>(&self, request: &FetchRequest<T>) -> Result<Vec<T>, StoreError> {
        let reader = self.core.reader.lock();
        let conn = reader.as_ref().ok_or(StoreError::Closed)?;
        Ok(request.rows(conn)?)
    }

    /// Runs `operation` on a fresh write connection, dropped afterwards.
    fn write<R>(
        &self,
        operation: impl FnOnce(&Transaction<'_>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let tx = conn.transaction()?;
        let before = total_changes(&tx)?;

        match operation(&tx) {
            Ok(value) => {
                let changed = total_changes(&tx)? - before;
                if changed > 0 {
                    tx.commit()?;
                    debug!(changed, "Committed store update");
                } else {
                    tx.rollback()?;
                }
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "Store update failed, rolling back");
                if let Err(rollback) = tx.rollback() {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }
}

fn total_changes(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT total_changes()", [], |row| row.get(0))
}

fn open_error(error: impl std::fmt::Display) -> StoreError {
    StoreError::open(error.to_string())
}

struct StoreWorker {
    context: WorkerContext,
    version: StoreVersion,
    receiver: mpsc::Receiver<Job>,
}

impl StoreWorker {
    fn run(self) {
        let outcome = self.open();
        match &outcome {
            Ok(()) => info!(
                path = %self.context.db_path.display(),
                version = %self.version,
                "Store ready"
            ),
            Err(e) => error!(
                path = %self.context.db_path.display(),
                error = %e,
                "Failed to open store"
            ),
        }

        let deferred = self.context.core.gate.resolve(outcome.clone());
        debug!(count = deferred.len(), "Releasing deferred store jobs");
        for job in deferred {
            job(outcome.clone().map(|()| &self.context));
        }
        if outcome.is_err() {
            return;
        }

        while let Ok(job) = self.receiver.recv() {
            job(Ok(&self.context));
        }
        *self.context.core.reader.lock() = None;
        debug!("Store worker stopped");
    }

    fn open(&self) -> Result<(), StoreError> {
        let path = &self.context.db_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(open_error)?;
        }

        let conn = Connection::open(path).map_err(open_error)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(open_error)?;
        conn.execute_batch(self.version.schema()).map_err(open_error)?;
        drop(conn);

        let reader = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(open_error)?;
        reader.busy_timeout(BUSY_TIMEOUT).map_err(open_error)?;
        *self.context.core.reader.lock() = Some(reader);
        Ok(())
    }
}

/// Store over a single SQLite file.
///
/// Opening happens on the worker thread. Until it finishes, `fetch` and
/// `update` calls are queued and released in call order; if it fails, every
/// queued and later call fails with [`StoreError::Open`].
pub struct SqliteStore {
    core: Arc<StoreCore>,
    jobs: mpsc::Sender<Job>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Starts opening the store at `db_path`. Returns immediately.
    #[must_use]
    pub fn open(db_path: PathBuf, version: StoreVersion) -> Self {
        Self::open_after(db_path, version, || {})
    }

    /// Like [`SqliteStore::open`], running `before_open` on the worker first.
    pub(crate) fn open_after(
        db_path: PathBuf,
        version: StoreVersion,
        before_open: impl FnOnce() + Send + 'static,
    ) -> Self {
        let core = Arc::new(StoreCore {
            gate: ReadinessGate::new(),
            reader: Mutex::new(None),
        });
        let (jobs, receiver) = mpsc::channel();
        let worker = StoreWorker {
            context: WorkerContext {
                core: Arc::clone(&core),
                db_path: db_path.clone(),
            },
            version,
            receiver,
        };

        let spawned = thread::Builder::new()
            .name("store-worker".to_string())
            .spawn(move || {
                before_open();
                worker.run();
            });
        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn store worker");
            core.gate
                .resolve(Err(StoreError::open(format!("failed to spawn store worker: {e}"))));
        }

        Self {
            core,
            jobs,
            db_path,
        }
    }

    /// Database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Returns true once the database finished opening.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.core.gate.is_ready()
    }

    fn submit(&self, job: Job) {
        match self.core.gate.admit(job) {
            Admission::Dispatch(job) => {
                if let Err(mpsc::SendError(job)) = self.jobs.send(job) {
                    job(Err(StoreError::Closed));
                }
            }
            Admission::Deferred => debug!("Store not ready, deferring job"),
            Admission::Rejected(job, e) => job(Err(e)),
        }
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl PersistentStore for SqliteStore {
    fn count<T>(&self, request: &FetchRequest<T>) -> usize {
        if !self.core.gate.is_ready() {
            debug!("Store not ready, count is 0");
            return 0;
        }
        let reader = self.core.reader.lock();
        let Some(conn) = reader.as_ref() else {
            return 0;
        };
        request.count(conn).unwrap_or_else(|e| {
            warn!(error = %e, sql = request.sql(), "Count failed");
            0
        })
    }

    fn fetch<T, V, M>(
        &self,
        request: FetchRequest<T>,
        map: M,
    ) -> BoxFuture<'static, Result<LazyList<V>, StoreError>>
    where
        T: Send + Sync + 'static,
        V: Clone + Send + 'static,
        M: Fn(&T) -> Option<V> + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(Box::new(move |context: Result<&WorkerContext, StoreError>| {
            let _ = tx.send(context.and_then(|context| context.read(&request)));
        }));

        async move {
            let rows = rx.await.map_err(|_| StoreError::Closed)??;
            Ok(LazyList::new(rows, map))
        }
        .boxed()
    }

    fn update<R, F>(&self, operation: F) -> BoxFuture<'static, Result<R, StoreError>>
    where
        R: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<R, StoreError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(Box::new(move |context: Result<&WorkerContext, StoreError>| {
            let _ = tx.send(context.and_then(|context| context.write(operation)));
        }));

        async move { rx.await.map_err(|_| StoreError::Closed)? }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc as std_mpsc;

    use rusqlite::params;
    use tempfile::TempDir;

    use super::*;

    fn code_request() -> FetchRequest<String> {
        FetchRequest::new("SELECT alpha3_code FROM countries ORDER BY alpha3_code", |row| {
            row.get(0)
        })
    }

    fn insert(code: &'static str) -> impl FnOnce(&Transaction<'_>) -> Result<(), StoreError> {
        move |tx| {
            tx.execute(
                "INSERT INTO countries (alpha3_code, name, population) VALUES (?1, ?1, 1)",
                params![code],
            )?;
            Ok(())
        }
    }

    fn open_store(dir: &TempDir) -> SqliteStore {
        SqliteStore::open(StoreVersion::CURRENT.db_path(dir.path()), StoreVersion::CURRENT)
    }

    #[tokio::test]
    async fn test_update_then_fetch() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.update(insert("FRA")).await.unwrap();
        let codes = store.fetch(code_request(), |code| Some(code.clone())).await.unwrap();

        assert_eq!(codes.to_vec(), vec!["FRA".to_string()]);
        assert!(store.is_ready());
        assert_eq!(store.count(&code_request()), 1);
        assert!(dir.path().join("db.sql").exists());
    }

    #[tokio::test]
    async fn test_operations_issued_before_ready_run_in_order() {
        let dir = TempDir::new().unwrap();
        let (release, held) = std_mpsc::channel::<()>();
        let store = SqliteStore::open_after(
            StoreVersion::CURRENT.db_path(dir.path()),
            StoreVersion::CURRENT,
            move || {
                let _ = held.recv();
            },
        );

        let first_write = store.update(insert("AAA"));
        let read_after_first = store.fetch(code_request(), |code| Some(code.clone()));
        let second_write = store.update(insert("BBB"));
        let read_after_second = store.fetch(code_request(), |code| Some(code.clone()));

        assert!(!store.is_ready());
        assert_eq!(store.count(&code_request()), 0);
        release.send(()).unwrap();

        first_write.await.unwrap();
        second_write.await.unwrap();
        assert_eq!(read_after_first.await.unwrap().to_vec(), vec!["AAA".to_string()]);
        assert_eq!(
            read_after_second.await.unwrap().to_vec(),
            vec!["AAA".to_string(), "BBB".to_string()]
        );
    }

    #[tokio::test]
    async fn test_open_failure_fails_queued_and_later_operations() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        let (release, held) = std_mpsc::channel::<()>();
        let store = SqliteStore::open_after(
            blocker.join("nested").join("db.sql"),
            StoreVersion::CURRENT,
            move || {
                let _ = held.recv();
            },
        );

        let queued = store.update(insert("AAA"));
        release.send(()).unwrap();

        let err = queued.await.unwrap_err();
        assert!(err.is_open_failure());

        let later = store.fetch(code_request(), |code| Some(code.clone())).await;
        assert_eq!(later.unwrap_err(), err);
        assert_eq!(store.count(&code_request()), 0);
        assert!(!store.is_ready());
    }

    #[tokio::test]
    async fn test_failed_update_is_discarded() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let result = store
            .update(|tx| {
                insert("AAA")(tx)?;
                Err::<(), _>(StoreError::operation("validation failed"))
            })
            .await;
        assert_eq!(result, Err(StoreError::operation("validation failed")));

        let seen_by_next_write = store
            .update(|tx| {
                let count: i64 =
                    tx.query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
            .unwrap();
        assert_eq!(seen_by_next_write, 0);
        assert_eq!(store.count(&code_request()), 0);
    }

    #[tokio::test]
    async fn test_sql_error_surfaces_as_operation_error() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let err = store
            .update(|tx| {
                tx.execute("INSERT INTO missing_table VALUES (1)", [])?;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Operation { .. }));
        assert!(store.is_ready());
    }

    #[tokio::test]
    async fn test_fetch_maps_lazily_and_skips_none() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .update(|tx| {
                for code in ["AAA", "BBB", "CCC"] {
                    insert(code)(tx)?;
                }
                Ok(())
            })
            .await
            .unwrap();

        let list = store
            .fetch(code_request(), |code| (code != "BBB").then(|| code.to_lowercase()))
            .await
            .unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1), None);
        assert_eq!(list.to_vec(), vec!["aaa".to_string(), "ccc".to_string()]);
    }
}
