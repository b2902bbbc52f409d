//! Serialized, observable sleep record store.
//!
//! # Responsibility
//! - Own the SQLite connection on one dedicated worker thread.
//! - Run store requests strictly in submission order.
//! - Broadcast a fresh nights snapshot after every successful write.
//!
//! # Invariants
//! - Requests from any number of callers form one FIFO queue, so
//!   overlapping writes keep a total order consistent with call order.
//! - Requests are never cancelled once queued; dropping the last handle
//!   lets the worker drain the queue and exit.
//! - The worker never runs on the caller's (UI) thread.

mod broadcast;

pub use broadcast::{NightsSnapshot, Subscription};

use crate::db::{open_location, DbError, DbLocation};
use crate::model::sleep_night::{NightId, SleepNight};
use crate::repo::sleep_repo::{RepoError, SleepRepository, SqliteSleepRepository};
use broadcast::Broadcaster;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const DEFAULT_WORKER_NAME: &str = "nightwords-store";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for bootstrap and request round trips.
#[derive(Debug)]
pub enum StoreError {
    /// Opening or migrating the database failed.
    Db(DbError),
    /// The request reached the repository and failed there.
    Repo(RepoError),
    /// The worker thread could not be spawned.
    Spawn(std::io::Error),
    /// The worker is gone; the request was never answered.
    WorkerGone,
    /// `StoreCall::wait_timeout` elapsed first.
    TimedOut,
}

impl StoreError {
    /// Whether this is a lookup miss that callers may treat as a no-op.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(RepoError::NotFound(_)))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start store worker: {err}"),
            Self::WorkerGone => write!(f, "store worker has shut down"),
            Self::TimedOut => write!(f, "store request timed out"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Spawn(err) => Some(err),
            Self::WorkerGone | Self::TimedOut => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Store bootstrap options.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: DbLocation,
    pub worker_name: String,
}

impl StoreConfig {
    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            location: DbLocation::File(path.into()),
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: DbLocation::Memory,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

type Job = Box<dyn FnOnce(&dyn SleepRepository, &mut Broadcaster) + Send>;

/// Pending reply for one queued request.
#[must_use = "a store call does nothing observable until waited on"]
pub struct StoreCall<T> {
    reply: Receiver<StoreResult<T>>,
}

impl<T> StoreCall<T> {
    /// Blocks until the worker answers.
    pub fn wait(self) -> StoreResult<T> {
        self.reply.recv().unwrap_or(Err(StoreError::WorkerGone))
    }

    /// Blocks up to `timeout` for the answer.
    pub fn wait_timeout(self, timeout: Duration) -> StoreResult<T> {
        match self.reply.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(StoreError::TimedOut),
            Err(RecvTimeoutError::Disconnected) => Err(StoreError::WorkerGone),
        }
    }
}

struct StoreInner {
    jobs: Option<Sender<Job>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        // Closing the queue lets the worker finish what is queued, then exit.
        self.jobs.take();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("event=store_shutdown module=store status=error error_code=worker_panicked");
            }
        }
    }
}

/// Cloneable handle to the sleep record store.
///
/// Every clone talks to the same worker thread.
#[derive(Clone)]
pub struct SleepStore {
    inner: Arc<StoreInner>,
}

impl SleepStore {
    /// Opens the database and starts the worker thread.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let conn = open_location(&config.location)?;
        Self::spawn(conn, config.worker_name.as_str())
    }

    /// Private in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Starts a worker over an already migrated connection.
    pub fn spawn(conn: Connection, worker_name: &str) -> StoreResult<Self> {
        let (jobs_tx, jobs_rx) = unbounded::<Job>();
        let handle = std::thread::Builder::new()
            .name(worker_name.to_string())
            .spawn(move || run_worker(conn, jobs_rx))
            .map_err(StoreError::Spawn)?;

        info!("event=store_start module=store status=ok worker={worker_name}");
        Ok(Self {
            inner: Arc::new(StoreInner {
                jobs: Some(jobs_tx),
                worker: Mutex::new(Some(handle)),
            }),
        })
    }

    /// Inserts `night` and returns its storage-assigned id.
    pub fn insert(&self, night: &SleepNight) -> StoreCall<NightId> {
        let night = night.clone();
        self.submit("insert", Access::Write, move |repo| repo.insert(&night))
    }

    /// Replaces the stored fields of `night`.
    ///
    /// Fails with `RepoError::NotFound` when the id no longer exists.
    pub fn update(&self, night: &SleepNight) -> StoreCall<()> {
        let night = night.clone();
        self.submit("update", Access::Write, move |repo| repo.update(&night))
    }

    /// Looks up one night by id.
    pub fn get(&self, id: NightId) -> StoreCall<Option<SleepNight>> {
        self.submit("get", Access::Read, move |repo| repo.get(id))
    }

    /// Returns "tonight": the most recent night, only while it is still open.
    pub fn get_open_night(&self) -> StoreCall<Option<SleepNight>> {
        self.submit("get_open_night", Access::Read, |repo| {
            Ok(repo.get_latest()?.filter(SleepNight::is_open))
        })
    }

    /// Every night, most recent first.
    pub fn get_all_nights(&self) -> StoreCall<NightsSnapshot> {
        self.submit("get_all_nights", Access::Read, |repo| {
            Ok(NightsSnapshot::from(repo.get_all_nights()?))
        })
    }

    /// Deletes every night; returns how many were removed.
    pub fn clear(&self) -> StoreCall<usize> {
        self.submit("clear", Access::Write, |repo| repo.clear())
    }

    /// Registers an observer of the nights collection.
    ///
    /// Registration is queued like any request, so the first snapshot
    /// reflects every write submitted before this call.
    pub fn subscribe(&self) -> Subscription {
        let (subscriber, subscription) = broadcast::channel();
        let job: Job = Box::new(move |repo: &dyn SleepRepository, broadcaster: &mut Broadcaster| match repo.get_all_nights() {
            Ok(nights) => {
                broadcaster.register(subscriber, &NightsSnapshot::from(nights));
                debug!(
                    "event=store_subscribe module=store status=ok subscribers={}",
                    broadcaster.len()
                );
            }
            Err(err) => {
                error!("event=store_subscribe module=store status=error error={err}");
            }
        });
        self.enqueue(job);
        subscription
    }

    fn submit<T, F>(&self, op: &'static str, access: Access, request: F) -> StoreCall<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SleepRepository) -> Result<T, RepoError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = bounded(1);
        let job: Job = Box::new(move |repo: &dyn SleepRepository, broadcaster: &mut Broadcaster| {
            let started_at = Instant::now();
            let result = request(repo);
            match &result {
                Ok(_) => debug!(
                    "event=store_request module=store status=ok op={op} duration_ms={}",
                    started_at.elapsed().as_millis()
                ),
                Err(RepoError::NotFound(_)) => debug!(
                    "event=store_request module=store status=not_found op={op} duration_ms={}",
                    started_at.elapsed().as_millis()
                ),
                Err(err) => error!(
                    "event=store_request module=store status=error op={op} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                ),
            }
            if access == Access::Write && result.is_ok() {
                publish_nights(repo, broadcaster);
            }
            // The caller may have dropped the call; that is not an error.
            let _ = reply_tx.send(result.map_err(StoreError::from));
        });
        self.enqueue(job);
        StoreCall { reply: reply_rx }
    }

    // A rejected job is dropped with its reply sender, so the matching
    // `StoreCall` resolves to `WorkerGone`.
    fn enqueue(&self, job: Job) {
        let sent = match &self.inner.jobs {
            Some(jobs) => jobs.send(job).is_ok(),
            None => false,
        };
        if !sent {
            error!("event=store_enqueue module=store status=error error_code=worker_gone");
        }
    }
}

fn run_worker(conn: Connection, jobs: Receiver<Job>) {
    let repo = SqliteSleepRepository::new(&conn);
    let mut broadcaster = Broadcaster::default();
    for job in jobs.iter() {
        job(&repo, &mut broadcaster);
    }
    info!("event=store_stop module=store status=ok");
}

fn publish_nights(repo: &dyn SleepRepository, broadcaster: &mut Broadcaster) {
    match repo.get_all_nights() {
        Ok(nights) => broadcaster.publish(&NightsSnapshot::from(nights)),
        Err(err) => error!("event=store_publish module=store status=error error={err}"),
    }
}
