use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::{oneshot, watch};

pub mod helpers;
mod migrations;
pub mod models;
mod repositories;

use migrations::run_migrations;
use models::SleepNight;
use repositories::nights::query_all_nights;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// Handle to the sleep-night store.
///
/// All SQLite access runs on one dedicated worker thread, so writes are
/// serialized without additional locking. Callers reach the connection
/// through [`Database::execute`], which marshals the result back to the
/// awaiting task. Every mutating operation publishes a fresh descending
/// snapshot of the table on the watch channel returned by
/// [`Database::subscribe_nights`].
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
    nights_tx: watch::Sender<Vec<SleepNight>>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let (nights_tx, _nights_rx) = watch::channel(Vec::new());
        let snapshot_tx = nights_tx.clone();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("nightlog-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("Failed to enable foreign keys: {err}");
                }

                let init_result = run_migrations(&mut conn)
                    .context("failed to run database migrations")
                    .and_then(|()| {
                        // Seed subscribers with the persisted rows before the
                        // handle is usable.
                        let nights = query_all_nights(&conn)?;
                        snapshot_tx.send_replace(nights);
                        Ok(())
                    });
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
            nights_tx,
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Live view of all nights, most recent first.
    ///
    /// Each emission is a consistent snapshot taken on the worker thread
    /// right after the mutation that caused it. Any number of subscribers
    /// may hold receivers concurrently.
    pub fn subscribe_nights(&self) -> watch::Receiver<Vec<SleepNight>> {
        self.nights_tx.subscribe()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    /// Like [`Database::execute`], but republishes the nights snapshot after
    /// the task succeeds. Used by every mutating repository operation.
    async fn execute_mutating<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let snapshot_tx = self.nights_tx.clone();
        self.execute(move |conn| {
            let value = task(conn)?;
            let nights = query_all_nights(conn)?;
            // send_replace stores the snapshot even with no receivers, so a
            // later subscriber still starts from the current table contents.
            snapshot_tx.send_replace(nights);
            Ok(value)
        })
        .await
    }
}
