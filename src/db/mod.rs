use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection};
use tokio::sync::oneshot;

mod migrations;
pub mod models;

use migrations::run_migrations;
pub use models::{
    CaptureEvent, CaptureKind, InventoryChange, InventoryEvent, MonitorSession, SessionStatus,
};

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

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

fn status_from_str(value: &str) -> Result<SessionStatus> {
    match value {
        "Running" => Ok(SessionStatus::Running),
        "Completed" => Ok(SessionStatus::Completed),
        "Interrupted" => Ok(SessionStatus::Interrupted),
        _ => Err(anyhow!("unknown session status '{value}'")),
    }
}

fn change_from_str(value: &str) -> Result<InventoryChange> {
    match value {
        "Added" => Ok(InventoryChange::Added),
        "Removed" => Ok(InventoryChange::Removed),
        _ => Err(anyhow!("unknown inventory change '{value}'")),
    }
}

fn kind_from_str(value: &str) -> Result<CaptureKind> {
    match value {
        "Barcode" => Ok(CaptureKind::Barcode),
        "DoorSettle" => Ok(CaptureKind::DoorSettle),
        _ => Err(anyhow!("unknown capture kind '{value}'")),
    }
}

/// Handle to the SQLite event log.
///
/// All statements run on one dedicated worker thread; callers ship closures
/// over a channel and await the reply, so async tasks never block on SQLite.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
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
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("fridgewatch-db".into())
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

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
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
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
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

    pub async fn insert_session(&self, session: &MonitorSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, started_at, stopped_at, status)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id,
                    record.started_at.to_rfc3339(),
                    record.stopped_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.status.as_str(),
                ],
            )
            .with_context(|| "failed to insert session")?;
            Ok(())
        })
        .await
    }

    pub async fn mark_session_stopped(
        &self,
        session_id: &str,
        status: SessionStatus,
        stopped_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE sessions SET status = ?1, stopped_at = ?2 WHERE id = ?3",
                params![status.as_str(), stopped_at.to_rfc3339(), session_id],
            )
            .with_context(|| "failed to update session status")?;
            Ok(())
        })
        .await
    }

    /// Sessions still marked Running, e.g. after a crash. Startup marks these
    /// Interrupted before opening a new one.
    pub async fn get_running_sessions(&self) -> Result<Vec<MonitorSession>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, started_at, stopped_at, status
                 FROM sessions
                 WHERE status = 'Running'
                 ORDER BY started_at DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(MonitorSession {
                    id: row.get(0)?,
                    started_at: parse_datetime(&row.get::<_, String>(1)?)?,
                    stopped_at: row
                        .get::<_, Option<String>>(2)?
                        .map(|s| parse_datetime(&s))
                        .transpose()?,
                    status: status_from_str(&row.get::<_, String>(3)?)?,
                });
            }

            Ok(sessions)
        })
        .await
    }

    pub async fn insert_inventory_event(&self, event: &InventoryEvent) -> Result<()> {
        let record = event.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO inventory_events (id, session_id, timestamp, change, label)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.session_id,
                    record.timestamp.to_rfc3339(),
                    record.change.as_str(),
                    record.label,
                ],
            )
            .with_context(|| "failed to insert inventory event")?;
            Ok(())
        })
        .await
    }

    pub async fn insert_capture_event(&self, event: &CaptureEvent) -> Result<()> {
        let record = event.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO capture_events (id, session_id, timestamp, kind, code, outcome)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.session_id,
                    record.timestamp.to_rfc3339(),
                    record.kind.as_str(),
                    record.code,
                    record.outcome,
                ],
            )
            .with_context(|| "failed to insert capture event")?;
            Ok(())
        })
        .await
    }

    pub async fn get_inventory_events_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<InventoryEvent>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, timestamp, change, label
                 FROM inventory_events
                 WHERE session_id = ?1
                 ORDER BY timestamp ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                events.push(InventoryEvent {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    timestamp: parse_datetime(&row.get::<_, String>(2)?)?,
                    change: change_from_str(&row.get::<_, String>(3)?)?,
                    label: row.get(4)?,
                });
            }

            Ok(events)
        })
        .await
    }

    pub async fn get_capture_events_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<CaptureEvent>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, timestamp, kind, code, outcome
                 FROM capture_events
                 WHERE session_id = ?1
                 ORDER BY timestamp ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                events.push(CaptureEvent {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    timestamp: parse_datetime(&row.get::<_, String>(2)?)?,
                    kind: kind_from_str(&row.get::<_, String>(3)?)?,
                    code: row.get(4)?,
                    outcome: row.get(5)?,
                });
            }

            Ok(events)
        })
        .await
    }
}
