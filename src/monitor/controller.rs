use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::{Database, MonitorSession, SessionStatus};
use crate::settings::GateSettings;

use super::loop_worker::{monitor_loop, MonitorDeps};

/// Marks sessions left Running by a crash as Interrupted. Call once at
/// startup before opening a new session.
pub async fn recover_interrupted(db: &Database) -> Result<usize> {
    let stale = db.get_running_sessions().await?;
    let now = Utc::now();
    for session in &stale {
        warn!(
            "Recovered incomplete session {}; marking as Interrupted",
            session.id
        );
        db.mark_session_stopped(&session.id, SessionStatus::Interrupted, now)
            .await?;
    }
    Ok(stale.len())
}

/// Owns the monitor loop task for one session at a time.
pub struct MonitorController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    session_id: Option<String>,
}

impl MonitorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            session_id: None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Open a session row and spawn the loop. Returns the new session id.
    pub async fn start(
        &mut self,
        db: Database,
        settings: GateSettings,
        deps: MonitorDeps,
    ) -> Result<String> {
        if self.handle.is_some() {
            bail!("monitor already active");
        }

        let session_id = Uuid::new_v4().to_string();
        db.insert_session(&MonitorSession {
            id: session_id.clone(),
            started_at: Utc::now(),
            stopped_at: None,
            status: SessionStatus::Running,
        })
        .await?;

        info!("Monitor session {session_id} starting");

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let handle = tokio::spawn(monitor_loop(
            session_id.clone(),
            db,
            settings,
            deps,
            token_clone,
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.session_id = Some(session_id.clone());
        Ok(session_id)
    }

    /// Cancel the loop, wait for it to drain, and close the session row.
    pub async fn stop(&mut self, db: &Database) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("monitor loop task failed to join")?;
        }

        if let Some(session_id) = self.session_id.take() {
            db.mark_session_stopped(&session_id, SessionStatus::Completed, Utc::now())
                .await?;
            info!("Monitor session {session_id} completed");
        }

        Ok(())
    }
}

impl Default for MonitorController {
    fn default() -> Self {
        Self::new()
    }
}
