//! Per-browser session state
//!
//! A session owns at most one loaded table. Handlers clone the `Arc` out
//! under a short read of the map and release the lock before any view runs.

use nse_forecast::LoadedTable;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub type SessionId = Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown session {0}")]
    UnknownSession(SessionId),

    #[error("No dataset loaded for this session")]
    NoDataset,
}

#[derive(Debug)]
struct Session {
    table: Option<Arc<LoadedTable>>,
    last_seen: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            table: None,
            last_seen: Instant::now(),
        }
    }
}

/// Sessions keyed by id, expiring after `ttl` without access
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<SessionId, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Open a new empty session
    pub async fn create(&self) -> SessionId {
        let id = Uuid::new_v4();
        let mut sessions = self.inner.write().await;
        self.purge_locked(&mut sessions);
        sessions.insert(id, Session::new());
        info!(session = %id, active = sessions.len(), "Session created");
        id
    }

    /// Drop a session; false when it did not exist
    pub async fn remove(&self, id: SessionId) -> bool {
        let mut sessions = self.inner.write().await;
        self.purge_locked(&mut sessions);
        let removed = sessions.remove(&id).is_some();
        if removed {
            info!(session = %id, "Session closed");
        }
        removed
    }

    /// Refresh a session's idle timer
    pub async fn touch(&self, id: SessionId) -> Result<(), SessionError> {
        let mut sessions = self.inner.write().await;
        self.purge_locked(&mut sessions);
        let session = sessions
            .get_mut(&id)
            .ok_or(SessionError::UnknownSession(id))?;
        session.last_seen = Instant::now();
        Ok(())
    }

    /// The session's current table
    pub async fn table(&self, id: SessionId) -> Result<Arc<LoadedTable>, SessionError> {
        let mut sessions = self.inner.write().await;
        self.purge_locked(&mut sessions);
        let session = sessions
            .get_mut(&id)
            .ok_or(SessionError::UnknownSession(id))?;
        session.last_seen = Instant::now();
        session.table.clone().ok_or(SessionError::NoDataset)
    }

    /// Replace (or with `None`, clear) the session's table
    pub async fn set_table(
        &self,
        id: SessionId,
        table: Option<Arc<LoadedTable>>,
    ) -> Result<(), SessionError> {
        let mut sessions = self.inner.write().await;
        self.purge_locked(&mut sessions);
        let session = sessions
            .get_mut(&id)
            .ok_or(SessionError::UnknownSession(id))?;
        session.last_seen = Instant::now();
        session.table = table;
        Ok(())
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let mut sessions = self.inner.write().await;
        self.purge_locked(&mut sessions);
        sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn purge_locked(&self, sessions: &mut HashMap<SessionId, Session>) {
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen.elapsed() < self.ttl);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "Expired idle sessions");
        }
    }
}
