//! Session storage
//!
//! Every session has its own turn lock so that turns on one debate are
//! serialized while different debates run in parallel. Next to the lock sits
//! the last committed state, which readers take without waiting on a turn.
//! The map lock is only held long enough to clone the session handle.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::error::StorageError;
use moot_core::DebateSession;

#[derive(Debug)]
struct SessionSlot {
    turn: Arc<Mutex<()>>,
    committed: RwLock<DebateSession>,
}

type SessionHandle = Arc<SessionSlot>;

/// Exclusive right to run one turn on a session.
///
/// Derefs to the state committed before the turn began. [`SessionTurn::commit`]
/// publishes the next state; dropping the turn without committing leaves the
/// last committed state in place.
#[derive(Debug)]
pub struct SessionTurn {
    _permit: OwnedMutexGuard<()>,
    slot: SessionHandle,
    current: DebateSession,
}

impl SessionTurn {
    /// Publish `next` and release the turn lock
    pub async fn commit(self, next: DebateSession) {
        *self.slot.committed.write().await = next;
    }
}

impl Deref for SessionTurn {
    type Target = DebateSession;

    fn deref(&self) -> &DebateSession {
        &self.current
    }
}

/// Process-lifetime store of debate sessions
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session under its own id
    pub async fn insert(&self, session: DebateSession) -> Result<Uuid, StorageError> {
        let id = session.id();
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(StorageError::AlreadyExists(id.to_string()));
        }
        sessions.insert(
            id,
            Arc::new(SessionSlot {
                turn: Arc::new(Mutex::new(())),
                committed: RwLock::new(session),
            }),
        );
        tracing::debug!(session_id = %id, "Session stored");
        Ok(id)
    }

    async fn handle(&self, id: Uuid) -> Result<SessionHandle, StorageError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// Last committed state of a session. Never waits on an in-flight turn.
    pub async fn get(&self, id: Uuid) -> Result<DebateSession, StorageError> {
        let handle = self.handle(id).await?;
        let session = handle.committed.read().await.clone();
        Ok(session)
    }

    /// Exclusive access to a session for the duration of one turn
    pub async fn lock(&self, id: Uuid) -> Result<SessionTurn, StorageError> {
        let handle = self.handle(id).await?;
        let permit = handle.turn.clone().lock_owned().await;
        let current = handle.committed.read().await.clone();
        Ok(SessionTurn {
            _permit: permit,
            slot: handle,
            current,
        })
    }

    /// Remove a session, returning its final state.
    ///
    /// A turn already running is allowed to commit first.
    pub async fn remove(&self, id: Uuid) -> Result<DebateSession, StorageError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let _permit = handle.turn.lock().await;
        let session = handle.committed.read().await.clone();
        tracing::debug!(session_id = %id, "Session removed");
        Ok(session)
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// JSON transcript of a session
    pub async fn export_json(&self, id: Uuid) -> Result<String, StorageError> {
        let session = self.get(id).await?;
        Ok(serde_json::to_string_pretty(&session)?)
    }
}
