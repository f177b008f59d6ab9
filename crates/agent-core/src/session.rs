//! Session Checkpoints
//!
//! Keyed storage of the latest turn snapshot per conversation, plus the
//! per-session lock that keeps steps of one conversation strictly sequential.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentError, Result};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a session taken after one graph step
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint<S> {
    pub session_id: SessionId,

    /// Monotonic step counter across the session's lifetime
    pub step: u64,

    pub state: S,

    pub created_at: DateTime<Utc>,
}

impl<S> Checkpoint<S> {
    pub fn new(session_id: SessionId, step: u64, state: S) -> Self {
        Self {
            session_id,
            step,
            state,
            created_at: Utc::now(),
        }
    }
}

/// Checkpoint store trait
pub trait CheckpointStore<S>: Send + Sync {
    /// Replace the latest checkpoint of a session
    fn save(&self, checkpoint: Checkpoint<S>) -> Result<()>;

    /// Latest checkpoint of a session
    fn load(&self, id: &SessionId) -> Result<Option<Checkpoint<S>>>;

    /// Forget a session
    fn delete(&self, id: &SessionId) -> Result<()>;

    /// Known session ids
    fn list(&self) -> Result<Vec<SessionId>>;
}

/// In-memory checkpoint store; lost on restart
pub struct MemoryCheckpointStore<S> {
    checkpoints: RwLock<HashMap<SessionId, Checkpoint<S>>>,
}

impl<S> Default for MemoryCheckpointStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MemoryCheckpointStore<S> {
    pub fn new() -> Self {
        Self {
            checkpoints: RwLock::new(HashMap::new()),
        }
    }
}

fn poisoned<E>(_: E) -> AgentError {
    AgentError::Session("checkpoint store lock poisoned".into())
}

impl<S: Clone + Send + Sync> CheckpointStore<S> for MemoryCheckpointStore<S> {
    fn save(&self, checkpoint: Checkpoint<S>) -> Result<()> {
        let mut checkpoints = self.checkpoints.write().map_err(poisoned)?;
        checkpoints.insert(checkpoint.session_id.clone(), checkpoint);
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Checkpoint<S>>> {
        let checkpoints = self.checkpoints.read().map_err(poisoned)?;
        Ok(checkpoints.get(id).cloned())
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        let mut checkpoints = self.checkpoints.write().map_err(poisoned)?;
        checkpoints.remove(id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<SessionId>> {
        let checkpoints = self.checkpoints.read().map_err(poisoned)?;
        Ok(checkpoints.keys().cloned().collect())
    }
}

/// One async mutex per session id
///
/// Holding the guard for a whole turn keeps steps of the same session
/// sequential while other sessions run freely. Entries only live while a
/// turn holds or waits on them.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of a session
    pub async fn acquire(&self, id: &SessionId) -> Result<SessionGuard<'_>> {
        let guard = self.handle(id)?.lock_owned().await;
        Ok(SessionGuard {
            locks: self,
            id: id.clone(),
            guard: Some(guard),
        })
    }

    fn handle(&self, id: &SessionId) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(poisoned)?;
        Ok(locks.entry(id.clone()).or_default().clone())
    }

    /// Drop the entry unless another turn still holds a handle to it
    fn release(&self, id: &SessionId) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        if locks.get(id).is_some_and(|m| Arc::strong_count(m) == 1) {
            locks.remove(id);
        }
    }
}

/// Exclusive use of one session, released on drop
pub struct SessionGuard<'a> {
    locks: &'a SessionLocks,
    id: SessionId,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        // The mutex goes first so its handle no longer counts as a holder
        drop(self.guard.take());
        self.locks.release(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_keeps_latest() {
        let store = MemoryCheckpointStore::<Vec<u32>>::new();
        let id = SessionId::from_string("conv-1");

        store.save(Checkpoint::new(id.clone(), 1, vec![1])).unwrap();
        store.save(Checkpoint::new(id.clone(), 2, vec![1, 2])).unwrap();

        let loaded = store.load(&id).unwrap().unwrap();
        assert_eq!(loaded.step, 2);
        assert_eq!(loaded.state, vec![1, 2]);
        assert_eq!(store.list().unwrap(), vec![id.clone()]);

        store.delete(&id).unwrap();
        assert!(store.load(&id).unwrap().is_none());
    }

    fn tracked(locks: &SessionLocks) -> usize {
        locks.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_session_locks_are_per_session() {
        let locks = SessionLocks::new();
        let a = SessionId::from_string("a");
        let b = SessionId::from_string("b");

        let _guard = locks.acquire(&a).await.unwrap();

        assert!(locks.handle(&a).unwrap().try_lock().is_err());
        assert!(locks.handle(&b).unwrap().try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_session_lock_entries_are_pruned() {
        let locks = SessionLocks::new();
        let ids: Vec<SessionId> = (0..10).map(|i| SessionId::from_string(format!("conv-{i}"))).collect();

        for id in &ids {
            let _guard = locks.acquire(id).await.unwrap();
            assert_eq!(tracked(&locks), 1);
        }
        assert_eq!(tracked(&locks), 0);

        // A waiting turn keeps the entry past the holder's release
        let first = locks.acquire(&ids[0]).await.unwrap();
        let waiter = locks.handle(&ids[0]).unwrap();
        drop(first);
        assert_eq!(tracked(&locks), 1);
        assert!(waiter.try_lock().is_ok());

        drop(waiter);
        drop(locks.acquire(&ids[0]).await.unwrap());
        assert_eq!(tracked(&locks), 0);
    }
}
