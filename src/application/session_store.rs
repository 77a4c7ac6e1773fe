use crate::domain::errors::SessionError;
use crate::domain::session::{SessionId, SessionManager};
use compact_str::ToCompactString;
use fnv::FnvHashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub created_at: OffsetDateTime,
    pub resets: u32,
}

impl SessionRecord {
    fn fresh(resets: u32) -> Self {
        Self {
            created_at: OffsetDateTime::now_utc(),
            resets,
        }
    }
}

/// In-process [SessionManager] keeping nothing but the ids it handed out.
#[derive(Debug, Default)]
pub struct LocalSessionManager {
    sessions: Mutex<FnvHashMap<SessionId, SessionRecord>>,
}

impl LocalSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, FnvHashMap<SessionId, SessionRecord>> {
        // the map is never left half-updated, so a poisoned lock is still usable
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions().contains_key(&SessionId::from(id))
    }

    pub fn session(&self, id: &str) -> Option<SessionRecord> {
        self.sessions().get(&SessionId::from(id)).copied()
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionManager for LocalSessionManager {
    fn create_session(&self, requested: Option<&str>) -> SessionId {
        let id = match requested {
            Some(id) if !id.is_empty() => SessionId::from(id),
            _ => SessionId::new(uuid::Uuid::new_v4().simple().to_compact_string()),
        };

        let mut sessions = self.sessions();
        if let Some(existing) = sessions.get(&id) {
            tracing::debug!(
                session_id = %id,
                created_at = %existing.created_at,
                "session already exists, reusing it"
            );
        } else {
            sessions.insert(id.clone(), SessionRecord::fresh(0));
            tracing::debug!(session_id = %id, "session created");
        }

        id
    }

    fn remove_session(&self, id: Option<&str>) -> Result<(), SessionError> {
        let key = id.map(SessionId::from).ok_or_else(|| SessionError::invalid(None))?;

        match self.sessions().remove(&key) {
            Some(_) => {
                tracing::debug!(session_id = %key, "session removed");
                Ok(())
            }
            None => Err(SessionError::InvalidSessionId(Some(key))),
        }
    }

    fn reset_session(&self, id: Option<&str>) -> Result<(), SessionError> {
        let key = id.map(SessionId::from).ok_or_else(|| SessionError::invalid(None))?;

        let mut sessions = self.sessions();
        let Some(previous) = sessions.remove(&key) else {
            return Err(SessionError::InvalidSessionId(Some(key)));
        };

        sessions.insert(key.clone(), SessionRecord::fresh(previous.resets + 1));
        tracing::debug!(session_id = %key, resets = previous.resets + 1, "session reset");
        Ok(())
    }
}
