use crate::domain::errors::SessionError;
use compact_str::CompactString;
use derive_more::{Deref, Display};
use std::sync::Arc;

/// Opaque session identifier, either picked by the client or generated by the
/// [SessionManager].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Display)]
pub struct SessionId(CompactString);

impl SessionId {
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

/// Owner of session storage and lifecycle.
///
/// The admin API only ever calls these three operations; any synchronisation
/// the storage needs lives behind `&self`.
pub trait SessionManager {
    /// Creates a session, returning the id that was actually assigned. A
    /// missing `requested` id lets the manager pick one.
    fn create_session(&self, requested: Option<&str>) -> SessionId;

    /// Fails with [SessionError::InvalidSessionId] when `id` is unknown or missing.
    fn remove_session(&self, id: Option<&str>) -> Result<(), SessionError>;

    /// Destroys and recreates the session under the same id.
    fn reset_session(&self, id: Option<&str>) -> Result<(), SessionError>;
}

impl<M: SessionManager + ?Sized> SessionManager for Arc<M> {
    fn create_session(&self, requested: Option<&str>) -> SessionId {
        (**self).create_session(requested)
    }

    fn remove_session(&self, id: Option<&str>) -> Result<(), SessionError> {
        (**self).remove_session(id)
    }

    fn reset_session(&self, id: Option<&str>) -> Result<(), SessionError> {
        (**self).reset_session(id)
    }
}

impl<M: SessionManager + ?Sized> SessionManager for &M {
    fn create_session(&self, requested: Option<&str>) -> SessionId {
        (**self).create_session(requested)
    }

    fn remove_session(&self, id: Option<&str>) -> Result<(), SessionError> {
        (**self).remove_session(id)
    }

    fn reset_session(&self, id: Option<&str>) -> Result<(), SessionError> {
        (**self).reset_session(id)
    }
}
