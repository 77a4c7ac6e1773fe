//! Domain Errors

use crate::domain::session::SessionId;
use thiserror::Error;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The id is unknown to the manager, or no id was given at all.
    #[error("Invalid Session ID: {}", display_id(.0))]
    InvalidSessionId(Option<SessionId>),
    #[error("session manager failure")]
    Backend(#[source] BoxedError),
}

impl SessionError {
    pub fn invalid(id: Option<&str>) -> Self {
        Self::InvalidSessionId(id.map(SessionId::from))
    }
}

fn display_id(id: &Option<SessionId>) -> &str {
    id.as_ref().map(|c| c.as_str()).unwrap_or("<none>")
}
