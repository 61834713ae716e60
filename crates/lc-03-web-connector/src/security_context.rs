//! Security context handed out by an in-process `login`.

use shared_types::{ConnectionId, SecurityContext, SecurityContextId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSecurityContext {
    connection_id: ConnectionId,
    user: String,
    session_id: SecurityContextId,
}

impl WebSecurityContext {
    pub fn new(connection_id: ConnectionId, user: impl Into<String>) -> Self {
        Self {
            connection_id,
            user: user.into(),
            session_id: SecurityContextId::generate(),
        }
    }
}

impl SecurityContext for WebSecurityContext {
    fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    fn user(&self) -> &str {
        &self.user
    }

    fn session_id(&self) -> &SecurityContextId {
        &self.session_id
    }
}
