//! Security context handed out by a proxy `login`.

use shared_types::{ConnectionId, SecurityContext, SecurityContextId};

/// Remote session token plus the identity it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySecurityContext {
    connection_id: ConnectionId,
    user: String,
    session_id: SecurityContextId,
}

impl ProxySecurityContext {
    pub fn new(connection_id: ConnectionId, user: impl Into<String>, session_id: SecurityContextId) -> Self {
        Self {
            connection_id,
            user: user.into(),
            session_id,
        }
    }
}

impl SecurityContext for ProxySecurityContext {
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
