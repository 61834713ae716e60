//! # Error Codec
//!
//! Serializes errors into the `{name, message, stack}` wire format and
//! inflates them back on the other side of the transport.
//!
//! Inflation never looks a name up dynamically. The name is matched against
//! the fixed [`ErrorKind`] allow-list. Anything else degrades to a generic
//! `Error` that still carries the original name, message and stack.

use crate::errors::ConnectorError;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

/// Built-in error kinds that survive a round trip with their type intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
    EvalError,
    #[serde(rename = "URIError")]
    UriError,
}

impl ErrorKind {
    /// Every recognized kind.
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Error,
        ErrorKind::TypeError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
        ErrorKind::EvalError,
        ErrorKind::UriError,
    ];

    /// Name of the kind as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
            Self::ReferenceError => "ReferenceError",
            Self::SyntaxError => "SyntaxError",
            Self::EvalError => "EvalError",
            Self::UriError => "URIError",
        }
    }

    /// Look a wire name up in the allow-list.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error as carried on the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub stack: String,
}

impl WireError {
    /// Build a wire error whose stack is just its header line.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            name: kind.as_str().to_string(),
            stack: stack_header(kind.as_str(), &message),
            message,
        }
    }
}

/// Error raised on the remote side of a transport, inflated locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    kind: ErrorKind,
    name: String,
    message: String,
    stack: String,
}

impl RemoteError {
    /// Create a remote error of a known kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        deserialize(WireError::new(kind, message))
    }

    /// The allow-listed kind (`Error` when the name was not recognized).
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The name sent by the peer, verbatim.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The stack string sent by the peer, verbatim.
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Whether the peer's error name was on the allow-list.
    pub fn is_recognized(&self) -> bool {
        ErrorKind::from_name(&self.name).is_some()
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl StdError for RemoteError {}

impl From<WireError> for RemoteError {
    fn from(wire: WireError) -> Self {
        deserialize(wire)
    }
}

impl From<&RemoteError> for WireError {
    fn from(err: &RemoteError) -> Self {
        WireError {
            name: err.name.clone(),
            message: err.message.clone(),
            stack: err.stack.clone(),
        }
    }
}

/// Inflate a wire error. Never fails.
pub fn deserialize(wire: WireError) -> RemoteError {
    let kind = ErrorKind::from_name(&wire.name).unwrap_or(ErrorKind::Error);
    let stack = if wire.stack.is_empty() {
        stack_header(&wire.name, &wire.message)
    } else {
        wire.stack
    };
    RemoteError {
        kind,
        name: wire.name,
        message: wire.message,
        stack,
    }
}

/// Flatten a connector error for the wire.
///
/// Remote errors pass through untouched so a relay does not rewrite the
/// original stack. Local errors get a stack built from their source chain.
pub fn serialize(err: &ConnectorError) -> WireError {
    if let ConnectorError::Remote(remote) = err {
        return WireError::from(remote);
    }

    let kind = kind_of(err);
    let message = err.to_string();
    let mut stack = stack_header(kind.as_str(), &message);
    let mut source = err.source();
    while let Some(cause) = source {
        stack.push_str("\n    caused by: ");
        stack.push_str(&cause.to_string());
        source = cause.source();
    }

    WireError {
        name: kind.as_str().to_string(),
        message,
        stack,
    }
}

fn kind_of(err: &ConnectorError) -> ErrorKind {
    match err {
        ConnectorError::Remote(remote) => remote.kind(),
        ConnectorError::InvalidArgument(_) => ErrorKind::TypeError,
        ConnectorError::UnknownReference { .. } => ErrorKind::ReferenceError,
        ConnectorError::Archive(_) | ConnectorError::InvalidResponse(_) => ErrorKind::SyntaxError,
        _ => ErrorKind::Error,
    }
}

fn stack_header(name: &str, message: &str) -> String {
    format!("{name}: {message}")
}
