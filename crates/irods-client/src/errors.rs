//! Error types for the client runtime and their status-code mapping.

use std::io;
use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use irods_api_types::status;

/// Failures surfaced by client calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required pointer was null at the C boundary.
    #[error("required argument '{0}' was null")]
    NullArgument(&'static str),
    /// Layered configuration could not be loaded.
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(#[source] Arc<OrthoError>),
    /// The request text was not a structured document.
    #[error("invalid request input: {message}")]
    InvalidInput {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
    #[error("failed to resolve agent address {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to connect to agent at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
    #[error("startup handshake with {endpoint} failed: {message}")]
    Handshake { endpoint: String, message: String },
    #[error("agent at {endpoint} rejected the session with status {status}")]
    SessionRejected { endpoint: String, status: i32 },
    #[error("failed to serialise request: {0}")]
    SerialiseRequest(#[source] serde_json::Error),
    #[error("failed to send request to agent: {0}")]
    SendRequest(#[source] io::Error),
    #[error("failed to read reply from agent: {0}")]
    ReadResponse(#[source] io::Error),
    #[error("agent did not reply before the request timeout: {0}")]
    TimedOut(#[source] io::Error),
    #[error("agent reply exceeds {max_size} bytes")]
    ReplyTooLarge { max_size: usize },
    #[error("agent closed the connection without replying")]
    MissingReply,
    #[error("failed to parse agent message: {0}")]
    ParseMessage(#[source] serde_json::Error),
    #[error("unexpected {0} message from agent")]
    UnexpectedMessage(&'static str),
    #[error("agent reply is unusable: {0}")]
    BadReply(String),
    /// An earlier transport failure left the session unusable.
    #[error("connection is unusable after an earlier transport failure")]
    ConnectionBroken,
    /// The agent processed the request and refused it.
    #[error("agent returned {status}: {message}")]
    Agent { status: i32, message: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Registry status reported for this error across the C boundary.
    #[must_use]
    pub fn status(&self) -> i32 {
        match self {
            Self::NullArgument(_) => status::SYS_INTERNAL_NULL_INPUT_ERR,
            Self::LoadConfiguration(_)
            | Self::InvalidInput { .. }
            | Self::SerialiseRequest(_) => status::SYS_INVALID_INPUT_PARAM,
            Self::Resolve { .. }
            | Self::Connect { .. }
            | Self::Handshake { .. }
            | Self::SessionRejected { .. } => status::USER_SOCK_CONNECT_ERR,
            #[cfg(not(unix))]
            Self::UnsupportedUnixTransport(_) => status::USER_SOCK_CONNECT_ERR,
            Self::SendRequest(_) => status::SYS_SOCK_WRITE_ERR,
            Self::ReadResponse(_) | Self::MissingReply | Self::ConnectionBroken => {
                status::SYS_SOCK_READ_ERR
            }
            Self::TimedOut(_) => status::SYS_SOCK_READ_TIMEDOUT,
            Self::ParseMessage(_)
            | Self::UnexpectedMessage(_)
            | Self::BadReply(_)
            | Self::ReplyTooLarge { .. } => status::SYS_BAD_REPLY_ERR,
            Self::Agent { status, .. } => *status,
            Self::Internal(_) => status::SYS_INTERNAL_ERR,
        }
    }

    /// Returns true when the failure came from the connection rather than
    /// from the request or the agent's decision.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::Resolve { .. }
                | Self::Connect { .. }
                | Self::SendRequest(_)
                | Self::ReadResponse(_)
                | Self::TimedOut(_)
                | Self::MissingReply
                | Self::ConnectionBroken
        )
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn from_input_json(source: serde_json::Error) -> Self {
        Self::InvalidInput {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Classifies a read failure, separating timeouts from other IO errors.
    pub(crate) fn from_read(source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::TimedOut(source),
            _ => Self::ReadResponse(source),
        }
    }
}
