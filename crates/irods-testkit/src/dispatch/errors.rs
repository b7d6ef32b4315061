//! Failures the fake agent reports to clients or to the test driving it.

use std::io;

use thiserror::Error;

use irods_api_types::status;

/// Errors raised while serving a session or controlling the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A request line was not a client message.
    #[error("malformed message: {message}")]
    MalformedMessage {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
    /// A request line exceeded the size limit.
    #[error("request too large: more than {max_size} bytes")]
    RequestTooLarge { max_size: usize },
    /// The API input was not usable.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    /// No handler exists for the API number.
    #[error("unsupported api number {0}")]
    UnmatchedApi(i32),
    /// The descriptor lies outside the descriptor table.
    #[error("descriptor {0} is out of range")]
    DescriptorOutOfRange(i64),
    /// The descriptor is not open on this session.
    #[error("descriptor {0} is not open")]
    DescriptorNotOpen(i32),
    /// The session's user does not own the descriptor.
    #[error("user '{user}' may not inspect descriptor {fd}")]
    NotOwner { fd: i32, user: String },
    /// No live session has this cookie.
    #[error("no session with cookie {0}")]
    UnknownSession(i32),
    /// Every descriptor slot is taken.
    #[error("descriptor table is full")]
    TableFull,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialise reply: {0}")]
    SerialiseReply(#[source] serde_json::Error),
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AgentError {
    /// Registry status sent to the client for this error.
    #[must_use]
    pub const fn status(&self) -> i32 {
        match self {
            Self::MalformedMessage { .. }
            | Self::RequestTooLarge { .. }
            | Self::InvalidInput { .. } => status::SYS_INVALID_INPUT_PARAM,
            Self::UnmatchedApi(_) => status::SYS_UNMATCHED_API_NUM,
            Self::DescriptorOutOfRange(_) | Self::TableFull => status::SYS_FILE_DESC_OUT_OF_RANGE,
            Self::DescriptorNotOpen(_) | Self::UnknownSession(_) => status::BAD_INPUT_DESC_INDEX,
            Self::NotOwner { .. } => status::SYS_NO_API_PRIV,
            Self::Io(_) | Self::SerialiseReply(_) | Self::Internal { .. } => {
                status::SYS_INTERNAL_ERR
            }
        }
    }

    pub(crate) fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedMessage {
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(AgentError::malformed("empty"), status::SYS_INVALID_INPUT_PARAM)]
    #[case(AgentError::UnmatchedApi(1), status::SYS_UNMATCHED_API_NUM)]
    #[case(AgentError::DescriptorOutOfRange(2), status::SYS_FILE_DESC_OUT_OF_RANGE)]
    #[case(AgentError::DescriptorNotOpen(3), status::BAD_INPUT_DESC_INDEX)]
    #[case(
        AgentError::NotOwner { fd: 3, user: "bob".into() },
        status::SYS_NO_API_PRIV
    )]
    #[case(AgentError::internal("poisoned"), status::SYS_INTERNAL_ERR)]
    fn maps_to_registry(#[case] error: AgentError, #[case] expected: i32) {
        assert_eq!(error.status(), expected);
    }
}
