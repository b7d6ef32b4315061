//! Owned structured-text replies.

use std::ffi::CString;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ClientError;

/// Structured text returned by an agent, owned by the caller.
///
/// A `JsonOutput` only exists for successful calls and always holds text
/// that parsed as JSON when it was received. Dropping it releases the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonOutput(String);

impl JsonOutput {
    /// Accepts `text` from a successful reply after checking it parses.
    pub(crate) fn from_reply(text: String) -> Result<Self, ClientError> {
        serde_json::from_str::<serde::de::IgnoredAny>(&text)
            .map_err(|error| ClientError::BadReply(format!("output is not JSON: {error}")))?;
        Ok(Self(text))
    }

    /// Borrows the reply text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Takes ownership of the reply text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Parses the reply into a generic JSON value.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.0)
    }

    /// Decodes the reply into `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.0)
    }

    /// Converts the reply into a NUL-terminated buffer for C callers.
    pub(crate) fn into_c_string(self) -> Result<CString, ClientError> {
        CString::new(self.0)
            .map_err(|_| ClientError::BadReply("output contains an interior NUL byte".into()))
    }
}

impl AsRef<str> for JsonOutput {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JsonOutput {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
