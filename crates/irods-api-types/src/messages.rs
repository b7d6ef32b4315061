use serde::{Deserialize, Serialize};

use crate::api::{API_VERSION, RELEASE_VERSION};
use crate::status::SUCCESS;

/// Identity and protocol details sent when a session opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupPack {
    /// Account the connection authenticates as.
    pub proxy_user: String,
    /// Zone of the proxy account.
    pub proxy_zone: String,
    /// Account the requests are performed on behalf of.
    pub client_user: String,
    /// Zone of the client account.
    pub client_zone: String,
    /// Client release string.
    pub release_version: String,
    /// Client protocol revision.
    pub api_version: String,
    /// Free-form connection options.
    #[serde(default)]
    pub option: String,
}

impl StartupPack {
    /// Builds a startup pack where the proxy and client identities coincide.
    #[must_use]
    pub fn for_user(user: impl Into<String>, zone: impl Into<String>) -> Self {
        let user_name = user.into();
        let zone_name = zone.into();
        Self {
            proxy_user: user_name.clone(),
            proxy_zone: zone_name.clone(),
            client_user: user_name,
            client_zone: zone_name,
            release_version: RELEASE_VERSION.to_owned(),
            api_version: API_VERSION.to_owned(),
            option: String::new(),
        }
    }
}

/// Agent answer to a [`StartupPack`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    /// Zero when the session was accepted.
    pub status: i32,
    /// Agent release string.
    pub release_version: String,
    /// Agent protocol revision.
    pub api_version: String,
    /// Session identifier assigned by the agent.
    pub cookie: i32,
}

impl VersionReply {
    /// Accepts a session under `cookie`.
    #[must_use]
    pub fn accepted(cookie: i32) -> Self {
        Self {
            status: SUCCESS,
            release_version: RELEASE_VERSION.to_owned(),
            api_version: API_VERSION.to_owned(),
            cookie,
        }
    }

    /// Rejects a session with `status`.
    #[must_use]
    pub fn rejected(status: i32) -> Self {
        Self {
            status,
            release_version: RELEASE_VERSION.to_owned(),
            api_version: API_VERSION.to_owned(),
            cookie: 0,
        }
    }
}

/// Agent answer to a single API request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReply {
    /// Zero on success, a registry code otherwise.
    pub status: i32,
    /// Structured output text, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Human-readable failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiReply {
    /// Successful reply carrying `output`.
    #[must_use]
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            status: SUCCESS,
            output: Some(output.into()),
            error: None,
        }
    }

    /// Failed reply with `status` and a description.
    #[must_use]
    pub fn failure(status: i32, error: impl Into<String>) -> Self {
        Self {
            status,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Messages sent from client to agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens the session.
    Startup(StartupPack),
    /// Invokes an API by number.
    ApiRequest {
        /// API number, for example [`crate::GET_FILE_DESCRIPTOR_INFO_APN`].
        api_number: i32,
        /// Request text forwarded verbatim to the API handler.
        input: String,
    },
    /// Closes the session.
    Disconnect,
}

/// Messages sent from agent to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentMessage {
    /// Answer to [`ClientMessage::Startup`].
    Version(VersionReply),
    /// Answer to [`ClientMessage::ApiRequest`].
    ApiReply(ApiReply),
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests use expect for clarity")]

    use super::*;

    #[test]
    fn api_request_carries_input_as_text() {
        let message = ClientMessage::ApiRequest {
            api_number: 20000,
            input: r#"{"fd":3}"#.to_owned(),
        };
        let line = serde_json::to_string(&message).expect("serialise request");
        assert_eq!(
            line,
            r#"{"kind":"api_request","api_number":20000,"input":"{\"fd\":3}"}"#
        );
    }

    #[test]
    fn disconnect_is_a_bare_tag() {
        let line = serde_json::to_string(&ClientMessage::Disconnect).expect("serialise");
        assert_eq!(line, r#"{"kind":"disconnect"}"#);
    }

    #[test]
    fn failed_reply_omits_output() {
        let reply = AgentMessage::ApiReply(ApiReply::failure(-326000, "not open"));
        let line = serde_json::to_string(&reply).expect("serialise reply");
        assert!(!line.contains("output"));
        assert!(line.contains(r#""status":-326000"#));
    }

    #[test]
    fn version_reply_parses_from_agent_line() {
        let line = r#"{"kind":"version","status":0,"release_version":"rods4.2.8","api_version":"d","cookie":400}"#;
        let message: AgentMessage = serde_json::from_str(line).expect("parse version");
        assert_eq!(message, AgentMessage::Version(VersionReply::accepted(400)));
    }
}
