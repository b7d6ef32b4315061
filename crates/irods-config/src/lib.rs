//! Layered configuration for the iRODS descriptor-info client.
//!
//! Values resolve in the usual `ortho_config` order: built-in defaults, then
//! configuration files (named with `--config-path` or `IRODS_CONFIG_PATH`),
//! then `IRODS_*` environment variables, then command-line style arguments
//! such as `--agent-endpoint tcp://irods.example.org:1247`.

mod defaults;
mod logging;
mod socket;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_AGENT_HOST, DEFAULT_AGENT_PORT, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOG_FILTER,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_NAME, DEFAULT_ZONE_NAME, default_agent_endpoint,
    default_log_filter, default_log_filter_string, default_log_format, default_user_name,
    default_zone_name,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "IRODS")]
pub struct Config {
    /// Agent the client connects to.
    #[ortho_config(default = default_agent_endpoint())]
    pub agent_endpoint: SocketEndpoint,
    /// Account presented in the startup handshake.
    #[ortho_config(default = default_user_name())]
    pub user_name: String,
    /// Zone of the account presented in the startup handshake.
    #[ortho_config(default = default_zone_name())]
    pub zone_name: String,
    /// Seconds allowed for establishing the connection; zero waits on the OS.
    #[ortho_config(default = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,
    /// Seconds allowed per request; zero waits indefinitely.
    #[ortho_config(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
    /// `tracing_subscriber::EnvFilter` expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the tracing subscriber.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_endpoint: default_agent_endpoint(),
            user_name: default_user_name(),
            zone_name: default_zone_name(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Agent endpoint.
    #[must_use]
    pub const fn agent_endpoint(&self) -> &SocketEndpoint {
        &self.agent_endpoint
    }

    /// Account name presented to the agent.
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Zone of the account presented to the agent.
    #[must_use]
    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }

    /// Connection establishment timeout, or `None` to wait on the OS default.
    #[must_use]
    pub const fn connect_timeout(&self) -> Option<Duration> {
        if self.connect_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.connect_timeout_secs))
        }
    }

    /// Per-request timeout, or `None` when requests may block indefinitely.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
