use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Host used when no agent endpoint is configured.
pub const DEFAULT_AGENT_HOST: &str = "localhost";

/// Port iRODS agents listen on unless told otherwise.
pub const DEFAULT_AGENT_PORT: u16 = 1247;

/// Account the client authenticates as by default.
pub const DEFAULT_USER_NAME: &str = "rods";

/// Zone the default account belongs to.
pub const DEFAULT_ZONE_NAME: &str = "tempZone";

/// Seconds allowed for establishing the agent connection.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Seconds allowed for a single request/reply exchange.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default agent endpoint, `tcp://localhost:1247`.
#[must_use]
pub fn default_agent_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_AGENT_HOST, DEFAULT_AGENT_PORT)
}

/// Owned default user name.
#[must_use]
pub fn default_user_name() -> String {
    DEFAULT_USER_NAME.to_owned()
}

/// Owned default zone name.
#[must_use]
pub fn default_zone_name() -> String {
    DEFAULT_ZONE_NAME.to_owned()
}

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
