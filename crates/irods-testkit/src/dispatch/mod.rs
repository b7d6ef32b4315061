//! Session handling and API dispatch for the fake agent.
//!
//! Each connection opens with a `startup` line answered by `version`; the
//! agent then answers every `api_request` line with one `api_reply` line until
//! the client sends `disconnect` or closes the stream. Malformed lines get a
//! failure reply and the session stays open.

mod descriptor_info;
mod errors;
mod router;
mod session;

pub use self::errors::AgentError;
pub(crate) use self::session::SessionHandler;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
