//! Socket listener for the fake agent.
//!
//! The listener binds a [`irods_config::SocketEndpoint`] and accepts
//! connections on a background thread, handing each one to a
//! [`ConnectionHandler`] on its own thread.

mod errors;
mod listener;
mod stream;

pub use self::errors::ListenerError;
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub(crate) use self::stream::{ConnectionHandler, ConnectionStream};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
