//! In-process stand-in for an iRODS agent.
//!
//! [`FakeAgent`] listens on a real socket and speaks the newline-delimited
//! JSON protocol from `irods-api-types`, so client code can be exercised end
//! to end without a server. Tests seed descriptors per session and can make
//! the agent drop connections to simulate transport loss.
//!
//! ```ignore
//! let agent = FakeAgent::spawn()?;
//! let mut comm = RcComm::connect(&config_for(agent.endpoint()))?;
//! let fd = agent.open_descriptor(comm.cookie(), DescriptorState::new("rods", "/tempZone/a"))?;
//! ```

mod dispatch;
mod state;
mod transport;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use irods_config::SocketEndpoint;

pub use dispatch::AgentError;
pub use state::DescriptorState;
pub use transport::ListenerError;

use dispatch::SessionHandler;
use state::AgentState;
use transport::{ListenerHandle, SocketListener};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A running fake agent. Dropping it stops the listener.
#[derive(Debug)]
pub struct FakeAgent {
    endpoint: SocketEndpoint,
    state: Arc<AgentState>,
    listener: ListenerHandle,
}

impl FakeAgent {
    /// Starts an agent on a free loopback TCP port.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the port cannot be bound.
    pub fn spawn() -> Result<Self, ListenerError> {
        Self::spawn_on(&SocketEndpoint::tcp("127.0.0.1", 0))
    }

    /// Starts an agent on `endpoint`, creating the parent directory of a Unix
    /// socket if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the endpoint cannot be bound.
    pub fn spawn_on(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let listener = SocketListener::bind(endpoint)?;
        let endpoint = listener.endpoint().clone();
        let state = Arc::new(AgentState::default());
        let listener = listener.start(Arc::new(SessionHandler::new(Arc::clone(&state))))?;
        Ok(Self {
            endpoint,
            state,
            listener,
        })
    }

    /// Endpoint clients should connect to.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Opens a descriptor on session `cookie` and returns its index.
    ///
    /// # Errors
    ///
    /// Fails when no session has `cookie` or the table is full.
    pub fn open_descriptor(&self, cookie: i32, state: DescriptorState) -> Result<i32, AgentError> {
        self.state
            .with_session(cookie, |session| session.descriptors.open(state))
    }

    /// Closes descriptor `fd` on session `cookie`.
    ///
    /// # Errors
    ///
    /// Fails when no session has `cookie` or `fd` is not open.
    pub fn close_descriptor(&self, cookie: i32, fd: i32) -> Result<DescriptorState, AgentError> {
        self.state.with_session(cookie, |session| {
            session
                .descriptors
                .close(fd)
                .ok_or(AgentError::DescriptorNotOpen(fd))
        })
    }

    /// Current state of descriptor `fd` on session `cookie`.
    ///
    /// # Errors
    ///
    /// Fails when no session has `cookie` or `fd` is not open.
    pub fn descriptor(&self, cookie: i32, fd: i32) -> Result<DescriptorState, AgentError> {
        self.state.with_session(cookie, |session| {
            session
                .descriptors
                .get(fd)
                .cloned()
                .ok_or(AgentError::DescriptorNotOpen(fd))
        })
    }

    /// Number of sessions currently connected.
    #[must_use]
    pub fn sessions(&self) -> usize {
        self.state.session_count()
    }

    /// Polls until [`FakeAgent::sessions`] equals `expected` or `timeout`
    /// passes. Returns whether the count was reached.
    #[must_use]
    pub fn wait_for_sessions(&self, expected: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.sessions() == expected {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Number of API requests received across all sessions.
    #[must_use]
    pub fn api_requests(&self) -> usize {
        self.state.api_requests()
    }

    /// When enabled, the agent closes a session's connection on the next API
    /// request instead of replying.
    pub fn set_hang_up(&self, enabled: bool) {
        self.state.set_hang_up(enabled);
    }

    /// Stops accepting connections and waits for the listener to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept loop panicked.
    pub fn shutdown(mut self) -> Result<(), ListenerError> {
        self.listener.stop()
    }
}
