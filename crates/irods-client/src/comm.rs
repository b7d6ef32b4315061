//! Session handle shared by every API call.
//!
//! An [`RcComm`] owns one transport stream to an agent. Opening it performs
//! the startup handshake; afterwards each API call writes one request line and
//! reads exactly one reply line. Calls take `&mut self`, so a handle can never
//! carry two requests at once.

use std::io::{self, BufRead, BufReader, Read, Write};

use serde::Serialize;
use tracing::{debug, warn};

use irods_api_types::status::SUCCESS;
use irods_api_types::{AgentMessage, ApiReply, ClientMessage, StartupPack, VersionReply};
use irods_config::{Config, SocketEndpoint};

use crate::ClientError;
use crate::transport::{self, Connection};

pub(crate) const COMM_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::comm");
const EMPTY_LINE_LIMIT: usize = 10;
/// Largest reply line accepted from an agent, excluding the newline.
pub(crate) const MAX_REPLY_BYTES: usize = 1024 * 1024;

/// An open, authenticated session with an agent.
pub struct RcComm {
    endpoint: SocketEndpoint,
    stream: BufReader<Connection>,
    client_user: String,
    client_zone: String,
    cookie: i32,
    release_version: String,
    broken: bool,
    closed: bool,
}

impl RcComm {
    /// Connects to the configured agent and performs the startup handshake.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the agent cannot be reached and
    /// [`ClientError::Handshake`] or [`ClientError::SessionRejected`] when the
    /// handshake does not produce an accepted session.
    pub fn connect(config: &Config) -> Result<Self, ClientError> {
        let endpoint = config.agent_endpoint().clone();
        let connection = transport::connect(&endpoint, config.connect_timeout())?;
        connection
            .set_timeouts(config.request_timeout())
            .map_err(|source| ClientError::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let mut stream = BufReader::new(connection);
        let startup = StartupPack::for_user(config.user_name(), config.zone_name());
        let client_user = startup.client_user.clone();
        let client_zone = startup.client_zone.clone();
        let version =
            handshake(&mut stream, startup).map_err(|error| ClientError::Handshake {
                endpoint: endpoint.to_string(),
                message: error.to_string(),
            })?;

        if version.status != SUCCESS {
            warn!(
                target: COMM_TARGET,
                endpoint = %endpoint,
                status = version.status,
                "agent rejected session"
            );
            return Err(ClientError::SessionRejected {
                endpoint: endpoint.to_string(),
                status: version.status,
            });
        }

        debug!(
            target: COMM_TARGET,
            endpoint = %endpoint,
            cookie = version.cookie,
            release = %version.release_version,
            "session established"
        );

        Ok(Self {
            endpoint,
            stream,
            client_user,
            client_zone,
            cookie: version.cookie,
            release_version: version.release_version,
            broken: false,
            closed: false,
        })
    }

    /// Session identifier assigned by the agent.
    #[must_use]
    pub const fn cookie(&self) -> i32 {
        self.cookie
    }

    /// Endpoint this session is connected to.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Account the session acts on behalf of.
    #[must_use]
    pub fn client_user(&self) -> &str {
        &self.client_user
    }

    /// Zone of the account the session acts on behalf of.
    #[must_use]
    pub fn client_zone(&self) -> &str {
        &self.client_zone
    }

    /// Release string reported by the agent.
    #[must_use]
    pub fn release_version(&self) -> &str {
        &self.release_version
    }

    /// Returns true once a transport failure has made the session unusable.
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.broken
    }

    /// Sends one API request and waits for its reply.
    ///
    /// `input` is forwarded verbatim. On success the reply's output text is
    /// returned; a non-zero agent status becomes [`ClientError::Agent`].
    ///
    /// # Errors
    ///
    /// Framing or transport failures mark the session broken, and every later
    /// call fails with [`ClientError::ConnectionBroken`] without touching the
    /// socket.
    pub fn api_call(&mut self, api_number: i32, input: &str) -> Result<String, ClientError> {
        if self.broken || self.closed {
            return Err(ClientError::ConnectionBroken);
        }

        debug!(
            target: COMM_TARGET,
            cookie = self.cookie,
            api_number,
            "sending api request"
        );

        let reply = match self.exchange(api_number, input) {
            Ok(reply) => reply,
            Err(error) => {
                self.broken = true;
                warn!(
                    target: COMM_TARGET,
                    cookie = self.cookie,
                    api_number,
                    error = %error,
                    "api exchange failed; session marked broken"
                );
                return Err(error);
            }
        };

        if reply.status != SUCCESS {
            debug!(
                target: COMM_TARGET,
                cookie = self.cookie,
                api_number,
                status = reply.status,
                "agent refused api request"
            );
            return Err(ClientError::Agent {
                status: reply.status,
                message: reply.error.unwrap_or_default(),
            });
        }

        reply
            .output
            .ok_or_else(|| ClientError::BadReply("successful reply carried no output".into()))
    }

    /// Ends the session, telling the agent to release it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SendRequest`] when the disconnect message could
    /// not be written. The stream is shut down either way.
    pub fn disconnect(mut self) -> Result<(), ClientError> {
        self.close()
    }

    fn exchange(&mut self, api_number: i32, input: &str) -> Result<ApiReply, ClientError> {
        let request = ClientMessage::ApiRequest {
            api_number,
            input: input.to_owned(),
        };
        write_message(self.stream.get_mut(), &request)?;
        match read_message(&mut self.stream)? {
            AgentMessage::ApiReply(reply) => Ok(reply),
            AgentMessage::Version(_) => Err(ClientError::UnexpectedMessage("version")),
        }
    }

    fn close(&mut self) -> Result<(), ClientError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let sent = if self.broken {
            Ok(())
        } else {
            write_message(self.stream.get_mut(), &ClientMessage::Disconnect)
        };
        if let Err(error) = self.stream.get_ref().shutdown()
            && error.kind() != io::ErrorKind::NotConnected
        {
            debug!(target: COMM_TARGET, error = %error, "stream shutdown failed");
        }
        debug!(target: COMM_TARGET, cookie = self.cookie, "session closed");
        sent
    }
}

impl Drop for RcComm {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            debug!(target: COMM_TARGET, error = %error, "disconnect on drop failed");
        }
    }
}

impl std::fmt::Debug for RcComm {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RcComm")
            .field("endpoint", &self.endpoint)
            .field("cookie", &self.cookie)
            .field("client_user", &self.client_user)
            .field("broken", &self.broken)
            .finish_non_exhaustive()
    }
}

fn handshake<R>(stream: &mut BufReader<R>, startup: StartupPack) -> Result<VersionReply, ClientError>
where
    R: io::Read + Write,
{
    write_message(stream.get_mut(), &ClientMessage::Startup(startup))?;
    match read_message(stream)? {
        AgentMessage::Version(version) => Ok(version),
        AgentMessage::ApiReply(_) => Err(ClientError::UnexpectedMessage("api_reply")),
    }
}

fn write_message<W, M>(writer: &mut W, message: &M) -> Result<(), ClientError>
where
    W: Write,
    M: Serialize,
{
    serde_json::to_writer(&mut *writer, message).map_err(ClientError::SerialiseRequest)?;
    writer.write_all(b"\n").map_err(ClientError::SendRequest)?;
    writer.flush().map_err(ClientError::SendRequest)
}

fn read_message<R: io::Read>(reader: &mut BufReader<R>) -> Result<AgentMessage, ClientError> {
    let mut line = Vec::new();
    let mut consecutive_empty_lines = 0;

    loop {
        line.clear();
        let read = reader
            .by_ref()
            .take(MAX_REPLY_BYTES as u64 + 1)
            .read_until(b'\n', &mut line)
            .map_err(ClientError::from_read)?;
        if read == 0 {
            return Err(ClientError::MissingReply);
        }
        if line.len() > MAX_REPLY_BYTES && line.last() != Some(&b'\n') {
            return Err(ClientError::ReplyTooLarge {
                max_size: MAX_REPLY_BYTES,
            });
        }
        let trimmed = line.trim_ascii();
        if !trimmed.is_empty() {
            return serde_json::from_slice(trimmed).map_err(ClientError::ParseMessage);
        }
        consecutive_empty_lines += 1;
        if consecutive_empty_lines >= EMPTY_LINE_LIMIT {
            warn!(
                target: COMM_TARGET,
                limit = EMPTY_LINE_LIMIT,
                "agent sent only empty lines; giving up on reply"
            );
            return Err(ClientError::MissingReply);
        }
    }
}
