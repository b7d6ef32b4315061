//! Per-connection session loop.

use std::io::{BufRead, BufReader, Read, Write};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use irods_api_types::status::USER_SOCK_CONNECT_ERR;
use irods_api_types::{AgentMessage, ApiReply, ClientMessage, VersionReply};

use super::DISPATCH_TARGET;
use super::router::route;
use crate::AgentError;
use crate::state::AgentState;
use crate::transport::{ConnectionHandler, ConnectionStream};

/// Largest request line accepted, excluding the newline.
pub(crate) const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Serves the startup handshake and then API requests until the client
/// leaves.
#[derive(Debug)]
pub(crate) struct SessionHandler {
    state: Arc<AgentState>,
}

impl SessionHandler {
    pub(crate) const fn new(state: Arc<AgentState>) -> Self {
        Self { state }
    }

    fn handshake<S: Read + Write>(
        &self,
        stream: &mut BufReader<S>,
    ) -> Result<Option<i32>, AgentError> {
        let Some(line) = read_request_line(stream)? else {
            debug!(target: DISPATCH_TARGET, "client left before startup");
            return Ok(None);
        };

        let startup = match parse_message(&line) {
            Ok(Some(ClientMessage::Startup(startup))) if !startup.client_user.trim().is_empty() => {
                startup
            }
            _ => {
                warn!(target: DISPATCH_TARGET, "rejecting session without a valid startup");
                write_message(
                    stream.get_mut(),
                    &AgentMessage::Version(VersionReply::rejected(USER_SOCK_CONNECT_ERR)),
                )?;
                return Ok(None);
            }
        };

        let cookie = self
            .state
            .open_session(&startup.client_user, &startup.client_zone)?;
        if let Err(error) = write_message(
            stream.get_mut(),
            &AgentMessage::Version(VersionReply::accepted(cookie)),
        ) {
            self.state.close_session(cookie);
            return Err(error);
        }
        info!(
            target: DISPATCH_TARGET,
            cookie,
            user = %startup.client_user,
            zone = %startup.client_zone,
            "session started"
        );
        Ok(Some(cookie))
    }

    fn serve<S: Read + Write>(
        &self,
        stream: &mut BufReader<S>,
        cookie: i32,
    ) -> Result<(), AgentError> {
        loop {
            let line = match read_request_line(stream) {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(()),
                Err(error) => {
                    write_failure(stream.get_mut(), &error)?;
                    return Err(error);
                }
            };

            let message = match parse_message(&line) {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, cookie, error = %error, "malformed request");
                    write_failure(stream.get_mut(), &error)?;
                    continue;
                }
            };

            match message {
                ClientMessage::Disconnect => {
                    debug!(target: DISPATCH_TARGET, cookie, "client disconnected");
                    return Ok(());
                }
                ClientMessage::Startup(_) => {
                    let error = AgentError::malformed("session already started");
                    write_failure(stream.get_mut(), &error)?;
                }
                ClientMessage::ApiRequest { api_number, input } => {
                    self.state.record_api_request();
                    if self.state.hang_up() {
                        info!(
                            target: DISPATCH_TARGET,
                            cookie,
                            api_number,
                            "hanging up instead of replying"
                        );
                        return Ok(());
                    }
                    let reply = match route(&self.state, cookie, api_number, &input) {
                        Ok(output) => ApiReply::success(output),
                        Err(error) => {
                            debug!(
                                target: DISPATCH_TARGET,
                                cookie,
                                api_number,
                                status = error.status(),
                                error = %error,
                                "api request refused"
                            );
                            ApiReply::failure(error.status(), error.to_string())
                        }
                    };
                    write_reply(stream.get_mut(), reply)?;
                }
            }
        }
    }
}

impl ConnectionHandler for SessionHandler {
    fn handle(&self, stream: ConnectionStream) {
        let mut stream = BufReader::new(stream);
        let cookie = match self.handshake(&mut stream) {
            Ok(Some(cookie)) => cookie,
            Ok(None) => return,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, error = %error, "handshake failed");
                return;
            }
        };

        if let Err(error) = self.serve(&mut stream, cookie) {
            warn!(target: DISPATCH_TARGET, cookie, error = %error, "session ended with error");
        }
        self.state.close_session(cookie);
        if let Err(error) = stream.get_ref().shutdown() {
            debug!(target: DISPATCH_TARGET, cookie, error = %error, "stream shutdown failed");
        }
    }
}

/// Reads one newline-terminated line of at most [`MAX_REQUEST_BYTES`].
fn read_request_line<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>, AgentError> {
    let mut line = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_REQUEST_BYTES as u64 + 1)
        .read_until(b'\n', &mut line)?;
    if read == 0 {
        return Ok(None);
    }
    if line.len() > MAX_REQUEST_BYTES && line.last() != Some(&b'\n') {
        return Err(AgentError::RequestTooLarge {
            max_size: MAX_REQUEST_BYTES,
        });
    }
    Ok(Some(line))
}

/// Parses a request line; blank lines yield `None`.
fn parse_message(line: &[u8]) -> Result<Option<ClientMessage>, AgentError> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(trimmed)
        .map(Some)
        .map_err(AgentError::from_json_error)
}

fn write_reply<W: Write>(writer: &mut W, reply: ApiReply) -> Result<(), AgentError> {
    write_message(writer, &AgentMessage::ApiReply(reply))
}

fn write_failure<W: Write>(writer: &mut W, error: &AgentError) -> Result<(), AgentError> {
    write_reply(writer, ApiReply::failure(error.status(), error.to_string()))
}

fn write_message<W: Write, M: Serialize>(writer: &mut W, message: &M) -> Result<(), AgentError> {
    serde_json::to_writer(&mut *writer, message).map_err(AgentError::SerialiseReply)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
