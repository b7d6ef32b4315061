//! Socket transport helpers for the client.
//!
//! The functions here establish connections to agent sockets and wrap the
//! resulting streams in a uniform [`Connection`] type so that session logic
//! can remain transport agnostic.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use irods_config::SocketEndpoint;

#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use crate::ClientError;

pub(crate) enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    /// Applies `timeout` to both directions; `None` blocks indefinitely.
    pub(crate) fn set_timeouts(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => {
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)
            }
            #[cfg(unix)]
            Self::Unix(stream) => {
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)
            }
        }
    }

    pub(crate) fn shutdown(&self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Opens a stream to `endpoint`; a `None` timeout leaves the wait to the OS.
pub(crate) fn connect(
    endpoint: &SocketEndpoint,
    timeout: Option<Duration>,
) -> Result<Connection, ClientError> {
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let endpoint_display = endpoint.to_string();
            let address =
                resolve_tcp_address(host, *port).map_err(|error| ClientError::Resolve {
                    endpoint: endpoint_display.clone(),
                    source: error,
                })?;

            let stream = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&address, timeout),
                None => TcpStream::connect(address),
            };
            stream
                .and_then(|stream| {
                    stream.set_nodelay(true)?;
                    Ok(stream)
                })
                .map(Connection::Tcp)
                .map_err(|source| ClientError::Connect {
                    endpoint: endpoint_display,
                    source,
                })
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str(), timeout).map_err(|source| ClientError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })
            }

            #[cfg(not(unix))]
            {
                let _ = (path, timeout);
                Err(ClientError::UnsupportedUnixTransport(endpoint.to_string()))
            }
        }
    }
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str, timeout: Option<Duration>) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    match timeout {
        Some(timeout) => socket.connect_timeout(&address, timeout)?,
        None => socket.connect(&address)?,
    }
    let stream = UnixStream::from(OwnedFd::from(socket));
    Ok(Connection::Unix(stream))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn refused_tcp_connection_reports_endpoint() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let endpoint = SocketEndpoint::tcp("127.0.0.1", port);
        let Err(error) = connect(&endpoint, Some(Duration::from_secs(1))) else {
            panic!("connecting to a closed port should fail");
        };
        assert!(matches!(error, ClientError::Connect { .. }));
        assert!(error.to_string().contains(&format!("127.0.0.1:{port}")));
    }

    #[cfg(unix)]
    #[test]
    fn missing_unix_socket_fails_to_connect() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.sock");
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
        let result = connect(&endpoint, Some(Duration::from_secs(1)));
        assert!(matches!(result, Err(ClientError::Connect { .. })));
    }

    #[test]
    fn tcp_connects_without_a_deadline() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();
        let endpoint = SocketEndpoint::tcp("127.0.0.1", port);
        let connection = connect(&endpoint, None).expect("connect without timeout");
        assert!(matches!(connection, Connection::Tcp(_)));
    }

    #[cfg(unix)]
    #[test]
    fn unix_connects_without_a_deadline() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("agent.sock");
        let _listener = std::os::unix::net::UnixListener::bind(&path).expect("bind socket");
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
        let connection = connect(&endpoint, None).expect("connect without timeout");
        assert!(matches!(connection, Connection::Unix(_)));
    }
}
