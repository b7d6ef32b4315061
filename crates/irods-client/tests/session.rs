//! Session lifecycle: handshake, transport loss, and Unix sockets.

mod support;

use anyhow::{Context, Result, ensure};
use rstest::rstest;

use irods_client::{ClientError, Config, RcComm, get_file_descriptor_info, status};
use irods_config::SocketEndpoint;
use irods_testkit::{DescriptorState, FakeAgent};

use support::{OBJECT_PATH, OpenSession, SETTLE, USER, config_for, session};

#[rstest]
fn handshake_reports_agent_identity() -> Result<()> {
    let agent = FakeAgent::spawn()?;
    let comm = RcComm::connect(&config_for(agent.endpoint(), USER))?;
    ensure!(comm.cookie() >= 400);
    ensure!(comm.client_user() == USER);
    ensure!(comm.release_version() == "rods4.2.8");
    ensure!(comm.endpoint() == agent.endpoint());
    Ok(())
}

#[rstest]
fn zero_connect_timeout_still_connects() -> Result<()> {
    let agent = FakeAgent::spawn()?;
    let config = Config {
        connect_timeout_secs: 0,
        ..config_for(agent.endpoint(), USER)
    };
    let comm = RcComm::connect(&config).context("connect without a deadline")?;
    ensure!(comm.cookie() >= 400);
    comm.disconnect()?;
    Ok(())
}

#[rstest]
fn agent_rejects_session_without_user() -> Result<()> {
    let agent = FakeAgent::spawn()?;
    let error = RcComm::connect(&config_for(agent.endpoint(), ""))
        .err()
        .context("handshake should be rejected")?;
    ensure!(
        matches!(error, ClientError::SessionRejected { .. }),
        "unexpected error: {error}"
    );
    ensure!(error.status() == status::USER_SOCK_CONNECT_ERR);
    Ok(())
}

#[rstest]
fn unreachable_agent_fails_to_connect() -> Result<()> {
    let agent = FakeAgent::spawn()?;
    let endpoint = agent.endpoint().clone();
    agent.shutdown()?;

    let error = RcComm::connect(&config_for(&endpoint, USER))
        .err()
        .context("connect should fail")?;
    ensure!(error.is_transport_failure());
    ensure!(error.status() == status::USER_SOCK_CONNECT_ERR);
    Ok(())
}

#[rstest]
fn lost_connection_breaks_the_session(mut session: OpenSession) {
    session.agent.set_hang_up(true);
    let request = session.request();

    let Err(first) = get_file_descriptor_info(&mut session.comm, &request) else {
        panic!("request should fail once the agent hangs up");
    };
    assert!(first.is_transport_failure(), "unexpected error: {first}");
    assert_eq!(first.status(), status::SYS_SOCK_READ_ERR);
    assert!(session.comm.is_broken());

    let Err(second) = get_file_descriptor_info(&mut session.comm, &request) else {
        panic!("broken session should refuse further requests");
    };
    assert!(matches!(second, ClientError::ConnectionBroken));
    assert_eq!(second.status(), status::SYS_SOCK_READ_ERR);
    assert_eq!(session.agent.api_requests(), 1);
}

#[rstest]
fn disconnect_releases_the_session(session: OpenSession) -> Result<()> {
    let OpenSession { comm, agent, .. } = session;
    ensure!(agent.wait_for_sessions(1, SETTLE));
    comm.disconnect()?;
    ensure!(agent.wait_for_sessions(0, SETTLE), "agent still holds the session");
    Ok(())
}

#[rstest]
fn dropping_the_handle_releases_the_session(session: OpenSession) -> Result<()> {
    let OpenSession { comm, agent, .. } = session;
    drop(comm);
    ensure!(agent.wait_for_sessions(0, SETTLE), "agent still holds the session");
    Ok(())
}

#[cfg(unix)]
#[rstest]
fn unix_socket_sessions_answer_requests() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("run").join("agent.sock");
    let endpoint = SocketEndpoint::unix(path.to_str().context("utf8 socket path")?);
    let agent = FakeAgent::spawn_on(&endpoint)?;

    let mut comm = RcComm::connect(&config_for(agent.endpoint(), USER))?;
    let fd = agent.open_descriptor(comm.cookie(), DescriptorState::new(USER, OBJECT_PATH))?;
    let output = get_file_descriptor_info(&mut comm, &format!("{{\"fd\":{fd}}}"))?;
    ensure!(output.to_value()?["data_object_info"]["object_path"] == OBJECT_PATH);

    comm.disconnect()?;
    agent.shutdown()?;
    ensure!(!path.exists(), "socket file should be removed");
    Ok(())
}
