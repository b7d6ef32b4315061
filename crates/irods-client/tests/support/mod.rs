//! Shared harness for driving the client against a fake agent.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::time::Duration;

use anyhow::{Context, Result};
use rstest::fixture;

use irods_client::{Config, RcComm};
use irods_config::SocketEndpoint;
use irods_testkit::{DescriptorState, FakeAgent};

pub const USER: &str = "rods";
pub const OBJECT_PATH: &str = "/tempZone/home/rods/observations.csv";
pub const SETTLE: Duration = Duration::from_secs(2);

pub fn config_for(endpoint: &SocketEndpoint, user: &str) -> Config {
    Config {
        agent_endpoint: endpoint.clone(),
        user_name: user.to_owned(),
        connect_timeout_secs: 2,
        request_timeout_secs: 5,
        ..Config::default()
    }
}

/// A connected session with one descriptor open for its own user.
///
/// Fields drop in order, so the session disconnects before the agent stops.
pub struct OpenSession {
    pub comm: RcComm,
    pub fd: i32,
    pub agent: FakeAgent,
}

impl OpenSession {
    pub fn start() -> Result<Self> {
        let agent = FakeAgent::spawn().context("spawn fake agent")?;
        let comm =
            RcComm::connect(&config_for(agent.endpoint(), USER)).context("connect to agent")?;
        let fd = agent
            .open_descriptor(comm.cookie(), DescriptorState::new(USER, OBJECT_PATH))
            .context("open descriptor")?;
        Ok(Self { comm, fd, agent })
    }

    pub fn descriptor(&self) -> Result<DescriptorState> {
        self.agent
            .descriptor(self.comm.cookie(), self.fd)
            .context("look up descriptor")
    }

    pub fn request(&self) -> String {
        format!("{{\"fd\":{}}}", self.fd)
    }
}

#[fixture]
pub fn session() -> OpenSession {
    match OpenSession::start() {
        Ok(session) => session,
        Err(error) => panic!("failed to open session: {error:#}"),
    }
}
