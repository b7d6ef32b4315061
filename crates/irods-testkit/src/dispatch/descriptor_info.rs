//! Handler for the descriptor-info API.

use serde_json::Value;
use tracing::debug;

use irods_api_types::{MIN_FILE_DESCRIPTOR, NUM_L1_DESC};

use super::DISPATCH_TARGET;
use crate::AgentError;
use crate::state::AgentState;

/// Answers a descriptor-info request from session `cookie`.
///
/// Checks run in order: input shape, descriptor range, descriptor open on
/// this session, then ownership. Nothing in the agent's state changes.
pub(crate) fn handle(state: &AgentState, cookie: i32, input: &str) -> Result<String, AgentError> {
    let request: Value = serde_json::from_str(input)
        .map_err(|error| AgentError::invalid_input(format!("input is not JSON: {error}")))?;
    let requested = request
        .get("fd")
        .and_then(Value::as_i64)
        .ok_or_else(|| AgentError::invalid_input("'fd' must be an integer"))?;
    let fd = i32::try_from(requested)
        .ok()
        .filter(|fd| (MIN_FILE_DESCRIPTOR..NUM_L1_DESC).contains(fd))
        .ok_or(AgentError::DescriptorOutOfRange(requested))?;

    let info = state.with_session(cookie, |session| {
        let descriptor = session
            .descriptors
            .get(fd)
            .ok_or(AgentError::DescriptorNotOpen(fd))?;
        if descriptor.owner_name != session.client_user {
            return Err(AgentError::NotOwner {
                fd,
                user: session.client_user.clone(),
            });
        }
        debug!(
            target: DISPATCH_TARGET,
            cookie,
            fd,
            user = %session.client_user,
            zone = %session.client_zone,
            "reporting descriptor"
        );
        Ok(descriptor.to_info())
    })?;

    serde_json::to_string(&info).map_err(AgentError::SerialiseReply)
}
