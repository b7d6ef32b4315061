use irods_api_types::GET_FILE_DESCRIPTOR_INFO_APN;

use super::descriptor_info;
use crate::AgentError;
use crate::state::AgentState;

/// Sends an API request to its handler by number.
pub(crate) fn route(
    state: &AgentState,
    cookie: i32,
    api_number: i32,
    input: &str,
) -> Result<String, AgentError> {
    match api_number {
        GET_FILE_DESCRIPTOR_INFO_APN => descriptor_info::handle(state, cookie, input),
        other => Err(AgentError::UnmatchedApi(other)),
    }
}
