//! Descriptor-state inspection for open data objects.
//!
//! The request names a descriptor returned when a data object was opened on
//! the same session; the agent answers with a structured report of that
//! descriptor's state. The call only reads: nothing beyond the request itself
//! is sent to the agent.

use serde_json::Value;
use tracing::debug;

use irods_api_types::{FileDescriptorInfo, FileDescriptorInfoInput, GET_FILE_DESCRIPTOR_INFO_APN};

use super::API_TARGET;
use crate::{ClientError, JsonOutput, RcComm};

/// Returns the agent's report on the descriptor named by `json_input`.
///
/// `json_input` must be a JSON object, typically `{"fd": 3}`; anything else
/// fails with [`ClientError::InvalidInput`] before any network traffic. The
/// session must be the one the descriptor was opened on.
///
/// # Errors
///
/// Returns [`ClientError::Agent`] carrying the agent's status when the
/// descriptor is unknown, out of range, or may not be inspected; transport
/// errors when the session fails mid-call; and [`ClientError::BadReply`] when
/// a successful reply does not carry JSON.
pub fn get_file_descriptor_info(
    comm: &mut RcComm,
    json_input: &str,
) -> Result<JsonOutput, ClientError> {
    validate_input(json_input)?;

    debug!(
        target: API_TARGET,
        cookie = comm.cookie(),
        "requesting file descriptor info"
    );

    let output = comm.api_call(GET_FILE_DESCRIPTOR_INFO_APN, json_input)?;
    JsonOutput::from_reply(output)
}

/// Typed form of [`get_file_descriptor_info`] for descriptor `fd`.
///
/// # Errors
///
/// Same as [`get_file_descriptor_info`]; a reply that does not match
/// [`FileDescriptorInfo`] fails with [`ClientError::BadReply`].
pub fn file_descriptor_info(comm: &mut RcComm, fd: i32) -> Result<FileDescriptorInfo, ClientError> {
    let input = serde_json::to_string(&FileDescriptorInfoInput { fd })
        .map_err(ClientError::SerialiseRequest)?;
    get_file_descriptor_info(comm, &input)?
        .parse()
        .map_err(|error| ClientError::BadReply(format!("unexpected descriptor report: {error}")))
}

fn validate_input(json_input: &str) -> Result<(), ClientError> {
    let value: Value = serde_json::from_str(json_input).map_err(ClientError::from_input_json)?;
    if value.is_object() {
        Ok(())
    } else {
        Err(ClientError::invalid_input("request must be a JSON object"))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::object(r#"{"fd":3}"#)]
    #[case::extra_fields(r#"{"fd":3,"verbose":true}"#)]
    fn accepts_objects(#[case] input: &str) {
        assert!(validate_input(input).is_ok());
    }

    #[rstest]
    #[case::empty("")]
    #[case::truncated(r#"{"fd":"#)]
    #[case::not_json("fd=3")]
    #[case::array("[3]")]
    #[case::number("3")]
    fn rejects_non_objects(#[case] input: &str) {
        let result = validate_input(input);
        assert!(
            matches!(result, Err(ClientError::InvalidInput { .. })),
            "{input:?} should be rejected"
        );
    }
}
