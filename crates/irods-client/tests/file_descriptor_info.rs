//! Descriptor-info requests through the Rust API.

mod support;

use anyhow::{Context, Result, ensure};
use rstest::rstest;

use irods_client::{
    ClientError, FileDescriptorInfo, file_descriptor_info, get_file_descriptor_info, status,
};
use irods_testkit::DescriptorState;

use support::{OBJECT_PATH, OpenSession, USER, session};

#[rstest]
fn reports_an_open_descriptor(mut session: OpenSession) -> Result<()> {
    let request = session.request();
    let output = get_file_descriptor_info(&mut session.comm, &request)?;
    let info: FileDescriptorInfo = output.parse().context("decode report")?;

    ensure!(info.in_use, "descriptor should be reported in use");
    ensure!(info.data_object_info.object_path == OBJECT_PATH);
    ensure!(info.data_object_info.owner_name == USER);
    Ok(())
}

#[rstest]
fn typed_call_matches_agent_state(mut session: OpenSession) -> Result<()> {
    let info = file_descriptor_info(&mut session.comm, session.fd)?;
    ensure!(info == session.descriptor()?.to_info());
    Ok(())
}

#[rstest]
#[case::negative(-1, status::SYS_FILE_DESC_OUT_OF_RANGE)]
#[case::zero(0, status::SYS_FILE_DESC_OUT_OF_RANGE)]
#[case::reserved(2, status::SYS_FILE_DESC_OUT_OF_RANGE)]
#[case::past_table(1026, status::SYS_FILE_DESC_OUT_OF_RANGE)]
#[case::never_opened(1025, status::BAD_INPUT_DESC_INDEX)]
fn invalid_descriptors_fail_with_agent_status(
    mut session: OpenSession,
    #[case] fd: i32,
    #[case] expected: i32,
) {
    let result = get_file_descriptor_info(&mut session.comm, &format!("{{\"fd\":{fd}}}"));
    let Err(error) = result else {
        panic!("descriptor {fd} should be refused");
    };
    assert!(matches!(error, ClientError::Agent { .. }));
    assert_eq!(error.status(), expected);
}

#[rstest]
fn closed_descriptor_is_not_open(mut session: OpenSession) -> Result<()> {
    session
        .agent
        .close_descriptor(session.comm.cookie(), session.fd)
        .context("close descriptor")?;
    let request = session.request();
    let error = get_file_descriptor_info(&mut session.comm, &request)
        .err()
        .context("closed descriptor should be refused")?;
    ensure!(error.status() == status::BAD_INPUT_DESC_INDEX);
    Ok(())
}

#[rstest]
#[case::empty("")]
#[case::truncated(r#"{"fd":"#)]
#[case::plain_text("fd=3")]
#[case::array("[3]")]
fn malformed_requests_never_reach_the_agent(mut session: OpenSession, #[case] input: &str) {
    let result = get_file_descriptor_info(&mut session.comm, input);
    let Err(error) = result else {
        panic!("{input:?} should be rejected");
    };
    assert!(matches!(error, ClientError::InvalidInput { .. }));
    assert_eq!(error.status(), status::SYS_INVALID_INPUT_PARAM);
    assert_eq!(session.agent.api_requests(), 0);
    assert!(!session.comm.is_broken());
}

#[rstest]
#[case::missing_fd(r#"{"descriptor":3}"#)]
#[case::string_fd(r#"{"fd":"3"}"#)]
fn agent_rejects_objects_without_integer_fd(mut session: OpenSession, #[case] input: &str) {
    let result = get_file_descriptor_info(&mut session.comm, input);
    let Err(error) = result else {
        panic!("{input:?} should be rejected");
    };
    assert_eq!(error.status(), status::SYS_INVALID_INPUT_PARAM);
    assert_eq!(session.agent.api_requests(), 1);
}

#[rstest]
fn descriptors_of_other_users_are_private(mut session: OpenSession) -> Result<()> {
    let foreign = session
        .agent
        .open_descriptor(
            session.comm.cookie(),
            DescriptorState::new("alice", "/tempZone/home/alice/private.dat"),
        )
        .context("open foreign descriptor")?;
    let error = get_file_descriptor_info(&mut session.comm, &format!("{{\"fd\":{foreign}}}"))
        .err()
        .context("foreign descriptor should be refused")?;
    ensure!(error.status() == status::SYS_NO_API_PRIV);
    Ok(())
}

#[rstest]
fn inspection_leaves_descriptor_untouched(mut session: OpenSession) -> Result<()> {
    let before = session.descriptor()?;
    let request = session.request();
    get_file_descriptor_info(&mut session.comm, &request)?;
    ensure!(session.descriptor()? == before, "descriptor state changed");
    Ok(())
}

#[rstest]
fn repeated_requests_return_identical_reports(mut session: OpenSession) -> Result<()> {
    let request = session.request();
    let first = get_file_descriptor_info(&mut session.comm, &request)?;
    let second = get_file_descriptor_info(&mut session.comm, &request)?;
    ensure!(first == second);
    ensure!(session.agent.api_requests() == 2);
    Ok(())
}

#[rstest]
fn session_survives_agent_refusals(mut session: OpenSession) -> Result<()> {
    let refused = get_file_descriptor_info(&mut session.comm, r#"{"fd":1025}"#);
    ensure!(refused.is_err());
    ensure!(!session.comm.is_broken());

    let request = session.request();
    get_file_descriptor_info(&mut session.comm, &request)?;
    Ok(())
}
