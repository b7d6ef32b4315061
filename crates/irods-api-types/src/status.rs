//! Status-code registry.
//!
//! Zero is success. Every failure is a negative code; callers that only need
//! a yes/no answer compare against [`SUCCESS`].

/// The call succeeded.
pub const SUCCESS: i32 = 0;
/// Reading from the agent failed or the agent closed the connection.
pub const SYS_SOCK_READ_ERR: i32 = -4000;
/// Writing to the agent failed.
pub const SYS_SOCK_WRITE_ERR: i32 = -5000;
/// The agent does not implement the requested API number.
pub const SYS_UNMATCHED_API_NUM: i32 = -12000;
/// The caller may not inspect the referenced descriptor.
pub const SYS_NO_API_PRIV: i32 = -13000;
/// The agent's reply could not be decoded.
pub const SYS_BAD_REPLY_ERR: i32 = -16000;
/// The descriptor index lies outside the agent's descriptor table.
pub const SYS_FILE_DESC_OUT_OF_RANGE: i32 = -23000;
/// A required pointer was null at the C boundary.
pub const SYS_INTERNAL_NULL_INPUT_ERR: i32 = -24000;
/// The agent did not answer before the request timeout.
pub const SYS_SOCK_READ_TIMEDOUT: i32 = -115000;
/// The request text was malformed or missing required fields.
pub const SYS_INVALID_INPUT_PARAM: i32 = -130000;
/// An internal fault, such as a caught panic.
pub const SYS_INTERNAL_ERR: i32 = -154000;
/// The agent could not be reached or refused the session.
pub const USER_SOCK_CONNECT_ERR: i32 = -305000;
/// The descriptor is not open on this connection.
pub const BAD_INPUT_DESC_INDEX: i32 = -326000;

const REGISTRY: &[(i32, &str)] = &[
    (SUCCESS, "SUCCESS"),
    (SYS_SOCK_READ_ERR, "SYS_SOCK_READ_ERR"),
    (SYS_SOCK_WRITE_ERR, "SYS_SOCK_WRITE_ERR"),
    (SYS_UNMATCHED_API_NUM, "SYS_UNMATCHED_API_NUM"),
    (SYS_NO_API_PRIV, "SYS_NO_API_PRIV"),
    (SYS_BAD_REPLY_ERR, "SYS_BAD_REPLY_ERR"),
    (SYS_FILE_DESC_OUT_OF_RANGE, "SYS_FILE_DESC_OUT_OF_RANGE"),
    (SYS_INTERNAL_NULL_INPUT_ERR, "SYS_INTERNAL_NULL_INPUT_ERR"),
    (SYS_SOCK_READ_TIMEDOUT, "SYS_SOCK_READ_TIMEDOUT"),
    (SYS_INVALID_INPUT_PARAM, "SYS_INVALID_INPUT_PARAM"),
    (SYS_INTERNAL_ERR, "SYS_INTERNAL_ERR"),
    (USER_SOCK_CONNECT_ERR, "USER_SOCK_CONNECT_ERR"),
    (BAD_INPUT_DESC_INDEX, "BAD_INPUT_DESC_INDEX"),
];

/// Returns the registry name of `code`, or `None` for unregistered values.
#[must_use]
pub fn name(code: i32) -> Option<&'static str> {
    REGISTRY
        .iter()
        .find(|(value, _)| *value == code)
        .map(|(_, name)| *name)
}

/// Returns the registry name of `code` as a NUL-terminated C string.
///
/// Unregistered values map to `UNKNOWN_STATUS`.
#[must_use]
pub const fn c_name(code: i32) -> &'static std::ffi::CStr {
    match code {
        SUCCESS => c"SUCCESS",
        SYS_SOCK_READ_ERR => c"SYS_SOCK_READ_ERR",
        SYS_SOCK_WRITE_ERR => c"SYS_SOCK_WRITE_ERR",
        SYS_UNMATCHED_API_NUM => c"SYS_UNMATCHED_API_NUM",
        SYS_NO_API_PRIV => c"SYS_NO_API_PRIV",
        SYS_BAD_REPLY_ERR => c"SYS_BAD_REPLY_ERR",
        SYS_FILE_DESC_OUT_OF_RANGE => c"SYS_FILE_DESC_OUT_OF_RANGE",
        SYS_INTERNAL_NULL_INPUT_ERR => c"SYS_INTERNAL_NULL_INPUT_ERR",
        SYS_SOCK_READ_TIMEDOUT => c"SYS_SOCK_READ_TIMEDOUT",
        SYS_INVALID_INPUT_PARAM => c"SYS_INVALID_INPUT_PARAM",
        SYS_INTERNAL_ERR => c"SYS_INTERNAL_ERR",
        USER_SOCK_CONNECT_ERR => c"USER_SOCK_CONNECT_ERR",
        BAD_INPUT_DESC_INDEX => c"BAD_INPUT_DESC_INDEX",
        _ => c"UNKNOWN_STATUS",
    }
}
