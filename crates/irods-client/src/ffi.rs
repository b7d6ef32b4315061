//! C ABI entry points.
//!
//! Every function here catches panics before they reach the caller and checks
//! pointer arguments before dereferencing them. Status-returning functions
//! report `0` on success and a negative registry code otherwise; handle
//! constructors return null on failure. Strings returned through
//! `json_output` are owned by the caller and must be released with
//! [`rc_free_json_output`].

use std::ffi::{CStr, CString, c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use tracing::{debug, error, warn};

use irods_api_types::status;
use irods_config::{Config, SocketEndpoint};

use crate::config::{ConfigLoader, OrthoConfigLoader};
use crate::{ClientError, RcComm, get_file_descriptor_info, telemetry};

pub(crate) const FFI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::ffi");

fn guard<T>(function: &'static str, fallback: T, body: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(_) => {
            error!(target: FFI_TARGET, function, "panic caught at C boundary");
            fallback
        }
    }
}

/// Reads a NUL-terminated UTF-8 argument.
///
/// # Safety
///
/// `value` must be null or point to a NUL-terminated string that stays valid
/// for `'a`.
unsafe fn read_str<'a>(value: *const c_char, name: &'static str) -> Result<&'a str, ClientError> {
    if value.is_null() {
        return Err(ClientError::NullArgument(name));
    }
    // SAFETY: checked for null above; the caller guarantees termination.
    let text = unsafe { CStr::from_ptr(value) };
    text.to_str()
        .map_err(|_| ClientError::invalid_input(format!("{name} is not valid UTF-8")))
}

/// Like [`read_str`] but maps null to `default`.
///
/// # Safety
///
/// Same as [`read_str`].
unsafe fn read_str_or<'a>(
    value: *const c_char,
    name: &'static str,
    default: &'a str,
) -> Result<&'a str, ClientError> {
    if value.is_null() {
        Ok(default)
    } else {
        // SAFETY: forwarded caller contract.
        unsafe { read_str(value, name) }
    }
}

fn into_handle(result: Result<RcComm, ClientError>) -> *mut RcComm {
    match result {
        Ok(comm) => Box::into_raw(Box::new(comm)),
        Err(error) => {
            warn!(
                target: FFI_TARGET,
                status = error.status(),
                error = %error,
                "connection failed"
            );
            ptr::null_mut()
        }
    }
}

/// Opens a session with the agent at `host:port`.
///
/// Null `user_name` or `zone_name` fall back to the configured defaults.
/// Returns null when `host` is null, `port` is outside `1..=65535`, or the
/// session cannot be established.
///
/// # Safety
///
/// Non-null string arguments must point to NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rc_connect(
    host: *const c_char,
    port: c_int,
    user_name: *const c_char,
    zone_name: *const c_char,
) -> *mut RcComm {
    guard("rc_connect", ptr::null_mut(), || {
        let defaults = Config::default();
        let result = (|| {
            // SAFETY: forwarded caller contract.
            let host = unsafe { read_str(host, "host") }?;
            // SAFETY: forwarded caller contract.
            let user = unsafe { read_str_or(user_name, "user_name", defaults.user_name()) }?;
            // SAFETY: forwarded caller contract.
            let zone = unsafe { read_str_or(zone_name, "zone_name", defaults.zone_name()) }?;
            let port = u16::try_from(port)
                .ok()
                .filter(|value| *value != 0)
                .ok_or_else(|| ClientError::invalid_input(format!("port {port} is out of range")))?;

            let config = Config {
                agent_endpoint: SocketEndpoint::tcp(host, port),
                user_name: user.to_owned(),
                zone_name: zone.to_owned(),
                ..defaults.clone()
            };
            RcComm::connect(&config)
        })();
        into_handle(result)
    })
}

/// Opens a session using configuration files and `IRODS_*` environment
/// variables, installing the crate's log subscriber if none is active.
///
/// Returns null when configuration is malformed or the session cannot be
/// established.
#[unsafe(no_mangle)]
pub extern "C" fn rc_connect_from_environment() -> *mut RcComm {
    guard("rc_connect_from_environment", ptr::null_mut(), || {
        let result = OrthoConfigLoader.load().and_then(|config| {
            if let Err(error) = telemetry::initialise(&config) {
                debug!(target: FFI_TARGET, error = %error, "telemetry not installed");
            }
            RcComm::connect(&config)
        });
        into_handle(result)
    })
}

/// Closes a session and releases its handle.
///
/// A null handle is ignored. The handle must not be used afterwards, even
/// when a non-zero status is returned.
///
/// # Safety
///
/// `comm` must be null or a handle returned by [`rc_connect`] or
/// [`rc_connect_from_environment`] that has not been disconnected.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rc_disconnect(comm: *mut RcComm) -> c_int {
    if comm.is_null() {
        return status::SUCCESS;
    }
    // SAFETY: the caller hands back a handle produced by `Box::into_raw`.
    let owned = unsafe { Box::from_raw(comm) };
    guard("rc_disconnect", status::SYS_INTERNAL_ERR, move || {
        match owned.disconnect() {
            Ok(()) => status::SUCCESS,
            Err(error) => {
                debug!(target: FFI_TARGET, error = %error, "disconnect message not sent");
                error.status()
            }
        }
    })
}

/// Reports the state of an open data-object descriptor.
///
/// `*json_output` is set to null on entry. On success it receives a
/// NUL-terminated JSON document that the caller releases with
/// [`rc_free_json_output`]; on failure it stays null.
///
/// # Safety
///
/// `comm` must be null or a live handle not in use on another thread.
/// `json_input` must be null or NUL-terminated. `json_output` must be null or
/// writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rc_get_file_descriptor_info(
    comm: *mut RcComm,
    json_input: *const c_char,
    json_output: *mut *mut c_char,
) -> c_int {
    if json_output.is_null() {
        return status::SYS_INTERNAL_NULL_INPUT_ERR;
    }
    // SAFETY: checked for null; the caller guarantees it is writable.
    unsafe { json_output.write(ptr::null_mut()) };

    guard("rc_get_file_descriptor_info", status::SYS_INTERNAL_ERR, || {
        let result = (|| {
            // SAFETY: the caller guarantees a live, exclusively used handle.
            let comm = unsafe { comm.as_mut() }.ok_or(ClientError::NullArgument("comm"))?;
            // SAFETY: forwarded caller contract.
            let input = unsafe { read_str(json_input, "json_input") }?;
            get_file_descriptor_info(comm, input)?.into_c_string()
        })();

        match result {
            Ok(text) => {
                // SAFETY: checked for null above.
                unsafe { json_output.write(text.into_raw()) };
                status::SUCCESS
            }
            Err(error) => {
                debug!(
                    target: FFI_TARGET,
                    status = error.status(),
                    error = %error,
                    "rc_get_file_descriptor_info failed"
                );
                error.status()
            }
        }
    })
}

/// Releases a string returned through `json_output`. Null is ignored.
///
/// # Safety
///
/// `output` must be null or a pointer obtained from this library that has not
/// already been released.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rc_free_json_output(output: *mut c_char) {
    if output.is_null() {
        return;
    }
    // SAFETY: the pointer came from `CString::into_raw` in this module.
    drop(unsafe { CString::from_raw(output) });
}

/// Returns the registry name for `code`, or `UNKNOWN_STATUS`.
///
/// The returned string is static and must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn rc_status_name(code: c_int) -> *const c_char {
    status::c_name(code).as_ptr()
}
