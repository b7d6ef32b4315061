//! Client-side API calls layered on [`crate::RcComm`].

mod file_descriptor_info;

pub use self::file_descriptor_info::{file_descriptor_info, get_file_descriptor_info};

pub(crate) const API_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::api");
