//! Client runtime for querying open data-object descriptors on an agent.
//!
//! Open a session with [`RcComm::connect`], then ask the agent about a
//! descriptor obtained from an earlier open on the same session:
//!
//! ```no_run
//! use irods_client::{Config, RcComm, get_file_descriptor_info};
//!
//! # fn main() -> Result<(), irods_client::ClientError> {
//! let mut comm = RcComm::connect(&Config::default())?;
//! let output = get_file_descriptor_info(&mut comm, r#"{"fd": 3}"#)?;
//! println!("{output}");
//! comm.disconnect()?;
//! # Ok(())
//! # }
//! ```
//!
//! Failures carry a registry status through [`ClientError::status`]. The
//! [`ffi`] module exposes the same operations to C callers.

pub mod api;
mod comm;
mod config;
mod errors;
pub mod ffi;
mod output;
pub mod telemetry;
mod transport;

pub use api::{file_descriptor_info, get_file_descriptor_info};
pub use comm::RcComm;
pub use config::{ConfigLoader, OrthoConfigLoader, StaticConfigLoader};
pub use errors::ClientError;
pub use irods_api_types::{FileDescriptorInfo, FileDescriptorInfoInput, status};
pub use irods_config::Config;
pub use output::JsonOutput;
