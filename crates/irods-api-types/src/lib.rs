//! Wire contract shared by iRODS clients and agents.
//!
//! Messages travel as newline-delimited JSON. A session opens with a
//! [`ClientMessage::Startup`] answered by [`AgentMessage::Version`]; every
//! [`ClientMessage::ApiRequest`] is then answered by exactly one
//! [`AgentMessage::ApiReply`]. Status values come from the [`status`]
//! registry.

mod api;
mod descriptor_info;
mod messages;
pub mod status;

pub use api::{API_VERSION, GET_FILE_DESCRIPTOR_INFO_APN, RELEASE_VERSION};
pub use descriptor_info::{
    CREATE_TYPE, DataObjectInfo, DataObjectInput, FileDescriptorInfo, FileDescriptorInfoInput,
    GOOD_REPLICA, INTERMEDIATE_REPLICA, MIN_FILE_DESCRIPTOR, NUM_L1_DESC, OPEN_FOR_READ_TYPE,
    OPEN_FOR_WRITE_TYPE, STALE_REPLICA,
};
pub use messages::{AgentMessage, ApiReply, ClientMessage, StartupPack, VersionReply};
