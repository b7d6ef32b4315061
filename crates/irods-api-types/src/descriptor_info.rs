use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lowest descriptor index handed out to clients; 0-2 are reserved.
pub const MIN_FILE_DESCRIPTOR: i32 = 3;
/// Size of an agent's descriptor table.
pub const NUM_L1_DESC: i32 = 1026;

/// Descriptor was opened to create a new replica.
pub const CREATE_TYPE: i32 = 1;
/// Descriptor was opened for reading.
pub const OPEN_FOR_READ_TYPE: i32 = 2;
/// Descriptor was opened for writing.
pub const OPEN_FOR_WRITE_TYPE: i32 = 3;

/// Replica is out of date.
pub const STALE_REPLICA: i32 = 0;
/// Replica is current.
pub const GOOD_REPLICA: i32 = 1;
/// Replica is being written.
pub const INTERMEDIATE_REPLICA: i32 = 2;

/// Request body of the descriptor-info call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptorInfoInput {
    /// Descriptor returned when the data object was opened.
    pub fd: i32,
}

/// Open request the descriptor was created from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataObjectInput {
    /// Logical path of the data object.
    pub obj_path: String,
    /// Mode used when the replica was created.
    pub create_mode: i32,
    /// Open flags (`O_RDONLY`, `O_WRONLY`, ...).
    pub open_flags: i32,
    /// Initial offset.
    pub offset: i64,
    /// Size hint supplied by the client.
    pub data_size: i64,
    /// Requested transfer thread count.
    pub num_threads: i32,
    /// Operation type requested by the client.
    pub opr_type: i32,
    /// Additional keywords supplied with the open.
    pub key_value_pairs: BTreeMap<String, String>,
}

/// Replica the descriptor refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataObjectInfo {
    /// Logical path of the data object.
    pub object_path: String,
    /// Resource hierarchy holding the replica.
    pub resource_hierarchy: String,
    /// Physical path of the replica in storage.
    pub physical_path: String,
    /// Replica number within the data object.
    pub replica_number: i32,
    /// Replica status (see [`GOOD_REPLICA`] and friends).
    pub replica_status: i32,
    /// Catalog identifier of the data object.
    pub data_id: i64,
    /// Catalogued size of the replica.
    pub data_size: i64,
    /// Catalogued checksum, empty when none is recorded.
    pub checksum: String,
    /// Owner of the data object.
    pub owner_name: String,
    /// Zone of the owner.
    pub owner_zone: String,
}

/// Descriptor state reported by the agent.
///
/// Fields missing from a reply take their default values and fields this
/// version does not know about are kept in [`FileDescriptorInfo::extra`], so
/// agents can extend the report without breaking older clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDescriptorInfo {
    /// Index of the storage-level descriptor backing this one.
    #[serde(rename = "l3descInx")]
    pub l3_descriptor_index: i32,
    /// Whether the descriptor slot is in use.
    pub in_use: bool,
    /// Operation the descriptor was opened for.
    pub operation_type: i32,
    /// Open type (see [`CREATE_TYPE`] and friends).
    pub open_type: i32,
    /// Status of the last operation on the descriptor.
    pub operation_status: i32,
    /// Replica number requested at open time, or -1.
    pub data_object_input_replica_flag: i32,
    /// Open request the descriptor was created from.
    pub data_object_input: DataObjectInput,
    /// Replica the descriptor refers to.
    pub data_object_info: DataObjectInfo,
    /// Replicas still to be made on close.
    pub copies_needed: i32,
    /// Bytes written through the descriptor so far.
    pub bytes_written: i64,
    /// Expected size of the data.
    pub data_size: i64,
    /// Replica status to apply on close.
    pub replica_status: i32,
    /// Checksum policy requested at open time.
    pub checksum_flag: i32,
    /// Source descriptor when this one is a replication target, or -1.
    pub source_l1_descriptor_index: i32,
    /// Checksum computed so far.
    pub checksum: String,
    /// Descriptor index on a remote zone, or -1.
    pub remote_l1_descriptor_index: i32,
    /// Staging policy flag.
    pub stage_flag: i32,
    /// Whether the cache replica is purged on close.
    pub purge_cache_flag: i32,
    /// Descriptor of the advisory lock held for the object, or -1.
    pub lock_file_descriptor: i32,
    /// Logical path of a parallel data-movement operation, if any.
    pub in_pdmo: String,
    /// Token shared by writers of the same replica.
    pub replica_token: String,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
