/// API number of the descriptor-info call.
pub const GET_FILE_DESCRIPTOR_INFO_APN: i32 = 20000;

/// Release string exchanged during the startup handshake.
pub const RELEASE_VERSION: &str = "rods4.2.8";

/// Protocol revision exchanged during the startup handshake.
pub const API_VERSION: &str = "d";
