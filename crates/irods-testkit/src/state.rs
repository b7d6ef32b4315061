//! Sessions and per-session descriptor tables held by the fake agent.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use irods_api_types::{
    DataObjectInfo, DataObjectInput, FileDescriptorInfo, GOOD_REPLICA, MIN_FILE_DESCRIPTOR,
    NUM_L1_DESC, OPEN_FOR_READ_TYPE,
};

use crate::AgentError;

const FIRST_COOKIE: i32 = 400;

/// State of one open data-object descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorState {
    /// Account that opened the descriptor.
    pub owner_name: String,
    /// Zone of the owning account.
    pub owner_zone: String,
    /// Logical path of the data object.
    pub object_path: String,
    /// Resource hierarchy holding the replica.
    pub resource_hierarchy: String,
    /// Physical path of the replica.
    pub physical_path: String,
    /// Replica number within the data object.
    pub replica_number: i32,
    /// Catalogued replica status.
    pub replica_status: i32,
    /// Open type, such as [`OPEN_FOR_READ_TYPE`].
    pub open_type: i32,
    /// Flags passed to the open.
    pub open_flags: i32,
    /// Operation requested at open time.
    pub operation_type: i32,
    /// Catalog identifier of the data object.
    pub data_id: i64,
    /// Size of the data.
    pub data_size: i64,
    /// Bytes written through the descriptor.
    pub bytes_written: i64,
    /// Checksum recorded for the replica.
    pub checksum: String,
    /// Token shared by writers of the replica.
    pub replica_token: String,
    /// Storage-level descriptor backing this one.
    pub l3_descriptor_index: i32,
}

impl DescriptorState {
    /// A replica of `object_path` opened for reading by `owner_name`.
    #[must_use]
    pub fn new(owner_name: impl Into<String>, object_path: impl Into<String>) -> Self {
        let object_path = object_path.into();
        Self {
            owner_name: owner_name.into(),
            owner_zone: String::from("tempZone"),
            physical_path: format!("/var/lib/irods/Vault{object_path}"),
            object_path,
            resource_hierarchy: String::from("demoResc"),
            replica_number: 0,
            replica_status: GOOD_REPLICA,
            open_type: OPEN_FOR_READ_TYPE,
            open_flags: 0,
            operation_type: 0,
            data_id: 10_001,
            data_size: 0,
            bytes_written: 0,
            checksum: String::new(),
            replica_token: String::new(),
            l3_descriptor_index: 3,
        }
    }

    /// Report returned by the descriptor-info API.
    #[must_use]
    pub fn to_info(&self) -> FileDescriptorInfo {
        FileDescriptorInfo {
            l3_descriptor_index: self.l3_descriptor_index,
            in_use: true,
            operation_type: self.operation_type,
            open_type: self.open_type,
            operation_status: 0,
            data_object_input_replica_flag: -1,
            data_object_input: DataObjectInput {
                obj_path: self.object_path.clone(),
                open_flags: self.open_flags,
                data_size: self.data_size,
                opr_type: self.operation_type,
                ..DataObjectInput::default()
            },
            data_object_info: DataObjectInfo {
                object_path: self.object_path.clone(),
                resource_hierarchy: self.resource_hierarchy.clone(),
                physical_path: self.physical_path.clone(),
                replica_number: self.replica_number,
                replica_status: self.replica_status,
                data_id: self.data_id,
                data_size: self.data_size,
                checksum: self.checksum.clone(),
                owner_name: self.owner_name.clone(),
                owner_zone: self.owner_zone.clone(),
            },
            copies_needed: 0,
            bytes_written: self.bytes_written,
            data_size: self.data_size,
            replica_status: self.replica_status,
            checksum_flag: 0,
            source_l1_descriptor_index: -1,
            checksum: self.checksum.clone(),
            remote_l1_descriptor_index: -1,
            stage_flag: 0,
            purge_cache_flag: 0,
            lock_file_descriptor: -1,
            in_pdmo: String::new(),
            replica_token: self.replica_token.clone(),
            extra: BTreeMap::new(),
        }
    }
}

/// Descriptor slots of one session, indexed from [`MIN_FILE_DESCRIPTOR`].
#[derive(Debug, Default)]
pub(crate) struct DescriptorTable {
    slots: BTreeMap<i32, DescriptorState>,
}

impl DescriptorTable {
    /// Stores `state` in the lowest free slot.
    pub(crate) fn open(&mut self, state: DescriptorState) -> Result<i32, AgentError> {
        let fd = (MIN_FILE_DESCRIPTOR..NUM_L1_DESC)
            .find(|fd| !self.slots.contains_key(fd))
            .ok_or(AgentError::TableFull)?;
        self.slots.insert(fd, state);
        Ok(fd)
    }

    pub(crate) fn close(&mut self, fd: i32) -> Option<DescriptorState> {
        self.slots.remove(&fd)
    }

    pub(crate) fn get(&self, fd: i32) -> Option<&DescriptorState> {
        self.slots.get(&fd)
    }
}

/// Identity and descriptors of one connected client.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) client_user: String,
    pub(crate) client_zone: String,
    pub(crate) descriptors: DescriptorTable,
}

/// State shared between the listener threads and the test's control handle.
#[derive(Debug)]
pub(crate) struct AgentState {
    sessions: Mutex<HashMap<i32, Session>>,
    next_cookie: AtomicI32,
    api_requests: AtomicUsize,
    hang_up: AtomicBool,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_cookie: AtomicI32::new(FIRST_COOKIE),
            api_requests: AtomicUsize::new(0),
            hang_up: AtomicBool::new(false),
        }
    }
}

impl AgentState {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<i32, Session>>, AgentError> {
        self.sessions
            .lock()
            .map_err(|_| AgentError::internal("session table lock poisoned"))
    }

    /// Registers a new session and returns its cookie.
    pub(crate) fn open_session(&self, client_user: &str, client_zone: &str) -> Result<i32, AgentError> {
        let cookie = self.next_cookie.fetch_add(1, Ordering::SeqCst);
        self.lock()?.insert(
            cookie,
            Session {
                client_user: client_user.to_owned(),
                client_zone: client_zone.to_owned(),
                descriptors: DescriptorTable::default(),
            },
        );
        Ok(cookie)
    }

    pub(crate) fn close_session(&self, cookie: i32) {
        if let Ok(mut sessions) = self.lock() {
            sessions.remove(&cookie);
        }
    }

    /// Runs `action` against the live session `cookie`.
    pub(crate) fn with_session<T>(
        &self,
        cookie: i32,
        action: impl FnOnce(&mut Session) -> Result<T, AgentError>,
    ) -> Result<T, AgentError> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(&cookie)
            .ok_or(AgentError::UnknownSession(cookie))?;
        action(session)
    }

    pub(crate) fn session_count(&self) -> usize {
        self.lock().map_or(0, |sessions| sessions.len())
    }

    pub(crate) fn record_api_request(&self) {
        self.api_requests.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn api_requests(&self) -> usize {
        self.api_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn set_hang_up(&self, enabled: bool) {
        self.hang_up.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn hang_up(&self) -> bool {
        self.hang_up.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn state() -> DescriptorState {
        DescriptorState::new("alice", "/tempZone/home/alice/file.txt")
    }

    #[rstest]
    fn hands_out_lowest_free_descriptor(state: DescriptorState) {
        let mut table = DescriptorTable::default();
        let first = table.open(state.clone()).expect("open first");
        let second = table.open(state.clone()).expect("open second");
        assert_eq!((first, second), (MIN_FILE_DESCRIPTOR, MIN_FILE_DESCRIPTOR + 1));

        table.close(first);
        assert_eq!(table.open(state).expect("reuse"), MIN_FILE_DESCRIPTOR);
    }

    #[rstest]
    fn full_table_refuses_new_descriptors(state: DescriptorState) {
        let mut table = DescriptorTable::default();
        for _ in MIN_FILE_DESCRIPTOR..NUM_L1_DESC {
            table.open(state.clone()).expect("slot available");
        }
        assert!(matches!(table.open(state), Err(AgentError::TableFull)));
    }

    #[rstest]
    fn report_mirrors_descriptor_state(state: DescriptorState) {
        let info = state.to_info();
        assert!(info.in_use);
        assert_eq!(info.data_object_info.object_path, state.object_path);
        assert_eq!(info.data_object_info.owner_name, "alice");
        assert_eq!(info.open_type, OPEN_FOR_READ_TYPE);
    }

    #[test]
    fn cookies_start_at_first_cookie_and_increase() {
        let agent = AgentState::default();
        let first = agent.open_session("alice", "tempZone").expect("first");
        let second = agent.open_session("bob", "tempZone").expect("second");
        assert_eq!((first, second), (FIRST_COOKIE, FIRST_COOKIE + 1));
        assert_eq!(agent.session_count(), 2);

        agent.close_session(first);
        assert_eq!(agent.session_count(), 1);
    }
}
