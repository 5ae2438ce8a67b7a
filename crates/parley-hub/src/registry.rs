use std::collections::btree_map::{BTreeMap, Entry};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::connection::Connection;
use crate::error::HubError;
use crate::types::ConnId;

/// The live set of connections, keyed and ordered by [`ConnId`].
///
/// Every operation takes the lock once and never awaits while holding it, so
/// a snapshot sees each register/unregister either fully applied or not at all.
#[derive(Default)]
pub struct Registry {
    conns: RwLock<BTreeMap<ConnId, Arc<Connection>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly accepted connection. An existing entry with the same id is
    /// left untouched.
    pub fn register(&self, conn: Arc<Connection>) -> Result<(), HubError> {
        let id = conn.id();
        match self.write().entry(id) {
            Entry::Occupied(_) => Err(HubError::DuplicateIdentity(id)),
            Entry::Vacant(slot) => {
                slot.insert(conn);
                debug!(conn_id = %id, "connection registered");
                Ok(())
            }
        }
    }

    /// Remove a connection. Absent ids are a no-op: close and error paths may
    /// both get here. Returns whether an entry was removed.
    pub fn unregister(&self, id: ConnId) -> bool {
        let removed = self.write().remove(&id).is_some();
        if removed {
            debug!(conn_id = %id, "connection unregistered");
        }
        removed
    }

    /// Point-in-time copy of the membership, in accept order.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.read().values().cloned().collect()
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-modified:
    // every critical section is a single BTreeMap call.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<ConnId, Arc<Connection>>> {
        self.conns.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<ConnId, Arc<Connection>>> {
        self.conns.write().unwrap_or_else(PoisonError::into_inner)
    }
}
