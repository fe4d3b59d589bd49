//! Thread safe handle to a [RoutingTable].

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::common::{Contact, Id, RoutingTable};
use crate::{Config, Result};

#[derive(Debug, Clone)]
/// Cloneable, thread safe handle to a [RoutingTable].
///
/// Recording takes an exclusive lock over the whole table, so adding a contact
/// and evicting on overflow happen atomically, while queries share a read lock.
pub struct SharedRoutingTable {
    inner: Arc<RwLock<RoutingTable>>,
}

impl SharedRoutingTable {
    /// Create a new [SharedRoutingTable] with a given id, and the default [Config].
    pub fn new(id: Id) -> Self {
        RoutingTable::new(id).into()
    }

    /// Create a new [SharedRoutingTable] with a given id and [Config].
    pub fn with_config(id: Id, config: Config) -> Result<Self> {
        Ok(RoutingTable::with_config(id, config)?.into())
    }

    // === Getters ===

    pub fn id(&self) -> Id {
        *self.read().id()
    }

    // === Public Methods ===

    /// See [RoutingTable::record]
    pub fn record(&self, id: Id, host: impl Into<String>, port: u16) -> Result<Option<Contact>> {
        self.write().record(id, host, port)
    }

    /// See [RoutingTable::record_at]
    pub fn record_at(
        &self,
        id: Id,
        host: impl Into<String>,
        port: u16,
        now: Instant,
    ) -> Result<Option<Contact>> {
        self.write().record_at(id, host, port, now)
    }

    /// See [RoutingTable::bucket_index]
    pub fn bucket_index(&self, other: &Id) -> Result<u8> {
        self.read().bucket_index(other)
    }

    /// See [RoutingTable::nearest]
    pub fn nearest(&self, target: &Id) -> Vec<Contact> {
        self.read().nearest(target)
    }

    /// See [RoutingTable::closest]
    pub fn closest(&self, target: &Id) -> Vec<Contact> {
        self.read().closest(target)
    }

    pub fn get(&self, id: &Id) -> Option<Contact> {
        self.read().get(id).cloned()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Clone the current state of the table.
    pub fn snapshot(&self) -> RoutingTable {
        self.read().clone()
    }

    // === Private Methods ===

    // Every mutation is all-or-nothing, so the table is consistent even if
    // a thread panicked while holding the lock.
    fn read(&self) -> RwLockReadGuard<'_, RoutingTable> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RoutingTable> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<RoutingTable> for SharedRoutingTable {
    fn from(table: RoutingTable) -> Self {
        SharedRoutingTable {
            inner: Arc::new(RwLock::new(table)),
        }
    }
}
