//! Kademlia routing table

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Instant;

use tracing::trace;

use crate::common::{Contact, Id, KBucket};
use crate::{Config, Result, ValidationError};

#[derive(Debug, Clone)]
/// Kademlia routing table
///
/// Contacts are grouped in [KBucket]s by their distance class relative to the
/// local [Id], see [RoutingTable::bucket_index].
pub struct RoutingTable {
    id: Id,
    k: usize,
    buckets: BTreeMap<u8, KBucket>,
}

impl RoutingTable {
    /// Create a new [RoutingTable] with a given id, and the default [Config].
    pub fn new(id: Id) -> Self {
        RoutingTable {
            id,
            k: Config::default().k,
            buckets: BTreeMap::new(),
        }
    }

    /// Create a new [RoutingTable] with a given id and [Config].
    ///
    /// Returns Err if `config.k` is zero.
    pub fn with_config(id: Id, config: Config) -> Result<Self> {
        if config.k == 0 {
            return Err(ValidationError::InvalidCapacity(config.k));
        }

        Ok(RoutingTable {
            id,
            k: config.k,
            buckets: BTreeMap::new(),
        })
    }

    // === Getters ===

    /// Returns the [Id] of this node, where the distance is measured from.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Capacity of each bucket in this table.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the bucket at a given index, if any contact was recorded in it.
    pub fn bucket(&self, index: u8) -> Option<&KBucket> {
        self.buckets.get(&index)
    }

    /// Iterate over existing buckets and their indices, ordered by index.
    pub fn buckets(&self) -> impl Iterator<Item = (u8, &KBucket)> + '_ {
        self.buckets.iter().map(|(index, bucket)| (*index, bucket))
    }

    // === Public Methods ===

    /// Distance class of `other` relative to this node's [Id].
    ///
    /// The position of the most significant bit at which `other` differs from
    /// this node's [Id], i.e. the leading zero bits of the XOR distance, so in `[0..160)`.
    /// An Id differing in the first bit is in bucket `0`,
    /// and an Id differing only in the last bit is in bucket `159`.
    ///
    /// Returns Err for this node's own [Id].
    pub fn bucket_index(&self, other: &Id) -> Result<u8> {
        let distance = self.id.xor(other);

        if distance.is_zero() {
            return Err(ValidationError::SelfDistance);
        }

        Ok(distance.leading_zeros() as u8)
    }

    /// Record a contact seen now, adding it to its bucket or touching it if
    /// already known.
    ///
    /// Returns the contact evicted from that bucket, if it overflowed.
    pub fn record(
        &mut self,
        id: Id,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Option<Contact>> {
        self.record_at(id, host, port, Instant::now())
    }

    /// Same as [Self::record] with an explicit monotonic timestamp.
    pub fn record_at(
        &mut self,
        id: Id,
        host: impl Into<String>,
        port: u16,
        now: Instant,
    ) -> Result<Option<Contact>> {
        let index = self.bucket_index(&id)?;
        let contact = Contact::new(id, host, port, now)?;

        let bucket = match self.buckets.entry(index) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                trace!(index, k = self.k, "Created bucket");
                entry.insert(KBucket::with_capacity(self.k)?)
            }
        };

        Ok(bucket.insert(contact))
    }

    /// Every known contact, ordered by ascending XOR distance to the `target`.
    pub fn nearest(&self, target: &Id) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self.contacts().cloned().collect();

        contacts.sort_by_cached_key(|contact| (contact.id().xor(target), *contact.id()));

        contacts
    }

    /// Return the `k` closest contacts to the target, ordered by ascending XOR distance.
    pub fn closest(&self, target: &Id) -> Vec<Contact> {
        let mut closest = self.nearest(target);
        closest.truncate(self.k);

        closest
    }

    pub fn get(&self, id: &Id) -> Option<&Contact> {
        let index = self.bucket_index(id).ok()?;

        self.buckets.get(&index)?.get(id)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.get(id).is_some()
    }

    /// Returns `true` if this routing table is empty.
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|bucket| bucket.is_empty())
    }

    /// Return the number of contacts in this routing table.
    pub fn len(&self) -> usize {
        self.buckets.values().map(KBucket::len).sum()
    }

    /// Returns an iterator over the contacts in this routing table, by bucket index.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.buckets.values().flat_map(KBucket::iter)
    }
}
