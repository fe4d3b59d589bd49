//! Kbuckets
use std::{
    collections::{BTreeSet, HashMap},
    fmt::{self, Debug, Formatter},
    time::Instant,
};

use tracing::{debug, trace};

use crate::common::{Contact, Id};
use crate::{Result, ValidationError};

/// K = the default maximum size of a k-bucket.
pub const DEFAULT_K: usize = 20;

/// Kbuckets are recency based caches of contactable peers for one distance class.
///
/// Adding a known contact touches it instead of duplicating it, and once the bucket
/// grows beyond `k`, the least recently touched contact is evicted.
#[derive(Clone)]
pub struct KBucket {
    /// K (as in k-bucket) is the maximum number of contacts in a k-bucket.
    k: usize,
    contacts: HashMap<Id, Contact>,
    /// Eviction order, least recently touched first, ties broken by [Id] order.
    ///
    /// Always holds exactly one entry per contact.
    recency: BTreeSet<(Instant, Id)>,
}

impl KBucket {
    pub fn new() -> Self {
        KBucket {
            k: DEFAULT_K,
            contacts: HashMap::with_capacity(DEFAULT_K + 1),
            recency: BTreeSet::new(),
        }
    }

    /// Create an empty bucket with capacity `k`. Returns Err if `k` is zero.
    pub fn with_capacity(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(ValidationError::InvalidCapacity(k));
        }

        Ok(KBucket {
            k,
            contacts: HashMap::with_capacity(k + 1),
            recency: BTreeSet::new(),
        })
    }

    // === Getters ===

    pub fn capacity(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    // === Public Methods ===

    /// Add a new contact or touch an existing one, stamped with the current time.
    ///
    /// Returns the evicted contact if the bucket overflowed.
    pub fn add_or_touch(
        &mut self,
        id: Id,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Option<Contact>> {
        self.add_or_touch_at(id, host, port, Instant::now())
    }

    /// Same as [Self::add_or_touch] with an explicit monotonic timestamp.
    pub fn add_or_touch_at(
        &mut self,
        id: Id,
        host: impl Into<String>,
        port: u16,
        now: Instant,
    ) -> Result<Option<Contact>> {
        let contact = Contact::new(id, host, port, now)?;

        Ok(self.insert(contact))
    }

    pub fn get(&self, id: &Id) -> Option<&Contact> {
        self.contacts.get(id)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.contacts.contains_key(id)
    }

    /// The next contact to be evicted on overflow.
    pub fn least_recently_touched(&self) -> Option<&Contact> {
        self.recency
            .first()
            .and_then(|(_, id)| self.contacts.get(id))
    }

    /// Iterate over contacts, least recently touched first.
    pub fn iter(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.recency
            .iter()
            .filter_map(|(_, id)| self.contacts.get(id))
    }

    // === Private Methods ===

    /// Insert an already validated contact, overwriting any record with the same [Id].
    pub(crate) fn insert(&mut self, contact: Contact) -> Option<Contact> {
        let id = *contact.id();
        let key = contact.recency();

        if let Some(previous) = self.contacts.insert(id, contact) {
            self.recency.remove(&previous.recency());
            trace!(?id, "Touched contact");
        }

        self.recency.insert(key);

        if self.contacts.len() <= self.k {
            return None;
        }

        let (_, oldest) = self.recency.pop_first()?;
        let evicted = self.contacts.remove(&oldest);

        debug!(?evicted, k = self.k, "Evicted least recently touched contact");

        evicted
    }
}

impl Default for KBucket {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for KBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "KBucket{{ k: {}, contacts: {} }}", self.k, self.contacts.len())
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    fn peer(n: u8) -> Id {
        let mut bytes = [0; 20];
        bytes[19] = n;
        Id(bytes)
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            KBucket::with_capacity(0),
            Err(ValidationError::InvalidCapacity(0))
        ));
        assert_eq!(KBucket::with_capacity(1).unwrap().capacity(), 1);
        assert_eq!(KBucket::new().capacity(), DEFAULT_K);
    }

    #[test]
    fn should_not_hold_more_than_k() {
        let mut bucket = KBucket::new();

        for i in 0..(DEFAULT_K * 2) {
            bucket
                .add_or_touch(Id::random(), "127.0.0.1", 6881)
                .unwrap_or_else(|e| panic!("Failed to add node {i}: {e}"));

            assert!(bucket.len() <= DEFAULT_K);
        }

        assert_eq!(bucket.len(), DEFAULT_K);
        assert_eq!(bucket.iter().count(), DEFAULT_K);
    }

    #[test]
    fn evicts_least_recently_touched() {
        let mut bucket = KBucket::with_capacity(2).unwrap();
        let t1 = Instant::now();
        let t2 = t1 + Duration::from_millis(1);
        let t3 = t2 + Duration::from_millis(1);

        assert_eq!(bucket.add_or_touch_at(peer(1), "p1", 1, t1), Ok(None));
        assert_eq!(bucket.add_or_touch_at(peer(2), "p2", 2, t2), Ok(None));

        let evicted = bucket.add_or_touch_at(peer(3), "p3", 3, t3).unwrap();

        assert_eq!(evicted.map(|c| *c.id()), Some(peer(1)));
        assert_eq!(bucket.len(), 2);
        assert!(!bucket.contains(&peer(1)));
        assert!(bucket.contains(&peer(2)));
        assert!(bucket.contains(&peer(3)));
    }

    #[test]
    fn touch_moves_to_most_recent_end() {
        let mut bucket = KBucket::with_capacity(2).unwrap();
        let t1 = Instant::now();
        let t2 = t1 + Duration::from_millis(1);
        let t3 = t2 + Duration::from_millis(1);
        let t4 = t3 + Duration::from_millis(1);

        bucket.add_or_touch_at(peer(1), "p1", 1, t1).unwrap();
        bucket.add_or_touch_at(peer(2), "p2", 2, t2).unwrap();

        // Touch p1 with a new port, size unchanged.
        assert_eq!(bucket.add_or_touch_at(peer(1), "p1", 11, t3), Ok(None));
        assert_eq!(bucket.len(), 2);

        let touched = bucket.get(&peer(1)).unwrap();
        assert_eq!(touched.port(), 11);
        assert_eq!(touched.last_touched(), t3);

        let order: Vec<Id> = bucket.iter().map(|c| *c.id()).collect();
        assert_eq!(order, vec![peer(2), peer(1)]);
        assert_eq!(
            bucket.least_recently_touched().map(|c| *c.id()),
            Some(peer(2))
        );

        let evicted = bucket.add_or_touch_at(peer(3), "p3", 3, t4).unwrap();
        assert_eq!(evicted.map(|c| *c.id()), Some(peer(2)));
    }

    #[test]
    fn touch_with_same_timestamp() {
        let mut bucket = KBucket::new();
        let now = Instant::now();

        bucket.add_or_touch_at(peer(1), "p1", 1, now).unwrap();
        bucket.add_or_touch_at(peer(1), "p1", 2, now).unwrap();

        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.iter().count(), 1);
        assert_eq!(bucket.get(&peer(1)).unwrap().port(), 2);
    }

    #[test]
    fn ties_are_broken_by_id() {
        let mut bucket = KBucket::with_capacity(2).unwrap();
        let now = Instant::now();

        bucket.add_or_touch_at(peer(9), "p9", 9, now).unwrap();
        bucket.add_or_touch_at(peer(3), "p3", 3, now).unwrap();

        let evicted = bucket.add_or_touch_at(peer(5), "p5", 5, now).unwrap();

        assert_eq!(evicted.map(|c| *c.id()), Some(peer(3)));
    }

    #[test]
    fn invalid_contact_leaves_bucket_unchanged() {
        let mut bucket = KBucket::with_capacity(1).unwrap();

        bucket.add_or_touch(peer(1), "p1", 1).unwrap();

        assert_eq!(
            bucket.add_or_touch(peer(2), "", 1),
            Err(ValidationError::EmptyHost)
        );
        assert_eq!(
            bucket.add_or_touch(peer(2), "p2", 0),
            Err(ValidationError::InvalidPort(0))
        );

        assert_eq!(bucket.len(), 1);
        assert!(bucket.contains(&peer(1)));
    }

    #[test]
    fn matches_linear_scan_for_minimum() {
        let mut bucket = KBucket::with_capacity(8).unwrap();
        let start = Instant::now();

        for step in 0..200_u64 {
            let id = peer((step * 7 % 13) as u8);
            let now = start + Duration::from_millis(step / 3);

            let expected = if bucket.contains(&id) || bucket.len() < bucket.capacity() {
                None
            } else {
                bucket
                    .iter()
                    .map(|c| (c.last_touched(), *c.id()))
                    .min()
                    .map(|(_, id)| id)
            };

            let evicted = bucket.add_or_touch_at(id, "host", 1, now).unwrap();

            assert_eq!(evicted.map(|c| *c.id()), expected);
            assert!(bucket.len() <= bucket.capacity());
        }
    }
}
