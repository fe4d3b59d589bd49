//! Churn test for the routing table.
//!
//! Records contacts concurrently from many threads, the way inbound message
//! handlers would, and checks the table never overflows or loses a touch.
//!
//! Run with: cargo test churn

use kademlia_routing::{Config, Id, SharedRoutingTable, ValidationError};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct ChurnMetrics {
    records: AtomicU64,
    evictions: AtomicU64,
    rejected: AtomicU64,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[test]
fn churn_never_overflows_buckets() {
    init_tracing();

    let k = 8;
    let table = SharedRoutingTable::with_config(Id::random(), Config::default().k(k)).unwrap();
    let metrics = ChurnMetrics::default();

    let peers: Vec<Id> = (0..2_000).map(|_| Id::random()).collect();

    peers.par_iter().enumerate().for_each(|(i, id)| {
        match table.record(*id, "127.0.0.1", (i % 65535) as u16 + 1) {
            Ok(evicted) => {
                metrics.records.fetch_add(1, Ordering::Relaxed);
                if evicted.is_some() {
                    metrics.evictions.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(_) => {
                metrics.rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    let snapshot = table.snapshot();

    for (index, bucket) in snapshot.buckets() {
        assert!(bucket.len() <= k, "bucket {index} overflowed");
    }

    // Every record either stayed in the table or evicted exactly one contact.
    let records = metrics.records.load(Ordering::Relaxed);
    let evictions = metrics.evictions.load(Ordering::Relaxed);

    assert_eq!(metrics.rejected.load(Ordering::Relaxed), 0);
    assert_eq!(records, peers.len() as u64);
    assert_eq!(snapshot.len() as u64, records - evictions);
}

#[test]
fn concurrent_touches_keep_one_entry() {
    init_tracing();

    let table = SharedRoutingTable::new(Id::random());
    let peer = Id::random();

    (0..1_000_u16).into_par_iter().for_each(|port| {
        table
            .record(peer, "127.0.0.1", port + 1)
            .expect("valid contact");
    });

    assert_eq!(table.len(), 1);

    let contact = table.get(&peer).expect("recorded peer");
    assert!((1..=1_000).contains(&contact.port()));
}

#[test]
fn invalid_records_from_many_threads() {
    init_tracing();

    let table = SharedRoutingTable::new(Id::random());
    let own_id = table.id();

    let errors: Vec<ValidationError> = (0..100)
        .into_par_iter()
        .filter_map(|i| match i % 3 {
            0 => table.record(own_id, "127.0.0.1", 6881).err(),
            1 => table.record(Id::random(), "", 6881).err(),
            _ => table.record(Id::random(), "127.0.0.1", 0).err(),
        })
        .collect();

    assert_eq!(errors.len(), 100);
    assert!(table.is_empty());
    assert!(errors.contains(&ValidationError::SelfDistance));
    assert!(errors.contains(&ValidationError::EmptyHost));
    assert!(errors.contains(&ValidationError::InvalidPort(0)));
}
