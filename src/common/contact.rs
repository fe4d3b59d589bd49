//! Struct and implementation of the Contact entry in the Kademlia routing table
use std::time::Instant;

use crate::common::Id;
use crate::{Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Contact entry in Kademlia routing table
pub struct Contact {
    id: Id,
    host: String,
    port: u16,
    last_touched: Instant,
}

impl Contact {
    /// Creates a new Contact, validating that the host is not empty
    /// and the port is in `[1..65535]`.
    pub fn new(id: Id, host: impl Into<String>, port: u16, last_touched: Instant) -> Result<Self> {
        let host = host.into();

        if host.is_empty() {
            return Err(ValidationError::EmptyHost);
        }

        if port == 0 {
            return Err(ValidationError::InvalidPort(port));
        }

        Ok(Contact {
            id,
            host,
            port,
            last_touched,
        })
    }

    // === Getters ===

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Monotonic time of the last add or touch of this contact.
    pub fn last_touched(&self) -> Instant {
        self.last_touched
    }

    /// `host:port` form of this contact's address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    // === Private Methods ===

    /// Key of this contact in a bucket's eviction order.
    pub(crate) fn recency(&self) -> (Instant, Id) {
        (self.last_touched, self.id)
    }
}
