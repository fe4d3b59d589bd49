//! Identifier and routing table primitives.

mod contact;
mod id;
mod kbucket;
mod routing_table;

pub use contact::*;
pub use id::*;
pub use kbucket::*;
pub use routing_table::*;
