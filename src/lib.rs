#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
//!

// Public modules
mod common;

mod config;
mod error;
mod shared;

pub use common::{Contact, Id, KBucket, RoutingTable, DEFAULT_K, ID_BITS, ID_SIZE};
pub use config::Config;
pub use error::ValidationError;
pub use shared::SharedRoutingTable;

/// Alias `Result<T, ValidationError>`
pub type Result<T, E = ValidationError> = std::result::Result<T, E>;
