//! CloudLookup - IPv4 to infrastructure-provider resolution
//!
//! This library resolves an IPv4 address to the identity of the
//! cloud/hosting provider operating it: an exact match against the published
//! provider network ranges first, then a heuristic classification of the
//! registered AS organization as a fallback.

pub mod asn;
pub mod batch;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod ingest;
pub mod matcher;
pub mod table;

// Re-export the types most callers need.
pub use crate::core::{AsnLookupError, AsnOrgSource, NetworkRecord};
pub use crate::engine::{CloudLookup, ResolveError};
pub use crate::table::{RangeTable, TableError};
