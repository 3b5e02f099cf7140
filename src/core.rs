//! Core domain types and service traits for CloudLookup
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use thiserror::Error;

/// Provider identity for a network range or a classified AS organization.
///
/// Fields that do not apply are always the empty string, never an absent
/// value, so downstream consumers (CSV columns, JSON output) see a uniform
/// shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NetworkRecord {
    /// Canonical provider name (e.g. "AWS", "Azure (Public)"). Empty only
    /// when ASN classification matched no rule.
    #[serde(default)]
    pub provider: String,
    /// Provider region label, where the source feed carries one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// Provider service label (AWS/GCP/Azure entries), where available.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service: String,
    /// The raw AS organization the record was classified from. Set only on
    /// records produced by the ASN classifier; table entries leave it empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asn_org: String,
}

/// Errors from an AS-organization source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsnLookupError {
    /// The database has no entry for this address. Private and reserved
    /// ranges land here; it is an expected outcome, not a fault.
    #[error("no AS data for {0}")]
    NotFound(Ipv4Addr),

    /// The database itself could not be opened or read.
    #[error("AS database error: {0}")]
    Database(String),
}

// =============================================================================
// Service Traits
// =============================================================================

/// Supplies the registered AS organization for an IPv4 address.
///
/// Implementations must be safe for concurrent lookups (`Send + Sync`): the
/// resolution engine hands out references to parallel callers without
/// serializing access.
pub trait AsnOrgSource: Send + Sync {
    /// Looks up the AS organization string for an address.
    ///
    /// # Returns
    /// * `Ok(org)` with the registry organization name
    /// * `Err(AsnLookupError::NotFound)` when the database has no entry
    /// * `Err(AsnLookupError::Database)` for read failures
    fn lookup_org(&self, ip: Ipv4Addr) -> Result<String, AsnLookupError>;
}
