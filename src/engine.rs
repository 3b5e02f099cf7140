//! The resolution engine: range-table match first, ASN classification
//! fallback.

use crate::asn::MaxmindAsnSource;
use crate::classifier;
use crate::core::{AsnOrgSource, NetworkRecord};
use crate::matcher;
use crate::table::RangeTable;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::net::Ipv4Addr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The input is not a syntactically valid IPv4 literal. Distinct from
    /// "no match", which is a successful resolution with no result.
    #[error("not a valid IPv4 address: {0:?}")]
    InvalidAddress(String),
}

/// Resolves IPv4 addresses to provider identities.
///
/// Construction is comparatively expensive (table load, database open);
/// build one instance and reuse it across lookups. A built engine is
/// immutable, so `resolve` may be called from multiple threads without
/// locking. The ASN database handle is owned here and released when the
/// engine is dropped; a construction error after the table loaded releases
/// whatever was opened on the way out.
pub struct CloudLookup {
    table: RangeTable,
    asn_source: Option<Box<dyn AsnOrgSource>>,
}

impl CloudLookup {
    /// Opens an engine from a range-table file and an optional ASN database.
    ///
    /// A missing or corrupt table is fatal: an engine with an empty table
    /// would silently answer "no match" for everything. A configured ASN
    /// database that does not exist on disk only disables the
    /// classification fallback, since the engine is useful without it.
    pub fn open(table_path: &Path, asn_db_path: Option<&Path>) -> Result<Self> {
        let table = RangeTable::load(table_path)
            .with_context(|| format!("loading range table from {}", table_path.display()))?;

        let asn_source: Option<Box<dyn AsnOrgSource>> = match asn_db_path {
            Some(path) if path.exists() => {
                let source = MaxmindAsnSource::open(path)
                    .with_context(|| format!("opening ASN database at {}", path.display()))?;
                Some(Box::new(source))
            }
            Some(path) => {
                warn!(
                    "ASN database not found at {}, continuing without ASN classification",
                    path.display()
                );
                None
            }
            None => None,
        };

        Ok(Self { table, asn_source })
    }

    /// Builds an engine from preconstructed parts. Used by tests and by
    /// callers that manage their own table or AS-organization source.
    pub fn from_parts(table: RangeTable, asn_source: Option<Box<dyn AsnOrgSource>>) -> Self {
        Self { table, asn_source }
    }

    /// Resolves an IPv4 literal.
    ///
    /// # Returns
    /// * `Ok(Some(record))` on a range-table or classifier hit
    /// * `Ok(None)` when nothing is known about the address
    /// * `Err(ResolveError::InvalidAddress)` for malformed input
    pub fn resolve(&self, ip: &str) -> Result<Option<NetworkRecord>, ResolveError> {
        let addr: Ipv4Addr = ip
            .trim()
            .parse()
            .map_err(|_| ResolveError::InvalidAddress(ip.to_string()))?;
        Ok(self.resolve_addr(addr))
    }

    /// Resolves an already-parsed address.
    ///
    /// The range table is consulted first; the AS-organization source is
    /// queried only on a table miss, and any failure there is an expected
    /// "no match" (private ranges have no AS data), not an error.
    pub fn resolve_addr(&self, ip: Ipv4Addr) -> Option<NetworkRecord> {
        if let Some(record) = matcher::find(&self.table, ip) {
            return Some(record.clone());
        }

        let source = self.asn_source.as_ref()?;
        match source.lookup_org(ip) {
            Ok(org) => Some(classifier::classify(&org)),
            Err(err) => {
                debug!("No ASN classification for {}: {}", ip, err);
                None
            }
        }
    }
}
