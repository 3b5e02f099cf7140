//! The in-memory network-range table and its serialized form.
//!
//! The table is an ordered mapping from exact IPv4 CIDR networks to
//! [`NetworkRecord`]s. It is built once by the offline ingestion job,
//! serialized as a JSON array, and loaded read-only at engine startup.
//! Because it is never mutated after load, concurrent lookups need no
//! locking.

use crate::core::NetworkRecord;
use anyhow::Context;
use ipnetwork::Ipv4Network;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("range table not found at {path}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("range table at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to read range table at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One serialized table entry. The order of entries in the file is the
/// table's insertion order.
#[derive(Debug, Serialize, Deserialize)]
struct TableEntry {
    network: Ipv4Network,
    #[serde(flatten)]
    record: NetworkRecord,
}

/// An ordered collection of (CIDR network, record) pairs with unique exact
/// keys.
///
/// Inserting a duplicate exact key overwrites the record while keeping the
/// key's original position. Overlapping but non-identical networks (a /16
/// and a contained /24) are both retained; the prefix matcher resolves the
/// ambiguity at lookup time.
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    records: HashMap<Ipv4Network, NetworkRecord>,
    /// Keys in insertion order. Invariant: exactly the keys of `records`.
    order: Vec<Ipv4Network>,
}

impl RangeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under the exact network key, masking off any host
    /// bits first. A later insert for the same exact network overwrites the
    /// earlier record in place.
    pub fn insert(&mut self, network: Ipv4Network, record: NetworkRecord) {
        let key = normalize(network);
        if self.records.insert(key, record).is_none() {
            self.order.push(key);
        }
    }

    /// Exact-key lookup. This is deliberately not a containment test: the
    /// prefix matcher probes successively wider supernets against it.
    pub fn get(&self, network: &Ipv4Network) -> Option<&NetworkRecord> {
        self.records.get(&normalize(*network))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Ipv4Network, &NetworkRecord)> + '_ {
        self.order
            .iter()
            .filter_map(move |key| self.records.get(key).map(|record| (*key, record)))
    }

    /// Loads a table from its serialized JSON form.
    ///
    /// # Returns
    /// * `Err(TableError::Missing)` if the file does not exist
    /// * `Err(TableError::Corrupt)` if it cannot be parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => TableError::Missing {
                path: path.to_path_buf(),
                source,
            },
            _ => TableError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let entries: Vec<TableEntry> =
            serde_json::from_reader(BufReader::new(file)).map_err(|err| TableError::Corrupt {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        let mut table = RangeTable::new();
        for entry in entries {
            table.insert(entry.network, entry.record);
        }
        debug!(
            "Loaded {} network ranges from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Writes the table as a JSON array, preserving insertion order so that
    /// a later `load` reconstructs an identical table.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let entries: Vec<TableEntry> = self
            .iter()
            .map(|(network, record)| TableEntry {
                network,
                record: record.clone(),
            })
            .collect();
        let file = File::create(path)
            .with_context(|| format!("creating range table file {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &entries)
            .with_context(|| format!("writing range table to {}", path.display()))?;
        Ok(())
    }
}

/// Reduces a network to its exact key form: the network address plus the
/// prefix length, host bits cleared.
fn normalize(network: Ipv4Network) -> Ipv4Network {
    Ipv4Network::new(network.network(), network.prefix())
        .expect("prefix length is unchanged and therefore valid")
}
