//! MaxMind-backed AS-organization source.

use crate::core::{AsnLookupError, AsnOrgSource};
use log::info;
use maxminddb::{geoip2, MaxMindDBError, Reader};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

/// Reads AS organizations from a GeoLite2-ASN database file.
///
/// `maxminddb::Reader` supports concurrent reads, so one source can serve
/// parallel `resolve` calls without locking. The database handle is owned
/// by this struct and released exactly once when it is dropped.
pub struct MaxmindAsnSource {
    reader: Reader<Vec<u8>>,
}

impl MaxmindAsnSource {
    /// Opens the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AsnLookupError> {
        let path = path.as_ref();
        let reader = Reader::open_readfile(path)
            .map_err(|err| AsnLookupError::Database(err.to_string()))?;
        info!("Opened ASN database at {}", path.display());
        Ok(Self { reader })
    }
}

impl AsnOrgSource for MaxmindAsnSource {
    fn lookup_org(&self, ip: Ipv4Addr) -> Result<String, AsnLookupError> {
        let asn: geoip2::Asn = self.reader.lookup(IpAddr::V4(ip)).map_err(|err| match err {
            MaxMindDBError::AddressNotFoundError(_) => AsnLookupError::NotFound(ip),
            other => AsnLookupError::Database(other.to_string()),
        })?;

        match asn.autonomous_system_organization {
            Some(org) => Ok(org.to_string()),
            // An entry without an organization carries no usable signal.
            None => Err(AsnLookupError::NotFound(ip)),
        }
    }
}
