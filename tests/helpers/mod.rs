#![allow(dead_code)]
//! Shared test doubles.

use cloudlookup::core::{AsnLookupError, AsnOrgSource};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An `AsnOrgSource` that serves scripted organization strings and counts
/// how often it is queried. Addresses without a scripted entry behave like
/// real lookups of private ranges: `NotFound`.
#[derive(Debug, Default)]
pub struct FakeAsnOrgSource {
    orgs: HashMap<Ipv4Addr, String>,
    calls: Arc<AtomicUsize>,
}

impl FakeAsnOrgSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(mut self, ip: &str, org: &str) -> Self {
        self.orgs.insert(ip.parse().unwrap(), org.to_string());
        self
    }

    /// Returns a handle to the call counter that stays valid after the
    /// fake has been moved into an engine.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl AsnOrgSource for FakeAsnOrgSource {
    fn lookup_org(&self, ip: Ipv4Addr) -> Result<String, AsnLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.orgs
            .get(&ip)
            .cloned()
            .ok_or(AsnLookupError::NotFound(ip))
    }
}
