//! Longest-prefix matching over the range table.

use crate::core::NetworkRecord;
use crate::table::RangeTable;
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;

/// Finds the most specific table entry containing `ip`.
///
/// Walks the chain of supernets starting from the address itself as a /32
/// and widening one bit at a time, probing each as an exact key. The first
/// hit is necessarily the longest matching prefix, because every narrower
/// candidate has already been ruled out. The walk gives up after probing
/// 0.0.0.0/0, so lookup cost is bounded by the address width regardless of
/// table size.
pub fn find<'a>(table: &'a RangeTable, ip: Ipv4Addr) -> Option<&'a NetworkRecord> {
    let bits = u32::from(ip);
    for prefix in (0..=32u8).rev() {
        let base = Ipv4Addr::from(bits & prefix_mask(prefix));
        let network = Ipv4Network::new(base, prefix).expect("prefix length is at most 32");
        if let Some(record) = table.get(&network) {
            return Some(record);
        }
    }
    None
}

/// Reference lookup that tests the address against every stored network.
///
/// Kept only to cross-check [`find`]; it scans the whole table per lookup
/// and must not be used on the production path.
pub fn find_linear<'a>(table: &'a RangeTable, ip: Ipv4Addr) -> Option<&'a NetworkRecord> {
    table
        .iter()
        .filter(|(network, _)| network.contains(ip))
        .max_by_key(|(network, _)| network.prefix())
        .map(|(_, record)| record)
}

fn prefix_mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(provider: &str) -> NetworkRecord {
        NetworkRecord {
            provider: provider.to_string(),
            ..Default::default()
        }
    }

    fn table() -> RangeTable {
        let mut table = RangeTable::new();
        table.insert("10.0.0.0/16".parse().unwrap(), record("wide"));
        table.insert("10.0.5.0/24".parse().unwrap(), record("narrow"));
        table.insert("203.0.113.7/32".parse().unwrap(), record("host"));
        table
    }

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn longest_prefix_wins() {
        let table = table();
        // Inside both the /16 and the contained /24: the /24 must win even
        // though the /16 was inserted first.
        assert_eq!(find(&table, ip("10.0.5.9")).unwrap().provider, "narrow");
        // Inside only the /16.
        assert_eq!(find(&table, ip("10.0.6.9")).unwrap().provider, "wide");
    }

    #[test]
    fn host_route_matches_itself_only() {
        let table = table();
        assert_eq!(find(&table, ip("203.0.113.7")).unwrap().provider, "host");
        assert!(find(&table, ip("203.0.113.8")).is_none());
    }

    #[test]
    fn no_entry_is_no_match() {
        assert!(find(&table(), ip("192.168.1.1")).is_none());
        assert!(find(&RangeTable::new(), ip("8.8.8.8")).is_none());
    }

    #[test]
    fn default_route_entry_is_reachable() {
        let mut table = table();
        table.insert("0.0.0.0/0".parse().unwrap(), record("default"));
        assert_eq!(find(&table, ip("192.168.1.1")).unwrap().provider, "default");
        // More specific entries still win over the default route.
        assert_eq!(find(&table, ip("10.0.5.9")).unwrap().provider, "narrow");
    }

    #[test]
    fn walk_agrees_with_linear_scan() {
        let table = table();
        for addr in [
            "10.0.5.0",
            "10.0.5.255",
            "10.0.200.1",
            "10.1.0.1",
            "203.0.113.7",
            "203.0.113.6",
            "0.0.0.0",
            "255.255.255.255",
        ] {
            let addr = ip(addr);
            assert_eq!(find(&table, addr), find_linear(&table, addr), "{addr}");
        }
    }
}
