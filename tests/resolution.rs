mod helpers;

use cloudlookup::core::NetworkRecord;
use cloudlookup::engine::{CloudLookup, ResolveError};
use cloudlookup::table::RangeTable;
use helpers::FakeAsnOrgSource;
use std::sync::atomic::Ordering;

fn aws_record() -> NetworkRecord {
    NetworkRecord {
        provider: "AWS".to_string(),
        region: "us-east-1".to_string(),
        ..Default::default()
    }
}

fn table_with_aws() -> RangeTable {
    let mut table = RangeTable::new();
    table.insert("203.0.113.0/24".parse().unwrap(), aws_record());
    table
}

#[test]
fn table_hit_skips_the_asn_source() {
    let fake = FakeAsnOrgSource::new();
    let calls = fake.call_counter();
    let engine = CloudLookup::from_parts(table_with_aws(), Some(Box::new(fake)));

    let record = engine
        .resolve("203.0.113.5")
        .unwrap()
        .expect("address is inside the /24");
    assert_eq!(record.provider, "AWS");
    assert_eq!(record.region, "us-east-1");
    assert_eq!(record.service, "");
    assert_eq!(record.asn_org, "");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn longest_prefix_wins_over_insertion_order() {
    let mut table = RangeTable::new();
    table.insert(
        "198.51.0.0/16".parse().unwrap(),
        NetworkRecord {
            provider: "OCI".to_string(),
            ..Default::default()
        },
    );
    table.insert(
        "198.51.100.0/24".parse().unwrap(),
        NetworkRecord {
            provider: "GCP".to_string(),
            ..Default::default()
        },
    );
    let engine = CloudLookup::from_parts(table, None);

    assert_eq!(
        engine.resolve("198.51.100.7").unwrap().unwrap().provider,
        "GCP"
    );
    assert_eq!(
        engine.resolve("198.51.7.7").unwrap().unwrap().provider,
        "OCI"
    );
}

#[test]
fn table_miss_queries_the_asn_source_exactly_once() {
    let fake = FakeAsnOrgSource::new().with_org("5.9.1.1", "Hetzner Online GmbH");
    let calls = fake.call_counter();
    let engine = CloudLookup::from_parts(RangeTable::new(), Some(Box::new(fake)));

    let record = engine.resolve("5.9.1.1").unwrap().expect("classifier hit");
    assert_eq!(record.provider, "Hetzner");
    assert_eq!(record.region, "");
    assert_eq!(record.asn_org, "Hetzner Online GmbH");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn starlink_org_is_matched_exactly() {
    let fake = FakeAsnOrgSource::new().with_org("98.97.32.1", "SPACEX-STARLINK");
    let engine = CloudLookup::from_parts(RangeTable::new(), Some(Box::new(fake)));

    let record = engine.resolve("98.97.32.1").unwrap().unwrap();
    assert_eq!(record.provider, "Starlink");
    assert_eq!(record.asn_org, "SPACEX-STARLINK");
}

#[test]
fn unknown_org_yields_empty_provider_with_raw_org() {
    let fake = FakeAsnOrgSource::new().with_org("192.0.2.200", "Some Random ISP");
    let engine = CloudLookup::from_parts(RangeTable::new(), Some(Box::new(fake)));

    let record = engine.resolve("192.0.2.200").unwrap().unwrap();
    assert_eq!(record.provider, "");
    assert_eq!(record.region, "");
    assert_eq!(record.asn_org, "Some Random ISP");
}

#[test]
fn asn_lookup_failure_is_no_match_not_an_error() {
    // The fake reports NotFound for any unscripted address, as the real
    // database does for private ranges.
    let fake = FakeAsnOrgSource::new();
    let calls = fake.call_counter();
    let engine = CloudLookup::from_parts(RangeTable::new(), Some(Box::new(fake)));

    assert_eq!(engine.resolve("10.1.2.3").unwrap(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn without_an_asn_source_a_miss_is_no_match() {
    let engine = CloudLookup::from_parts(table_with_aws(), None);
    assert_eq!(engine.resolve("8.8.8.8").unwrap(), None);
}

#[test]
fn malformed_input_is_a_structured_error() {
    let engine = CloudLookup::from_parts(RangeTable::new(), None);

    for input in ["not-an-ip", "256.1.2.3", "1.2.3", "", "2001:db8::1"] {
        assert_eq!(
            engine.resolve(input),
            Err(ResolveError::InvalidAddress(input.to_string())),
            "{input:?}"
        );
    }
}

#[test]
fn repeated_resolution_is_idempotent() {
    let fake = FakeAsnOrgSource::new().with_org("5.9.1.1", "Hetzner Online GmbH");
    let engine = CloudLookup::from_parts(table_with_aws(), Some(Box::new(fake)));

    for ip in ["203.0.113.5", "5.9.1.1", "10.0.0.1"] {
        let first = engine.resolve(ip).unwrap();
        let second = engine.resolve(ip).unwrap();
        assert_eq!(first, second, "{ip}");
    }
}
