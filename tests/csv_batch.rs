mod helpers;

use cloudlookup::batch;
use cloudlookup::core::NetworkRecord;
use cloudlookup::engine::CloudLookup;
use cloudlookup::table::RangeTable;
use helpers::FakeAsnOrgSource;
use std::fs;
use std::io::Cursor;

fn test_engine() -> CloudLookup {
    let mut table = RangeTable::new();
    table.insert(
        "203.0.113.0/24".parse().unwrap(),
        NetworkRecord {
            provider: "AWS".to_string(),
            region: "us-east-1".to_string(),
            service: "EC2".to_string(),
            ..Default::default()
        },
    );
    let fake = FakeAsnOrgSource::new()
        .with_org("5.9.1.1", "Hetzner Online GmbH")
        .with_org("8.8.8.8", "Some Random ISP");
    CloudLookup::from_parts(table, Some(Box::new(fake)))
}

const INPUT: &str = "\
tenant id,external ip
alpha,203.0.113.5
bravo,5.9.1.1
charlie,8.8.8.8
delta,10.0.0.1
echo,not-an-ip
";

#[test]
fn annotate_appends_columns_and_isolates_row_failures() {
    let engine = test_engine();
    let mut output = Vec::new();

    let summary =
        batch::annotate(&engine, Cursor::new(INPUT), &mut output, "external ip").unwrap();

    assert_eq!(summary.rows, 5);
    assert_eq!(summary.matched, 3);
    assert_eq!(summary.unmatched, 1);
    assert_eq!(summary.invalid, 1);

    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "tenant id,external ip,provider,region,asn_org");
    // Table hit: provider and region filled, no asn_org.
    assert_eq!(lines[1], "alpha,203.0.113.5,AWS,us-east-1,");
    // Classifier hit: provider plus the raw organization.
    assert_eq!(lines[2], "bravo,5.9.1.1,Hetzner,,Hetzner Online GmbH");
    // Unknown organization: provider empty, raw organization kept.
    assert_eq!(lines[3], "charlie,8.8.8.8,,,Some Random ISP");
    // No data at all (private range): all three columns blank.
    assert_eq!(lines[4], "delta,10.0.0.1,,,");
    // Malformed address: row passes through, columns blank.
    assert_eq!(lines[5], "echo,not-an-ip,,,");
}

#[test]
fn a_missing_ip_column_aborts_before_any_row() {
    let engine = test_engine();
    let mut output = Vec::new();

    let result = batch::annotate(&engine, Cursor::new(INPUT), &mut output, "source ip");
    let err = result.unwrap_err();
    assert!(err.to_string().contains("source ip"), "{err}");
}

#[test]
fn annotate_file_renames_the_result_into_place() {
    let engine = test_engine();
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("in.csv");
    let out_path = dir.path().join("out.csv");
    fs::write(&in_path, INPUT).unwrap();
    // Pre-existing output must be replaced, not appended to.
    fs::write(&out_path, "stale contents\n").unwrap();

    let summary = batch::annotate_file(&engine, &in_path, &out_path, "external ip").unwrap();
    assert_eq!(summary.rows, 5);

    let text = fs::read_to_string(&out_path).unwrap();
    assert!(text.starts_with("tenant id,external ip,provider,region,asn_org"));
    assert!(text.contains("alpha,203.0.113.5,AWS,us-east-1,"));
    assert!(!text.contains("stale contents"));

    // No stray temp files left behind.
    let entries: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries.len(), 2, "{entries:?}");
}
