//! CSV batch annotation.
//!
//! Streams an input CSV through the resolution engine and appends
//! `provider`, `region` and `asn_org` columns. Rows that cannot be resolved
//! pass through with those columns empty; one bad row never aborts the
//! batch. File output goes to a temporary file next to the destination and
//! is renamed into place only when the whole batch succeeded.

use crate::engine::{CloudLookup, ResolveError};
use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const ADDED_FIELDS: [&str; 3] = ["provider", "region", "asn_org"];
const PROGRESS_INTERVAL: u64 = 10_000;

/// Counters for a completed batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Data rows read (the header is not counted).
    pub rows: u64,
    /// Rows for which the engine produced a record.
    pub matched: u64,
    /// Rows with a valid address but no record.
    pub unmatched: u64,
    /// Rows whose address field was not a valid IPv4 literal.
    pub invalid: u64,
}

/// Annotates CSV data from `input` into `output`.
///
/// The column named `ip_field` supplies the address for each row; its
/// absence from the header is a configuration error, not a row error.
pub fn annotate<R: Read, W: Write>(
    engine: &CloudLookup,
    input: R,
    output: W,
    ip_field: &str,
) -> Result<BatchSummary> {
    let mut reader = csv::Reader::from_reader(input);
    let mut writer = csv::Writer::from_writer(output);

    let headers = reader.headers().context("reading CSV header")?.clone();
    let Some(ip_index) = headers.iter().position(|name| name == ip_field) else {
        bail!("input CSV has no {:?} column", ip_field);
    };

    let mut out_headers = headers.clone();
    for field in ADDED_FIELDS {
        out_headers.push_field(field);
    }
    writer
        .write_record(&out_headers)
        .context("writing CSV header")?;

    let mut summary = BatchSummary::default();
    for row in reader.records() {
        let row = row.context("reading CSV row")?;
        summary.rows += 1;

        let ip = row.get(ip_index).unwrap_or("");
        let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
        match engine.resolve(ip) {
            Ok(Some(record)) => {
                summary.matched += 1;
                fields.extend([record.provider, record.region, record.asn_org]);
            }
            Ok(None) => {
                summary.unmatched += 1;
                fields.extend([String::new(), String::new(), String::new()]);
            }
            Err(ResolveError::InvalidAddress(_)) => {
                warn!(
                    "Row {}: {:?} is not a valid IPv4 address, leaving columns blank",
                    summary.rows, ip
                );
                summary.invalid += 1;
                fields.extend([String::new(), String::new(), String::new()]);
            }
        }
        writer.write_record(&fields).context("writing CSV row")?;

        if summary.rows % PROGRESS_INTERVAL == 0 {
            info!("{} rows processed", summary.rows);
        }
    }
    writer.flush().context("flushing CSV output")?;

    Ok(summary)
}

/// Annotates `in_path` into `out_path` atomically.
pub fn annotate_file(
    engine: &CloudLookup,
    in_path: &Path,
    out_path: &Path,
    ip_field: &str,
) -> Result<BatchSummary> {
    let input =
        File::open(in_path).with_context(|| format!("opening input CSV {}", in_path.display()))?;

    // The temp file must live in the destination directory so the final
    // rename cannot cross a filesystem boundary.
    let out_dir = out_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp =
        NamedTempFile::new_in(out_dir).context("creating temporary output file")?;

    let summary = annotate(engine, input, &mut tmp, ip_field)?;

    tmp.persist(out_path)
        .with_context(|| format!("replacing {}", out_path.display()))?;
    info!(
        "Annotated {} rows from {} into {} ({} matched, {} unmatched, {} invalid)",
        summary.rows,
        in_path.display(),
        out_path.display(),
        summary.matched,
        summary.unmatched,
        summary.invalid
    );
    Ok(summary)
}
