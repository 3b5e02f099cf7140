//! CloudLookup - IPv4 to infrastructure-provider resolution
//!
//! Labels traffic sources by hosting provider: exact matches against the
//! published cloud network ranges first, AS-organization heuristics second.

use anyhow::Result;
use clap::Parser;
use cloudlookup::{
    batch,
    cli::{Cli, Command},
    config::Config,
    core::NetworkRecord,
    engine::CloudLookup,
    ingest,
};
use log::{error, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment,
    // and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // Manually initialize logger for this specific error
        env_logger::init();
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    match &cli.command {
        Command::Lookup { ip, json } => run_lookup(&config, ip, *json),
        Command::Csv {
            in_file, out_file, ..
        } => {
            let engine = open_engine(&config)?;
            let summary = batch::annotate_file(&engine, in_file, out_file, &config.csv.ip_field)?;
            info!(
                "Done: {} rows, {} matched, {} unmatched, {} invalid",
                summary.rows, summary.matched, summary.unmatched, summary.invalid
            );
            Ok(())
        }
        Command::FetchData { out } => {
            let out_path = out.clone().unwrap_or_else(|| config.data.table_path.clone());
            ingest::run(&out_path)
        }
    }
}

fn open_engine(config: &Config) -> Result<CloudLookup> {
    CloudLookup::open(&config.data.table_path, config.data.asn_db_path.as_deref())
}

fn run_lookup(config: &Config, ip: &str, json: bool) -> Result<()> {
    // Constructing an engine is expensive (table load, database open);
    // anything resolving more than one address should reuse it, the way the
    // csv subcommand does.
    let engine = open_engine(config)?;
    match engine.resolve(ip)? {
        Some(record) => {
            if json {
                println!("{}", serde_json::to_string(&record)?);
            } else {
                println!("{}", format_record(&record));
            }
        }
        None => println!("Not found"),
    }
    Ok(())
}

fn format_record(record: &NetworkRecord) -> String {
    let mut out = if record.provider.is_empty() {
        "(unknown provider)".to_string()
    } else {
        record.provider.clone()
    };
    if !record.region.is_empty() {
        out.push_str(&format!(" region={}", record.region));
    }
    if !record.service.is_empty() {
        out.push_str(&format!(" service={}", record.service));
    }
    if !record.asn_org.is_empty() {
        out.push_str(&format!(" asn_org={:?}", record.asn_org));
    }
    out
}
