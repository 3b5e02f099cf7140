//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. These arguments are parsed at startup and then merged
//! with the configuration from the `cloudlookup.toml` file and environment
//! variables; CLI values win.

use clap::{Parser, Subcommand};
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Resolve IPv4 addresses to cloud/hosting provider identities.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the serialized network-range table.
    #[arg(long, value_name = "FILE")]
    pub table: Option<PathBuf>,

    /// Path to the GeoLite2-ASN database.
    #[arg(long, value_name = "FILE")]
    pub asn_db: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve a single IPv4 address and print the result.
    Lookup {
        /// The IPv4 address to look up.
        ip: String,

        /// Print the record as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Annotate a CSV file with provider, region and asn_org columns.
    Csv {
        /// Path to the input CSV file.
        in_file: PathBuf,

        /// Path to the output CSV file.
        out_file: PathBuf,

        /// Name of the column holding the address to resolve.
        #[arg(long, value_name = "NAME")]
        ip_field: Option<String>,
    },

    /// Rebuild the network-range table from the public provider feeds.
    FetchData {
        /// Where to write the table (defaults to the configured table path).
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();
        let mut data = Dict::new();
        let mut csv = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }
        if let Some(table) = &self.table {
            data.insert(
                "table_path".into(),
                Value::from(table.display().to_string()),
            );
        }
        if let Some(asn_db) = &self.asn_db {
            data.insert(
                "asn_db_path".into(),
                Value::from(asn_db.display().to_string()),
            );
        }
        if let Command::Csv {
            ip_field: Some(field),
            ..
        } = &self.command
        {
            csv.insert("ip_field".into(), Value::from(field.clone()));
        }

        if !data.is_empty() {
            dict.insert("data".into(), Value::Dict(Tag::Default, data));
        }
        if !csv.is_empty() {
            dict.insert("csv".into(), Value::Dict(Tag::Default, csv));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
