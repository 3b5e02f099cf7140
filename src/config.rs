//! Configuration management for CloudLookup
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer a `cloudlookup.toml` file, environment variables, and
//! command-line arguments over the built-in defaults.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Locations of the data files the engine loads at startup.
    pub data: DataConfig,
    /// Settings for CSV batch annotation.
    pub csv: CsvConfig,
}

/// Locations of the data files the engine loads at startup.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DataConfig {
    /// Path to the serialized network-range table.
    pub table_path: PathBuf,
    /// Path to the GeoLite2-ASN database. When the file is absent the
    /// engine runs without ASN classification.
    pub asn_db_path: Option<PathBuf>,
}

/// Settings for CSV batch annotation.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CsvConfig {
    /// Name of the input column holding the address to resolve.
    pub ip_field: String,
}

impl Config {
    /// Loads the configuration by layering sources: defaults, file,
    /// environment, and CLI arguments (last wins).
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("cloudlookup.toml"));
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // Allow overriding with environment variables, e.g.
            // CLOUDLOOKUP_LOG_LEVEL=debug
            .merge(Env::prefixed("CLOUDLOOKUP_"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data: DataConfig {
                table_path: PathBuf::from("data/networks.json"),
                asn_db_path: Some(PathBuf::from("data/GeoLite2-ASN.mmdb")),
            },
            csv: CsvConfig {
                ip_field: "external ip".to_string(),
            },
        }
    }
}
