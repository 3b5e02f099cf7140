//! Offline construction of the network-range table from provider feeds.
//!
//! Each cloud provider publishes its address ranges as a JSON document; the
//! Azure variants sit behind a download-confirmation page whose real link
//! has to be pulled out of the HTML. Fetching is kept separate from parsing
//! so the parsers are pure functions of the payload and testable offline.
//!
//! Insertion order is part of the table contract: AWS first, then GCP, the
//! Azure clouds, and OCI, with each provider's ranges sorted by network
//! before insertion. Duplicate exact networks within or across feeds
//! resolve to the last record inserted.

use crate::core::NetworkRecord;
use crate::table::RangeTable;
use anyhow::{anyhow, Context, Result};
use ipnetwork::Ipv4Network;
use log::info;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

pub const AWS_RANGES_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";
pub const GCP_RANGES_URL: &str = "https://www.gstatic.com/ipranges/cloud.json";
pub const OCI_RANGES_URL: &str = "https://docs.oracle.com/en-us/iaas/tools/public_ip_ranges.json";

/// Azure service-tag feeds, one confirmation page per cloud variant.
/// See <https://learn.microsoft.com/en-us/azure/virtual-network/service-tags-overview>.
pub const AZURE_FEEDS: [(&str, &str); 4] = [
    (
        "Azure (Public)",
        "https://www.microsoft.com/en-us/download/confirmation.aspx?id=56519",
    ),
    (
        "Azure (US Gov)",
        "https://www.microsoft.com/en-us/download/confirmation.aspx?id=57063",
    ),
    (
        "Azure (China)",
        "https://www.microsoft.com/en-us/download/confirmation.aspx?id=57062",
    ),
    (
        "Azure (Germany)",
        "https://www.microsoft.com/en-us/download/confirmation.aspx?id=57064",
    ),
];

type Ranges = Vec<(Ipv4Network, NetworkRecord)>;

// =============================================================================
// Fetching
// =============================================================================

pub fn http_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(concat!("cloudlookup/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")
}

/// Fetches a URL, treating any non-success status as an error.
pub fn fetch_text(client: &reqwest::blocking::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()
        .with_context(|| format!("requesting {url}"))?;
    response.text().with_context(|| format!("reading {url}"))
}

/// Extracts the real download link from a Microsoft confirmation page.
///
/// The page carries it on the anchor tagged `download retry`; attribute
/// order within the tag is not guaranteed.
pub fn extract_azure_download_url(html: &str) -> Result<String> {
    let tag_re = Regex::new(r"<a\s[^>]*>")?;
    let href_re = Regex::new(r#"href="([^"]+)""#)?;

    for tag in tag_re.find_iter(html) {
        if !tag.as_str().contains(r#"data-bi-containername="download retry""#) {
            continue;
        }
        if let Some(caps) = href_re.captures(tag.as_str()) {
            return Ok(caps[1].to_string());
        }
    }
    Err(anyhow!("no download link found on confirmation page"))
}

// =============================================================================
// Feed parsers
// =============================================================================

#[derive(Debug, Deserialize)]
struct AwsFeed {
    prefixes: Vec<AwsPrefix>,
}

#[derive(Debug, Deserialize)]
struct AwsPrefix {
    /// Absent on the IPv6 entries of the feed.
    #[serde(default)]
    ip_prefix: Option<String>,
    #[serde(default)]
    region: String,
    #[serde(default)]
    service: String,
}

pub fn parse_aws(body: &str) -> Result<Ranges> {
    let feed: AwsFeed = serde_json::from_str(body).context("parsing AWS ip-ranges.json")?;
    let mut ranges = Vec::new();
    for prefix in feed.prefixes {
        let Some(cidr) = prefix.ip_prefix else {
            continue;
        };
        let network = parse_network(&cidr, "AWS")?;
        ranges.push((
            network,
            NetworkRecord {
                provider: "AWS".to_string(),
                region: prefix.region,
                service: prefix.service,
                asn_org: String::new(),
            },
        ));
    }
    sort_by_network(&mut ranges);
    Ok(ranges)
}

#[derive(Debug, Deserialize)]
struct GcpFeed {
    prefixes: Vec<GcpPrefix>,
}

#[derive(Debug, Deserialize)]
struct GcpPrefix {
    /// Absent on the IPv6 entries of the feed.
    #[serde(rename = "ipv4Prefix", default)]
    ipv4_prefix: Option<String>,
    #[serde(default)]
    scope: String,
}

pub fn parse_gcp(body: &str) -> Result<Ranges> {
    let feed: GcpFeed = serde_json::from_str(body).context("parsing GCP cloud.json")?;
    let mut ranges = Vec::new();
    for prefix in feed.prefixes {
        let Some(cidr) = prefix.ipv4_prefix else {
            continue;
        };
        let network = parse_network(&cidr, "GCP")?;
        ranges.push((
            network,
            NetworkRecord {
                provider: "GCP".to_string(),
                region: prefix.scope,
                service: String::new(),
                asn_org: String::new(),
            },
        ));
    }
    sort_by_network(&mut ranges);
    Ok(ranges)
}

#[derive(Debug, Deserialize)]
struct AzureFeed {
    values: Vec<AzureValue>,
}

#[derive(Debug, Deserialize)]
struct AzureValue {
    properties: AzureProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureProperties {
    #[serde(default)]
    system_service: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    address_prefixes: Vec<String>,
}

/// Parses an Azure service-tags document. `provider` names the cloud
/// variant ("Azure (Public)", "Azure (US Gov)", ...).
pub fn parse_azure(body: &str, provider: &str) -> Result<Ranges> {
    let feed: AzureFeed = serde_json::from_str(body)
        .with_context(|| format!("parsing {provider} service tags"))?;

    // The same prefix appears under several service tags; ordering the rows
    // by region before the stable by-network sort makes the overwrite winner
    // deterministic.
    let mut properties: Vec<AzureProperties> =
        feed.values.into_iter().map(|value| value.properties).collect();
    properties.sort_by(|a, b| a.region.cmp(&b.region));

    let mut ranges = Vec::new();
    for props in &properties {
        for cidr in &props.address_prefixes {
            // The service-tag lists mix IPv4 and IPv6 prefixes.
            if !cidr.contains('.') {
                continue;
            }
            let network = parse_network(cidr, provider)?;
            ranges.push((
                network,
                NetworkRecord {
                    provider: provider.to_string(),
                    region: props.region.clone(),
                    service: props.system_service.clone(),
                    asn_org: String::new(),
                },
            ));
        }
    }
    sort_by_network(&mut ranges);
    Ok(ranges)
}

#[derive(Debug, Deserialize)]
struct OciFeed {
    regions: Vec<OciRegion>,
}

#[derive(Debug, Deserialize)]
struct OciRegion {
    #[serde(default)]
    region: String,
    #[serde(default)]
    cidrs: Vec<OciCidr>,
}

#[derive(Debug, Deserialize)]
struct OciCidr {
    cidr: String,
}

pub fn parse_oci(body: &str) -> Result<Ranges> {
    let feed: OciFeed =
        serde_json::from_str(body).context("parsing OCI public_ip_ranges.json")?;
    let mut ranges = Vec::new();
    for region in feed.regions {
        for entry in region.cidrs {
            let network = parse_network(&entry.cidr, "OCI")?;
            ranges.push((
                network,
                NetworkRecord {
                    provider: "OCI".to_string(),
                    region: region.region.clone(),
                    service: String::new(),
                    asn_org: String::new(),
                },
            ));
        }
    }
    sort_by_network(&mut ranges);
    Ok(ranges)
}

fn parse_network(cidr: &str, provider: &str) -> Result<Ipv4Network> {
    cidr.parse()
        .with_context(|| format!("bad {provider} prefix {cidr:?}"))
}

fn sort_by_network(ranges: &mut Ranges) {
    // Stable sort: rows for the same network keep their relative order, so
    // the insert-time overwrite winner is well defined.
    ranges.sort_by_key(|(network, _)| (u32::from(network.network()), network.prefix()));
}

// =============================================================================
// Assembly
// =============================================================================

/// Fetches every feed and assembles the table in provider order.
pub fn build_table() -> Result<RangeTable> {
    let client = http_client()?;
    let mut table = RangeTable::new();

    info!("Processing AWS ranges...");
    insert_all(&mut table, parse_aws(&fetch_text(&client, AWS_RANGES_URL)?)?);

    info!("Processing GCP ranges...");
    insert_all(&mut table, parse_gcp(&fetch_text(&client, GCP_RANGES_URL)?)?);

    for (provider, confirmation_url) in AZURE_FEEDS {
        info!("Processing {} ranges...", provider);
        let page = fetch_text(&client, confirmation_url)?;
        let download_url = extract_azure_download_url(&page)
            .with_context(|| format!("locating the {provider} download"))?;
        insert_all(
            &mut table,
            parse_azure(&fetch_text(&client, &download_url)?, provider)?,
        );
    }

    info!("Processing OCI ranges...");
    insert_all(&mut table, parse_oci(&fetch_text(&client, OCI_RANGES_URL)?)?);

    Ok(table)
}

fn insert_all(table: &mut RangeTable, ranges: Ranges) {
    for (network, record) in ranges {
        table.insert(network, record);
    }
}

/// Builds the table from the live feeds and writes it to `out_path`.
pub fn run(out_path: &Path) -> Result<()> {
    let table = build_table()?;
    table.save(out_path)?;
    info!(
        "Saved {} network ranges to {}",
        table.len(),
        out_path.display()
    );
    Ok(())
}
