//! Heuristic AS-organization to provider classification.
//!
//! Registry organization strings are free text, so this is a best-effort
//! signal, not a verified provider identity. The rules are evaluated
//! strictly top to bottom and the first match wins; several patterns can
//! match the same string, which makes the order load-bearing. Do not
//! reorder, merge, or "fix" individual patterns without checking real
//! registry data.

use crate::core::NetworkRecord;

enum Pattern {
    Prefix(&'static str),
    Contains(&'static str),
    Exact(&'static str),
}

impl Pattern {
    fn matches(&self, org: &str) -> bool {
        match self {
            Pattern::Prefix(p) => org.starts_with(p),
            Pattern::Contains(p) => org.contains(p),
            Pattern::Exact(p) => org == *p,
        }
    }
}

/// Ordered (pattern, provider) rules. All comparisons are case-sensitive.
const RULES: &[(Pattern, &str)] = &[
    (Pattern::Prefix("Hetzner"), "Hetzner"),
    (Pattern::Prefix("DIGITALOCEAN"), "Digital Ocean"),
    (Pattern::Prefix("Linode"), "Linode"),
    (Pattern::Contains("Tencent"), "Tencent"),
    (Pattern::Contains("OVH"), "OVH"),
    (Pattern::Contains("SOFTLAYER"), "IBM"),
    (Pattern::Exact("SPACEX-STARLINK"), "Starlink"),
    (Pattern::Contains("AS-CHOOPA"), "Vultr"), // Not 100% certain
    (Pattern::Contains("Online S.a.s."), "Scaleway"),
    (Pattern::Contains("Fly.io"), "Fly.io"),
];

/// Classifies an AS organization string into a provider record.
///
/// Never fails: when no rule matches, the provider is left empty and the
/// raw organization string is preserved in `asn_org` so callers keep the
/// signal.
pub fn classify(asn_org: &str) -> NetworkRecord {
    let provider = RULES
        .iter()
        .find(|(pattern, _)| pattern.matches(asn_org))
        .map(|(_, provider)| *provider)
        .unwrap_or("");

    NetworkRecord {
        provider: provider.to_string(),
        region: String::new(),
        service: String::new(),
        asn_org: asn_org.to_string(),
    }
}
