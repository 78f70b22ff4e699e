// ── DNS domain blocking ──

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::timestamp;
use crate::error::CoreError;

/// Note attached to domains pulled in from a downloaded list.
pub const ADBLOCK_NOTE: &str = "Adblock imported";

/// Name of the rule group that holds the DNS-over-HTTPS block rule.
pub const DOH_GROUP_NAME: &str = "DNS-over-HTTPS";

/// Well-known public DoH resolver addresses.
pub const DOH_RESOLVERS: &[&str] = &[
    "1.1.1.1",
    "1.0.0.1",
    "8.8.8.8",
    "8.8.4.4",
    "9.9.9.9",
    "149.112.112.112",
    "208.67.222.222",
    "208.67.220.220",
    "94.140.14.14",
    "94.140.15.15",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDomain {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    pub domain: String,
    #[serde(default)]
    pub note: String,
    #[serde(default = "default_wildcard")]
    pub use_wildcard: bool,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDraft {
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default = "default_wildcard")]
    pub use_wildcard: bool,
}

fn default_wildcard() -> bool {
    true
}

impl DomainDraft {
    pub(crate) fn build(self, created_at: DateTime<Utc>) -> Result<BlockedDomain, CoreError> {
        Ok(BlockedDomain {
            id: EntityId::generate(),
            domain: normalize_domain(&self.domain)?,
            note: self.note.map(|n| n.trim().to_owned()).unwrap_or_default(),
            use_wildcard: self.use_wildcard,
            created_at,
        })
    }
}

/// Trim, lowercase and syntax-check a host name.
pub fn normalize_domain(raw: &str) -> Result<String, CoreError> {
    let domain = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    if is_host_name(&domain) {
        Ok(domain)
    } else {
        Err(CoreError::validation(format!(
            "'{}' is not a valid domain name",
            raw.trim()
        )))
    }
}

fn is_host_name(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    })
}

/// Extract domain names from a hosts-style or adblock-style list.
///
/// Lines that cannot be read as a domain are skipped. The result keeps
/// first-seen order and contains no duplicates.
pub fn parse_blocklist(contents: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        // Inline comments
        let line = line.split('#').next().unwrap_or_default().trim();

        let candidate = if let Some(rest) = line.strip_prefix("||") {
            rest.split(['^', '$', '/']).next().unwrap_or_default()
        } else {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(_addr), Some(host)) => host,
                (Some(host), None) => host,
                _ => continue,
            }
        };

        let Ok(domain) = normalize_domain(candidate) else {
            continue;
        };
        if matches!(
            domain.as_str(),
            "localhost" | "localhost.localdomain" | "local" | "broadcasthost"
        ) {
            continue;
        }
        if domain.parse::<std::net::IpAddr>().is_ok() {
            continue;
        }
        if seen.insert(domain.clone()) {
            out.push(domain);
        }
    }
    out
}

/// Render the blocklist in hosts-file format for the resolver.
pub fn render_hosts<'a>(domains: impl IntoIterator<Item = &'a BlockedDomain>) -> String {
    let mut out = String::new();
    for d in domains {
        let _ = writeln!(out, "127.0.0.1 {}", d.domain);
        if d.use_wildcard {
            let _ = writeln!(out, "127.0.0.1 www.{}", d.domain);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn domain_is_trimmed_and_lowercased() {
        assert_eq!(normalize_domain("  Ads.Example.COM ").unwrap(), "ads.example.com");
        assert!(normalize_domain("not a domain").is_err());
        assert!(normalize_domain("").is_err());
        assert!(normalize_domain("-bad.com").is_err());
    }

    #[test]
    fn parses_hosts_and_adblock_lines() {
        let list = "\
# comment
! adblock comment
0.0.0.0 ads.example.com
127.0.0.1 localhost
127.0.0.1   tracker.example.net # inline
||doubleclick.net^
||metrics.example.org^$third-party
plain.example.io

0.0.0.0 ads.example.com
";
        assert_eq!(
            parse_blocklist(list),
            vec![
                "ads.example.com",
                "tracker.example.net",
                "doubleclick.net",
                "metrics.example.org",
                "plain.example.io",
            ]
        );
    }

    #[test]
    fn renders_wildcard_entries() {
        let now = Utc::now();
        let domains = vec![
            BlockedDomain {
                id: EntityId::generate(),
                domain: "a.com".into(),
                note: String::new(),
                use_wildcard: true,
                created_at: now,
            },
            BlockedDomain {
                id: EntityId::generate(),
                domain: "b.com".into(),
                note: String::new(),
                use_wildcard: false,
                created_at: now,
            },
        ];
        assert_eq!(
            render_hosts(&domains),
            "127.0.0.1 a.com\n127.0.0.1 www.a.com\n127.0.0.1 b.com\n"
        );
    }
}
