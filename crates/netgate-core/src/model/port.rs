// ── Port specifications ──
//
// Rules carry their port filter as free text ("80,443", "8000-8090").
// PortSpec is the parsed form the matcher tests connections against.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::CoreError;

/// A comma-separated list of single ports and inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    ranges: Vec<RangeInclusive<u16>>,
}

impl PortSpec {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mut ranges = Vec::new();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let range = match item.split_once('-') {
                Some((lo, hi)) => {
                    let lo = parse_port(lo)?;
                    let hi = parse_port(hi)?;
                    if lo > hi {
                        return Err(CoreError::validation(format!(
                            "port range '{item}' is reversed"
                        )));
                    }
                    lo..=hi
                }
                None => {
                    let port = parse_port(item)?;
                    port..=port
                }
            };
            ranges.push(range);
        }

        if ranges.is_empty() {
            return Err(CoreError::validation("port list is empty"));
        }
        Ok(Self { ranges })
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ranges.iter().any(|r| r.contains(&port))
    }
}

fn parse_port(raw: &str) -> Result<u16, CoreError> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(CoreError::validation(format!(
            "invalid port '{}': expected 1-65535",
            raw.trim()
        ))),
        Ok(port) => Ok(port),
    }
}

impl FromStr for PortSpec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .ranges
            .iter()
            .map(|r| {
                if r.start() == r.end() {
                    r.start().to_string()
                } else {
                    format!("{}-{}", r.start(), r.end())
                }
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_and_ranges() {
        let spec = PortSpec::parse("80, 443,8000-8080").unwrap();
        assert!(spec.contains(80));
        assert!(spec.contains(443));
        assert!(spec.contains(8000));
        assert!(spec.contains(8080));
        assert!(!spec.contains(8081));
        assert!(!spec.contains(22));
        assert_eq!(spec.to_string(), "80,443,8000-8080");
    }

    #[test]
    fn rejects_garbage() {
        assert!(PortSpec::parse("http").is_err());
        assert!(PortSpec::parse("0").is_err());
        assert!(PortSpec::parse("70000").is_err());
        assert!(PortSpec::parse("443-80").is_err());
        assert!(PortSpec::parse(" , ").is_err());
    }
}
