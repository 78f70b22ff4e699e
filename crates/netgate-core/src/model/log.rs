// ── Log records ──

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Marker the kernel firewall puts in front of dropped-packet lines.
pub const DROP_MARKER: &str = "FWDROP:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_time_ms: Option<u64>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            source_ip: None,
            method: None,
            path: None,
            query_string: None,
            status_code: None,
            process_time_ms: None,
        }
    }
}

/// One HTTP request as seen by the request-log middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub source_ip: Option<IpAddr>,
    pub method: String,
    pub path: String,
    pub query_string: Option<String>,
    pub status_code: u16,
    pub process_time_ms: u64,
}

impl From<RequestRecord> for LogEntry {
    fn from(req: RequestRecord) -> Self {
        Self {
            message: format!("Request to {}", req.path),
            source_ip: req.source_ip,
            method: Some(req.method),
            path: Some(req.path),
            query_string: req.query_string,
            status_code: Some(req.status_code),
            process_time_ms: Some(req.process_time_ms),
            ..Self::new(LogLevel::Info, String::new())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPacket {
    pub timestamp: DateTime<Utc>,
    pub raw_log_line: String,
}

/// Filter for `GET /logs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
}

impl LogQuery {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.level.is_none_or(|l| l == entry.level)
            && self.ip.is_none_or(|ip| entry.source_ip == Some(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_filters_by_level_and_ip() {
        let mut entry = LogEntry::new(LogLevel::Info, "hello");
        entry.source_ip = "10.0.0.5".parse().ok();

        assert!(LogQuery::default().matches(&entry));
        assert!(
            LogQuery {
                level: Some(LogLevel::Info),
                ip: "10.0.0.5".parse().ok(),
            }
            .matches(&entry)
        );
        assert!(
            !LogQuery {
                level: Some(LogLevel::Alert),
                ip: None,
            }
            .matches(&entry)
        );
        assert!(
            !LogQuery {
                level: None,
                ip: "10.0.0.6".parse().ok(),
            }
            .matches(&entry)
        );
    }

    #[test]
    fn request_record_becomes_info_entry() {
        let entry = LogEntry::from(RequestRecord {
            source_ip: None,
            method: "GET".into(),
            path: "/firewall/rules".into(),
            query_string: None,
            status_code: 200,
            process_time_ms: 3,
        });
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message, "Request to /firewall/rules");
        assert_eq!(entry.status_code, Some(200));
    }
}
