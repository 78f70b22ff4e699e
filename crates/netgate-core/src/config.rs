// ── Gateway runtime configuration ──
//
// Plain values the core needs at startup. The core never reads files or
// environment variables; `netgate-config` builds this from TOML and env.
// The one file it writes is the blocklist hosts file.

use std::path::PathBuf;

use chrono::TimeDelta;
use secrecy::SecretString;

use crate::model::{Role, RuleAction};

/// Drop-rate alarm settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmConfig {
    /// Raise an alert when more than this many drops fall in one window.
    pub threshold: usize,
    pub window: TimeDelta,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            threshold: 50,
            window: TimeDelta::minutes(5),
        }
    }
}

/// A console account provisioned at startup.
#[derive(Debug, Clone)]
pub struct UserSeed {
    pub username: String,
    pub password: SecretString,
    pub role: Role,
}

/// Configuration for a [`Controller`](crate::Controller).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Action applied when no rule matches.
    pub default_action: RuleAction,
    /// Lifetime of an issued bearer token.
    pub session_ttl: TimeDelta,
    pub allow_registration: bool,
    pub users: Vec<UserSeed>,
    /// Capacity of each log ring buffer.
    pub log_capacity: usize,
    pub alarm: AlarmConfig,
    /// Hosts file rewritten after every blocklist change.
    pub blocklist_path: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_action: RuleAction::Deny,
            session_ttl: TimeDelta::minutes(60),
            allow_registration: false,
            users: Vec::new(),
            log_capacity: 10_000,
            alarm: AlarmConfig::default(),
            blocklist_path: None,
        }
    }
}
