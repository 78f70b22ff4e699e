// ── Server configuration ──
//
// Layout of `netgated.toml` and its translation to the core's runtime
// `GatewayConfig`. Every key can be overridden from the environment as
// `NETGATE_<SECTION>__<KEY>`, e.g. `NETGATE_FIREWALL__DEFAULT_ACTION=ALLOW`.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use netgate_core::{AlarmConfig, GatewayConfig, Role, RuleAction, UserSeed};

use crate::ConfigError;

/// Default file name looked up in the working directory.
pub const SERVER_CONFIG_FILE: &str = "netgated.toml";

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    pub listen: SocketAddr,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub firewall: FirewallSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub dns: DnsSettings,
    #[serde(default)]
    pub logs: LogsSettings,
    #[serde(default)]
    pub alarm: AlarmSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            log: LogSettings::default(),
            firewall: FirewallSettings::default(),
            auth: AuthSettings::default(),
            dns: DnsSettings::default(),
            logs: LogsSettings::default(),
            alarm: AlarmSettings::default(),
            cors: CorsSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirewallSettings {
    /// Action returned by the matcher when no rule matches.
    #[serde(default = "default_action")]
    pub default_action: RuleAction,
}

impl Default for FirewallSettings {
    fn default() -> Self {
        Self {
            default_action: default_action(),
        }
    }
}

fn default_action() -> RuleAction {
    RuleAction::Deny
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: i64,
    #[serde(default)]
    pub allow_registration: bool,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl_minutes: default_session_ttl(),
            allow_registration: false,
            users: Vec::new(),
        }
    }
}

fn default_session_ttl() -> i64 {
    60
}

/// A console account provisioned from the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserEntry {
    pub username: String,

    /// Plaintext password (prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    #[serde(default)]
    pub role: Role,
}

impl UserEntry {
    fn to_seed(&self) -> Result<UserSeed, ConfigError> {
        let field = format!("auth.users.{}", self.username);
        if self.username.trim().is_empty() {
            return Err(ConfigError::validation("auth.users", "username is empty"));
        }

        let from_env = self
            .password_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok());
        let password = from_env
            .or_else(|| self.password.clone())
            .ok_or_else(|| ConfigError::validation(field, "no password or password_env set"))?;

        Ok(UserSeed {
            username: self.username.trim().to_owned(),
            password: SecretString::from(password),
            role: self.role,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DnsSettings {
    /// Hosts-format blocklist rewritten after every DNS change.
    pub blocklist_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogsSettings {
    /// Capacity of each in-memory log ring.
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
    /// Kernel log followed for `FWDROP:` lines.
    pub syslog_path: Option<PathBuf>,
}

impl Default for LogsSettings {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
            syslog_path: None,
        }
    }
}

fn default_log_capacity() -> usize {
    10_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlarmSettings {
    #[serde(default = "default_alarm_threshold")]
    pub threshold: usize,
    #[serde(default = "default_alarm_window")]
    pub window_secs: i64,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            threshold: default_alarm_threshold(),
            window_secs: default_alarm_window(),
        }
    }
}

fn default_alarm_threshold() -> usize {
    50
}
fn default_alarm_window() -> i64 {
    300
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CorsSettings {
    /// Allowed origins; empty allows any origin.
    #[serde(default)]
    pub origins: Vec<String>,
}

// ── Loading ─────────────────────────────────────────────────────────

impl ServerConfig {
    /// Load defaults, then `path` if it exists, then `NETGATE_` env vars.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("NETGATE_").split("__"));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from [`SERVER_CONFIG_FILE`] in the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(SERVER_CONFIG_FILE))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_ttl_minutes <= 0 {
            return Err(ConfigError::validation(
                "auth.session_ttl_minutes",
                "must be positive",
            ));
        }
        if self.logs.capacity == 0 {
            return Err(ConfigError::validation("logs.capacity", "must be positive"));
        }
        if self.alarm.threshold == 0 {
            return Err(ConfigError::validation("alarm.threshold", "must be positive"));
        }
        if self.alarm.window_secs <= 0 {
            return Err(ConfigError::validation("alarm.window_secs", "must be positive"));
        }
        for origin in &self.cors.origins {
            origin
                .parse::<url::Url>()
                .map_err(|e| ConfigError::validation("cors.origins", format!("{origin}: {e}")))?;
        }
        Ok(())
    }

    /// Translate into the core's runtime configuration, resolving user
    /// passwords from the environment where configured.
    pub fn to_gateway_config(&self) -> Result<GatewayConfig, ConfigError> {
        let users = self
            .auth
            .users
            .iter()
            .map(UserEntry::to_seed)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GatewayConfig {
            default_action: self.firewall.default_action,
            session_ttl: TimeDelta::minutes(self.auth.session_ttl_minutes),
            allow_registration: self.auth.allow_registration,
            users,
            log_capacity: self.logs.capacity,
            alarm: AlarmConfig {
                threshold: self.alarm.threshold,
                window: TimeDelta::seconds(self.alarm.window_secs),
            },
            blocklist_path: self.dns.blocklist_path.clone(),
        })
    }
}
