//! Shared configuration for the NetGate server and CLI.
//!
//! [`server`] holds the `netgated.toml` layout and its translation to
//! `netgate_core::GatewayConfig`; [`profile`] holds the CLI's named
//! controller profiles and credential resolution. Both layer serialized
//! defaults, a TOML file and `NETGATE_` environment variables via figment.

pub mod profile;
pub mod server;

use thiserror::Error;

pub use profile::{
    Config, Defaults, Profile, config_path, load_config, load_config_from,
    load_config_or_default, resolve_credentials, save_config, save_config_to,
};
pub use server::{
    AlarmSettings, AuthSettings, CorsSettings, DnsSettings, FirewallSettings, LogFormat,
    LogSettings, LogsSettings, ServerConfig, UserEntry,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
