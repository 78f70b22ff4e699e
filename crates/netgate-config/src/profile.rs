// ── CLI profiles ──
//
// TOML profiles naming the NetGate servers the CLI talks to, plus
// credential resolution (env + plaintext).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "NETGATE_CONFIG";
pub const USERNAME_ENV: &str = "NETGATE_USERNAME";
pub const PASSWORD_ENV: &str = "NETGATE_PASSWORD";

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level CLI configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }

    /// Effective request timeout for `profile`.
    pub fn timeout(&self, profile: &Profile) -> Duration {
        Duration::from_secs(profile.timeout.unwrap_or(self.defaults.timeout))
    }

    /// Effective TLS-verification override for `profile`.
    pub fn insecure(&self, profile: &Profile) -> bool {
        profile.insecure.unwrap_or(self.defaults.insecure)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named server profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g., "http://192.168.1.1:8000").
    pub controller: String,

    pub username: Option<String>,

    /// Plaintext password (prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Accept self-signed certificates.
    pub insecure: Option<bool>,

    /// PEM file with an extra CA to trust.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn controller_url(&self) -> Result<url::Url, ConfigError> {
        self.controller.parse().map_err(|_| {
            ConfigError::validation("controller", format!("invalid URL: {}", self.controller))
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `NETGATE_CONFIG`, then the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "netgate", "netgate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netgate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from `path` + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETGATE_").only(&["default_profile"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve username + password for a profile.
///
/// Username: profile, then `NETGATE_USERNAME`. Password: the profile's
/// `password_env` variable, then `NETGATE_PASSWORD`, then plaintext.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .ok_or_else(no_credentials)?;

    if let Some(pw) = profile
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok((username, SecretString::from(pw)));
    }

    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok((username, SecretString::from(pw)));
    }

    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(no_credentials())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use secrecy::ExposeSecret;

    fn profile() -> Profile {
        Profile {
            controller: "http://10.0.0.1:8000".into(),
            username: Some("admin".into()),
            password: Some("plain".into()),
            password_env: None,
            insecure: None,
            ca_cert: None,
            timeout: None,
        }
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), profile());
        cfg.default_profile = Some("lab".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.active_profile_name(None), "lab");
        assert_eq!(loaded.active_profile_name(Some("other")), "other");
        let lab = loaded.profile("lab").unwrap();
        assert_eq!(lab.controller_url().unwrap().port(), Some(8000));
        assert_eq!(loaded.timeout(lab), Duration::from_secs(30));
        assert!(matches!(
            loaded.profile("missing"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.output, "table");
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn config_path_honours_override() {
        Jail::expect_with(|jail| {
            jail.set_env(CONFIG_PATH_ENV, "/tmp/netgate-test.toml");
            assert_eq!(config_path(), PathBuf::from("/tmp/netgate-test.toml"));
            Ok(())
        });
    }

    #[test]
    fn credentials_prefer_profile_env_then_global_env() {
        Jail::expect_with(|jail| {
            let mut p = profile();
            let (user, pw) = resolve_credentials(&p, "lab").unwrap();
            assert_eq!(user, "admin");
            assert_eq!(pw.expose_secret(), "plain");

            jail.set_env(PASSWORD_ENV, "global");
            let (_, pw) = resolve_credentials(&p, "lab").unwrap();
            assert_eq!(pw.expose_secret(), "global");

            p.password_env = Some("LAB_PW".into());
            jail.set_env("LAB_PW", "scoped");
            let (_, pw) = resolve_credentials(&p, "lab").unwrap();
            assert_eq!(pw.expose_secret(), "scoped");
            Ok(())
        });
    }

    #[test]
    fn missing_username_is_no_credentials() {
        Jail::expect_with(|_| {
            let p = Profile {
                username: None,
                ..profile()
            };
            assert!(matches!(
                resolve_credentials(&p, "lab"),
                Err(ConfigError::NoCredentials { .. })
            ));
            Ok(())
        });
    }

    #[test]
    fn invalid_controller_url_is_rejected() {
        let p = Profile {
            controller: "not a url".into(),
            ..profile()
        };
        assert!(p.controller_url().is_err());
    }
}
