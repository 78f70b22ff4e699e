//! CLI error types with miette diagnostics.
//!
//! Maps API client and config errors into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netgate_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(netgate::connection_failed),
        help(
            "Check that netgated is running and reachable.\n\
             URL: {url}\n\
             Try: netgate status"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(netgate::tls_error),
        help("Pass --ca-cert <PEM> to trust a private CA, or --insecure (-k) to skip verification.")
    )]
    TlsError { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(netgate::timeout),
        help("Increase timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(netgate::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             Run: netgate config init"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(netgate::no_credentials),
        help(
            "Configure credentials with: netgate config init\n\
             Or set NETGATE_USERNAME and NETGATE_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(netgate::permission_denied),
        help("This operation needs an admin account.")
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(netgate::not_found),
        help("Run the matching `list` command to see available IDs.")
    )]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(code(netgate::conflict))]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Server error ({status}): {message}")]
    #[diagnostic(code(netgate::api_error))]
    ApiError { status: u16, message: String },

    #[error("{message}")]
    #[diagnostic(
        code(netgate::unsupported),
        help("The server does not implement this operation.")
    )]
    Unsupported { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netgate::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(netgate::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: netgate config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(netgate::no_config),
        help(
            "Create a profile with: netgate config init\n\
             Or pass --controller. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(netgate::config))]
    Config(ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(netgate::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(netgate::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            Self::PermissionDenied { .. } | Self::Unsupported { .. } => exit_code::PERMISSION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

// ── API error → CliError mapping ─────────────────────────────────────

impl From<netgate_api::Error> for CliError {
    fn from(err: netgate_api::Error) -> Self {
        use netgate_api::Error as ApiErr;

        match err {
            ApiErr::Authentication { message } => Self::AuthFailed {
                profile: "current".into(),
                message,
            },
            ApiErr::NotLoggedIn => Self::AuthFailed {
                profile: "current".into(),
                message: "not logged in".into(),
            },
            ApiErr::PermissionDenied { message } => Self::PermissionDenied { message },
            ApiErr::Transport(e) if e.is_timeout() => Self::Timeout,
            ApiErr::Transport(e) => Self::ConnectionFailed {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                source: Box::new(e),
            },
            ApiErr::InvalidUrl(e) => Self::Validation {
                field: "controller".into(),
                reason: e.to_string(),
            },
            ApiErr::Tls(message) => Self::TlsError { message },
            ApiErr::Api { status, message } => match status {
                404 => Self::NotFound { message },
                409 => Self::Conflict { message },
                400 | 422 => Self::Validation {
                    field: "request".into(),
                    reason: message,
                },
                501 => Self::Unsupported { message },
                _ => Self::ApiError { status, message },
            },
            ApiErr::Deserialization { message, .. } => Self::ApiError {
                status: 200,
                message: format!("unexpected response: {message}"),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_status_codes_map_to_exit_codes() {
        let cases = [
            (404, exit_code::NOT_FOUND),
            (409, exit_code::CONFLICT),
            (400, exit_code::USAGE),
            (422, exit_code::USAGE),
            (501, exit_code::PERMISSION),
            (500, exit_code::GENERAL),
        ];
        for (status, code) in cases {
            let err = CliError::from(netgate_api::Error::Api {
                status,
                message: "boom".into(),
            });
            assert_eq!(err.exit_code(), code, "status {status}");
        }
    }

    #[test]
    fn auth_errors_exit_with_auth_code() {
        let err = CliError::from(netgate_api::Error::Authentication {
            message: "invalid credentials".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert!(err.to_string().contains("invalid credentials"));
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let err = CliError::from(ConfigError::UnknownProfile {
            name: "lab".into(),
        });
        assert!(matches!(err, CliError::ProfileNotFound { ref name, .. } if name == "lab"));
    }
}
