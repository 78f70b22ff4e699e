mod cli;
mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use netgate_api::{NetgateClient, TlsMode, TransportConfig};
use netgate_config::{Config, Profile};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a server connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "netgate", &mut std::io::stdout());
            Ok(())
        }

        // Public endpoints: connect without logging in
        Command::Status => {
            let target = resolve_target(&cli.global)?;
            let client = target.client()?;
            commands::system::status(&client, &cli.global).await
        }
        Command::Register { username } => {
            let target = resolve_target(&cli.global)?;
            let client = target.client()?;
            commands::system::register(&client, &username, &cli.global).await
        }

        // Everything else needs a bearer token
        cmd => {
            let target = resolve_target(&cli.global)?;
            let client = target.login().await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &client, &cli.global).await
        }
    }
}

// ── Connection target ────────────────────────────────────────────────

/// Server URL, transport settings and (lazily checked) credentials.
struct Target {
    profile_name: String,
    url: String,
    transport: TransportConfig,
    credentials: Result<(String, SecretString), CliError>,
}

impl Target {
    fn client(&self) -> Result<NetgateClient, CliError> {
        Ok(NetgateClient::new(&self.url, &self.transport)?)
    }

    async fn login(self) -> Result<NetgateClient, CliError> {
        let mut client = self.client()?;
        let (username, password) = self.credentials?;
        client
            .login(&username, &password)
            .await
            .map_err(|e| match CliError::from(e) {
                CliError::AuthFailed { message, .. } => CliError::AuthFailed {
                    profile: self.profile_name.clone(),
                    message,
                },
                other => other,
            })?;
        Ok(client)
    }
}

/// Resolve the server and credentials from the config file, the active
/// profile, and CLI overrides.
fn resolve_target(global: &GlobalOpts) -> Result<Target, CliError> {
    let cfg = netgate_config::load_config_or_default();
    let profile_name = cfg.active_profile_name(global.profile.as_deref());

    match cfg.profiles.get(&profile_name) {
        Some(profile) => Ok(target_from_profile(&cfg, profile, profile_name, global)),
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        }),
        // No profile -- build from CLI flags / env vars alone
        None => {
            let url = global.controller.clone().ok_or_else(|| CliError::NoConfig {
                path: netgate_config::config_path().display().to_string(),
            })?;
            let credentials = match (&global.username, &global.password) {
                (Some(user), Some(pass)) => Ok((user.clone(), SecretString::from(pass.clone()))),
                _ => Err(CliError::NoCredentials {
                    profile: profile_name.clone(),
                }),
            };
            Ok(Target {
                profile_name,
                url,
                transport: transport(
                    global.insecure,
                    global.ca_cert.clone(),
                    Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout)),
                ),
                credentials,
            })
        }
    }
}

fn target_from_profile(
    cfg: &Config,
    profile: &Profile,
    profile_name: String,
    global: &GlobalOpts,
) -> Target {
    let url = global
        .controller
        .clone()
        .unwrap_or_else(|| profile.controller.clone());

    let credentials = match (&global.username, &global.password) {
        (Some(user), Some(pass)) => Ok((user.clone(), SecretString::from(pass.clone()))),
        (user, _) => {
            let mut profile = profile.clone();
            if let Some(user) = user {
                profile.username = Some(user.clone());
            }
            netgate_config::resolve_credentials(&profile, &profile_name).map_err(CliError::from)
        }
    };

    let timeout = global
        .timeout
        .map_or_else(|| cfg.timeout(profile), Duration::from_secs);

    Target {
        url,
        transport: transport(
            global.insecure || cfg.insecure(profile),
            global.ca_cert.clone().or_else(|| profile.ca_cert.clone()),
            timeout,
        ),
        credentials,
        profile_name,
    }
}

fn transport(insecure: bool, ca_cert: Option<PathBuf>, timeout: Duration) -> TransportConfig {
    TransportConfig {
        tls: TlsMode::resolve(insecure, ca_cert),
        timeout,
    }
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}
