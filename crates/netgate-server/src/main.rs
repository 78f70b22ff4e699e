use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use netgate_config::{ConfigError, LogFormat, ServerConfig};
use netgate_core::{Controller, CoreError};
use netgate_server::{AppState, app, syslog};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// NetGate management API server.
#[derive(Debug, Parser)]
#[command(name = "netgated", version, about)]
struct Args {
    /// Path to the server config file
    #[arg(short, long, env = "NETGATED_CONFIG", default_value = netgate_config::server::SERVER_CONFIG_FILE)]
    config: PathBuf,

    /// Override the listen address from the config file
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Error)]
enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match ServerConfig::load_from(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("netgated: {e}");
            return ExitCode::from(2);
        }
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    init_tracing(&config, args.verbose);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server exited with error");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &ServerConfig, verbosity: u8) {
    let filter = match verbosity {
        0 => config.log.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match config.log.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init(),
    }
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let gateway = config.to_gateway_config()?;
    if gateway.users.is_empty() && !gateway.allow_registration {
        warn!("no users configured and registration disabled; nobody can log in");
    }

    let controller = Controller::new(gateway);
    controller.start().await?;
    let cancel = controller.cancellation();

    if let Some(path) = config.logs.syslog_path.clone() {
        tokio::spawn(syslog::watch_syslog(
            controller.clone(),
            path,
            cancel.clone(),
        ));
    }
    tokio::spawn(session_purge_task(controller.clone(), cancel.clone()));

    let state = AppState::new(controller.clone())?;
    let router = app(state, &config.cors);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cancel))
    .await?;

    controller.shutdown().await;
    Ok(())
}

async fn session_purge_task(controller: Controller, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let purged = controller.auth().purge_expired();
                if purged > 0 {
                    debug!(purged, "expired sessions purged");
                }
            }
        }
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
        () = cancel.cancelled() => {},
    }
    info!("shutdown signal received");
}
