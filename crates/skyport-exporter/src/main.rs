mod cli;
mod error;
mod server;

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use skyport_core::{Poller, SnapshotStore};

use crate::cli::{Cli, LogFormat};
use crate::error::ExporterError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), ExporterError> {
    // Configuration is complete and valid before any network activity.
    let mut settings = skyport_config::load_settings(cli.config.as_deref())?;
    cli.apply_overrides(&mut settings);
    let runtime = settings.clone().into_runtime_config()?;

    if cli.check_config {
        print!("{}", settings.to_redacted_toml()?);
        return Ok(());
    }

    let store = Arc::new(SnapshotStore::new());
    let poller = Poller::from_config(&runtime.exporter, Arc::clone(&store))?;

    let listener = TcpListener::bind(runtime.listen)
        .await
        .map_err(|source| ExporterError::Bind {
            addr: runtime.listen,
            source,
        })?;
    info!(
        addr = %runtime.listen,
        thermostat = %runtime.exporter.thermostat,
        "serving metrics on /metrics"
    );

    let poller = poller.spawn();

    let served = axum::serve(listener, server::build_router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    poller.shutdown().await;
    served.map_err(ExporterError::Server)?;

    info!("exporter stopped");
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
}
