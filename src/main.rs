use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use workspace_watch::metrics;
use workspace_watch::start_rpc_server;
use workspace_watch::InMemoryWorkspaceStore;
use workspace_watch::InstanceUpdateHub;
use workspace_watch::Result;
use workspace_watch::Settings;
use workspace_watch::SystemError;
use workspace_watch::WorkspaceServiceApi;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = Settings::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.server.log_dir)?;

    // Initializing Shutdown Signal
    let shutdown = CancellationToken::new();

    if settings.monitoring.prometheus_enabled {
        tokio::spawn(metrics::start_server(
            settings.monitoring.metrics_addr()?,
            shutdown.clone(),
        ));
    }

    let hub = InstanceUpdateHub::new();
    let store = Arc::new(InMemoryWorkspaceStore::new(hub.clone()));
    let service = WorkspaceServiceApi::new(store, hub, &settings.watch, shutdown.clone());

    info!("Application started. Waiting for CTRL+C signal...");
    // Listen on Shutdown Signal
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown(signal_token).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    if let Err(e) = start_rpc_server(service, &settings.server, shutdown).await {
        error!("rpc server stops: {:?}", e);
    }

    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(shutdown: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(SystemError::Io)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(SystemError::Io)?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutdown server..");
    shutdown.cancel();
    Ok(())
}

pub fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir).map_err(SystemError::Io)?;
    let log_file = tracing_appender::rolling::never(log_dir, "workspace-watch.log");

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
