//! gRPC server for the workspace service.
//!
//! Wraps [`WorkspaceServiceApi`] with health reporting, gzip compression and
//! the transport parameters from [`ServerConfig`], and shuts down when the
//! server-wide cancellation token fires.

mod workspace_service;
pub use workspace_service::*;


use std::time::Duration;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::codec::CompressionEncoding;
use tonic::transport::server::Router;
use tonic::transport::Server;
use tonic_health::server::health_reporter;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::proto::workspace_service_server::WorkspaceServiceServer;
use crate::Result;
use crate::ServerConfig;
use crate::SystemError;
use crate::WorkspaceStore;

/// Binds `config.listen_address` and serves until `shutdown` fires
pub async fn start_rpc_server<S>(
    service: WorkspaceServiceApi<S>,
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> Result<()>
where
    S: WorkspaceStore,
{
    let listen_address = config.socket_addr()?;
    let router = build_router(service, config).await;

    info!("Workspace RPC server listening on {}", listen_address);
    if let Err(e) = router
        .serve_with_shutdown(listen_address, async move {
            shutdown.cancelled().await;
            warn!("Stopping RPC server. {}", listen_address);
        })
        .await
    {
        error!("error to start workspace rpc server :{:?}.", e);
        return Err(SystemError::ServerUnavailable.into());
    }
    debug!("rpc service finished!");
    Ok(())
}

/// Serves on an already bound listener until `shutdown` fires
pub async fn serve_with_listener<S>(
    service: WorkspaceServiceApi<S>,
    config: &ServerConfig,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> Result<()>
where
    S: WorkspaceStore,
{
    let router = build_router(service, config).await;

    if let Err(e) = router
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown.cancelled_owned())
        .await
    {
        error!("error to serve workspace rpc :{:?}.", e);
        return Err(SystemError::ServerUnavailable.into());
    }
    Ok(())
}

async fn build_router<S>(
    service: WorkspaceServiceApi<S>,
    config: &ServerConfig,
) -> Router
where
    S: WorkspaceStore,
{
    let (mut health_reporter, health_service) = health_reporter();
    health_reporter
        .set_serving::<WorkspaceServiceServer<WorkspaceServiceApi<S>>>()
        .await;

    Server::builder()
        .concurrency_limit_per_connection(config.concurrency_limit)
        .tcp_keepalive(Some(Duration::from_secs(config.tcp_keepalive_in_secs)))
        .http2_keepalive_interval(Some(Duration::from_secs(
            config.http2_keep_alive_interval_in_secs,
        )))
        .http2_keepalive_timeout(Some(Duration::from_secs(
            config.http2_keep_alive_timeout_in_secs,
        )))
        .tcp_nodelay(config.tcp_nodelay)
        .add_service(health_service)
        .add_service(
            WorkspaceServiceServer::new(service)
                .accept_compressed(CompressionEncoding::Gzip)
                .send_compressed(CompressionEncoding::Gzip),
        )
}
