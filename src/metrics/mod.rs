use std::net::SocketAddr;

use autometrics::prometheus_exporter;
use lazy_static::lazy_static;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use warp::Filter;
use warp::Rejection;
use warp::Reply;


lazy_static! {
    pub static ref ACTIVE_WATCHES: IntGauge =
        IntGauge::new("active_watches", "Watch calls currently streaming")
            .expect("metric can not be created");

    pub static ref WATCH_ELEMENTS_DELIVERED: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_elements_delivered", "Elements yielded to watch callers"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_UPDATES_DROPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_updates_dropped", "Live updates discarded by the watch filter"),
        &["reason"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_ENDED: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_ended", "Watch calls that reached a terminal state"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub(crate) fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(ACTIVE_WATCHES.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_ELEMENTS_DELIVERED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_UPDATES_DROPPED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_ENDED.clone()))
        .expect("collector can be registered");
}

/// Serves `/metrics` until `shutdown` fires
pub async fn start_server(
    addr: SocketAddr,
    shutdown: CancellationToken,
) {
    register_custom_metrics(&REGISTRY);

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(addr, async move {
            shutdown.cancelled().await;
        });
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(encode_metrics(&REGISTRY))
}

/// Text exposition of `registry` followed by the autometrics series
pub(crate) fn encode_metrics(registry: &Registry) -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        warn!("could not encode custom metrics: {}", e);
    };
    let mut res = String::from_utf8(buffer).unwrap_or_else(|e| {
        warn!("custom metrics could not be from_utf8'd: {}", e);
        String::default()
    });

    res.push_str(&get_metrics_body());
    res
}

/// Export autometrics series for Prometheus to scrape
pub fn get_metrics_body() -> String {
    prometheus_exporter::encode_http_response().into_body()
}
