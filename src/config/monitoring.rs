use std::net::IpAddr;
use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;
use crate::Result;
use crate::SystemError;

/// Prometheus `/metrics` endpoint
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    /// Serve watch gauges, counters and autometrics series
    ///
    /// **Default**: false
    #[serde(default)]
    pub prometheus_enabled: bool,

    /// Interface the metrics endpoint binds to
    #[serde(default = "default_prometheus_host")]
    pub prometheus_host: String,

    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            prometheus_enabled: false,
            prometheus_host: default_prometheus_host(),
            prometheus_port: default_prometheus_port(),
        }
    }
}

impl MonitoringConfig {
    /// Checks the endpoint only when it is enabled.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` for port 0 or a privileged port
    /// - `SystemError::InvalidAddress` for an unparsable host
    pub fn validate(&self) -> Result<()> {
        if !self.prometheus_enabled {
            return Ok(());
        }

        match self.prometheus_port {
            0 => Err(Error::InvalidConfig(
                "prometheus_port cannot be 0 when enabled".into(),
            )),
            port if port < 1024 => Err(Error::InvalidConfig(format!(
                "prometheus_port {port} is a privileged port (requires root)"
            ))),
            _ => self.metrics_addr().map(|_| ()),
        }
    }

    /// Address the `/metrics` server binds to
    pub fn metrics_addr(&self) -> Result<SocketAddr> {
        let host: IpAddr = self
            .prometheus_host
            .parse()
            .map_err(|_| SystemError::InvalidAddress(self.prometheus_host.clone()))?;
        Ok(SocketAddr::new(host, self.prometheus_port))
    }

    /// Rejects an enabled endpoint sharing the RPC listener's port on an
    /// overlapping interface.
    pub(super) fn check_against_rpc(
        &self,
        rpc: SocketAddr,
    ) -> Result<()> {
        if !self.prometheus_enabled {
            return Ok(());
        }

        let metrics = self.metrics_addr()?;
        let overlapping = metrics.ip() == rpc.ip() || metrics.ip().is_unspecified() || rpc.ip().is_unspecified();
        if overlapping && metrics.port() == rpc.port() {
            warn!(%metrics, %rpc, "metrics endpoint collides with the RPC listener");
            return Err(Error::InvalidConfig(format!(
                "prometheus_port {} is already used by server.listen_address",
                metrics.port()
            )));
        }
        Ok(())
    }
}

fn default_prometheus_host() -> String {
    "0.0.0.0".to_string()
}

fn default_prometheus_port() -> u16 {
    8080
}
