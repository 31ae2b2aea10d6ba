use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;
use crate::SystemError;

/// RPC listener and HTTP/2 transport parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Socket address the gRPC server binds to
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Max concurrent requests per connection
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// TCP keepalive in seconds
    #[serde(default = "default_tcp_keepalive")]
    pub tcp_keepalive_in_secs: u64,

    /// HTTP2 keep-alive ping interval in seconds
    #[serde(default = "default_h2_keepalive_interval")]
    pub http2_keep_alive_interval_in_secs: u64,

    /// HTTP2 keep-alive ping timeout in seconds
    #[serde(default = "default_h2_keepalive_timeout")]
    pub http2_keep_alive_timeout_in_secs: u64,

    #[serde(default = "default_tcp_nodelay")]
    pub tcp_nodelay: bool,

    /// Directory receiving the server log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            concurrency_limit: default_concurrency_limit(),
            tcp_keepalive_in_secs: default_tcp_keepalive(),
            http2_keep_alive_interval_in_secs: default_h2_keepalive_interval(),
            http2_keep_alive_timeout_in_secs: default_h2_keepalive_timeout(),
            tcp_nodelay: default_tcp_nodelay(),
            log_dir: default_log_dir(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.concurrency_limit == 0 {
            return Err(Error::InvalidConfig("concurrency_limit must be > 0".into()));
        }

        if self.http2_keep_alive_timeout_in_secs == 0 {
            return Err(Error::InvalidConfig(
                "http2_keep_alive_timeout_in_secs must be > 0".into(),
            ));
        }

        if self.http2_keep_alive_timeout_in_secs >= self.http2_keep_alive_interval_in_secs.saturating_mul(10) {
            return Err(Error::InvalidConfig(format!(
                "http2 keep-alive timeout {}s is too long for interval {}s",
                self.http2_keep_alive_timeout_in_secs, self.http2_keep_alive_interval_in_secs
            )));
        }

        Ok(())
    }

    /// Parsed form of `listen_address`
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_address
            .parse()
            .map_err(|_| SystemError::InvalidAddress(self.listen_address.clone()).into())
    }
}

fn default_listen_address() -> String {
    "127.0.0.1:9081".to_string()
}
fn default_concurrency_limit() -> usize {
    1024
}
fn default_tcp_keepalive() -> u64 {
    60
}
fn default_h2_keepalive_interval() -> u64 {
    5
}
fn default_h2_keepalive_timeout() -> u64 {
    20
}
fn default_tcp_nodelay() -> bool {
    true
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}
