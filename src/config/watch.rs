use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Result;

/// Limits applied to streaming watch calls
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Ceiling on concurrently open watch calls across all users
    ///
    /// Each open call holds one event-source registration and one unbounded
    /// queue. Calls above the ceiling are rejected before any lookup or
    /// subscription happens.
    ///
    /// **Default**: 10000, `0` disables the ceiling
    #[serde(default = "default_max_active_watches")]
    pub max_active_watches: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            max_active_watches: default_max_active_watches(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_active_watches == 0 {
            warn!("watch.max_active_watches is 0: concurrent watch calls are unbounded");
        }
        Ok(())
    }

    /// Returns the ceiling, `None` when unbounded
    pub fn limit(&self) -> Option<usize> {
        (self.max_active_watches > 0).then_some(self.max_active_watches)
    }
}

fn default_max_active_watches() -> usize {
    10_000
}
