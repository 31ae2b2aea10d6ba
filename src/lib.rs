//! Workspace status watch service.
//!
//! Serves `workspace.v1.WorkspaceService` over gRPC. The interesting part is
//! [`watch`]: a bridge that turns a push-style "register a listener, get a
//! disposer" event source into an ordered, cancellable stream, optionally
//! prefixed with a snapshot of the current state.

mod client;
mod config;
mod constants;
mod errors;
pub mod metrics;
mod network;
pub mod proto;
mod store;
pub mod utils;
mod watch;

pub use client::*;
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use network::grpc::*;
pub use store::*;
pub use utils::*;
pub use watch::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;

//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;
const API_SLO: Objective = Objective::new("api")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms10, ObjectivePercentile::P99);
