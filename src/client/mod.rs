//! Client-side call site of the watch bridge.
//!
//! [`WorkspaceClient`] exposes the same operations as the RPC service but
//! talks to a [`BackendConnection`] (a signed-in backend session) instead of
//! the store and hub directly.

mod embedded;
mod workspace_client;

pub use embedded::*;
pub use workspace_client::*;
