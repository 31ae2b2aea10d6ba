//! Persistence/query layer seen by the RPC facade.
//!
//! The facade needs two point-in-time lookups and one filtered listing;
//! everything else about storage is behind the [`WorkspaceStore`] trait.

mod memory;
mod query;
pub use memory::*;
pub use query::*;


#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;
use tonic::async_trait;

use crate::Result;

/// Instance lifecycle phase as recorded by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InstancePhase {
    /// Recorded before the instance reports any status
    #[default]
    Unknown,
    Preparing,
    Building,
    Pending,
    Creating,
    Initializing,
    Running,
    Interrupted,
    Stopping,
    Stopped,
}

/// Status fragment of a workspace instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InstanceStatus {
    pub phase: InstancePhase,
    pub version: u64,
    pub message: Option<String>,
    pub url: Option<String>,
    pub failed: Option<String>,
    pub timeout: Option<String>,
}

/// Raw update record delivered by the event source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInstance {
    pub id: String,
    pub workspace_id: String,
    pub status: InstanceStatus,
}

/// Workspace record together with its most recent instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: String,
    pub owner_id: String,
    pub organization_id: String,
    pub context_url: String,
    pub pinned: bool,
    pub latest_instance: Option<WorkspaceInstance>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkspaceStore: Send + Sync + 'static {
    /// Fetches a workspace visible to `user_id`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when the workspace does not exist
    /// - `StoreError::PermissionDenied` when it belongs to another user
    async fn get_workspace(
        &self,
        user_id: &str,
        workspace_id: &str,
    ) -> Result<WorkspaceInfo>;

    /// Fetches the current instance of a workspace visible to `user_id`.
    ///
    /// `Ok(None)` means the workspace exists but has never been started.
    async fn get_current_instance(
        &self,
        user_id: &str,
        workspace_id: &str,
    ) -> Result<Option<WorkspaceInstance>>;

    /// Lists `user_id`'s workspaces matching `query`, one page at a time.
    async fn list_workspaces(
        &self,
        user_id: &str,
        query: &WorkspaceQuery,
    ) -> Result<WorkspacePage>;
}
