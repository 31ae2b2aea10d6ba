use std::sync::Arc;

use tonic::async_trait;

use super::BackendConnection;
use crate::Disposer;
use crate::InMemoryWorkspaceStore;
use crate::Result;
use crate::UpdateSink;
use crate::WorkspaceInfo;
use crate::WorkspaceQuery;
use crate::WorkspaceStore;

/// In-process [`BackendConnection`] for one user, backed directly by an
/// [`InMemoryWorkspaceStore`] and its update hub.
#[derive(Debug, Clone)]
pub struct EmbeddedBackend {
    user_id: String,
    store: Arc<InMemoryWorkspaceStore>,
}

impl EmbeddedBackend {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<InMemoryWorkspaceStore>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            store,
        }
    }
}

#[async_trait]
impl BackendConnection for EmbeddedBackend {
    async fn get_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<WorkspaceInfo> {
        self.store.get_workspace(&self.user_id, workspace_id).await
    }

    async fn get_workspaces(
        &self,
        query: &WorkspaceQuery,
    ) -> Result<Vec<WorkspaceInfo>> {
        Ok(self.store.list_workspaces(&self.user_id, query).await?.rows)
    }

    fn register_client(
        &self,
        sink: UpdateSink,
    ) -> Result<Disposer> {
        Ok(self.store.hub().subscribe(&self.user_id, sink))
    }
}
