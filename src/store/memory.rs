use dashmap::DashMap;
use tonic::async_trait;
use tracing::debug;

use super::WorkspaceInfo;
use super::WorkspaceInstance;
use super::WorkspacePage;
use super::WorkspaceQuery;
use super::WorkspaceStore;
use crate::InstanceUpdateHub;
use crate::Result;
use crate::StoreError;

/// `WorkspaceStore` kept in memory.
///
/// Instance writes go through [`upsert_instance`](Self::upsert_instance),
/// which publishes the new instance to the owner's listeners.
#[derive(Debug)]
pub struct InMemoryWorkspaceStore {
    workspaces: DashMap<String, WorkspaceInfo>,
    hub: InstanceUpdateHub,
}

impl InMemoryWorkspaceStore {
    pub fn new(hub: InstanceUpdateHub) -> Self {
        Self {
            workspaces: DashMap::new(),
            hub,
        }
    }

    pub fn insert_workspace(
        &self,
        info: WorkspaceInfo,
    ) {
        self.workspaces.insert(info.id.clone(), info);
    }

    /// Records `instance` as the workspace's current instance and publishes it.
    ///
    /// Returns the number of watch calls that received the update.
    pub fn upsert_instance(
        &self,
        instance: WorkspaceInstance,
    ) -> Result<usize> {
        let owner_id = {
            let mut entry = self
                .workspaces
                .get_mut(&instance.workspace_id)
                .ok_or_else(|| StoreError::NotFound(instance.workspace_id.clone()))?;
            entry.latest_instance = Some(instance.clone());
            entry.owner_id.clone()
        };

        debug!(
            workspace_id = %instance.workspace_id,
            instance_id = %instance.id,
            phase = ?instance.status.phase,
            "Instance updated"
        );
        Ok(self.hub.publish(&owner_id, instance))
    }

    pub fn hub(&self) -> &InstanceUpdateHub {
        &self.hub
    }

    fn visible(
        &self,
        user_id: &str,
        workspace_id: &str,
    ) -> Result<WorkspaceInfo> {
        let info = self
            .workspaces
            .get(workspace_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(workspace_id.to_string()))?;

        if info.owner_id != user_id {
            return Err(StoreError::PermissionDenied(workspace_id.to_string()).into());
        }
        Ok(info)
    }
}

#[async_trait]
impl WorkspaceStore for InMemoryWorkspaceStore {
    async fn get_workspace(
        &self,
        user_id: &str,
        workspace_id: &str,
    ) -> Result<WorkspaceInfo> {
        self.visible(user_id, workspace_id)
    }

    async fn get_current_instance(
        &self,
        user_id: &str,
        workspace_id: &str,
    ) -> Result<Option<WorkspaceInstance>> {
        Ok(self.visible(user_id, workspace_id)?.latest_instance)
    }

    async fn list_workspaces(
        &self,
        user_id: &str,
        query: &WorkspaceQuery,
    ) -> Result<WorkspacePage> {
        let mut matching: Vec<WorkspaceInfo> = self
            .workspaces
            .iter()
            .filter(|entry| entry.owner_id == user_id && query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));

        let total = matching.len();
        let rows = matching.into_iter().skip(query.offset).take(query.limit).collect();
        Ok(WorkspacePage { rows, total })
    }
}
