use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;
use tonic::async_trait;
use tracing::debug;

use crate::convert;
use crate::proto::GetWorkspaceRequest;
use crate::proto::GetWorkspaceResponse;
use crate::proto::ListWorkspacesRequest;
use crate::proto::ListWorkspacesResponse;
use crate::proto::WatchWorkspaceStatusRequest;
use crate::Disposer;
use crate::Error;
use crate::EventSubscription;
use crate::Result;
use crate::SnapshotLookup;
use crate::UpdateSink;
use crate::WatchBridge;
use crate::WatchStream;
use crate::WorkspaceInfo;
use crate::WorkspaceInstance;
use crate::WorkspaceQuery;

/// Session with the workspace backend on behalf of one signed-in user
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BackendConnection: Send + Sync + 'static {
    async fn get_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<WorkspaceInfo>;

    /// The session user's workspaces matching `query`, already paged
    async fn get_workspaces(
        &self,
        query: &WorkspaceQuery,
    ) -> Result<Vec<WorkspaceInfo>>;

    /// Registers `sink` for instance updates of the session's workspaces
    fn register_client(
        &self,
        sink: UpdateSink,
    ) -> Result<Disposer>;
}

/// Client-side facade mirroring the RPC surface over a [`BackendConnection`]
pub struct WorkspaceClient<C> {
    connection: Arc<C>,
}

impl<C> Clone for WorkspaceClient<C> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
        }
    }
}

impl<C> WorkspaceClient<C>
where
    C: BackendConnection,
{
    pub fn new(connection: Arc<C>) -> Self {
        Self { connection }
    }

    pub async fn get_workspace(
        &self,
        request: GetWorkspaceRequest,
    ) -> Result<GetWorkspaceResponse> {
        if request.id.is_empty() {
            return Err(Error::invalid_argument("id is required"));
        }

        let info = self.connection.get_workspace(&request.id).await?;
        Ok(GetWorkspaceResponse {
            item: Some(convert::to_workspace(&info)),
        })
    }

    /// Lists one page of the session user's workspaces.
    ///
    /// The reported total is the size of the returned page.
    pub async fn list_workspaces(
        &self,
        request: ListWorkspacesRequest,
    ) -> Result<ListWorkspacesResponse> {
        let query = WorkspaceQuery::try_from(&request)?;

        let rows = self.connection.get_workspaces(&query).await?;
        Ok(convert::to_list_response(&rows, rows.len()))
    }

    /// Watches status changes; see [`WatchBridge::watch`].
    ///
    /// # Errors
    /// Fails immediately, before any lookup or registration, when no
    /// cancellation token is supplied.
    pub fn watch_workspace_status(
        &self,
        request: WatchWorkspaceStatusRequest,
        token: Option<CancellationToken>,
    ) -> Result<WatchStream> {
        let token = token.ok_or_else(|| Error::invalid_argument("signal is required"))?;
        let workspace_id = request.scope().map(str::to_string);

        debug!(workspace_id = ?workspace_id, "Watching workspace status through backend connection");

        let bridge = WatchBridge::new(
            Arc::new(ConnectionLookup {
                connection: self.connection.clone(),
            }),
            Arc::new(ConnectionSubscription {
                connection: self.connection.clone(),
            }),
        );
        Ok(bridge.watch(workspace_id, token))
    }
}

struct ConnectionLookup<C> {
    connection: Arc<C>,
}

#[async_trait]
impl<C> SnapshotLookup for ConnectionLookup<C>
where
    C: BackendConnection,
{
    async fn lookup(
        &self,
        workspace_id: &str,
    ) -> Result<Option<WorkspaceInstance>> {
        let info = self.connection.get_workspace(workspace_id).await?;
        Ok(info.latest_instance)
    }
}

struct ConnectionSubscription<C> {
    connection: Arc<C>,
}

impl<C> EventSubscription for ConnectionSubscription<C>
where
    C: BackendConnection,
{
    fn subscribe(
        &self,
        sink: UpdateSink,
    ) -> Result<Disposer> {
        self.connection.register_client(sink)
    }
}
