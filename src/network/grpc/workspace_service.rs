//! Server-side RPC handlers for `workspace.v1.WorkspaceService`.
//!
//! The handlers validate the call shape, then delegate: unary lookups go to
//! the [`WorkspaceStore`], watch calls run a [`WatchBridge`] over the store
//! (snapshot) and the caller's slice of the [`InstanceUpdateHub`] (live).

use std::pin::Pin;
use std::sync::Arc;

use autometrics::autometrics;
use futures::stream;
use futures::Stream;
use futures::StreamExt;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::sync::DropGuard;
use tonic::async_trait;
use tonic::Request;
use tonic::Response;
use tonic::Status;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::constants::USER_ID_METADATA_KEY;
use crate::convert;
use crate::metrics::ACTIVE_WATCHES;
use crate::proto::workspace_service_server::WorkspaceService;
use crate::proto::GetWorkspaceRequest;
use crate::proto::GetWorkspaceResponse;
use crate::proto::ListWorkspacesRequest;
use crate::proto::ListWorkspacesResponse;
use crate::proto::WatchWorkspaceStatusRequest;
use crate::proto::WatchWorkspaceStatusResponse;
use crate::Error;
use crate::InstanceUpdateHub;
use crate::Result;
use crate::SnapshotLookup;
use crate::WatchBridge;
use crate::WatchConfig;
use crate::WatchError;
use crate::WorkspaceInstance;
use crate::WorkspaceQuery;
use crate::WorkspaceStore;
use crate::API_SLO;

pub type WatchStatusStream =
    Pin<Box<dyn Stream<Item = std::result::Result<WatchWorkspaceStatusResponse, Status>> + Send>>;

pub struct WorkspaceServiceApi<S> {
    store: Arc<S>,
    hub: InstanceUpdateHub,
    /// Parent of every watch call's cancellation token
    shutdown: CancellationToken,
    watch_slots: Option<Arc<Semaphore>>,
    watch_limit: usize,
}

impl<S> WorkspaceServiceApi<S>
where
    S: WorkspaceStore,
{
    pub fn new(
        store: Arc<S>,
        hub: InstanceUpdateHub,
        config: &WatchConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let watch_limit = config.max_active_watches;
        Self {
            store,
            hub,
            shutdown,
            watch_slots: config.limit().map(|limit| Arc::new(Semaphore::new(limit))),
            watch_limit,
        }
    }

    #[autometrics(objective = API_SLO)]
    async fn fetch_workspace(
        &self,
        user_id: &str,
        workspace_id: &str,
    ) -> Result<GetWorkspaceResponse> {
        let info = self.store.get_workspace(user_id, workspace_id).await?;
        Ok(GetWorkspaceResponse {
            item: Some(convert::to_workspace(&info)),
        })
    }

    #[autometrics(objective = API_SLO)]
    async fn fetch_workspaces(
        &self,
        user_id: &str,
        query: &WorkspaceQuery,
    ) -> Result<ListWorkspacesResponse> {
        let page = self.store.list_workspaces(user_id, query).await?;
        debug!(user_id, total = page.total, returned = page.rows.len(), "Listed workspaces");
        Ok(convert::to_list_response(&page.rows, page.total))
    }

    #[autometrics(objective = API_SLO)]
    fn open_watch(
        &self,
        user_id: String,
        request: WatchWorkspaceStatusRequest,
    ) -> Result<WatchStatusStream> {
        let permit = self.acquire_watch_slot()?;
        let workspace_id = request.scope().map(str::to_string);
        let token = self.shutdown.child_token();

        info!(user_id = %user_id, workspace_id = ?workspace_id, "Opening workspace status watch");

        let bridge = WatchBridge::new(
            Arc::new(StoreLookup {
                store: self.store.clone(),
                user_id: user_id.clone(),
            }),
            Arc::new(self.hub.for_user(user_id)),
        );
        let watch = bridge.watch(workspace_id, token.clone());
        let call = WatchCall::new(permit, token);

        let stream = stream::unfold((watch, call), |(mut watch, call)| async move {
            let item = watch.next().await?;
            Some((item.map_err(Status::from), (watch, call)))
        });
        let stream: WatchStatusStream = Box::pin(stream);
        Ok(stream)
    }

    fn acquire_watch_slot(&self) -> Result<Option<OwnedSemaphorePermit>> {
        let Some(slots) = &self.watch_slots else {
            return Ok(None);
        };

        slots.clone().try_acquire_owned().map(Some).map_err(|_| {
            warn!(limit = self.watch_limit, "Rejecting watch: too many active watches");
            Error::from(WatchError::LimitExceeded {
                limit: self.watch_limit,
            })
        })
    }
}

#[async_trait]
impl<S> WorkspaceService for WorkspaceServiceApi<S>
where
    S: WorkspaceStore,
{
    type WatchWorkspaceStatusStream = WatchStatusStream;

    async fn get_workspace(
        &self,
        request: Request<GetWorkspaceRequest>,
    ) -> std::result::Result<Response<GetWorkspaceResponse>, Status> {
        let user_id = caller_id(&request)?;
        let req = request.into_inner();
        if req.id.is_empty() {
            return Err(Error::invalid_argument("id is required").into());
        }

        let response = self.fetch_workspace(&user_id, &req.id).await?;
        Ok(Response::new(response))
    }

    async fn list_workspaces(
        &self,
        request: Request<ListWorkspacesRequest>,
    ) -> std::result::Result<Response<ListWorkspacesResponse>, Status> {
        let user_id = caller_id(&request)?;
        let query = WorkspaceQuery::try_from(request.get_ref())?;

        let response = self.fetch_workspaces(&user_id, &query).await?;
        Ok(Response::new(response))
    }

    /// Streams status changes of one workspace (`workspace_id` set) or of all
    /// of the caller's workspaces.
    ///
    /// The stream ends cleanly on server shutdown and is torn down when the
    /// client disconnects.
    async fn watch_workspace_status(
        &self,
        request: Request<WatchWorkspaceStatusRequest>,
    ) -> std::result::Result<Response<Self::WatchWorkspaceStatusStream>, Status> {
        let user_id = caller_id(&request)?;
        let stream = self.open_watch(user_id, request.into_inner())?;
        Ok(Response::new(stream))
    }
}

/// Resources held for the lifetime of one streaming call.
///
/// Dropping it (stream finished or client gone) cancels the call's token and
/// frees its watch slot.
struct WatchCall {
    _permit: Option<OwnedSemaphorePermit>,
    _cancel_on_drop: DropGuard,
}

impl WatchCall {
    fn new(
        permit: Option<OwnedSemaphorePermit>,
        token: CancellationToken,
    ) -> Self {
        ACTIVE_WATCHES.inc();
        Self {
            _permit: permit,
            _cancel_on_drop: token.drop_guard(),
        }
    }
}

impl Drop for WatchCall {
    fn drop(&mut self) {
        ACTIVE_WATCHES.dec();
        debug!("Workspace status watch released");
    }
}

struct StoreLookup<S> {
    store: Arc<S>,
    user_id: String,
}

#[async_trait]
impl<S> SnapshotLookup for StoreLookup<S>
where
    S: WorkspaceStore,
{
    async fn lookup(
        &self,
        workspace_id: &str,
    ) -> Result<Option<WorkspaceInstance>> {
        self.store.get_current_instance(&self.user_id, workspace_id).await
    }
}

/// Calling user, taken from the `x-user-id` metadata entry
fn caller_id<T>(request: &Request<T>) -> Result<String> {
    request
        .metadata()
        .get(USER_ID_METADATA_KEY)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_argument("user id is required"))
}
