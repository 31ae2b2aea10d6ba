use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tonic::Request;
use workspace_watch::proto::workspace_service_client::WorkspaceServiceClient;
use workspace_watch::serve_with_listener;
use workspace_watch::InMemoryWorkspaceStore;
use workspace_watch::InstancePhase;
use workspace_watch::InstanceStatus;
use workspace_watch::InstanceUpdateHub;
use workspace_watch::ServerConfig;
use workspace_watch::WatchConfig;
use workspace_watch::WorkspaceInfo;
use workspace_watch::WorkspaceInstance;
use workspace_watch::WorkspaceServiceApi;
use workspace_watch::USER_ID_METADATA_KEY;

pub const WAIT_FOR_STREAM_IN_SEC: u64 = 3;

/// A running server on an ephemeral port plus handles to its backing state
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<InMemoryWorkspaceStore>,
    pub hub: InstanceUpdateHub,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<workspace_watch::Result<()>>,
}

impl TestServer {
    pub async fn start(max_active_watches: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let hub = InstanceUpdateHub::new();
        let store = Arc::new(InMemoryWorkspaceStore::new(hub.clone()));
        let shutdown = CancellationToken::new();
        let service = WorkspaceServiceApi::new(
            store.clone(),
            hub.clone(),
            &WatchConfig { max_active_watches },
            shutdown.clone(),
        );

        let server_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            serve_with_listener(service, &ServerConfig::default(), listener, server_shutdown).await
        });

        Self {
            addr,
            store,
            hub,
            shutdown,
            handle,
        }
    }

    pub async fn client(&self) -> WorkspaceServiceClient<Channel> {
        WorkspaceServiceClient::connect(format!("http://{}", self.addr))
            .await
            .expect("connect to test server")
    }
}

pub fn as_user<T>(
    user_id: &str,
    message: T,
) -> Request<T> {
    let mut request = Request::new(message);
    request
        .metadata_mut()
        .insert(USER_ID_METADATA_KEY, user_id.parse().unwrap());
    request
}

pub fn workspace(
    id: &str,
    owner_id: &str,
) -> WorkspaceInfo {
    WorkspaceInfo {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        organization_id: "org-1".to_string(),
        context_url: format!("https://github.com/example/{id}"),
        pinned: false,
        latest_instance: None,
    }
}

pub fn instance(
    workspace_id: &str,
    phase: InstancePhase,
    version: u64,
) -> WorkspaceInstance {
    WorkspaceInstance {
        id: format!("{workspace_id}-i1"),
        workspace_id: workspace_id.to_string(),
        status: InstanceStatus {
            phase,
            version,
            ..Default::default()
        },
    }
}

/// Waits until `condition` holds, panicking after a few seconds
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(WAIT_FOR_STREAM_IN_SEC);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
