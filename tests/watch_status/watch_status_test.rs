use std::time::Duration;

use tokio::time::timeout;
use tonic::Code;
use workspace_watch::proto::WatchWorkspaceStatusRequest;
use workspace_watch::proto::WatchWorkspaceStatusResponse;
use workspace_watch::InstancePhase;

use crate::common::as_user;
use crate::common::instance;
use crate::common::wait_until;
use crate::common::workspace;
use crate::common::TestServer;
use crate::common::WAIT_FOR_STREAM_IN_SEC;

fn watch_request(workspace_id: &str) -> WatchWorkspaceStatusRequest {
    WatchWorkspaceStatusRequest {
        workspace_id: workspace_id.to_string(),
    }
}

async fn next_message(
    stream: &mut tonic::Streaming<WatchWorkspaceStatusResponse>
) -> Result<Option<WatchWorkspaceStatusResponse>, tonic::Status> {
    timeout(Duration::from_secs(WAIT_FOR_STREAM_IN_SEC), stream.message())
        .await
        .expect("stream stalled")
}

#[tokio::test]
async fn test_watch_single_workspace_snapshot_then_live() {
    crate::enable_logger();
    let server = TestServer::start(0).await;
    server.store.insert_workspace(workspace("w1", "alice"));
    server.store.insert_workspace(workspace("w2", "alice"));
    server
        .store
        .upsert_instance(instance("w1", InstancePhase::Pending, 0))
        .unwrap();
    let mut client = server.client().await;

    let mut stream = client
        .watch_workspace_status(as_user("alice", watch_request("w1")))
        .await
        .unwrap()
        .into_inner();

    let snapshot = next_message(&mut stream).await.unwrap().unwrap();
    assert_eq!(snapshot.status.unwrap().status_version, 0);

    // The live registration happens once the snapshot has been consumed.
    wait_until(|| server.hub.listener_count("alice") == 1).await;
    server.store.upsert_instance(instance("w1", InstancePhase::Creating, 1)).unwrap();
    server.store.upsert_instance(instance("w2", InstancePhase::Running, 2)).unwrap();
    server.store.upsert_instance(instance("w1", InstancePhase::Running, 3)).unwrap();

    let mut versions = Vec::new();
    for _ in 0..2 {
        let message = next_message(&mut stream).await.unwrap().unwrap();
        assert_eq!(message.workspace_id, "w1");
        versions.push(message.status.unwrap().status_version);
    }
    assert_eq!(versions, vec![1, 3]);

    drop(stream);
    wait_until(|| server.hub.listener_count("alice") == 0).await;
    server.shutdown.cancel();
}

#[tokio::test]
async fn test_broad_watch_sees_every_workspace_of_the_caller() {
    let server = TestServer::start(0).await;
    server.store.insert_workspace(workspace("w1", "alice"));
    server.store.insert_workspace(workspace("w2", "alice"));
    server.store.insert_workspace(workspace("w3", "bob"));
    let mut client = server.client().await;

    let mut stream = client
        .watch_workspace_status(as_user("alice", watch_request("")))
        .await
        .unwrap()
        .into_inner();
    wait_until(|| server.hub.listener_count("alice") == 1).await;

    server.store.upsert_instance(instance("w1", InstancePhase::Running, 1)).unwrap();
    server.store.upsert_instance(instance("w3", InstancePhase::Running, 2)).unwrap();
    server.store.upsert_instance(instance("w2", InstancePhase::Stopped, 3)).unwrap();

    let first = next_message(&mut stream).await.unwrap().unwrap();
    let second = next_message(&mut stream).await.unwrap().unwrap();
    assert_eq!(first.workspace_id, "w1");
    assert_eq!(second.workspace_id, "w2");

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_watch_of_foreign_workspace_fails_with_lookup_error() {
    let server = TestServer::start(0).await;
    server.store.insert_workspace(workspace("w1", "alice"));
    let mut client = server.client().await;

    let result = client
        .watch_workspace_status(as_user("bob", watch_request("w1")))
        .await;

    // The error is the stream's only element; depending on timing it is
    // reported as the call status or as the first message.
    let status = match result {
        Err(status) => status,
        Ok(response) => {
            let mut stream = response.into_inner();
            next_message(&mut stream).await.unwrap_err()
        }
    };
    assert_eq!(status.code(), Code::PermissionDenied);
    assert_eq!(server.hub.listener_count("bob"), 0);
    server.shutdown.cancel();
}

#[tokio::test]
async fn test_watch_limit_is_enforced() {
    let server = TestServer::start(1).await;
    let mut client = server.client().await;

    let _held = client
        .watch_workspace_status(as_user("alice", watch_request("")))
        .await
        .unwrap()
        .into_inner();

    let status = client
        .watch_workspace_status(as_user("alice", watch_request("")))
        .await
        .err()
        .expect("second watch must be rejected");
    assert_eq!(status.code(), Code::ResourceExhausted);
    server.shutdown.cancel();
}

#[tokio::test]
async fn test_server_shutdown_ends_open_watches_cleanly() {
    let server = TestServer::start(0).await;
    let mut client = server.client().await;

    let mut stream = client
        .watch_workspace_status(as_user("alice", watch_request("")))
        .await
        .unwrap()
        .into_inner();
    wait_until(|| server.hub.listener_count("alice") == 1).await;

    server.shutdown.cancel();

    assert!(next_message(&mut stream).await.unwrap().is_none());
    wait_until(|| server.hub.listener_count("alice") == 0).await;
    let served = timeout(Duration::from_secs(WAIT_FOR_STREAM_IN_SEC), server.handle)
        .await
        .expect("server stops after shutdown")
        .unwrap();
    assert!(served.is_ok());
}
