use tonic::Code;
use tonic::Request;
use workspace_watch::proto::GetWorkspaceRequest;
use workspace_watch::proto::WorkspacePhase;
use workspace_watch::InstancePhase;

use crate::common::as_user;
use crate::common::instance;
use crate::common::workspace;
use crate::common::TestServer;

#[tokio::test]
async fn test_get_workspace_over_the_wire() {
    crate::enable_logger();
    let server = TestServer::start(0).await;
    server.store.insert_workspace(workspace("w1", "alice"));
    server
        .store
        .upsert_instance(instance("w1", InstancePhase::Initializing, 2))
        .unwrap();
    let mut client = server.client().await;

    let item = client
        .get_workspace(as_user("alice", GetWorkspaceRequest { id: "w1".into() }))
        .await
        .unwrap()
        .into_inner()
        .item
        .unwrap();

    assert_eq!(item.id, "w1");
    assert_eq!(item.status.unwrap().phase(), WorkspacePhase::Initializing);
    server.shutdown.cancel();
}

#[tokio::test]
async fn test_get_workspace_rejections() {
    let server = TestServer::start(0).await;
    server.store.insert_workspace(workspace("w1", "alice"));
    let mut client = server.client().await;

    let anonymous = client
        .get_workspace(Request::new(GetWorkspaceRequest { id: "w1".into() }))
        .await
        .unwrap_err();
    assert_eq!(anonymous.code(), Code::InvalidArgument);

    let missing_id = client
        .get_workspace(as_user("alice", GetWorkspaceRequest::default()))
        .await
        .unwrap_err();
    assert_eq!(missing_id.code(), Code::InvalidArgument);

    let foreign = client
        .get_workspace(as_user("bob", GetWorkspaceRequest { id: "w1".into() }))
        .await
        .unwrap_err();
    assert_eq!(foreign.code(), Code::PermissionDenied);

    let unknown = client
        .get_workspace(as_user("alice", GetWorkspaceRequest { id: "w9".into() }))
        .await
        .unwrap_err();
    assert_eq!(unknown.code(), Code::NotFound);

    server.shutdown.cancel();
}
