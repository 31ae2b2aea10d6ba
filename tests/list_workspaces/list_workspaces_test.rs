use tonic::Code;
use workspace_watch::proto::list_workspaces_request::Scope;
use workspace_watch::proto::ListWorkspacesRequest;
use workspace_watch::proto::PaginationRequest;

use crate::common::as_user;
use crate::common::workspace;
use crate::common::TestServer;

#[tokio::test]
async fn test_list_workspaces_pages_the_callers_workspaces() {
    crate::enable_logger();
    let server = TestServer::start(0).await;
    for id in ["w1", "w2", "w3"] {
        server.store.insert_workspace(workspace(id, "alice"));
    }
    server.store.insert_workspace(workspace("w4", "bob"));
    let mut client = server.client().await;

    let response = client
        .list_workspaces(as_user(
            "alice",
            ListWorkspacesRequest {
                organization_id: "org-1".into(),
                scope: Scope::MyWorkspacesInOrganization as i32,
                pagination: Some(PaginationRequest { page_size: 2, page: 1 }),
                ..Default::default()
            },
        ))
        .await
        .unwrap()
        .into_inner();

    let ids: Vec<_> = response.workspaces.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["w3"]);
    assert_eq!(response.pagination.unwrap().total, 3);
    server.shutdown.cancel();
}

#[tokio::test]
async fn test_list_workspaces_without_organization_is_rejected() {
    let server = TestServer::start(0).await;
    let mut client = server.client().await;

    let status = client
        .list_workspaces(as_user("alice", ListWorkspacesRequest::default()))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "organization_id is required");
    server.shutdown.cancel();
}
