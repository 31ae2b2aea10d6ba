//! Generates the `workspace.v1.WorkspaceService` gRPC server and client.
//!
//! Messages are declared by hand with `prost` derives in `src/proto/mod.rs`,
//! so only the service plumbing is generated here and no `protoc` is needed.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let get_workspace = tonic_build::manual::Method::builder()
        .name("get_workspace")
        .route_name("GetWorkspace")
        .input_type("crate::proto::GetWorkspaceRequest")
        .output_type("crate::proto::GetWorkspaceResponse")
        .codec_path("tonic::codec::ProstCodec")
        .build();

    let list_workspaces = tonic_build::manual::Method::builder()
        .name("list_workspaces")
        .route_name("ListWorkspaces")
        .input_type("crate::proto::ListWorkspacesRequest")
        .output_type("crate::proto::ListWorkspacesResponse")
        .codec_path("tonic::codec::ProstCodec")
        .build();

    let watch_workspace_status = tonic_build::manual::Method::builder()
        .name("watch_workspace_status")
        .route_name("WatchWorkspaceStatus")
        .input_type("crate::proto::WatchWorkspaceStatusRequest")
        .output_type("crate::proto::WatchWorkspaceStatusResponse")
        .codec_path("tonic::codec::ProstCodec")
        .server_streaming()
        .build();

    let workspace_service = tonic_build::manual::Service::builder()
        .name("WorkspaceService")
        .package("workspace.v1")
        .method(get_workspace)
        .method(list_workspaces)
        .method(watch_workspace_status)
        .build();

    tonic_build::manual::Builder::new().compile(&[workspace_service]);

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
