//! Wire messages and generated gRPC plumbing for `workspace.v1.WorkspaceService`.
//!
//! Messages are declared with `prost` derives; the server and client modules
//! (`workspace_service_server`, `workspace_service_client`) are generated by
//! `build.rs` through `tonic_build::manual`.

include!(concat!(env!("OUT_DIR"), "/workspace.v1.WorkspaceService.rs"));

/// Lifecycle phase of the workspace's current instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum WorkspacePhase {
    Unspecified = 0,
    Preparing = 1,
    ImageBuild = 2,
    Pending = 3,
    Creating = 4,
    Initializing = 5,
    Running = 6,
    Interrupted = 7,
    Stopping = 8,
    Stopped = 9,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkspaceConditions {
    /// Reason the instance failed, empty when healthy
    #[prost(string, tag = "1")]
    pub failed: ::prost::alloc::string::String,
    /// Reason the instance timed out, empty when it did not
    #[prost(string, tag = "2")]
    pub timeout: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkspaceStatus {
    #[prost(enumeration = "WorkspacePhase", tag = "1")]
    pub phase: i32,
    #[prost(string, tag = "2")]
    pub instance_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub message: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub workspace_url: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "5")]
    pub conditions: ::core::option::Option<WorkspaceConditions>,
    /// Monotonic per-instance version of this status
    #[prost(uint64, tag = "6")]
    pub status_version: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Workspace {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub organization_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub context_url: ::prost::alloc::string::String,
    #[prost(bool, tag = "4")]
    pub pinned: bool,
    #[prost(message, optional, tag = "5")]
    pub status: ::core::option::Option<WorkspaceStatus>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetWorkspaceRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetWorkspaceResponse {
    #[prost(message, optional, tag = "1")]
    pub item: ::core::option::Option<Workspace>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PaginationRequest {
    /// Maximum rows per page; non-positive means the server default
    #[prost(int32, tag = "1")]
    pub page_size: i32,
    /// Zero-based page index
    #[prost(int32, tag = "2")]
    pub page: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PaginationResponse {
    /// Rows matching the query across all pages
    #[prost(int32, tag = "1")]
    pub total: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListWorkspacesRequest {
    #[prost(message, optional, tag = "1")]
    pub pagination: ::core::option::Option<PaginationRequest>,
    #[prost(string, tag = "3")]
    pub organization_id: ::prost::alloc::string::String,
    /// Case-insensitive match against the context URL
    #[prost(string, tag = "4")]
    pub search_term: ::prost::alloc::string::String,
    /// `Some(true)` restricts the listing to pinned workspaces
    #[prost(bool, optional, tag = "5")]
    pub pinned: ::core::option::Option<bool>,
    #[prost(enumeration = "list_workspaces_request::Scope", tag = "6")]
    pub scope: i32,
}

pub mod list_workspaces_request {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Scope {
        /// Treated as `MyWorkspacesInOrganization`
        Unspecified = 0,
        MyWorkspacesInOrganization = 1,
        AllWorkspacesInOrganization = 2,
        AllWorkspacesInInstallation = 3,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListWorkspacesResponse {
    #[prost(message, optional, tag = "1")]
    pub pagination: ::core::option::Option<PaginationResponse>,
    #[prost(message, repeated, tag = "2")]
    pub workspaces: ::prost::alloc::vec::Vec<Workspace>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WatchWorkspaceStatusRequest {
    /// Workspace to watch; empty watches every workspace of the caller
    #[prost(string, tag = "1")]
    pub workspace_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WatchWorkspaceStatusResponse {
    #[prost(string, tag = "1")]
    pub workspace_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub status: ::core::option::Option<WorkspaceStatus>,
}

impl WatchWorkspaceStatusRequest {
    /// The requested workspace id, `None` for a broad watch
    pub fn scope(&self) -> Option<&str> {
        (!self.workspace_id.is_empty()).then_some(self.workspace_id.as_str())
    }
}
