//! Record-to-wire conversion.
//!
//! Pure functions; an instance whose phase is still unknown carries no
//! actionable status and converts to `None`.

use crate::proto::ListWorkspacesResponse;
use crate::proto::PaginationResponse;
use crate::proto::Workspace;
use crate::proto::WorkspaceConditions;
use crate::proto::WorkspacePhase;
use crate::proto::WorkspaceStatus;
use crate::InstancePhase;
use crate::WorkspaceInfo;
use crate::WorkspaceInstance;

pub fn to_phase(phase: InstancePhase) -> WorkspacePhase {
    match phase {
        InstancePhase::Unknown => WorkspacePhase::Unspecified,
        InstancePhase::Preparing => WorkspacePhase::Preparing,
        InstancePhase::Building => WorkspacePhase::ImageBuild,
        InstancePhase::Pending => WorkspacePhase::Pending,
        InstancePhase::Creating => WorkspacePhase::Creating,
        InstancePhase::Initializing => WorkspacePhase::Initializing,
        InstancePhase::Running => WorkspacePhase::Running,
        InstancePhase::Interrupted => WorkspacePhase::Interrupted,
        InstancePhase::Stopping => WorkspacePhase::Stopping,
        InstancePhase::Stopped => WorkspacePhase::Stopped,
    }
}

/// Wire status of `instance`, `None` when it has none yet
pub fn to_status(instance: &WorkspaceInstance) -> Option<WorkspaceStatus> {
    let status = &instance.status;
    let phase = to_phase(status.phase);
    if phase == WorkspacePhase::Unspecified {
        return None;
    }

    let conditions = (status.failed.is_some() || status.timeout.is_some()).then(|| WorkspaceConditions {
        failed: status.failed.clone().unwrap_or_default(),
        timeout: status.timeout.clone().unwrap_or_default(),
    });

    Some(WorkspaceStatus {
        phase: phase as i32,
        instance_id: instance.id.clone(),
        message: status.message.clone().unwrap_or_default(),
        workspace_url: status.url.clone().unwrap_or_default(),
        conditions,
        status_version: status.version,
    })
}

pub fn to_workspace(info: &WorkspaceInfo) -> Workspace {
    Workspace {
        id: info.id.clone(),
        organization_id: info.organization_id.clone(),
        context_url: info.context_url.clone(),
        pinned: info.pinned,
        status: info.latest_instance.as_ref().and_then(to_status),
    }
}

/// Listing response for `rows`, reporting `total` matching rows
pub fn to_list_response(
    rows: &[WorkspaceInfo],
    total: usize,
) -> ListWorkspacesResponse {
    ListWorkspacesResponse {
        pagination: Some(PaginationResponse {
            total: i32::try_from(total).unwrap_or(i32::MAX),
        }),
        workspaces: rows.iter().map(to_workspace).collect(),
    }
}
