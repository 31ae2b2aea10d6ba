use std::time::Duration;

use futures::Stream;
use futures::StreamExt;

use crate::InstancePhase;
use crate::InstanceStatus;
use crate::WorkspaceInfo;
use crate::WorkspaceInstance;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Instance of `workspace_id` in `phase`, instance id derived from the workspace
pub fn instance(
    workspace_id: &str,
    phase: InstancePhase,
) -> WorkspaceInstance {
    WorkspaceInstance {
        id: format!("{workspace_id}-i1"),
        workspace_id: workspace_id.to_string(),
        status: InstanceStatus {
            phase,
            ..Default::default()
        },
    }
}

/// Same as [`instance`] but tagged with a status version, handy for telling
/// otherwise identical updates apart
pub fn versioned(
    workspace_id: &str,
    phase: InstancePhase,
    version: u64,
) -> WorkspaceInstance {
    let mut instance = instance(workspace_id, phase);
    instance.status.version = version;
    instance
}

/// Workspace `id` owned by `owner_id`, never started
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

/// Next stream item, panicking if none arrives within a second
pub async fn next_within<S>(stream: &mut S) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("stream stalled")
}

/// Asserts that the stream yields nothing for a short while
pub async fn assert_pending<S>(stream: &mut S)
where
    S: Stream + Unpin,
    S::Item: std::fmt::Debug,
{
    if let Ok(item) = tokio::time::timeout(Duration::from_millis(50), stream.next()).await {
        panic!("expected no element, got {item:?}");
    }
}

/// Polls `condition` until it holds, panicking after a second
pub async fn eventually(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
