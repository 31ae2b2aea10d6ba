//! Snapshot-plus-live watch sequence.
//!
//! # State machine (per watch call)
//!
//! ```text
//! INIT ──▶ (SNAPSHOT) ──▶ SUBSCRIBING ──▶ STREAMING ──▶ CLOSED | FAILED
//! ```
//!
//! The snapshot, when produced, is always the first element. An update that
//! lands between the snapshot lookup and the registration is delivered again
//! as a live element; no deduplication happens against the snapshot.

use std::sync::Arc;

use futures::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;

use super::EventSubscription;
use super::SnapshotLookup;
use super::SubscriptionDriver;
use crate::convert;
use crate::metrics::WATCH_ELEMENTS_DELIVERED;
use crate::metrics::WATCH_ENDED;
use crate::metrics::WATCH_UPDATES_DROPPED;
use crate::proto::WatchWorkspaceStatusResponse;
use crate::Result;
use crate::WorkspaceInstance;

/// Ordered, lazy, cancellable sequence of wire responses
pub type WatchStream = BoxStream<'static, Result<WatchWorkspaceStatusResponse>>;

/// Outcome of the filter/map stage for one raw update
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selection {
    Emit(WatchWorkspaceStatusResponse),
    OtherWorkspace,
    NoStatus,
}

impl Selection {
    fn reason(&self) -> &'static str {
        match self {
            Selection::Emit(_) => "emit",
            Selection::OtherWorkspace => "other_workspace",
            Selection::NoStatus => "no_status",
        }
    }
}

/// Filter/map stage: drop updates for other workspaces and updates without a
/// status, convert the rest.
pub(crate) fn select_update(
    requested: Option<&str>,
    instance: &WorkspaceInstance,
) -> Selection {
    if let Some(requested) = requested {
        if instance.workspace_id != requested {
            return Selection::OtherWorkspace;
        }
    }

    match convert::to_status(instance) {
        Some(status) => Selection::Emit(WatchWorkspaceStatusResponse {
            workspace_id: instance.workspace_id.clone(),
            status: Some(status),
        }),
        None => Selection::NoStatus,
    }
}

/// Composes the snapshot stage, the subscription driver and the filter/map
/// stage for one pair of collaborators.
pub struct WatchBridge<L, S> {
    lookup: Arc<L>,
    subscription: Arc<S>,
}

impl<L, S> Clone for WatchBridge<L, S> {
    fn clone(&self) -> Self {
        Self {
            lookup: self.lookup.clone(),
            subscription: self.subscription.clone(),
        }
    }
}

impl<L, S> WatchBridge<L, S>
where
    L: SnapshotLookup,
    S: EventSubscription,
{
    pub fn new(
        lookup: Arc<L>,
        subscription: Arc<S>,
    ) -> Self {
        Self {
            lookup,
            subscription,
        }
    }

    /// Opens a watch.
    ///
    /// Nothing happens until the returned stream is first polled. With a
    /// `workspace_id` the current status is looked up and emitted first; the
    /// live subscription is registered on the following poll. The stream
    /// ends cleanly when `token` fires and ends with the originating error on
    /// lookup, registration or source failure. Dropping the stream disposes
    /// the registration.
    pub fn watch(
        &self,
        workspace_id: Option<String>,
        token: CancellationToken,
    ) -> WatchStream {
        let state = WatchState {
            watch_id: nanoid::nanoid!(10),
            workspace_id,
            token,
            lookup: self.lookup.clone(),
            subscription: self.subscription.clone(),
            phase: WatchPhase::Init,
        };

        stream::unfold(state, |mut state| async move {
            let item = state.next_element().await?;
            Some((item, state))
        })
        .fuse()
        .boxed()
    }
}

enum WatchPhase {
    Init,
    Subscribing,
    Streaming(SubscriptionDriver),
    Finished,
}

struct WatchState<L, S> {
    watch_id: String,
    workspace_id: Option<String>,
    token: CancellationToken,
    lookup: Arc<L>,
    subscription: Arc<S>,
    phase: WatchPhase,
}

impl<L, S> WatchState<L, S>
where
    L: SnapshotLookup,
    S: EventSubscription,
{
    async fn next_element(&mut self) -> Option<Result<WatchWorkspaceStatusResponse>> {
        loop {
            // Finished stays in place if the caller drops us mid-await.
            match std::mem::replace(&mut self.phase, WatchPhase::Finished) {
                WatchPhase::Init => {
                    if self.token.is_cancelled() {
                        self.end("cancelled");
                        return None;
                    }

                    let Some(workspace_id) = self.workspace_id.clone() else {
                        self.phase = WatchPhase::Subscribing;
                        continue;
                    };

                    match self.snapshot(&workspace_id).await {
                        SnapshotOutcome::Emit(response) => {
                            self.phase = WatchPhase::Subscribing;
                            WATCH_ELEMENTS_DELIVERED.with_label_values(&["snapshot"]).inc();
                            return Some(Ok(response));
                        }
                        SnapshotOutcome::Skip => {
                            self.phase = WatchPhase::Subscribing;
                        }
                        SnapshotOutcome::Cancelled => {
                            self.end("cancelled");
                            return None;
                        }
                        SnapshotOutcome::Failed(e) => {
                            self.end("failed");
                            return Some(Err(e));
                        }
                    }
                }

                WatchPhase::Subscribing => {
                    let driver = SubscriptionDriver::start(
                        self.watch_id.clone(),
                        self.subscription.as_ref(),
                        self.token.clone(),
                    );
                    self.phase = WatchPhase::Streaming(driver);
                }

                WatchPhase::Streaming(mut driver) => match driver.next().await {
                    Some(Ok(instance)) => {
                        let selection = select_update(self.workspace_id.as_deref(), &instance);
                        self.phase = WatchPhase::Streaming(driver);
                        match selection {
                            Selection::Emit(response) => {
                                WATCH_ELEMENTS_DELIVERED.with_label_values(&["live"]).inc();
                                return Some(Ok(response));
                            }
                            dropped => {
                                trace!(
                                    watch_id = %self.watch_id,
                                    workspace_id = %instance.workspace_id,
                                    reason = dropped.reason(),
                                    "Update dropped"
                                );
                                WATCH_UPDATES_DROPPED.with_label_values(&[dropped.reason()]).inc();
                            }
                        }
                    }
                    Some(Err(e)) => {
                        self.end("failed");
                        return Some(Err(e));
                    }
                    None => {
                        self.end("cancelled");
                        return None;
                    }
                },

                WatchPhase::Finished => return None,
            }
        }
    }

    async fn snapshot(
        &self,
        workspace_id: &str,
    ) -> SnapshotOutcome {
        let lookup = tokio::select! {
            biased;
            _ = self.token.cancelled() => return SnapshotOutcome::Cancelled,
            lookup = self.lookup.lookup(workspace_id) => lookup,
        };

        match lookup {
            Ok(Some(instance)) => match convert::to_status(&instance) {
                Some(status) => {
                    debug!(watch_id = %self.watch_id, workspace_id, "Emitting snapshot");
                    SnapshotOutcome::Emit(WatchWorkspaceStatusResponse {
                        workspace_id: instance.workspace_id,
                        status: Some(status),
                    })
                }
                None => {
                    debug!(watch_id = %self.watch_id, workspace_id, "Snapshot has no status yet");
                    SnapshotOutcome::Skip
                }
            },
            Ok(None) => {
                debug!(watch_id = %self.watch_id, workspace_id, "No current instance for snapshot");
                SnapshotOutcome::Skip
            }
            Err(e) => {
                debug!(watch_id = %self.watch_id, workspace_id, error = %e, "Snapshot lookup failed");
                SnapshotOutcome::Failed(e)
            }
        }
    }

    fn end(
        &mut self,
        outcome: &'static str,
    ) {
        self.phase = WatchPhase::Finished;
        WATCH_ENDED.with_label_values(&[outcome]).inc();
        debug!(watch_id = %self.watch_id, outcome, "Watch ended");
    }
}

enum SnapshotOutcome {
    Emit(WatchWorkspaceStatusResponse),
    Skip,
    Cancelled,
    Failed(crate::Error),
}
