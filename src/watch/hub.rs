//! In-process event source for workspace-instance updates.
//!
//! Listeners are grouped by the owning user. Publishing never blocks: every
//! listener is an [`UpdateSink`] whose push is a buffered enqueue.
//!
//! # Architecture
//!
//! ```text
//! store.upsert_instance() ─▶ hub.publish(owner) ─▶ sink.push() ─▶ watch call A
//!                                                └▶ sink.push() ─▶ watch call B
//! ```

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use super::Disposer;
use super::EventSubscription;
use super::UpdateSink;
use crate::Result;
use crate::WatchError;
use crate::WorkspaceInstance;

struct Listener {
    id: u64,
    sink: UpdateSink,
}

#[derive(Default)]
struct HubInner {
    listeners: DashMap<String, Vec<Listener>>,
    next_id: AtomicU64,
}

/// Registry of update listeners keyed by user id
#[derive(Clone, Default)]
pub struct InstanceUpdateHub {
    inner: Arc<HubInner>,
}

impl std::fmt::Debug for InstanceUpdateHub {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("InstanceUpdateHub")
            .field("users", &self.inner.listeners.len())
            .finish_non_exhaustive()
    }
}

impl InstanceUpdateHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sink` for updates of `user_id`'s workspaces.
    ///
    /// The returned disposer removes this registration only; registrations
    /// of the same user are independent of each other.
    pub fn subscribe(
        &self,
        user_id: &str,
        sink: UpdateSink,
    ) -> Disposer {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .entry(user_id.to_string())
            .or_default()
            .push(Listener { id, sink });

        trace!(listener_id = id, user_id, "Listener registered");

        let inner = self.inner.clone();
        let user_id = user_id.to_string();
        Disposer::new(move || {
            // Atomic check-and-remove so a concurrent registration for the
            // same user is never dropped with the emptied entry.
            inner.listeners.remove_if_mut(&user_id, |_, listeners| {
                listeners.retain(|l| l.id != id);
                listeners.is_empty()
            });
            trace!(listener_id = id, user_id = %user_id, "Listener unregistered");
        })
    }

    /// Delivers `instance` to every listener of `user_id`.
    ///
    /// Returns how many listeners accepted it.
    pub fn publish(
        &self,
        user_id: &str,
        instance: WorkspaceInstance,
    ) -> usize {
        let Some(listeners) = self.inner.listeners.get(user_id) else {
            return 0;
        };

        let delivered = listeners
            .iter()
            .filter(|l| l.sink.push(instance.clone()))
            .count();

        trace!(
            user_id,
            workspace_id = %instance.workspace_id,
            listeners = listeners.len(),
            delivered,
            "Instance update published"
        );
        delivered
    }

    /// Fails every open watch of `user_id`, e.g. when the upstream feed for
    /// that user is lost. Registrations stay until their watches dispose them.
    pub fn fail_user(
        &self,
        user_id: &str,
        reason: &str,
    ) -> usize {
        let Some(listeners) = self.inner.listeners.get(user_id) else {
            return 0;
        };

        listeners
            .iter()
            .filter(|l| l.sink.fail(WatchError::Source(reason.to_string()).into()))
            .count()
    }

    /// Number of live registrations for `user_id`
    pub fn listener_count(
        &self,
        user_id: &str,
    ) -> usize {
        self.inner.listeners.get(user_id).map(|l| l.len()).unwrap_or(0)
    }

    /// Number of users with at least one registration
    pub fn watched_user_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Event subscription view restricted to one user's updates
    pub fn for_user(
        &self,
        user_id: impl Into<String>,
    ) -> UserInstanceSubscription {
        UserInstanceSubscription {
            hub: self.clone(),
            user_id: user_id.into(),
        }
    }
}

/// [`EventSubscription`] over one user's updates in an [`InstanceUpdateHub`]
#[derive(Debug, Clone)]
pub struct UserInstanceSubscription {
    hub: InstanceUpdateHub,
    user_id: String,
}

impl EventSubscription for UserInstanceSubscription {
    fn subscribe(
        &self,
        sink: UpdateSink,
    ) -> Result<Disposer> {
        Ok(self.hub.subscribe(&self.user_id, sink))
    }
}
