//! Collaborator contracts consumed by the watch bridge.
//!
//! An [`EventSubscription`] is "register a listener, receive a disposer"; a
//! [`SnapshotLookup`] answers "what is the current instance of this
//! workspace". Both are implemented once per call site.

use std::fmt;

#[cfg(test)]
use mockall::automock;
use parking_lot::Mutex;
use tonic::async_trait;
use tracing::trace;

use super::QueueProducer;
use crate::Error;
use crate::Result;
use crate::WorkspaceInstance;

/// Listener handed to an event source on registration.
///
/// Forwards every update verbatim into the watch call's queue; never blocks.
#[derive(Clone)]
pub struct UpdateSink {
    producer: QueueProducer<WorkspaceInstance>,
}

impl UpdateSink {
    pub(crate) fn new(producer: QueueProducer<WorkspaceInstance>) -> Self {
        Self { producer }
    }

    /// Delivers one update. Returns `false` once the watch call has ended.
    pub fn push(
        &self,
        instance: WorkspaceInstance,
    ) -> bool {
        self.producer.push(instance)
    }

    /// Reports a terminal failure of the event source to the watch call.
    pub fn fail(
        &self,
        error: Error,
    ) -> bool {
        self.producer.fail(error)
    }
}

impl fmt::Debug for UpdateSink {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("UpdateSink")
            .field("status", &self.producer.status())
            .finish()
    }
}

/// Unregisters a previously registered listener when invoked
pub struct Disposer {
    dispose: Box<dyn FnOnce() + Send>,
}

impl Disposer {
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Box::new(dispose),
        }
    }

    pub(crate) fn dispose(self) {
        (self.dispose)()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str("Disposer")
    }
}

/// Push-based source of live workspace-instance updates
///
/// Must support many concurrent, independent registrations.
#[cfg_attr(test, automock)]
pub trait EventSubscription: Send + Sync + 'static {
    /// Registers `sink`; the returned disposer removes exactly this
    /// registration.
    ///
    /// # Errors
    /// Registration failures are terminal for the calling watch only.
    fn subscribe(
        &self,
        sink: UpdateSink,
    ) -> Result<Disposer>;
}

/// Point-in-time lookup backing the snapshot stage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotLookup: Send + Sync + 'static {
    /// Current instance of `workspace_id`, `None` if there is none yet
    async fn lookup(
        &self,
        workspace_id: &str,
    ) -> Result<Option<WorkspaceInstance>>;
}

/// Exclusive owner of one registration's disposer.
///
/// `dispose` runs the disposer at most once no matter how many teardown paths
/// race on it; dropping the handle disposes as well.
pub(crate) struct SubscriptionHandle {
    watch_id: String,
    disposer: Mutex<Option<Disposer>>,
}

impl SubscriptionHandle {
    pub(crate) fn new(
        watch_id: String,
        disposer: Disposer,
    ) -> Self {
        Self {
            watch_id,
            disposer: Mutex::new(Some(disposer)),
        }
    }

    /// Returns `true` only for the call that actually ran the disposer.
    pub(crate) fn dispose(&self) -> bool {
        let disposer = self.disposer.lock().take();
        match disposer {
            Some(disposer) => {
                disposer.dispose();
                trace!(watch_id = %self.watch_id, "Subscription disposed");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposer.lock().is_none()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}
