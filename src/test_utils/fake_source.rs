use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Disposer;
use crate::EventSubscription;
use crate::Result;
use crate::UpdateSink;
use crate::WatchError;
use crate::WorkspaceInstance;

#[derive(Default)]
struct FakeSourceInner {
    sinks: Mutex<Vec<UpdateSink>>,
    subscribed: AtomicUsize,
    disposed: AtomicUsize,
    refuse_with: Mutex<Option<String>>,
}

/// Scriptable event source recording registrations and disposals.
///
/// Emissions fan out to every registered sink, including ones whose watch has
/// already been disposed, so tests can check that late callbacks are ignored.
#[derive(Clone, Default)]
pub struct FakeEventSource {
    inner: Arc<FakeSourceInner>,
}

impl FakeEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following registration fails with `reason`
    pub fn refusing(reason: &str) -> Self {
        let source = Self::default();
        *source.inner.refuse_with.lock() = Some(reason.to_string());
        source
    }

    /// Pushes `instance` to all sinks; returns how many accepted it
    pub fn emit(
        &self,
        instance: WorkspaceInstance,
    ) -> usize {
        self.inner
            .sinks
            .lock()
            .iter()
            .filter(|sink| sink.push(instance.clone()))
            .count()
    }

    /// Reports a source failure to all sinks
    pub fn fail(
        &self,
        reason: &str,
    ) -> usize {
        self.inner
            .sinks
            .lock()
            .iter()
            .filter(|sink| sink.fail(WatchError::Source(reason.to_string()).into()))
            .count()
    }

    pub fn subscribe_count(&self) -> usize {
        self.inner.subscribed.load(Ordering::SeqCst)
    }

    pub fn dispose_count(&self) -> usize {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl EventSubscription for FakeEventSource {
    fn subscribe(
        &self,
        sink: UpdateSink,
    ) -> Result<Disposer> {
        if let Some(reason) = self.inner.refuse_with.lock().clone() {
            return Err(WatchError::Registration(reason).into());
        }

        self.inner.subscribed.fetch_add(1, Ordering::SeqCst);
        self.inner.sinks.lock().push(sink);

        let inner = self.inner.clone();
        Ok(Disposer::new(move || {
            inner.disposed.fetch_add(1, Ordering::SeqCst);
        }))
    }
}
