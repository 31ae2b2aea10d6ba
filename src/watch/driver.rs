//! Subscription lifecycle for one watch call.
//!
//! The driver registers an [`UpdateSink`] with the event source, owns the
//! resulting disposer, and tears the registration down exactly once: when the
//! caller's cancellation token fires, when the queue fails, or when the
//! driver is dropped.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::push_queue;
use super::EventSubscription;
use super::QueueConsumer;
use super::QueueProducer;
use super::SubscriptionHandle;
use super::UpdateSink;
use crate::Result;
use crate::WorkspaceInstance;

pub(crate) struct SubscriptionDriver {
    watch_id: String,
    consumer: QueueConsumer<WorkspaceInstance>,
    producer: QueueProducer<WorkspaceInstance>,
    /// `None` when no registration exists (pre-cancelled or refused)
    handle: Option<Arc<SubscriptionHandle>>,
    token: CancellationToken,
    /// Retires the cancellation reaction once the driver is done
    finished: CancellationToken,
}

impl SubscriptionDriver {
    /// Registers with `subscription` unless `token` has already fired.
    ///
    /// A refused registration is not returned as an error here: it becomes
    /// the queue's terminal failure so the consumer observes it in order.
    pub(crate) fn start<S>(
        watch_id: String,
        subscription: &S,
        token: CancellationToken,
    ) -> Self
    where
        S: EventSubscription + ?Sized,
    {
        let (producer, consumer) = push_queue();
        let finished = CancellationToken::new();

        if token.is_cancelled() {
            debug!(watch_id = %watch_id, "Watch cancelled before subscribing");
            producer.close();
            return Self {
                watch_id,
                consumer,
                producer,
                handle: None,
                token,
                finished,
            };
        }

        let handle = match subscription.subscribe(UpdateSink::new(producer.clone())) {
            Ok(disposer) => {
                debug!(watch_id = %watch_id, "Subscribed to instance updates");
                let handle = Arc::new(SubscriptionHandle::new(watch_id.clone(), disposer));
                spawn_cancellation_reaction(
                    watch_id.clone(),
                    token.clone(),
                    finished.clone(),
                    handle.clone(),
                    producer.clone(),
                );
                Some(handle)
            }
            Err(e) => {
                warn!(watch_id = %watch_id, error = %e, "Subscription registration failed");
                producer.fail(e);
                None
            }
        };

        Self {
            watch_id,
            consumer,
            producer,
            handle,
            token,
            finished,
        }
    }

    /// Next raw update, unfiltered.
    ///
    /// `None` ends the sequence cleanly (cancelled or closed). An error is
    /// returned only after the registration has been disposed.
    pub(crate) async fn next(&mut self) -> Option<Result<WorkspaceInstance>> {
        if self.token.is_cancelled() {
            self.teardown();
            return None;
        }

        let item = tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            item = self.consumer.pull() => item,
        };

        match item {
            Some(Ok(instance)) => Some(Ok(instance)),
            Some(Err(e)) => {
                self.teardown();
                debug!(watch_id = %self.watch_id, error = %e, "Watch failed");
                Some(Err(e))
            }
            None => {
                self.teardown();
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_subscribed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_disposed())
    }

    fn teardown(&mut self) {
        if let Some(handle) = &self.handle {
            if handle.dispose() {
                debug!(watch_id = %self.watch_id, "Watch torn down");
            }
        }
        self.producer.close();
        self.finished.cancel();
    }
}

impl Drop for SubscriptionDriver {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// The single terminal reaction to the caller's token: dispose, then close the
/// queue so a pending pull ends instead of suspending forever.
fn spawn_cancellation_reaction(
    watch_id: String,
    token: CancellationToken,
    finished: CancellationToken,
    handle: Arc<SubscriptionHandle>,
    producer: QueueProducer<WorkspaceInstance>,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                if handle.dispose() {
                    debug!(watch_id = %watch_id, "Watch cancelled by caller");
                }
                producer.close();
            }
            _ = finished.cancelled() => {}
        }
    });
}
