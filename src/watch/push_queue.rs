//! Single-consumer, unbounded, ordered push queue.
//!
//! Bridges a producer that must never block (event-source callbacks, possibly
//! running on an unrelated thread) to a consumer that suspends until the next
//! value, a terminal failure, or close.
//!
//! ```text
//!   callback ── push() ──▶ [ VecDeque ] ── pull().await ──▶ stream consumer
//!                             │
//!   close()/fail() ───────────┘ (terminal: buffer discarded)
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::Error;
use crate::Result;

/// Observable queue state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Open,
    Closed,
    Failed,
}

enum QueueState {
    Open,
    Closed,
    /// Error is taken by the first pull that observes it
    Failed(Option<Error>),
}

struct Inner<T> {
    buffer: VecDeque<T>,
    state: QueueState,
}

struct Shared<T> {
    inner: Mutex<Inner<T>>,
    notify: Notify,
}

/// Producer half. Cheap to clone; every operation is non-blocking.
pub struct QueueProducer<T> {
    shared: Arc<Shared<T>>,
}

/// Consumer half. Exactly one exists per queue.
pub struct QueueConsumer<T> {
    shared: Arc<Shared<T>>,
}

/// Creates an open queue
pub fn push_queue<T>() -> (QueueProducer<T>, QueueConsumer<T>) {
    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            buffer: VecDeque::new(),
            state: QueueState::Open,
        }),
        notify: Notify::new(),
    });

    (
        QueueProducer {
            shared: shared.clone(),
        },
        QueueConsumer { shared },
    )
}

impl<T> Clone for QueueProducer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> QueueProducer<T> {
    /// Enqueues `value`. Returns `false` if the queue already left OPEN, in
    /// which case the value is discarded.
    pub fn push(
        &self,
        value: T,
    ) -> bool {
        let mut inner = self.shared.inner.lock();
        if !matches!(inner.state, QueueState::Open) {
            return false;
        }
        inner.buffer.push_back(value);
        drop(inner);

        self.shared.notify.notify_one();
        true
    }

    /// Marks the queue FAILED. Returns `false` if it was already terminal.
    pub fn fail(
        &self,
        error: Error,
    ) -> bool {
        self.terminate(QueueState::Failed(Some(error)))
    }

    /// Marks the queue CLOSED. Returns `false` if it was already terminal.
    pub fn close(&self) -> bool {
        self.terminate(QueueState::Closed)
    }

    pub fn status(&self) -> QueueStatus {
        status_of(&self.shared.inner.lock().state)
    }

    fn terminate(
        &self,
        next: QueueState,
    ) -> bool {
        let mut inner = self.shared.inner.lock();
        if !matches!(inner.state, QueueState::Open) {
            return false;
        }
        inner.state = next;
        inner.buffer.clear();
        drop(inner);

        self.shared.notify.notify_one();
        true
    }
}

impl<T> QueueConsumer<T> {
    /// Waits for the next value.
    ///
    /// Resolves to `Some(Ok(value))` in push order, `Some(Err(error))` once
    /// after a failure, and `None` once the queue is closed (or its failure
    /// was already delivered).
    pub async fn pull(&mut self) -> Option<Result<T>> {
        loop {
            if let Some(next) = self.try_pull() {
                return next;
            }
            // A notification issued between `try_pull` and here is kept as a
            // permit, so this never misses a wake-up.
            self.shared.notify.notified().await;
        }
    }

    /// Non-suspending variant of [`pull`](Self::pull); `None` means "nothing yet".
    pub fn try_pull(&mut self) -> Option<Option<Result<T>>> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        match &mut inner.state {
            QueueState::Open => inner.buffer.pop_front().map(|value| Some(Ok(value))),
            QueueState::Closed => Some(None),
            QueueState::Failed(error) => Some(error.take().map(Err)),
        }
    }

    pub fn status(&self) -> QueueStatus {
        status_of(&self.shared.inner.lock().state)
    }

    /// Number of values waiting to be pulled
    pub fn len(&self) -> usize {
        self.shared.inner.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for QueueConsumer<T> {
    fn drop(&mut self) {
        // Nobody can pull anymore: stop buffering.
        let mut inner = self.shared.inner.lock();
        if matches!(inner.state, QueueState::Open) {
            inner.state = QueueState::Closed;
        }
        inner.buffer.clear();
    }
}

fn status_of(state: &QueueState) -> QueueStatus {
    match state {
        QueueState::Open => QueueStatus::Open,
        QueueState::Closed => QueueStatus::Closed,
        QueueState::Failed(_) => QueueStatus::Failed,
    }
}
