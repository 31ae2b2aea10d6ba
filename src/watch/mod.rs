//! Watch bridge: turns a callback subscription into an ordered, cancellable
//! pull sequence, optionally prefixed with a current-state snapshot.
//!
//! # Architecture
//!
//! ```text
//! caller ─▶ snapshot lookup (one-shot)
//!        ─▶ SubscriptionDriver ─▶ EventSubscription::subscribe(UpdateSink)
//!                                          │ callbacks
//!                                          ▼
//!                                     push queue ─▶ filter/map ─▶ caller
//!
//! cancellation token ─▶ driver ─▶ disposer ─▶ queue closed ─▶ stream ends
//! ```

mod bridge;
mod driver;
mod hub;
mod push_queue;
mod subscription;

pub use bridge::*;
pub(crate) use driver::*;
pub use hub::*;
pub use push_queue::*;
pub use subscription::*;

#[cfg(test)]
mod driver_test;
