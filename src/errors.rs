//! Error hierarchy for the workspace RPC facade and its watch bridge.
//!
//! Every failure a watch call can observe is surfaced to that call's single
//! consumer. The wire mapping lives in one place, `From<Error> for Status`.

use config::ConfigError;
use tonic::Status;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Watch call shape, registration and update source failures
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Failures reported by the persistence/query layer
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Infrastructure-level failures (sockets, files, server lifecycle)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration values rejected by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Malformed call: missing cancellation token, user id or workspace id
    #[error("{0}")]
    InvalidArgument(String),

    /// The event source refused the listener
    #[error("Subscription registration failed: {0}")]
    Registration(String),

    /// The event source reported a failure after registration
    #[error("Update source failed: {0}")]
    Source(String),

    /// Concurrent watch ceiling reached
    #[error("Too many active watches (limit {limit})")]
    LimitExceeded { limit: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Workspace {0} not found")]
    NotFound(String),

    #[error("Permission denied for workspace {0}")]
    PermissionDenied(String),

    #[error("Workspace store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("RPC server unavailable")]
    ServerUnavailable,
}

impl Error {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        WatchError::InvalidArgument(message.into()).into()
    }
}

impl From<Error> for Status {
    fn from(error: Error) -> Self {
        let message = error.to_string();
        match error {
            Error::Watch(WatchError::InvalidArgument(_)) => Status::invalid_argument(message),
            Error::Watch(WatchError::Registration(_)) => Status::unavailable(message),
            Error::Watch(WatchError::Source(_)) => Status::aborted(message),
            Error::Watch(WatchError::LimitExceeded { .. }) => Status::resource_exhausted(message),
            Error::Store(StoreError::NotFound(_)) => Status::not_found(message),
            Error::Store(StoreError::PermissionDenied(_)) => Status::permission_denied(message),
            Error::Store(StoreError::Unavailable(_)) => Status::unavailable(message),
            Error::System(_) | Error::Config(_) | Error::InvalidConfig(_) | Error::Fatal(_) => {
                Status::internal(message)
            }
        }
    }
}
