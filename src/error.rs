use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Error returned when a resource cannot be handed out.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PoolError<E> {
    /// The pool configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The manager failed to create a resource while warming the pool.
    ///
    /// Every resource created before the failure has already been disposed,
    /// and the pool is back in [`State::Uninitialized`](crate::State).
    #[error("failed to create resource: {0}")]
    Create(E),

    /// No resource was released before the deadline.
    #[error("timed out after {0:?} waiting for a resource")]
    Timeout(Duration),
}

/// Error returned when the pool configuration is invalid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A pool must be able to hold at least one resource.
    #[error("pool capacity must be greater than zero")]
    ZeroCapacity,
}

/// A resource was released while no resource was checked out.
///
/// This is a contract violation by the caller: the resource either came from
/// somewhere else or was already released. The resource is handed back so the
/// caller decides what to do with it.
#[derive(Error)]
#[error("released a resource while none was checked out from this pool")]
pub struct ReleaseError<R>(pub R);

impl<R> ReleaseError<R> {
    /// Take back the rejected resource.
    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R> fmt::Debug for ReleaseError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReleaseError").finish_non_exhaustive()
    }
}
