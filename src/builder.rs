use std::time::Duration;

use crate::{Config, Manager, Pool, PoolError};

/// A builder for creating a [`Pool`] with custom configuration.
///
/// # Example
///
/// ```rust
/// use warm_pool::{Builder, manager_fn};
/// use std::time::Duration;
///
/// let mut builder = Builder::new();
/// let pool = builder
///     .capacity(10)
///     .acquire_timeout(Duration::from_secs(1))
///     .build(manager_fn(|| Ok::<_, String>(0usize), |_| Ok(())))
///     .unwrap();
/// assert_eq!(pool.capacity(), 10);
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    /// Configuration of the pool.
    config: Config,
}

impl Builder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration, e.g. one loaded from a file.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the number of resources the pool holds.
    pub fn capacity(&mut self, capacity: usize) -> &mut Self {
        self.config.capacity = capacity;
        self
    }

    /// Bound how long [`Pool::acquire`] waits for a resource.
    pub fn acquire_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.acquire_timeout = Some(timeout);
        self
    }

    /// Let [`Pool::acquire`] wait until a resource is released.
    pub fn wait_forever(&mut self) -> &mut Self {
        self.config.acquire_timeout = None;
        self
    }

    /// Warm the pool while building it.
    pub fn warm_up_on_build(&mut self, enable: bool) -> &mut Self {
        self.config.warm_up_on_build = enable;
        self
    }

    /// Build the pool with the current configuration.
    ///
    /// The builder is reset to the default configuration afterwards.
    pub fn build<M: Manager>(&mut self, manager: M) -> Result<Pool<M>, PoolError<M::Error>> {
        let config = std::mem::take(&mut self.config);
        Pool::with_config(manager, config)
    }
}
