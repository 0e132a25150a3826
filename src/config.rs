use std::time::Duration;

use crate::ConfigError;

/// Configuration for the pool.
///
/// With the `serde` feature every field is optional in serialized form and
/// falls back to [`Config::default`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Number of resources the pool creates on warm-up. Must be positive.
    pub capacity: usize,
    /// Upper bound on how long [`Pool::acquire`](crate::Pool::acquire) waits.
    /// `None` waits until a resource is released.
    pub acquire_timeout: Option<Duration>,
    /// Warm the pool while building it instead of on the first acquire.
    pub warm_up_on_build: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 5,
            acquire_timeout: None,
            warm_up_on_build: false,
        }
    }
}

impl Config {
    /// Check the configuration once, before a pool is built from it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Config, ConfigError};
    ///
    /// let mut config = Config::default();
    /// assert!(config.validate().is_ok());
    /// config.capacity = 0;
    /// assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}
