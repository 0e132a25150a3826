//! A bounded pool of expensive, reusable resources.
//!
//! # Features
//!
//! - Fixed capacity: the pool creates exactly `capacity` resources and never
//!   more, the first time it is used or on an explicit [`Pool::warm_up`].
//! - Thread-safe: warm-up runs once no matter how many threads race into it.
//! - Backpressure: [`Pool::acquire`] parks the caller while every resource is
//!   checked out; releases hand resources to waiters in arrival order.
//! - Deterministic shutdown: [`Pool::shutdown`] disposes every idle resource
//!   and reports the disposal failures instead of stopping on them.
//!
//! Resources are created and disposed by a [`Manager`]. Closures work too,
//! through [`manager_fn`].
//!
//! # Examples
//!
//! ## Local pool
//!
//! ```rust
//! use warm_pool::{Pool, manager_fn};
//!
//! let manager = manager_fn(|| Ok::<_, String>(Vec::<u8>::with_capacity(64)), |_| Ok(()));
//! let pool = Pool::new(manager, 2).unwrap();
//! assert_eq!(pool.available(), 0);
//!
//! let buf = pool.acquire().unwrap();
//! assert_eq!(pool.created(), 2);
//! assert_eq!(pool.available(), 1);
//! pool.release(buf).unwrap();
//! assert_eq!(pool.available(), 2);
//!
//! let report = pool.shutdown();
//! assert_eq!(report.disposed, 2);
//! ```
//!
//! ## Multiple threads sharing a pool
//!
//! ```rust
//! use warm_pool::{Pool, manager_fn};
//! use std::sync::Arc;
//!
//! let pool = Arc::new(Pool::new(manager_fn(|| Ok::<_, String>(0u64), |_| Ok(())), 2).unwrap());
//!
//! let workers: Vec<_> = (0..8)
//!     .map(|_| {
//!         let pool = pool.clone();
//!         std::thread::spawn(move || {
//!             for _ in 0..100 {
//!                 let mut counter = pool.get().unwrap();
//!                 *counter += 1;
//!             }
//!         })
//!     })
//!     .collect();
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//!
//! assert_eq!(pool.created(), 2);
//! let a = pool.acquire().unwrap();
//! let b = pool.acquire().unwrap();
//! assert_eq!(a + b, 800);
//! # pool.release(a).unwrap();
//! # pool.release(b).unwrap();
//! ```

mod builder;
mod config;
mod entry;
mod error;
mod manager;
mod pool;

pub use builder::Builder;
pub use config::Config;
pub use entry::{Entry, OwnedEntry};
pub use error::{ConfigError, PoolError, ReleaseError};
pub use manager::{FnManager, Manager, manager_fn};
pub use pool::{Drained, Pool, State};
