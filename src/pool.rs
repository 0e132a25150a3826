use std::collections::VecDeque;
use std::sync::atomic::Ordering::*;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_queue::ArrayQueue;
use log::{debug, error, info, warn};

use crate::{Config, Entry, Manager, OwnedEntry, PoolError, ReleaseError};

/// A bounded pool of expensive resources, created lazily and handed out to
/// blocking callers in FIFO order.
///
/// The pool creates exactly `capacity` resources the first time it is used
/// and never creates more. When every resource is checked out, callers of
/// [`acquire`](Pool::acquire) park until another caller releases one.
///
/// # Examples
///
/// ```rust
/// use warm_pool::{Pool, manager_fn};
/// use std::sync::{Arc, mpsc};
///
/// let manager = manager_fn(|| Ok::<_, String>(String::from("session")), |_s| Ok(()));
/// let pool = Arc::new(Pool::new(manager, 1).unwrap());
///
/// let first = pool.acquire().unwrap();
///
/// let (tx, rx) = mpsc::channel();
/// let clone_pool = pool.clone();
/// let waiter = std::thread::spawn(move || {
///     // Blocks until `first` is released.
///     let session = clone_pool.acquire().unwrap();
///     tx.send(session.len()).unwrap();
///     clone_pool.release(session).unwrap();
/// });
///
/// pool.release(first).unwrap();
/// assert_eq!(rx.recv().unwrap(), 7);
/// waiter.join().unwrap();
/// assert_eq!(pool.created(), 1);
/// ```
pub struct Pool<M: Manager> {
    /// Creates and disposes resources.
    manager: M,
    /// Configuration of the pool.
    config: Config,
    /// Resources currently not checked out.
    queue: ArrayQueue<M::Resource>,
    /// Callers parked in `acquire`, oldest first.
    waiters: Mutex<VecDeque<Arc<Waiter<M::Resource>>>>,
    /// Serializes warm-up and shutdown.
    creation: Mutex<()>,
    /// Set once warm-up has filled the queue.
    initialized: AtomicBool,
    /// Current [`State`] as its discriminant.
    state: AtomicU8,
    /// Number of resources held by callers.
    checked_out: AtomicUsize,
    /// Number of resources ever created.
    created: AtomicUsize,
    /// Number of resources ever handed to `dispose`.
    disposed: AtomicUsize,
}

/// Lifecycle of a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    /// Nothing has been created yet, or the last warm-up failed.
    Uninitialized = 0,
    /// A warm-up pass is creating resources.
    Initializing = 1,
    /// Every resource has been created; acquire and release are live.
    Ready = 2,
    /// `shutdown` is disposing the available resources.
    Draining = 3,
    /// `shutdown` has emptied the buffer.
    ///
    /// Releases arriving after the drain put resources back into the buffer
    /// without leaving this state; the next `shutdown` disposes them.
    Drained = 4,
}

impl State {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => State::Uninitialized,
            1 => State::Initializing,
            2 => State::Ready,
            3 => State::Draining,
            _ => State::Drained,
        }
    }
}

/// Outcome of [`Pool::shutdown`].
#[derive(Debug)]
pub struct Drained<E> {
    /// Number of resources handed to `dispose`, failed ones included.
    pub disposed: usize,
    /// Errors returned by `dispose`, in drain order.
    pub failures: Vec<E>,
}

impl<E> Drained<E> {
    /// Whether every disposal succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A parked `acquire` call. Releases fill the slot directly.
struct Waiter<R> {
    slot: Mutex<Option<R>>,
    ready: Condvar,
}

impl<R> Waiter<R> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn fill(&self, resource: R) {
        *lock(&self.slot) = Some(resource);
        self.ready.notify_one();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<M: Manager> Drop for Pool<M> {
    fn drop(&mut self) {
        while let Some(resource) = self.queue.pop() {
            let _ = self.dispose_one(resource);
        }
    }
}

impl<M: Manager> Pool<M> {
    /// Create a new pool holding `capacity` resources from `manager`.
    ///
    /// Nothing is created until the first [`warm_up`](Pool::warm_up) or
    /// [`acquire`](Pool::acquire).
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, PoolError, ConfigError, manager_fn};
    ///
    /// let pool = Pool::new(manager_fn(|| Ok::<_, String>(0u32), |_| Ok(())), 3).unwrap();
    /// assert_eq!(pool.capacity(), 3);
    /// assert_eq!(pool.created(), 0);
    ///
    /// let err = Pool::new(manager_fn(|| Ok::<_, String>(0u32), |_| Ok(())), 0).unwrap_err();
    /// assert_eq!(err, PoolError::Config(ConfigError::ZeroCapacity));
    /// ```
    pub fn new(manager: M, capacity: usize) -> Result<Self, PoolError<M::Error>> {
        Self::with_config(
            manager,
            Config {
                capacity,
                ..Default::default()
            },
        )
    }

    /// Create a new pool with the given configuration.
    ///
    /// The configuration is validated once here. When
    /// [`Config::warm_up_on_build`] is set the pool is warmed before it is
    /// returned.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Config, Pool, State, manager_fn};
    ///
    /// let mut config = Config::default();
    /// config.capacity = 2;
    /// config.warm_up_on_build = true;
    /// let pool = Pool::with_config(manager_fn(|| Ok::<_, String>(1u8), |_| Ok(())), config).unwrap();
    /// assert_eq!(pool.state(), State::Ready);
    /// assert_eq!(pool.available(), 2);
    /// ```
    pub fn with_config(manager: M, config: Config) -> Result<Self, PoolError<M::Error>> {
        config.validate()?;
        let pool = Self {
            manager,
            queue: ArrayQueue::new(config.capacity),
            waiters: Mutex::new(VecDeque::new()),
            creation: Mutex::new(()),
            initialized: AtomicBool::new(false),
            state: AtomicU8::new(State::Uninitialized as u8),
            checked_out: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
            disposed: AtomicUsize::new(0),
            config,
        };
        if pool.config.warm_up_on_build {
            pool.warm_up()?;
        }
        Ok(pool)
    }

    /// Create every resource of the pool. Idempotent.
    ///
    /// Concurrent callers are serialized, so the manager is asked for exactly
    /// `capacity` resources no matter how many threads race here. If the
    /// manager fails, the resources created so far are disposed, the pool goes
    /// back to [`State::Uninitialized`] and a later call may try again.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, manager_fn};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// let calls = AtomicUsize::new(0);
    /// let manager = manager_fn(|| Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst)), |_| Ok(()));
    /// let pool = Pool::new(manager, 4).unwrap();
    /// pool.warm_up().unwrap();
    /// pool.warm_up().unwrap();
    /// assert_eq!(calls.load(Ordering::SeqCst), 4);
    /// assert_eq!(pool.available(), 4);
    /// ```
    pub fn warm_up(&self) -> Result<(), PoolError<M::Error>> {
        if self.initialized.load(Acquire) {
            return Ok(());
        }
        let _guard = lock(&self.creation);
        if self.initialized.load(Acquire) {
            return Ok(());
        }

        let capacity = self.config.capacity;
        self.set_state(State::Initializing);
        info!("Initializing resource pool with {capacity} resources...");

        let mut fresh = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            match self.manager.create() {
                Ok(resource) => {
                    self.created.fetch_add(1, AcqRel);
                    debug!("New resource created.");
                    fresh.push(resource);
                }
                Err(err) => {
                    warn!(
                        "Resource creation failed after {} of {capacity}; disposing them.",
                        fresh.len()
                    );
                    for resource in fresh {
                        let _ = self.dispose_one(resource);
                    }
                    self.set_state(State::Uninitialized);
                    return Err(PoolError::Create(err));
                }
            }
        }

        // Nothing can be checked out before the first warm-up, so the queue is empty.
        for resource in fresh {
            if let Err(resource) = self.queue.push(resource) {
                let _ = self.dispose_one(resource);
            }
        }
        self.initialized.store(true, Release);
        self.set_state(State::Ready);
        info!("Resource pool initialized.");
        Ok(())
    }

    /// Take a resource out of the pool, warming it first if needed.
    ///
    /// Parks the calling thread while every resource is checked out. Waiters
    /// are served in arrival order. Waits at most
    /// [`Config::acquire_timeout`] when one is configured.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, manager_fn};
    ///
    /// let pool = Pool::new(manager_fn(|| Ok::<_, String>(vec![1, 2, 3]), |_| Ok(())), 2).unwrap();
    /// let resource = pool.acquire().unwrap();
    /// assert_eq!(resource, vec![1, 2, 3]);
    /// assert_eq!(pool.available(), 1);
    /// assert_eq!(pool.in_use(), 1);
    /// pool.release(resource).unwrap();
    /// assert_eq!(pool.available(), 2);
    /// ```
    pub fn acquire(&self) -> Result<M::Resource, PoolError<M::Error>> {
        self.acquire_inner(self.config.acquire_timeout)
    }

    /// Like [`acquire`](Pool::acquire), but gives up after `timeout`.
    ///
    /// A timed-out caller leaves the waiter queue without losing a resource:
    /// if a release reached it while it was timing out, the call succeeds.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, PoolError, manager_fn};
    /// use std::time::Duration;
    ///
    /// let pool = Pool::new(manager_fn(|| Ok::<_, String>(()), |_| Ok(())), 1).unwrap();
    /// let held = pool.acquire().unwrap();
    /// let timeout = Duration::from_millis(10);
    /// assert_eq!(pool.acquire_timeout(timeout), Err(PoolError::Timeout(timeout)));
    /// assert_eq!(pool.waiting(), 0);
    /// pool.release(held).unwrap();
    /// ```
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<M::Resource, PoolError<M::Error>> {
        self.acquire_inner(Some(timeout))
    }

    /// Take a resource if one is available right now. Never parks.
    ///
    /// Returns `Ok(None)` when the buffer is empty or other callers are
    /// already waiting.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, manager_fn};
    ///
    /// let pool = Pool::new(manager_fn(|| Ok::<_, String>('x'), |_| Ok(())), 1).unwrap();
    /// let held = pool.try_acquire().unwrap().unwrap();
    /// assert!(pool.try_acquire().unwrap().is_none());
    /// pool.release(held).unwrap();
    /// ```
    pub fn try_acquire(&self) -> Result<Option<M::Resource>, PoolError<M::Error>> {
        self.warm_up()?;
        let waiters = lock(&self.waiters);
        if !waiters.is_empty() {
            return Ok(None);
        }
        Ok(self.queue.pop().inspect(|_| {
            self.checked_out.fetch_add(1, AcqRel);
        }))
    }

    fn acquire_inner(
        &self,
        timeout: Option<Duration>,
    ) -> Result<M::Resource, PoolError<M::Error>> {
        self.warm_up()?;
        debug!("Acquiring resource from pool...");
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));

        let waiter = {
            let mut waiters = lock(&self.waiters);
            if waiters.is_empty() {
                if let Some(resource) = self.queue.pop() {
                    self.checked_out.fetch_add(1, AcqRel);
                    debug!("Resource acquired from pool.");
                    return Ok(resource);
                }
            }
            let waiter = Arc::new(Waiter::new());
            waiters.push_back(waiter.clone());
            waiter
        };

        let mut slot = lock(&waiter.slot);
        loop {
            if let Some(resource) = slot.take() {
                debug!("Resource acquired from pool after waiting.");
                return Ok(resource);
            }
            match deadline {
                None => {
                    slot = waiter
                        .ready
                        .wait(slot)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    slot = waiter
                        .ready
                        .wait_timeout(slot, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
        drop(slot);

        let timeout = timeout.unwrap_or_default();
        let mut waiters = lock(&self.waiters);
        if let Some(pos) = waiters.iter().position(|w| Arc::ptr_eq(w, &waiter)) {
            waiters.remove(pos);
            warn!("Timed out after {timeout:?} waiting for a resource.");
            return Err(PoolError::Timeout(timeout));
        }
        drop(waiters);

        // A release dequeued this waiter and filled its slot under the waiters lock.
        let resource = lock(&waiter.slot).take();
        resource.ok_or(PoolError::Timeout(timeout))
    }

    /// Return a resource taken from this pool.
    ///
    /// The resource goes straight to the longest-waiting caller if there is
    /// one, otherwise back into the buffer. Never blocks.
    ///
    /// Releasing while nothing is checked out is a caller bug; the resource is
    /// handed back inside a [`ReleaseError`] and an error record is logged.
    /// Detection only counts checked-out resources: a foreign resource
    /// released while a genuine one is out is accepted, and the genuine one's
    /// later release is the one rejected.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, manager_fn};
    ///
    /// let pool = Pool::new(manager_fn(|| Ok::<_, String>(5u64), |_| Ok(())), 1).unwrap();
    /// let resource = pool.acquire().unwrap();
    /// pool.release(resource).unwrap();
    ///
    /// let stray = pool.release(6).unwrap_err();
    /// assert_eq!(stray.into_inner(), 6);
    /// assert_eq!(pool.available(), 1);
    /// ```
    pub fn release(&self, resource: M::Resource) -> Result<(), ReleaseError<M::Resource>> {
        if self
            .checked_out
            .fetch_update(AcqRel, Acquire, |n| n.checked_sub(1))
            .is_err()
        {
            error!("Release rejected: no resource is checked out from this pool.");
            return Err(ReleaseError(resource));
        }
        debug!("Releasing resource back to pool...");
        match self.put(resource) {
            Ok(()) => {
                debug!("Resource released back to pool.");
                Ok(())
            }
            Err(resource) => {
                self.checked_out.fetch_add(1, AcqRel);
                error!("Release rejected: the pool already holds every resource it created.");
                Err(ReleaseError(resource))
            }
        }
    }

    /// Hand a resource to the oldest waiter, or buffer it.
    fn put(&self, resource: M::Resource) -> Result<(), M::Resource> {
        let mut waiters = lock(&self.waiters);
        if let Some(waiter) = waiters.pop_front() {
            self.checked_out.fetch_add(1, AcqRel);
            waiter.fill(resource);
            return Ok(());
        }
        self.queue.push(resource)
    }

    /// Dispose every resource currently in the buffer.
    ///
    /// Resources checked out when the drain runs are left alone: their holders
    /// still own them, and a later release puts them back into the buffer
    /// where the next `shutdown` (or dropping the pool) disposes them. The
    /// call does not wait for outstanding resources. The pool stays
    /// initialized, so an `acquire` after shutdown parks until such a release
    /// arrives.
    ///
    /// Disposal failures are logged and collected in the returned report; they
    /// never stop the drain.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, State, manager_fn};
    ///
    /// let pool = Pool::new(manager_fn(|| Ok::<_, String>(0u8), |_| Ok(())), 3).unwrap();
    /// let held = pool.acquire().unwrap();
    /// let report = pool.shutdown();
    /// assert_eq!(report.disposed, 2);
    /// assert!(report.is_clean());
    /// assert_eq!(pool.state(), State::Drained);
    /// assert_eq!(pool.in_use(), 1);
    /// # pool.release(held).unwrap();
    /// ```
    pub fn shutdown(&self) -> Drained<M::Error> {
        let _guard = lock(&self.creation);
        let mut report = Drained {
            disposed: 0,
            failures: Vec::new(),
        };
        if !self.initialized.load(Acquire) {
            return report;
        }

        self.set_state(State::Draining);
        info!("Closing all resources in the pool...");
        while let Some(resource) = self.queue.pop() {
            report.disposed += 1;
            if let Err(err) = self.dispose_one(resource) {
                report.failures.push(err);
            }
        }
        self.set_state(State::Drained);
        info!(
            "All resources closed ({} disposed, {} failed, {} still checked out).",
            report.disposed,
            report.failures.len(),
            self.in_use()
        );
        report
    }

    fn dispose_one(&self, resource: M::Resource) -> Result<(), M::Error> {
        self.disposed.fetch_add(1, AcqRel);
        self.manager.dispose(resource).inspect_err(|err| {
            warn!("Failed to dispose resource: {err:?}");
        })
    }

    /// Take a resource wrapped in a guard that releases it on drop.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, manager_fn};
    ///
    /// let pool = Pool::new(manager_fn(|| Ok::<_, String>(String::new()), |_| Ok(())), 1).unwrap();
    /// {
    ///     let mut entry = pool.get().unwrap();
    ///     entry.push_str("used");
    ///     assert_eq!(pool.available(), 0);
    /// }
    /// assert_eq!(pool.available(), 1);
    /// assert_eq!(&*pool.get().unwrap(), "used");
    /// ```
    pub fn get(&self) -> Result<Entry<'_, M>, PoolError<M::Error>> {
        self.acquire().map(|resource| Entry {
            resource: Some(resource),
            pool: self,
        })
    }

    /// Take a resource wrapped in a guard that keeps the pool alive and
    /// releases the resource on drop.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, manager_fn};
    /// use std::sync::Arc;
    ///
    /// let pool = Arc::new(Pool::new(manager_fn(|| Ok::<_, String>(7i32), |_| Ok(())), 1).unwrap());
    /// let entry = pool.get_owned().unwrap();
    /// let handle = std::thread::spawn(move || *entry * 6);
    /// assert_eq!(handle.join().unwrap(), 42);
    /// assert_eq!(pool.available(), 1);
    /// ```
    pub fn get_owned(self: &Arc<Self>) -> Result<OwnedEntry<M>, PoolError<M::Error>> {
        self.acquire().map(|resource| OwnedEntry {
            resource: Some(resource),
            pool: self.clone(),
        })
    }

    /// Release a resource coming back from a guard.
    pub(crate) fn recycle(&self, resource: M::Resource) {
        if let Err(rejected) = self.release(resource) {
            let _ = self.dispose_one(rejected.into_inner());
        }
    }

    /// Get the capacity of the pool.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Get the configuration the pool was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the resource manager.
    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// Get the number of resources sitting in the buffer.
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    /// Get the number of resources held by callers.
    pub fn in_use(&self) -> usize {
        self.checked_out.load(Acquire)
    }

    /// Get the number of resources ever created.
    pub fn created(&self) -> usize {
        self.created.load(Acquire)
    }

    /// Get the number of resources ever handed to `dispose`.
    pub fn disposed(&self) -> usize {
        self.disposed.load(Acquire)
    }

    /// Get the number of callers parked in `acquire`.
    pub fn waiting(&self) -> usize {
        lock(&self.waiters).len()
    }

    /// Check whether warm-up has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Acquire)
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Acquire))
    }

    fn set_state(&self, state: State) {
        self.state.store(state as u8, Release);
    }
}

impl<M: Manager> std::fmt::Debug for Pool<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("available", &self.available())
            .field("in_use", &self.in_use())
            .field("created", &self.created())
            .field("disposed", &self.disposed())
            .finish()
    }
}
