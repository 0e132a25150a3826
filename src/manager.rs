use std::fmt;
use std::sync::Arc;

/// Creates and tears down the resources held by a [`Pool`](crate::Pool).
///
/// The pool never looks inside a resource. It only asks the manager for new
/// ones during warm-up and hands them back for disposal on shutdown.
pub trait Manager {
    /// The pooled resource.
    type Resource;
    /// Error raised by [`create`](Manager::create) or [`dispose`](Manager::dispose).
    type Error: fmt::Debug;

    /// Create a new resource.
    fn create(&self) -> Result<Self::Resource, Self::Error>;

    /// Tear down a resource. Failures are reported but never stop a drain.
    fn dispose(&self, resource: Self::Resource) -> Result<(), Self::Error>;
}

/// A [`Manager`] built from a pair of closures. See [`manager_fn`].
pub struct FnManager<C, D> {
    create: C,
    dispose: D,
}

/// Build a [`Manager`] from a create closure and a dispose closure.
///
/// # Example
///
/// ```rust
/// use warm_pool::{Manager, manager_fn};
///
/// let manager = manager_fn(|| Ok::<_, String>(vec![0u8; 16]), |_buf| Ok(()));
/// let buf = manager.create().unwrap();
/// assert_eq!(buf.len(), 16);
/// assert!(manager.dispose(buf).is_ok());
/// ```
pub fn manager_fn<R, E, C, D>(create: C, dispose: D) -> FnManager<C, D>
where
    C: Fn() -> Result<R, E>,
    D: Fn(R) -> Result<(), E>,
{
    FnManager { create, dispose }
}

impl<R, E, C, D> Manager for FnManager<C, D>
where
    C: Fn() -> Result<R, E>,
    D: Fn(R) -> Result<(), E>,
    E: fmt::Debug,
{
    type Resource = R;
    type Error = E;

    fn create(&self) -> Result<R, E> {
        (self.create)()
    }

    fn dispose(&self, resource: R) -> Result<(), E> {
        (self.dispose)(resource)
    }
}

impl<C, D> fmt::Debug for FnManager<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnManager").finish_non_exhaustive()
    }
}

impl<M: Manager + ?Sized> Manager for Arc<M> {
    type Resource = M::Resource;
    type Error = M::Error;

    fn create(&self) -> Result<Self::Resource, Self::Error> {
        (**self).create()
    }

    fn dispose(&self, resource: Self::Resource) -> Result<(), Self::Error> {
        (**self).dispose(resource)
    }
}
