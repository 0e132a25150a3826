use std::fmt::{self, Debug};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::{Manager, Pool};

/// A resource checked out of the pool.
///
/// `Entry` holds the resource and a reference to the [`Pool`].
/// When the `Entry` is dropped, the resource is released back to the pool.
pub struct Entry<'a, M: Manager> {
    // `resource` is always `Some` until the entry is dropped or detached.
    pub(crate) resource: Option<M::Resource>,
    pub(crate) pool: &'a Pool<M>,
}

impl<'a, M: Manager> Drop for Entry<'a, M> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.recycle(resource);
        }
    }
}

impl<'a, M: Manager> Deref for Entry<'a, M> {
    type Target = M::Resource;
    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<'a, M: Manager> DerefMut for Entry<'a, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut()
    }
}

impl<'a, M: Manager> Debug for Entry<'a, M>
where
    M::Resource: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "serde")]
impl<'a, M: Manager> serde::Serialize for Entry<'a, M>
where
    M::Resource: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.get().serialize(serializer)
    }
}

impl<'a, M: Manager> Entry<'a, M> {
    /// Get reference to the inner resource.
    pub fn get(&self) -> &M::Resource {
        match &self.resource {
            Some(resource) => resource,
            None => unreachable!("entry accessed after its resource was taken"),
        }
    }

    /// Get mutable reference to the inner resource.
    pub fn get_mut(&mut self) -> &mut M::Resource {
        match &mut self.resource {
            Some(resource) => resource,
            None => unreachable!("entry accessed after its resource was taken"),
        }
    }

    /// Detach the resource from the guard.
    ///
    /// The resource stays checked out; hand it back with
    /// [`Pool::release`] once done.
    ///
    /// # Example
    ///
    /// ```rust
    /// use warm_pool::{Pool, manager_fn};
    ///
    /// let pool = Pool::new(manager_fn(|| Ok::<_, String>(1u16), |_| Ok(())), 1).unwrap();
    /// let resource = pool.get().unwrap().into_inner();
    /// assert_eq!(pool.in_use(), 1);
    /// pool.release(resource).unwrap();
    /// assert_eq!(pool.in_use(), 0);
    /// ```
    pub fn into_inner(mut self) -> M::Resource {
        match self.resource.take() {
            Some(resource) => resource,
            None => unreachable!("entry accessed after its resource was taken"),
        }
    }
}

/// An owned resource checked out of the pool.
///
/// `OwnedEntry` holds the resource and an `Arc` reference to the [`Pool`],
/// so it can outlive the scope that borrowed the pool and move across
/// threads. When the `OwnedEntry` is dropped, the resource is released back
/// to the pool.
pub struct OwnedEntry<M: Manager> {
    // `resource` is always `Some` until the entry is dropped or detached.
    pub(crate) resource: Option<M::Resource>,
    pub(crate) pool: Arc<Pool<M>>,
}

impl<M: Manager> Drop for OwnedEntry<M> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.recycle(resource);
        }
    }
}

impl<M: Manager> Deref for OwnedEntry<M> {
    type Target = M::Resource;
    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<M: Manager> DerefMut for OwnedEntry<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut()
    }
}

impl<M: Manager> Debug for OwnedEntry<M>
where
    M::Resource: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedEntry")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "serde")]
impl<M: Manager> serde::Serialize for OwnedEntry<M>
where
    M::Resource: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.get().serialize(serializer)
    }
}

impl<M: Manager> OwnedEntry<M> {
    /// Get reference to the inner resource.
    pub fn get(&self) -> &M::Resource {
        match &self.resource {
            Some(resource) => resource,
            None => unreachable!("entry accessed after its resource was taken"),
        }
    }

    /// Get mutable reference to the inner resource.
    pub fn get_mut(&mut self) -> &mut M::Resource {
        match &mut self.resource {
            Some(resource) => resource,
            None => unreachable!("entry accessed after its resource was taken"),
        }
    }

    /// Get the pool this entry came from.
    pub fn pool(&self) -> &Arc<Pool<M>> {
        &self.pool
    }

    /// Detach the resource from the guard. See [`Entry::into_inner`].
    pub fn into_inner(mut self) -> M::Resource {
        match self.resource.take() {
            Some(resource) => resource,
            None => unreachable!("entry accessed after its resource was taken"),
        }
    }
}
