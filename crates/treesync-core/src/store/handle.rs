//! Shared store handle.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use treesync_proto::{NodeId, Patch, SerializedElement};

use super::{Diagnostic, NodeData, SubscriptionId, TreeStore};

/// Cloneable handle to a [`TreeStore`].
///
/// Clients take a handle at construction so independent sessions can each
/// own a store. [`StoreHandle::global`] exists for the outermost composition
/// point only.
///
/// Mutations lock the store, apply, release the lock and only then fire
/// listeners, so a listener may read the store through the same handle.
#[derive(Clone, Default)]
pub struct StoreHandle {
    inner: Arc<Mutex<TreeStore>>,
}

impl StoreHandle {
    /// Handle to a fresh, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide store.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<StoreHandle> = OnceLock::new();
        GLOBAL.get_or_init(Self::new).clone()
    }

    /// See [`TreeStore::set_tree`].
    pub fn set_tree(&self, root: &SerializedElement) -> Vec<Diagnostic> {
        let pending = self.lock().set_tree(root);
        pending.fire()
    }

    /// See [`TreeStore::apply_patches`].
    pub fn apply_patches(&self, patches: &[Patch]) -> Vec<Diagnostic> {
        let pending = self.lock().apply_patches(patches);
        pending.fire()
    }

    /// See [`TreeStore::node`].
    pub fn node(&self, id: &str) -> Option<Arc<NodeData>> {
        self.lock().node(id)
    }

    /// See [`TreeStore::root_id`].
    pub fn root_id(&self) -> Option<NodeId> {
        self.lock().root_id().cloned()
    }

    /// See [`TreeStore::subscribe_node`].
    pub fn subscribe_node<F>(&self, id: impl Into<NodeId>, listener: F) -> SubscriptionId
    where
        F: Fn(&NodeId, &Arc<NodeData>) + Send + Sync + 'static,
    {
        self.lock().subscribe_node(id, listener)
    }

    /// See [`TreeStore::subscribe_global`].
    pub fn subscribe_global<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.lock().subscribe_global(listener)
    }

    /// See [`TreeStore::unsubscribe`].
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.lock().unsubscribe(subscription)
    }

    /// Run a read-only closure against the store.
    pub fn read<R>(&self, f: impl FnOnce(&TreeStore) -> R) -> R {
        f(&self.lock())
    }

    /// Whether two handles share a store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> MutexGuard<'_, TreeStore> {
        // A listener panic cannot leave the map half-written: listeners run
        // after the lock is released.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StoreHandle").field(&Arc::as_ptr(&self.inner)).finish()
    }
}
