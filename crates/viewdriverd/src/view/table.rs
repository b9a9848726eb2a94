use std::collections::HashMap;

use super::{ViewHandle, ViewId};

/// Arena of the views a session owns, keyed by [`ViewId`].
///
/// A native view is attached at most once: attaching a handle whose native
/// view is already present returns the existing id and drops the extra
/// clone.
#[derive(Debug, Default)]
pub struct ViewTable {
    views: HashMap<ViewId, ViewHandle>,
    by_native: HashMap<String, ViewId>,
}

impl ViewTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a view and returns its id.
    pub fn attach(&mut self, handle: ViewHandle) -> ViewId {
        let native_id = handle.native_id();
        if let Some(existing) = self.by_native.get(&native_id) {
            return existing.clone();
        }

        let id = ViewId::generate();
        self.by_native.insert(native_id, id.clone());
        self.views.insert(id.clone(), handle);
        id
    }

    /// Detaches a view, handing its handle back to the caller.
    pub fn detach(&mut self, id: &ViewId) -> Option<ViewHandle> {
        let handle = self.views.remove(id)?;
        self.by_native.remove(&handle.native_id());
        Some(handle)
    }

    /// Looks up a view by id.
    #[must_use]
    pub fn get(&self, id: &ViewId) -> Option<&ViewHandle> {
        self.views.get(id)
    }

    /// Returns `true` when the id is attached.
    #[must_use]
    pub fn contains(&self, id: &ViewId) -> bool {
        self.views.contains_key(id)
    }

    /// Ids of every attached view, in no particular order.
    #[must_use]
    pub fn ids(&self) -> Vec<ViewId> {
        self.views.keys().cloned().collect()
    }

    /// Number of attached views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns `true` when no view is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Drops every handle and returns how many were held.
    pub fn release_all(&mut self) -> usize {
        let released = self.views.len();
        self.by_native.clear();
        self.views.clear();
        released
    }
}
