//! Mutable per-session view state, owned by the session thread.

use std::sync::Arc;

use tracing::debug;

use super::SESSION_TARGET;
use crate::error::WebDriverError;
use crate::view::{ViewBackends, ViewCmdExecutor, ViewHandle, ViewId, ViewTable};

/// Views attached to a session plus the currently focused one.
///
/// Only reachable from inside a session task, so backends may assume every
/// call on it happens on the session thread.
#[derive(Debug)]
pub struct SessionState {
    views: ViewTable,
    current_view: ViewId,
    backends: Arc<ViewBackends>,
}

impl SessionState {
    /// Creates state with no views attached.
    #[must_use]
    pub fn new(backends: Arc<ViewBackends>) -> Self {
        Self {
            views: ViewTable::new(),
            current_view: ViewId::default(),
            backends,
        }
    }

    /// The registered backends.
    #[must_use]
    pub fn backends(&self) -> &ViewBackends {
        &self.backends
    }

    /// The attached views.
    #[must_use]
    pub fn views(&self) -> &ViewTable {
        &self.views
    }

    /// Focused view; invalid when none is selected.
    #[must_use]
    pub fn current_view(&self) -> &ViewId {
        &self.current_view
    }

    /// Selects the focused view.
    pub fn set_current_view(&mut self, view_id: ViewId) {
        self.current_view = view_id;
    }

    /// Attaches a handle, returning the existing id if already attached.
    pub fn attach_view(&mut self, handle: ViewHandle) -> ViewId {
        self.views.attach(handle)
    }

    /// Detaches a view; clears the focus if it pointed at that view.
    pub fn detach_view(&mut self, view_id: &ViewId) -> Option<ViewHandle> {
        if &self.current_view == view_id {
            self.current_view = ViewId::default();
        }
        self.views.detach(view_id)
    }

    /// Enumerates open views across backends and attaches each of them.
    ///
    /// Returns ids in backend order.
    pub fn enumerate_views(&mut self) -> Vec<ViewId> {
        let backends = Arc::clone(&self.backends);
        backends
            .enumerate(self)
            .into_iter()
            .map(|handle| self.views.attach(handle))
            .collect()
    }

    /// Creates a view of `class_name` and attaches it.
    pub fn create_view(&mut self, class_name: &str) -> Option<ViewId> {
        let handle = self.backends.create_view(class_name)?;
        let view_id = self.views.attach(handle);
        debug!(target: SESSION_TARGET, %view_id, class_name, "created view");
        Some(view_id)
    }

    /// Builds a transient executor for an attached view.
    #[must_use]
    pub fn executor(&self, view_id: &ViewId) -> Option<Box<dyn ViewCmdExecutor>> {
        if !self.views.contains(view_id) {
            return None;
        }
        self.backends.executor(self, view_id)
    }

    /// Executor for the focused view.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchWindow` when no view is focused or the focused view has
    /// no executor.
    pub fn current_executor(&self) -> Result<Box<dyn ViewCmdExecutor>, WebDriverError> {
        if !self.current_view.is_valid() {
            return Err(WebDriverError::no_such_window("no current window"));
        }
        self.executor(&self.current_view).ok_or_else(|| {
            WebDriverError::no_such_window(format!("window {} is not open", self.current_view))
        })
    }

    /// Drops every attached handle. Returns how many were held.
    pub(crate) fn release_views(&mut self) -> usize {
        self.current_view = ViewId::default();
        self.views.release_all()
    }
}
