//! Plug-in seams between the protocol core and a browser engine.
//!
//! A backend supplies up to three roles: creating views by class name,
//! enumerating the views it already has, and building per-operation command
//! executors. [`ViewBackends`] collects the registered implementations and
//! consults them in registration order.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{VIEW_TARGET, ViewHandle, ViewId};
use crate::error::WebDriverError;
use crate::session::SessionState;

/// Creates engine views on demand.
#[cfg_attr(test, mockall::automock)]
pub trait ViewFactory: Send + Sync {
    /// Creates a view of the given class; `""` names the default browser
    /// window class. Returns `None` when the class is not recognised.
    fn create_view_by_class_name(&self, class_name: &str) -> Option<ViewHandle>;
}

/// Reports the views an engine currently has open.
#[cfg_attr(test, mockall::automock)]
pub trait ViewEnumerator: Send + Sync {
    /// Lists open views. Runs on the session thread.
    fn enumerate_views(&self, state: &SessionState) -> Vec<ViewHandle>;
}

/// Builds command executors for attached views.
#[cfg_attr(test, mockall::automock)]
pub trait ViewCmdExecutorFactory: Send + Sync {
    /// Returns an executor bound to `view_id`, or `None` when the view does
    /// not belong to this backend. Executors are created per operation.
    fn create_executor(
        &self,
        state: &SessionState,
        view_id: &ViewId,
    ) -> Option<Box<dyn ViewCmdExecutor>>;
}

/// Operations on one view. Only ever driven from the session thread.
pub trait ViewCmdExecutor {
    /// Id of the view this executor drives.
    fn view_id(&self) -> &ViewId;

    /// Makes the view the engine's focused view.
    fn switch_to(&mut self) -> Result<(), WebDriverError>;

    /// Window name used by attach-by-name and window switching.
    fn window_name(&self) -> Result<String, WebDriverError>;

    /// Document title.
    fn title(&self) -> Result<String, WebDriverError>;

    /// Current document URL.
    fn url(&self) -> Result<String, WebDriverError>;

    /// Closes the engine view.
    fn close(&mut self) -> Result<(), WebDriverError>;
}

/// Ordered registry of backend implementations.
#[derive(Clone, Default)]
pub struct ViewBackends {
    factories: Vec<Arc<dyn ViewFactory>>,
    enumerators: Vec<Arc<dyn ViewEnumerator>>,
    executor_factories: Vec<Arc<dyn ViewCmdExecutorFactory>>,
}

impl ViewBackends {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a view factory.
    pub fn register_factory(&mut self, factory: Arc<dyn ViewFactory>) -> &mut Self {
        self.factories.push(factory);
        self
    }

    /// Appends a view enumerator.
    pub fn register_enumerator(&mut self, enumerator: Arc<dyn ViewEnumerator>) -> &mut Self {
        self.enumerators.push(enumerator);
        self
    }

    /// Appends an executor factory.
    pub fn register_executor_factory(
        &mut self,
        factory: Arc<dyn ViewCmdExecutorFactory>,
    ) -> &mut Self {
        self.executor_factories.push(factory);
        self
    }

    /// Checks that every role has at least one implementation.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotCreated` naming the first missing role.
    pub fn ensure_complete(&self) -> Result<(), WebDriverError> {
        let missing = if self.factories.is_empty() {
            Some("view factory")
        } else if self.enumerators.is_empty() {
            Some("view enumerator")
        } else if self.executor_factories.is_empty() {
            Some("view executor factory")
        } else {
            None
        };
        match missing {
            Some(role) => Err(WebDriverError::session_not_created(format!(
                "no {role} registered"
            ))),
            None => Ok(()),
        }
    }

    /// Asks each factory in turn; the first to recognise the class wins.
    #[must_use]
    pub fn create_view(&self, class_name: &str) -> Option<ViewHandle> {
        let created = self
            .factories
            .iter()
            .find_map(|factory| factory.create_view_by_class_name(class_name));
        if created.is_none() {
            debug!(target: VIEW_TARGET, class_name, "no factory recognised view class");
        }
        created
    }

    /// Concatenates the views reported by every enumerator.
    #[must_use]
    pub fn enumerate(&self, state: &SessionState) -> Vec<ViewHandle> {
        self.enumerators
            .iter()
            .flat_map(|enumerator| enumerator.enumerate_views(state))
            .collect()
    }

    /// Asks each executor factory in turn for an executor bound to `view_id`.
    #[must_use]
    pub fn executor(
        &self,
        state: &SessionState,
        view_id: &ViewId,
    ) -> Option<Box<dyn ViewCmdExecutor>> {
        self.executor_factories
            .iter()
            .find_map(|factory| factory.create_executor(state, view_id))
    }
}

impl fmt::Debug for ViewBackends {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ViewBackends")
            .field("factories", &self.factories.len())
            .field("enumerators", &self.enumerators.len())
            .field("executor_factories", &self.executor_factories.len())
            .finish()
    }
}
