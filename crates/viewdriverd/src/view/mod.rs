//! Browser views as seen by the protocol core.
//!
//! Views are engine windows or tabs. The core refers to them through
//! session-scoped [`ViewId`]s kept in a [`ViewTable`], while backends hand out
//! shared [`ViewHandle`]s wrapping their [`NativeView`] resources.

mod backend;
mod handle;
mod id;
mod table;

pub use self::backend::{
    ViewBackends, ViewCmdExecutor, ViewCmdExecutorFactory, ViewEnumerator, ViewFactory,
};
#[cfg(test)]
pub(crate) use self::backend::{MockViewCmdExecutorFactory, MockViewEnumerator, MockViewFactory};
pub use self::handle::{NativeView, ViewHandle, WeakViewHandle};
pub use self::id::ViewId;
pub use self::table::ViewTable;

/// Tracing target for view lifecycle events.
pub(crate) const VIEW_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::view");
