//! Shared ownership of engine-native views.

use std::fmt;
use std::sync::{Arc, Weak};

use downcast_rs::{DowncastSync, impl_downcast};
use tracing::debug;

use super::VIEW_TARGET;

/// Engine-side view resource exposed by a backend.
///
/// Implementations are usually only safe to drive from the session thread;
/// the trait still requires `Send + Sync` because the final release may run
/// on whichever thread drops the last [`ViewHandle`].
pub trait NativeView: DowncastSync + fmt::Debug {
    /// Engine identity of the view, stable for its lifetime.
    fn native_id(&self) -> String;

    /// Frees the engine resource. Called exactly once.
    fn release(&self);
}

impl_downcast!(sync NativeView);

#[derive(Debug)]
struct ViewResource {
    native: Box<dyn NativeView>,
}

impl Drop for ViewResource {
    fn drop(&mut self) {
        debug!(
            target: VIEW_TARGET,
            native_id = %self.native.native_id(),
            "releasing native view"
        );
        self.native.release();
    }
}

/// Reference-counted handle to one engine-native view.
///
/// Clones share the same resource; the engine view is released when the last
/// clone is dropped. Backends must hand out clones of a single handle per
/// native view so the release happens once.
#[derive(Clone)]
pub struct ViewHandle {
    resource: Arc<ViewResource>,
}

impl ViewHandle {
    /// Takes ownership of a native view.
    pub fn new(native: impl NativeView) -> Self {
        Self {
            resource: Arc::new(ViewResource {
                native: Box::new(native),
            }),
        }
    }

    /// The wrapped native view.
    #[must_use]
    pub fn native(&self) -> &dyn NativeView {
        self.resource.native.as_ref()
    }

    /// Downcasts the native view to a backend's concrete type.
    #[must_use]
    pub fn downcast_ref<T: NativeView>(&self) -> Option<&T> {
        self.native().downcast_ref::<T>()
    }

    /// Engine identity of the view.
    #[must_use]
    pub fn native_id(&self) -> String {
        self.resource.native.native_id()
    }

    /// Number of live handles sharing this view.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.resource)
    }

    /// Returns `true` when both handles refer to the same native view.
    #[must_use]
    pub fn same_view(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }

    /// Non-owning reference that does not delay the release.
    #[must_use]
    pub fn downgrade(&self) -> WeakViewHandle {
        WeakViewHandle {
            resource: Arc::downgrade(&self.resource),
        }
    }
}

/// Weak counterpart of [`ViewHandle`], for backends tracking their views.
#[derive(Clone)]
pub struct WeakViewHandle {
    resource: Weak<ViewResource>,
}

impl WeakViewHandle {
    /// Recovers a strong handle while the view is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ViewHandle> {
        self.resource.upgrade().map(|resource| ViewHandle { resource })
    }

    /// Returns `true` until the last strong handle is dropped.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.resource.strong_count() > 0
    }

    /// Returns `true` when `handle` refers to this view.
    #[must_use]
    pub fn refers_to(&self, handle: &ViewHandle) -> bool {
        std::ptr::eq(self.resource.as_ptr(), Arc::as_ptr(&handle.resource))
    }
}

impl fmt::Debug for WeakViewHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("WeakViewHandle")
            .field("live", &self.is_live())
            .finish()
    }
}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ViewHandle")
            .field("native", &self.resource.native)
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug)]
    struct CountingView {
        id: &'static str,
        releases: Arc<AtomicUsize>,
    }

    impl NativeView for CountingView {
        fn native_id(&self) -> String {
            self.id.to_owned()
        }

        fn release(&self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_handle() -> (ViewHandle, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let handle = ViewHandle::new(CountingView {
            id: "native-1",
            releases: Arc::clone(&releases),
        });
        (handle, releases)
    }

    #[test]
    fn releases_once_after_last_clone() {
        let (handle, releases) = counting_handle();
        let clone = handle.clone();
        assert_eq!(handle.ref_count(), 2);

        drop(handle);
        assert_eq!(releases.load(Ordering::SeqCst), 0);
        drop(clone);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn final_release_is_safe_from_another_thread() {
        let (handle, releases) = counting_handle();
        let clone = handle.clone();
        drop(handle);
        thread::spawn(move || drop(clone))
            .join()
            .expect("release thread");
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn weak_handle_does_not_keep_the_view_alive() {
        let (handle, releases) = counting_handle();
        let weak = handle.downgrade();
        assert!(weak.refers_to(&handle));
        assert!(weak.upgrade().is_some_and(|strong| strong.same_view(&handle)));

        drop(handle);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(!weak.is_live());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn downcasts_to_backend_type() {
        let (handle, _releases) = counting_handle();
        let native = handle
            .downcast_ref::<CountingView>()
            .expect("counting view");
        assert_eq!(native.id, "native-1");
    }
}
