//! In-process reference backend.
//!
//! [`HeadlessEngine`] keeps a list of pretend browser windows and implements
//! every view plug-in role over them. The server registers it by default and
//! tests use it to drive the full protocol without a real browser.
//!
//! Windows created through the factory live only as long as some session
//! holds a handle to them. Windows opened with [`HeadlessEngine::open_window`]
//! stand for windows the user opened and stay open until closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::WebDriverError;
use crate::session::SessionState;
use crate::view::{
    NativeView, ViewBackends, ViewCmdExecutor, ViewCmdExecutorFactory, ViewEnumerator,
    ViewFactory, ViewHandle, ViewId, WeakViewHandle,
};

/// Tracing target for the headless backend.
const HEADLESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::headless");

/// Class created when a client asks for the default class `""`.
pub const DEFAULT_VIEW_CLASS: &str = "browser";

/// URL of a freshly opened window.
pub const BLANK_URL: &str = "about:blank";

/// A pretend browser with a set of supported window classes.
#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    classes: Vec<String>,
    windows: Mutex<Windows>,
}

#[derive(Debug, Default)]
struct Windows {
    open: Vec<OpenWindow>,
    focused: Option<String>,
    next_id: u64,
}

#[derive(Debug)]
struct OpenWindow {
    native_id: String,
    view: WeakViewHandle,
    pinned: Option<ViewHandle>,
}

impl Windows {
    /// Forgets windows whose last handle is gone.
    fn prune(&mut self) {
        self.open.retain(|window| window.view.is_live());
        let focused_open = self.focused.as_deref().is_some_and(|focused| {
            self.open.iter().any(|window| window.native_id == focused)
        });
        if !focused_open {
            self.focused = None;
        }
    }
}

impl HeadlessEngine {
    /// Engine supporting only [`DEFAULT_VIEW_CLASS`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_classes([DEFAULT_VIEW_CLASS])
    }

    /// Engine supporting the given window classes.
    pub fn with_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Arc::new(EngineInner {
                classes: classes.into_iter().map(Into::into).collect(),
                windows: Mutex::new(Windows::default()),
            }),
        }
    }

    /// Registers this engine for every plug-in role.
    pub fn register(&self, backends: &mut ViewBackends) {
        backends
            .register_factory(Arc::new(self.clone()))
            .register_enumerator(Arc::new(self.clone()))
            .register_executor_factory(Arc::new(self.clone()));
    }

    /// Returns `true` when `class_name` (or the default for `""`) is supported.
    #[must_use]
    pub fn supports(&self, class_name: &str) -> bool {
        let class_name = resolve_class(class_name);
        self.inner.classes.iter().any(|class| class == class_name)
    }

    /// Opens a window directly, as if the user or the page had done so.
    ///
    /// The engine keeps the window open until it is closed through an
    /// executor.
    pub fn open_window(&self, class_name: &str, window_name: &str, title: &str) -> ViewHandle {
        self.open(class_name, window_name, title, true)
    }

    /// Handles of every open window, oldest first.
    #[must_use]
    pub fn windows(&self) -> Vec<ViewHandle> {
        let mut windows = self.lock_windows();
        windows.prune();
        windows
            .open
            .iter()
            .filter_map(|window| window.view.upgrade())
            .collect()
    }

    /// Native id of the focused window.
    #[must_use]
    pub fn focused(&self) -> Option<String> {
        let mut windows = self.lock_windows();
        windows.prune();
        windows.focused.clone()
    }

    fn open(&self, class_name: &str, window_name: &str, title: &str, pinned: bool) -> ViewHandle {
        let mut windows = self.lock_windows();
        windows.prune();
        windows.next_id += 1;
        let view = HeadlessView {
            native_id: format!("headless-{}", windows.next_id),
            class_name: resolve_class(class_name).to_owned(),
            props: Mutex::new(ViewProps {
                window_name: window_name.to_owned(),
                title: title.to_owned(),
                url: BLANK_URL.to_owned(),
            }),
            unreadable: AtomicBool::new(false),
            released: Arc::new(AtomicBool::new(false)),
        };
        debug!(
            target: HEADLESS_TARGET,
            native_id = %view.native_id,
            class_name = %view.class_name,
            pinned,
            "opened window"
        );
        let native_id = view.native_id.clone();
        let handle = ViewHandle::new(view);
        windows.open.push(OpenWindow {
            native_id,
            view: handle.downgrade(),
            pinned: pinned.then(|| handle.clone()),
        });
        handle
    }

    fn is_open(&self, handle: &ViewHandle) -> bool {
        self.lock_windows()
            .open
            .iter()
            .any(|window| window.view.refers_to(handle))
    }

    fn focus(&self, native_id: &str) {
        self.lock_windows().focused = Some(native_id.to_owned());
    }

    fn close(&self, handle: &ViewHandle) {
        let pinned = {
            let mut windows = self.lock_windows();
            let position = windows
                .open
                .iter()
                .position(|window| window.view.refers_to(handle));
            let closed = position.map(|index| windows.open.remove(index));
            let native_id = handle.native_id();
            if windows.focused.as_deref() == Some(native_id.as_str()) {
                windows.focused = None;
            }
            debug!(target: HEADLESS_TARGET, %native_id, "closed window");
            closed.and_then(|window| window.pinned)
        };
        drop(pinned);
    }

    fn lock_windows(&self) -> MutexGuard<'_, Windows> {
        self.inner
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_class(class_name: &str) -> &str {
    if class_name.is_empty() {
        DEFAULT_VIEW_CLASS
    } else {
        class_name
    }
}

/// One pretend window.
#[derive(Debug)]
pub struct HeadlessView {
    native_id: String,
    class_name: String,
    props: Mutex<ViewProps>,
    unreadable: AtomicBool,
    released: Arc<AtomicBool>,
}

#[derive(Debug, Clone)]
struct ViewProps {
    window_name: String,
    title: String,
    url: String,
}

impl HeadlessView {
    /// Class the window was opened with.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Changes the window name.
    pub fn set_window_name(&self, window_name: &str) {
        self.props().window_name = window_name.to_owned();
    }

    /// Simulates navigation.
    pub fn navigate(&self, url: &str, title: &str) {
        let mut props = self.props();
        props.url = url.to_owned();
        props.title = title.to_owned();
    }

    /// Makes property reads fail, as a crashed renderer would.
    pub fn set_unreadable(&self, unreadable: bool) {
        self.unreadable.store(unreadable, Ordering::SeqCst);
    }

    /// Flag flipped once the engine resource has been released.
    #[must_use]
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }

    fn read<T>(&self, read: impl FnOnce(&ViewProps) -> T) -> Result<T, WebDriverError> {
        if self.unreadable.load(Ordering::SeqCst) {
            return Err(WebDriverError::unknown_error(format!(
                "window {} is not responding",
                self.native_id
            )));
        }
        Ok(read(&self.props()))
    }

    fn props(&self) -> MutexGuard<'_, ViewProps> {
        self.props.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NativeView for HeadlessView {
    fn native_id(&self) -> String {
        self.native_id.clone()
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

impl ViewFactory for HeadlessEngine {
    fn create_view_by_class_name(&self, class_name: &str) -> Option<ViewHandle> {
        self.supports(class_name)
            .then(|| self.open(class_name, "", "", false))
    }
}

impl ViewEnumerator for HeadlessEngine {
    fn enumerate_views(&self, _state: &SessionState) -> Vec<ViewHandle> {
        self.windows()
    }
}

impl ViewCmdExecutorFactory for HeadlessEngine {
    fn create_executor(
        &self,
        state: &SessionState,
        view_id: &ViewId,
    ) -> Option<Box<dyn ViewCmdExecutor>> {
        let handle = state.views().get(view_id)?;
        handle.downcast_ref::<HeadlessView>()?;
        if !self.is_open(handle) {
            return None;
        }
        Some(Box::new(HeadlessExecutor {
            view_id: view_id.clone(),
            handle: handle.clone(),
            engine: self.clone(),
        }))
    }
}

struct HeadlessExecutor {
    view_id: ViewId,
    handle: ViewHandle,
    engine: HeadlessEngine,
}

impl HeadlessExecutor {
    fn view(&self) -> Result<&HeadlessView, WebDriverError> {
        if !self.engine.is_open(&self.handle) {
            return Err(WebDriverError::no_such_window(format!(
                "window {} was closed",
                self.view_id
            )));
        }
        self.handle
            .downcast_ref::<HeadlessView>()
            .ok_or_else(|| WebDriverError::unknown_error("view is not a headless window"))
    }
}

impl ViewCmdExecutor for HeadlessExecutor {
    fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    fn switch_to(&mut self) -> Result<(), WebDriverError> {
        let view = self.view()?;
        view.read(|_| ())?;
        self.engine.focus(&view.native_id);
        Ok(())
    }

    fn window_name(&self) -> Result<String, WebDriverError> {
        self.view()?.read(|props| props.window_name.clone())
    }

    fn title(&self) -> Result<String, WebDriverError> {
        self.view()?.read(|props| props.title.clone())
    }

    fn url(&self) -> Result<String, WebDriverError> {
        self.view()?.read(|props| props.url.clone())
    }

    fn close(&mut self) -> Result<(), WebDriverError> {
        self.view()?;
        self.engine.close(&self.handle);
        Ok(())
    }
}
