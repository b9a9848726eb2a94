//! Test harness utilities shared by the dispatch and lifecycle suites.

use std::sync::{Arc, Mutex, Weak};

use crate::dispatch::{Dispatcher, Response};
use crate::error::{StatusCode, WebDriverError};
use crate::headless::{HeadlessEngine, HeadlessView};
use crate::server::ServerContext;
use crate::session::{Session, SessionManager, SessionState};
use crate::view::{
    ViewBackends, ViewCmdExecutor, ViewCmdExecutorFactory, ViewEnumerator, ViewFactory,
    ViewHandle, ViewId,
};

/// Headless engine wrapper that records factory calls and window-name reads.
///
/// Each factory call also snapshots the sessions registered at that moment,
/// so tests can inspect a session after it has left the registry.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    engine: HeadlessEngine,
    calls: Arc<Mutex<Calls>>,
}

#[derive(Debug, Default)]
struct Calls {
    created: Vec<String>,
    name_reads: usize,
    manager: Weak<SessionManager>,
    seen_sessions: Vec<Arc<Session>>,
}

impl RecordingBackend {
    /// Wraps `engine`.
    pub fn new(engine: HeadlessEngine) -> Self {
        Self {
            engine,
            calls: Arc::default(),
        }
    }

    /// Underlying engine.
    pub fn engine(&self) -> &HeadlessEngine {
        &self.engine
    }

    /// Opens a window with the given name, returning its handle.
    pub fn open_named(&self, window_name: &str) -> ViewHandle {
        self.engine.open_window("", window_name, window_name)
    }

    /// Makes reads on `handle` fail.
    pub fn break_window(handle: &ViewHandle) {
        handle
            .downcast_ref::<HeadlessView>()
            .expect("headless window")
            .set_unreadable(true);
    }

    /// Class names passed to the factory, in call order.
    pub fn created_classes(&self) -> Vec<String> {
        self.lock().created.clone()
    }

    /// Number of window-name reads issued through executors.
    pub fn name_reads(&self) -> usize {
        self.lock().name_reads
    }

    /// Sessions that were registered while the factory was being asked.
    pub fn seen_sessions(&self) -> Vec<Arc<Session>> {
        self.lock().seen_sessions.clone()
    }

    /// Context with this backend registered for every role.
    pub fn context(&self, max_sessions: usize) -> ServerContext {
        let mut backends = ViewBackends::new();
        backends
            .register_factory(Arc::new(self.clone()))
            .register_enumerator(Arc::new(self.clone()))
            .register_executor_factory(Arc::new(self.clone()));
        let sessions = Arc::new(SessionManager::new(max_sessions, None));
        self.lock().manager = Arc::downgrade(&sessions);
        ServerContext::new(sessions, Arc::new(backends), "")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().expect("calls mutex poisoned")
    }
}

impl ViewFactory for RecordingBackend {
    fn create_view_by_class_name(&self, class_name: &str) -> Option<ViewHandle> {
        let manager = self.lock().manager.upgrade();
        let registered = manager.map(|manager| manager.sessions()).unwrap_or_default();
        {
            let mut calls = self.lock();
            calls.created.push(class_name.to_owned());
            calls.seen_sessions.extend(registered);
        }
        self.engine.create_view_by_class_name(class_name)
    }
}

impl ViewEnumerator for RecordingBackend {
    fn enumerate_views(&self, state: &SessionState) -> Vec<ViewHandle> {
        self.engine.enumerate_views(state)
    }
}

impl ViewCmdExecutorFactory for RecordingBackend {
    fn create_executor(
        &self,
        state: &SessionState,
        view_id: &ViewId,
    ) -> Option<Box<dyn ViewCmdExecutor>> {
        let inner = self.engine.create_executor(state, view_id)?;
        Some(Box::new(CountingExecutor {
            inner,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct CountingExecutor {
    inner: Box<dyn ViewCmdExecutor>,
    calls: Arc<Mutex<Calls>>,
}

impl ViewCmdExecutor for CountingExecutor {
    fn view_id(&self) -> &ViewId {
        self.inner.view_id()
    }

    fn switch_to(&mut self) -> Result<(), WebDriverError> {
        self.inner.switch_to()
    }

    fn window_name(&self) -> Result<String, WebDriverError> {
        self.calls.lock().expect("calls mutex poisoned").name_reads += 1;
        self.inner.window_name()
    }

    fn title(&self) -> Result<String, WebDriverError> {
        self.inner.title()
    }

    fn url(&self) -> Result<String, WebDriverError> {
        self.inner.url()
    }

    fn close(&mut self) -> Result<(), WebDriverError> {
        self.inner.close()
    }
}

/// Scenario world shared across session lifecycle steps.
pub struct TestWorld {
    pub backend: RecordingBackend,
    pub context: ServerContext,
    pub dispatcher: Dispatcher,
    pub session_id: Option<String>,
    pub session: Option<Arc<Session>>,
    pub last_response: Option<Response>,
    pub windows: Vec<(String, ViewHandle)>,
}

impl TestWorld {
    /// World over an empty engine and a single-session registry.
    pub fn new() -> Self {
        let backend = RecordingBackend::default();
        let context = backend.context(1);
        Self {
            backend,
            context,
            dispatcher: Dispatcher::new(),
            session_id: None,
            session: None,
            last_response: None,
            windows: Vec::new(),
        }
    }

    /// Sends one request and keeps the response.
    pub fn send(&mut self, method: &str, path: &str, body: &str) -> &Response {
        let response = self
            .dispatcher
            .dispatch(&self.context, method, path, body.as_bytes());
        if response.status() == StatusCode::SeeOther {
            self.session_id = response.session_id().map(str::to_owned);
            self.session = self
                .session_id
                .as_deref()
                .and_then(|session_id| self.context.sessions().get(session_id));
        }
        self.last_response.insert(response)
    }

    /// Creates a session with the given desired capabilities.
    pub fn create_session(&mut self, desired: &serde_json::Value) -> &Response {
        let body = serde_json::json!({ "desiredCapabilities": desired }).to_string();
        self.send("POST", "/session", &body)
    }

    /// Path of the current session.
    pub fn session_path(&self, suffix: &str) -> String {
        let session_id = self.session_id.as_deref().expect("no session created");
        format!("/session/{session_id}{suffix}")
    }

    /// Status of the last response.
    pub fn last_status(&self) -> StatusCode {
        self.last_response
            .as_ref()
            .expect("no request sent")
            .status()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        self.context.sessions().terminate_all();
    }
}
