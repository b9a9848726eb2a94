//! Client sessions and their single-thread task queue.
//!
//! Each session owns one dedicated OS thread. Engine views may only be driven
//! from that thread, so every operation touching a session's views is shipped
//! to it as a task via [`Session::run_task`]. The calling thread blocks until
//! its own task has run; tasks for one session run strictly in submission
//! order while different sessions proceed independently.
//!
//! Lifecycle: `Created → Running → Terminating → Terminated`. Termination
//! stops new submissions, lets queued tasks drain, then releases every view
//! on the session thread. With a task timeout configured, the terminating
//! caller waits at most that long for the thread before detaching it.

mod capabilities;
pub mod manager;
mod state;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use tracing::{Span, debug, error, info, info_span, warn};

pub use self::capabilities::{
    ANY_WINDOW, BROWSER_CLASS, BROWSER_START_WINDOW, Capabilities, StartView,
};
pub use self::manager::SessionManager;
pub use self::state::SessionState;
use crate::error::WebDriverError;
use crate::view::ViewBackends;

/// Tracing target for session lifecycle and task execution.
pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Number of tasks that may wait in a session queue before submitters block.
pub const SESSION_QUEUE_DEPTH: usize = 64;

const THREAD_NAME_PREFIX: &str = "viewdriver-session-";

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Allocated; negotiation in progress.
    Created,
    /// A view is attached and focused.
    Running,
    /// Draining; new tasks are rejected.
    Terminating,
    /// Final.
    Terminated,
}

type Task = Box<dyn FnOnce(&mut SessionState) + Send>;
type TaskOutcome<R> = Result<R, Box<dyn std::any::Any + Send>>;

struct Control {
    sender: Option<SyncSender<Task>>,
    worker: Option<Worker>,
}

struct Worker {
    thread: JoinHandle<()>,
    finished: Receiver<()>,
}

/// Server-side state for one automation client.
pub struct Session {
    id: String,
    capabilities: OnceLock<Capabilities>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    control: Mutex<Control>,
    worker_thread: OnceLock<ThreadId>,
    task_timeout: Option<Duration>,
    manager: Weak<SessionManager>,
    span: Span,
}

impl Session {
    /// Creates a session in the `Created` state. No thread runs until
    /// [`Session::init`] succeeds.
    pub(crate) fn new(
        id: String,
        task_timeout: Option<Duration>,
        manager: Weak<SessionManager>,
    ) -> Self {
        let span = info_span!(target: SESSION_TARGET, "session", id = %id);
        Self {
            id,
            capabilities: OnceLock::new(),
            lifecycle: Arc::new(Mutex::new(Lifecycle::Created)),
            control: Mutex::new(Control {
                sender: None,
                worker: None,
            }),
            worker_thread: OnceLock::new(),
            task_timeout,
            manager,
            span,
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Negotiated capabilities; empty until initialised.
    #[must_use]
    pub fn capabilities(&self) -> Option<&Capabilities> {
        self.capabilities.get()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        *lock(&self.lifecycle)
    }

    /// Span carrying the session id for log correlation.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Records the capabilities, checks backend registration and starts the
    /// session thread.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotCreated` for an incomplete backend registry, a
    /// repeated call, or a failure to spawn the thread.
    pub fn init(
        &self,
        capabilities: Capabilities,
        backends: Arc<ViewBackends>,
    ) -> Result<(), WebDriverError> {
        backends.ensure_complete()?;

        let mut control = lock(&self.control);
        if self.lifecycle() != Lifecycle::Created || control.worker.is_some() {
            return Err(WebDriverError::session_not_created(format!(
                "session {} is already initialised",
                self.id
            )));
        }
        self.capabilities
            .set(capabilities)
            .map_err(|_| WebDriverError::session_not_created("capabilities already set"))?;

        let (sender, receiver) = mpsc::sync_channel::<Task>(SESSION_QUEUE_DEPTH);
        let (finished_tx, finished) = mpsc::sync_channel::<()>(1);
        let state = SessionState::new(backends);
        let lifecycle = Arc::clone(&self.lifecycle);
        let span = self.span.clone();
        let thread = thread::Builder::new()
            .name(thread_name(&self.id))
            .spawn(move || {
                serve(receiver, state, lifecycle, span);
                let _ = finished_tx.send(());
            })
            .map_err(|source| {
                WebDriverError::session_not_created(format!(
                    "failed to start session thread: {source}"
                ))
            })?;

        let _ = self.worker_thread.set(thread.thread().id());
        control.sender = Some(sender);
        control.worker = Some(Worker { thread, finished });
        debug!(target: SESSION_TARGET, parent: &self.span, "session initialised");
        Ok(())
    }

    /// Moves a freshly initialised session into `Running`.
    pub(crate) fn mark_running(&self) -> bool {
        let mut lifecycle = lock(&self.lifecycle);
        if *lifecycle == Lifecycle::Created {
            *lifecycle = Lifecycle::Running;
            true
        } else {
            false
        }
    }

    /// Runs `task` on the session thread and waits for its result.
    ///
    /// # Errors
    ///
    /// * `SessionNotFound` once termination has started or before the thread
    ///   exists.
    /// * `Timeout` when a task timeout is configured and elapses; the task
    ///   still runs to completion on the session thread.
    /// * `UnknownError` if the task panics or when called from the session
    ///   thread itself.
    pub fn run_task<R, F>(&self, task: F) -> Result<R, WebDriverError>
    where
        F: FnOnce(&mut SessionState) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.on_session_thread() {
            return Err(WebDriverError::unknown_error(
                "session tasks cannot be submitted from the session thread",
            ));
        }

        let sender = {
            let control = lock(&self.control);
            match (self.lifecycle(), &control.sender) {
                (Lifecycle::Created | Lifecycle::Running, Some(sender)) => sender.clone(),
                _ => return Err(WebDriverError::session_not_found(&self.id)),
            }
        };

        let (done, outcome) = mpsc::sync_channel::<TaskOutcome<R>>(1);
        let wrapped: Task = Box::new(move |state: &mut SessionState| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| task(state)));
            if result.is_err() {
                error!(target: SESSION_TARGET, "session task panicked");
            }
            // The submitter may have stopped waiting after a timeout.
            let _ = done.send(result);
        });
        sender
            .send(wrapped)
            .map_err(|_| WebDriverError::session_not_found(&self.id))?;
        drop(sender);

        let received = match self.task_timeout {
            Some(timeout) => outcome.recv_timeout(timeout).map_err(|error| match error {
                RecvTimeoutError::Timeout => {
                    warn!(
                        target: SESSION_TARGET,
                        parent: &self.span,
                        timeout_ms = timeout.as_millis(),
                        "session task timed out"
                    );
                    WebDriverError::timeout(format!(
                        "session task did not finish within {}ms",
                        timeout.as_millis()
                    ))
                }
                RecvTimeoutError::Disconnected => WebDriverError::session_not_found(&self.id),
            })?,
            None => outcome
                .recv()
                .map_err(|_| WebDriverError::session_not_found(&self.id))?,
        };

        received.map_err(|_| {
            WebDriverError::unknown_error(format!("task in session {} panicked", self.id))
        })
    }

    /// Terminates the session. Idempotent and callable from any thread.
    ///
    /// The session leaves the manager immediately, so later lookups fail.
    /// Unless called from the session thread, waits for queued tasks to
    /// drain and for the views to be released. With a task timeout the wait
    /// is bounded by it; a thread still busy afterwards is detached and
    /// finishes the release on its own.
    pub fn terminate(&self) {
        let worker = {
            let mut control = lock(&self.control);
            {
                let mut lifecycle = lock(&self.lifecycle);
                match *lifecycle {
                    Lifecycle::Terminating | Lifecycle::Terminated => return,
                    Lifecycle::Created | Lifecycle::Running => {}
                }
                *lifecycle = if control.worker.is_some() {
                    Lifecycle::Terminating
                } else {
                    Lifecycle::Terminated
                };
            }
            control.sender = None;
            control.worker.take()
        };

        info!(target: SESSION_TARGET, parent: &self.span, "terminating session");
        if let Some(manager) = self.manager.upgrade() {
            manager.remove(&self.id);
        }

        let Some(worker) = worker else {
            return;
        };
        if self.on_session_thread() {
            return;
        }
        if let Some(timeout) = self.task_timeout {
            if let Err(RecvTimeoutError::Timeout) = worker.finished.recv_timeout(timeout) {
                warn!(
                    target: SESSION_TARGET,
                    parent: &self.span,
                    timeout_ms = timeout.as_millis(),
                    "session thread still busy; detaching"
                );
                return;
            }
        }
        if worker.thread.join().is_err() {
            error!(target: SESSION_TARGET, parent: &self.span, "session thread panicked");
            *lock(&self.lifecycle) = Lifecycle::Terminated;
        }
    }

    fn on_session_thread(&self) -> bool {
        self.worker_thread
            .get()
            .is_some_and(|worker| *worker == thread::current().id())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle())
            .finish_non_exhaustive()
    }
}

fn serve(
    receiver: mpsc::Receiver<Task>,
    mut state: SessionState,
    lifecycle: Arc<Mutex<Lifecycle>>,
    span: Span,
) {
    let _entered = span.enter();
    debug!(target: SESSION_TARGET, "session thread started");

    for task in receiver {
        task(&mut state);
    }

    let released = state.release_views();
    *lock(&lifecycle) = Lifecycle::Terminated;
    info!(target: SESSION_TARGET, released, "session terminated");
}

fn thread_name(session_id: &str) -> String {
    let prefix: String = session_id.chars().take(8).collect();
    format!("{THREAD_NAME_PREFIX}{prefix}")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
