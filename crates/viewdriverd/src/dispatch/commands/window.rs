//! Window handle commands.

use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::{Command, DISPATCH_TARGET, Response};
use crate::error::WebDriverError;
use crate::server::ServerContext;
use crate::session::SessionState;
use crate::view::ViewId;

command! {
    /// `GET /session/{id}/window_handle`: the focused view id.
    GetWindowHandle
}

command! {
    /// `GET /session/{id}/window_handles`: every open view id.
    GetWindowHandles
}

command! {
    /// `POST /session/{id}/window` switches focus by handle or window name;
    /// `DELETE` closes the focused window.
    WindowCommand
}

impl Command for GetWindowHandle {
    fn does_get(&self) -> bool {
        true
    }

    fn execute_get(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let session = self.args.session(context)?;
        let current = session.run_task(|state| {
            let current = state.current_view();
            if current.is_valid() && state.views().contains(current) {
                Ok(current.clone())
            } else {
                Err(WebDriverError::no_such_window("no current window"))
            }
        })??;
        Ok(Response::success(Value::String(current.to_string())))
    }
}

impl Command for GetWindowHandles {
    fn does_get(&self) -> bool {
        true
    }

    fn execute_get(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let session = self.args.session(context)?;
        let handles = session.run_task(SessionState::enumerate_views)?;
        Ok(Response::success(Value::Array(
            handles
                .iter()
                .map(|handle| Value::String(handle.to_string()))
                .collect(),
        )))
    }
}

impl Command for WindowCommand {
    fn does_post(&self) -> bool {
        true
    }

    fn does_delete(&self) -> bool {
        true
    }

    fn execute_post(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let name = self.args.require_string("name")?.to_owned();
        let session = self.args.session(context)?;
        let _entered = session.span().enter();
        let view_id = session.run_task(move |state| switch_by_name(state, &name))??;
        debug!(target: DISPATCH_TARGET, %view_id, "switched window");
        Ok(Response::success(Value::Null))
    }

    fn execute_delete(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let session = self.args.session(context)?;
        let _entered = session.span().enter();
        let closed = session.run_task(close_current)??;
        debug!(target: DISPATCH_TARGET, view_id = %closed, "closed window");
        Ok(Response::success(Value::Null))
    }
}

/// Focuses the view whose handle or window name equals `name`.
fn switch_by_name(state: &mut SessionState, name: &str) -> Result<ViewId, WebDriverError> {
    let views = state.enumerate_views();
    let by_handle = views.iter().find(|view_id| view_id.as_str() == name).cloned();
    let target = by_handle.or_else(|| {
        views.into_iter().find(|view_id| {
            state.executor(view_id).is_some_and(|executor| {
                executor
                    .window_name()
                    .inspect_err(|error| {
                        warn!(target: DISPATCH_TARGET, %view_id, %error, "window name read failed");
                    })
                    .is_ok_and(|window_name| window_name == name)
            })
        })
    });
    let view_id =
        target.ok_or_else(|| WebDriverError::no_such_window(format!("no window named {name}")))?;

    let mut executor = state
        .executor(&view_id)
        .ok_or_else(|| WebDriverError::no_such_window(format!("window {view_id} is not open")))?;
    executor.switch_to()?;
    state.set_current_view(view_id.clone());
    Ok(view_id)
}

/// Closes the focused view and detaches it from the session.
fn close_current(state: &mut SessionState) -> Result<ViewId, WebDriverError> {
    let view_id = state.current_view().clone();
    state.current_executor()?.close()?;
    state.detach_view(&view_id);
    Ok(view_id)
}
