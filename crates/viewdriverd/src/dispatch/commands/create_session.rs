//! `POST /session`: capability negotiation and start-view resolution.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dispatch::{Command, DISPATCH_TARGET, Response};
use crate::error::WebDriverError;
use crate::server::ServerContext;
use crate::session::{ANY_WINDOW, Capabilities, Session, SessionState, StartView};
use crate::view::{ViewBackends, ViewCmdExecutor, ViewId};

const DESIRED_CAPABILITIES: &str = "desiredCapabilities";
const REQUIRED_CAPABILITIES: &str = "requiredCapabilities";

command! {
    /// Creates a session and redirects the client to it.
    CreateSession
}

impl Command for CreateSession {
    fn does_post(&self) -> bool {
        true
    }

    fn execute_post(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let desired = self.args.dictionary(DESIRED_CAPABILITIES).ok_or_else(|| {
            WebDriverError::bad_request(format!("Missing or invalid '{DESIRED_CAPABILITIES}'"))
        })?;
        let required = self.args.dictionary(REQUIRED_CAPABILITIES);
        let capabilities = Capabilities::new(desired.clone(), required.cloned());

        let session = context.sessions().allocate()?;
        let _entered = session.span().enter();
        if let Err(error) = start(&session, capabilities, Arc::clone(context.backends())) {
            warn!(target: DISPATCH_TARGET, %error, "session start failed");
            session.terminate();
            return Err(error);
        }

        info!(target: DISPATCH_TARGET, "session created");
        let location = format!("{}/session/{}", context.url_base(), session.id());
        Ok(Response::see_other(location).with_session_id(session.id()))
    }
}

fn start(
    session: &Session,
    capabilities: Capabilities,
    backends: Arc<ViewBackends>,
) -> Result<(), WebDriverError> {
    let attempts = capabilities.start_view_attempts();
    session.init(capabilities, backends)?;

    let view_id = resolve_start_view(session, &attempts)?.ok_or_else(|| {
        WebDriverError::unknown_error("No view ids after initialization")
    })?;
    debug!(target: DISPATCH_TARGET, %view_id, "resolved start view");

    session.run_task(move |state| switch_to(state, view_id))??;
    session.mark_running();
    Ok(())
}

/// Tries each start-view strategy in order until one yields a view.
fn resolve_start_view(
    session: &Session,
    attempts: &[StartView],
) -> Result<Option<ViewId>, WebDriverError> {
    for attempt in attempts {
        let resolved = match attempt {
            StartView::AttachByName(name) => attach_by_name(session, name)?,
            StartView::CreateByClass(class_name) => create_by_class(session, class_name)?,
        };
        if resolved.is_some() {
            return Ok(resolved);
        }
    }
    Ok(None)
}

fn attach_by_name(session: &Session, name: &str) -> Result<Option<ViewId>, WebDriverError> {
    debug!(target: DISPATCH_TARGET, name, "trying to attach to window");
    let views = session.run_task(SessionState::enumerate_views)?;

    if name == ANY_WINDOW {
        return Ok(views.into_iter().next());
    }

    for view_id in views {
        let candidate = view_id.clone();
        match session.run_task(move |state| read_window_name(state, &candidate))? {
            Ok(window_name) if window_name == name => return Ok(Some(view_id)),
            Ok(_) => {}
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %view_id, %error, "window name read failed");
                break;
            }
        }
    }

    warn!(target: DISPATCH_TARGET, name, "window not found");
    Ok(None)
}

fn create_by_class(session: &Session, class_name: &str) -> Result<Option<ViewId>, WebDriverError> {
    debug!(target: DISPATCH_TARGET, class_name, "trying to create window");
    let class_name = class_name.to_owned();
    session.run_task(move |state| state.create_view(&class_name))
}

fn read_window_name(state: &SessionState, view_id: &ViewId) -> Result<String, WebDriverError> {
    executor_for(state, view_id)?.window_name()
}

fn switch_to(state: &mut SessionState, view_id: ViewId) -> Result<(), WebDriverError> {
    executor_for(state, &view_id)?.switch_to()?;
    state.set_current_view(view_id);
    Ok(())
}

fn executor_for(
    state: &SessionState,
    view_id: &ViewId,
) -> Result<Box<dyn ViewCmdExecutor>, WebDriverError> {
    state
        .executor(view_id)
        .ok_or_else(|| WebDriverError::bad_request("cant get view executor."))
}

#[cfg(test)]
mod tests;
