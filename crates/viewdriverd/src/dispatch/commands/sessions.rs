//! Registry-level session commands.

use serde_json::{Value, json};
use tracing::info;

use crate::dispatch::{Command, DISPATCH_TARGET, Response};
use crate::error::WebDriverError;
use crate::server::ServerContext;
use crate::session::Session;

command! {
    /// `GET /sessions`: every live session with its capabilities.
    ListSessions, ignores_args
}

command! {
    /// `GET /session/{id}` returns the capabilities; `DELETE` terminates it.
    SessionWithId
}

fn capabilities_value(session: &Session) -> Value {
    session
        .capabilities()
        .map_or_else(|| json!({}), |capabilities| Value::Object(capabilities.merged()))
}

impl Command for ListSessions {
    fn does_get(&self) -> bool {
        true
    }

    fn execute_get(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let sessions: Vec<Value> = context
            .sessions()
            .sessions()
            .iter()
            .map(|session| {
                json!({
                    "id": session.id(),
                    "capabilities": capabilities_value(session),
                })
            })
            .collect();
        Ok(Response::success(Value::Array(sessions)))
    }
}

impl Command for SessionWithId {
    fn does_get(&self) -> bool {
        true
    }

    fn does_delete(&self) -> bool {
        true
    }

    fn execute_get(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let session = self.args.session(context)?;
        Ok(Response::success(capabilities_value(&session)).with_session_id(session.id()))
    }

    fn execute_delete(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let session = self.args.session(context)?;
        let _entered = session.span().enter();
        session.terminate();
        info!(target: DISPATCH_TARGET, "session deleted");
        Ok(Response::success(Value::Null).with_session_id(session.id()))
    }
}
