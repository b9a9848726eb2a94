//! Read-only queries against the focused view.

use serde_json::Value;

use crate::dispatch::{Command, Response};
use crate::error::WebDriverError;
use crate::server::ServerContext;

command! {
    /// `GET /session/{id}/title`: document title of the focused view.
    GetTitle
}

command! {
    /// `GET /session/{id}/url`: current URL of the focused view.
    GetUrl
}

impl Command for GetTitle {
    fn does_get(&self) -> bool {
        true
    }

    fn execute_get(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let session = self.args.session(context)?;
        let title = session.run_task(|state| state.current_executor()?.title())??;
        Ok(Response::success(Value::String(title)))
    }
}

impl Command for GetUrl {
    fn does_get(&self) -> bool {
        true
    }

    fn execute_get(&self, context: &ServerContext) -> Result<Response, WebDriverError> {
        let session = self.args.session(context)?;
        let url = session.run_task(|state| state.current_executor()?.url())??;
        Ok(Response::success(Value::String(url)))
    }
}
