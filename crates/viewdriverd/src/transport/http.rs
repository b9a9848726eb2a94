//! axum router and the protocol-to-HTTP response mapping.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode as HttpStatus, Uri, header};
use axum::response::{IntoResponse, Response as HttpResponse};
use tracing::error;

use super::LISTENER_TARGET;
use crate::dispatch::Response;
use crate::error::StatusCode;
use crate::server::Server;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Router sending every request to `server`.
pub fn router(server: Arc<Server>) -> Router {
    Router::new().fallback(handle_request).with_state(server)
}

async fn handle_request(
    State(server): State<Arc<Server>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> HttpResponse {
    let path = uri.path().to_owned();
    let dispatched = tokio::task::spawn_blocking(move || {
        server.handle(method.as_str(), &path, &body)
    })
    .await;

    match dispatched {
        Ok(response) => into_http_response(&response),
        Err(join_error) => {
            error!(target: LISTENER_TARGET, error = %join_error, "dispatch worker failed");
            (HttpStatus::INTERNAL_SERVER_ERROR, "dispatch worker failed").into_response()
        }
    }
}

/// Maps a protocol response onto HTTP.
///
/// Success answers 200 with the JSON envelope and redirects answer 303 with
/// a `Location` header. Client errors are plain text, and every other failure
/// is a 500 carrying the JSON envelope.
#[must_use]
pub fn into_http_response(response: &Response) -> HttpResponse {
    let message = response.message().unwrap_or_default().to_owned();
    match response.status() {
        StatusCode::Success => json_response(HttpStatus::OK, response),
        StatusCode::SeeOther => {
            let location = response.value().as_str().unwrap_or_default().to_owned();
            (HttpStatus::SEE_OTHER, [(header::LOCATION, location)]).into_response()
        }
        StatusCode::BadRequest => (HttpStatus::BAD_REQUEST, message).into_response(),
        StatusCode::SessionNotFound | StatusCode::UnknownCommand => {
            (HttpStatus::NOT_FOUND, message).into_response()
        }
        StatusCode::MethodNotAllowed => {
            let allow: Vec<&str> = response
                .allowed_methods()
                .iter()
                .map(|method| method.as_str())
                .collect();
            (
                HttpStatus::METHOD_NOT_ALLOWED,
                [(header::ALLOW, allow.join(", "))],
                message,
            )
                .into_response()
        }
        _ => json_response(HttpStatus::INTERNAL_SERVER_ERROR, response),
    }
}

fn json_response(status: HttpStatus, response: &Response) -> HttpResponse {
    match response.to_json() {
        Ok(body) => {
            let mut http = (status, Body::from(body)).into_response();
            http.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(JSON_CONTENT_TYPE),
            );
            http
        }
        Err(error) => {
            error!(target: LISTENER_TARGET, %error, "failed to serialise response");
            (HttpStatus::INTERNAL_SERVER_ERROR, "failed to serialise response").into_response()
        }
    }
}
