//! Routing and dispatch-order tests.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::headless::HeadlessEngine;
use crate::session::SessionManager;
use crate::view::ViewBackends;

#[fixture]
fn context() -> ServerContext {
    let mut backends = ViewBackends::new();
    HeadlessEngine::new().register(&mut backends);
    ServerContext::new(
        Arc::new(SessionManager::default()),
        Arc::new(backends),
        "",
    )
}

fn create_session(context: &ServerContext) -> String {
    let response = Dispatcher::new().dispatch(
        context,
        "POST",
        "/session",
        br#"{"desiredCapabilities":{}}"#,
    );
    assert_eq!(response.status(), StatusCode::SeeOther);
    response.session_id().expect("session id").to_owned()
}

#[rstest]
#[case("GET", "/")]
#[case("GET", "/nope")]
#[case("GET", "/session/abc/cookie")]
#[case("POST", "/session/abc/window/extra")]
fn unmatched_paths_are_unknown_commands(
    context: ServerContext,
    #[case] method: &str,
    #[case] path: &str,
) {
    let response = Dispatcher::new().dispatch(&context, method, path, b"");
    assert_eq!(response.status(), StatusCode::UnknownCommand);
}

#[rstest]
#[case("PUT", "/session/abc", &[HttpMethod::Get, HttpMethod::Delete])]
#[case("GET", "/session", &[HttpMethod::Post])]
#[case("GET", "/session/abc/window", &[HttpMethod::Post, HttpMethod::Delete])]
#[case("DELETE", "/status", &[HttpMethod::Get])]
fn unsupported_methods_list_the_allowed_ones(
    context: ServerContext,
    #[case] method: &str,
    #[case] path: &str,
    #[case] allowed: &[HttpMethod],
) {
    let response = Dispatcher::new().dispatch(&context, method, path, b"");
    assert_eq!(response.status(), StatusCode::MethodNotAllowed);
    assert_eq!(response.allowed_methods(), allowed);
}

#[rstest]
#[case(b"not json".as_slice())]
#[case(b"[1, 2]".as_slice())]
#[case(b"\"text\"".as_slice())]
fn malformed_bodies_are_bad_requests(context: ServerContext, #[case] body: &[u8]) {
    let response = Dispatcher::new().dispatch(&context, "POST", "/session", body);
    assert_eq!(response.status(), StatusCode::BadRequest);
    assert!(context.sessions().is_empty());
}

#[rstest]
#[case("PUT", "/status")]
#[case("DELETE", "/session")]
#[case("POST", "/sessions")]
fn unanswered_method_wins_over_a_malformed_body(
    context: ServerContext,
    #[case] method: &str,
    #[case] path: &str,
) {
    let response = Dispatcher::new().dispatch(&context, method, path, b"{");
    assert_eq!(response.status(), StatusCode::MethodNotAllowed);
    assert!(context.sessions().is_empty());
}

#[rstest]
fn unknown_session_keeps_the_path_session_id(context: ServerContext) {
    let response = Dispatcher::new().dispatch(&context, "GET", "/session/missing/title", b"");
    assert_eq!(response.status(), StatusCode::SessionNotFound);
    assert_eq!(response.session_id(), Some("missing"));
    assert_eq!(response.message(), Some("session missing not found"));
}

#[rstest]
fn status_answers_without_a_session(context: ServerContext) {
    let response = Dispatcher::new().dispatch(&context, "GET", "/status", b"");
    assert_eq!(response.status(), StatusCode::Success);
    assert_eq!(response.session_id(), None);
    assert_eq!(response.value()["ready"], json!(true));
}

#[rstest]
fn session_commands_reach_the_session(context: ServerContext) {
    let dispatcher = Dispatcher::new();
    let session_id = create_session(&context);

    let handle = dispatcher.dispatch(
        &context,
        "GET",
        &format!("/session/{session_id}/window_handle"),
        b"",
    );
    assert_eq!(handle.status(), StatusCode::Success);
    assert_eq!(handle.session_id(), Some(session_id.as_str()));

    let handles = dispatcher.dispatch(
        &context,
        "GET",
        &format!("/session/{session_id}/window_handles"),
        b"",
    );
    assert_eq!(handles.value(), &json!([handle.value().clone()]));

    let url = dispatcher.dispatch(&context, "GET", &format!("/session/{session_id}/url"), b"");
    assert_eq!(url.value(), &json!("about:blank"));

    let deleted = dispatcher.dispatch(&context, "DELETE", &format!("/session/{session_id}"), b"");
    assert_eq!(deleted.status(), StatusCode::Success);
    assert!(context.sessions().is_empty());

    let gone = dispatcher.dispatch(&context, "GET", &format!("/session/{session_id}/url"), b"");
    assert_eq!(gone.status(), StatusCode::SessionNotFound);
}

#[rstest]
fn switching_to_an_unknown_window_fails(context: ServerContext) {
    let session_id = create_session(&context);
    let response = Dispatcher::new().dispatch(
        &context,
        "POST",
        &format!("/session/{session_id}/window"),
        br#"{"name":"nowhere"}"#,
    );
    assert_eq!(response.status(), StatusCode::NoSuchWindow);
    context.sessions().terminate_all();
}

#[rstest]
fn switching_window_requires_a_name(context: ServerContext) {
    let session_id = create_session(&context);
    let response = Dispatcher::new().dispatch(
        &context,
        "POST",
        &format!("/session/{session_id}/window"),
        b"{}",
    );
    assert_eq!(response.status(), StatusCode::BadRequest);
    assert_eq!(response.message(), Some("Missing or invalid 'name'"));
    context.sessions().terminate_all();
}

#[rstest]
fn closing_the_focused_window_leaves_no_current_window(context: ServerContext) {
    let dispatcher = Dispatcher::new();
    let session_id = create_session(&context);
    let window = format!("/session/{session_id}/window");

    assert_eq!(
        dispatcher.dispatch(&context, "DELETE", &window, b"").status(),
        StatusCode::Success
    );
    let handle = dispatcher.dispatch(
        &context,
        "GET",
        &format!("/session/{session_id}/window_handle"),
        b"",
    );
    assert_eq!(handle.status(), StatusCode::NoSuchWindow);
    let title = dispatcher.dispatch(&context, "GET", &format!("/session/{session_id}/title"), b"");
    assert_eq!(title.status(), StatusCode::NoSuchWindow);
    context.sessions().terminate_all();
}

#[test]
fn every_route_is_registered_once() {
    let patterns = Dispatcher::new().patterns();
    assert_eq!(patterns.len(), 9);
    let mut unique = patterns.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), patterns.len());
}
