//! Start-view resolution and failure handling for `POST /session`.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::dispatch::{Dispatcher, Response};
use crate::error::StatusCode;
use crate::headless::{HeadlessEngine, HeadlessView};
use crate::server::ServerContext;
use crate::session::{Lifecycle, SessionManager};
use crate::tests::support::RecordingBackend;
use crate::view::{
    MockViewCmdExecutorFactory, MockViewEnumerator, MockViewFactory, NativeView, ViewBackends,
    ViewHandle,
};

#[fixture]
fn backend() -> RecordingBackend {
    RecordingBackend::new(HeadlessEngine::with_classes(["browser", "popup"]))
}

fn post_session(context: &ServerContext, body: &Value) -> Response {
    Dispatcher::new().dispatch(context, "POST", "/session", body.to_string().as_bytes())
}

fn get(context: &ServerContext, session_id: &str, suffix: &str) -> Response {
    Dispatcher::new().dispatch(
        context,
        "GET",
        &format!("/session/{session_id}{suffix}"),
        b"",
    )
}

#[rstest]
fn any_window_attaches_to_the_first_view_without_reads(backend: RecordingBackend) {
    let first = backend.open_named("first");
    backend.open_named("second");
    let context = backend.context(1);

    let response = post_session(
        &context,
        &json!({ "desiredCapabilities": { "browserStartWindow": "*" } }),
    );

    assert_eq!(response.status(), StatusCode::SeeOther);
    assert_eq!(backend.name_reads(), 0);
    assert!(backend.created_classes().is_empty());
    assert_eq!(backend.engine().focused(), Some(first.native_id()));
    context.sessions().terminate_all();
}

#[rstest]
fn required_window_wins_over_required_class(backend: RecordingBackend) {
    backend.open_named("other");
    let main = backend.open_named("main");
    let context = backend.context(1);

    let response = post_session(
        &context,
        &json!({
            "desiredCapabilities": { "browserClass": "browser" },
            "requiredCapabilities": { "browserStartWindow": "main", "browserClass": "popup" }
        }),
    );

    assert_eq!(response.status(), StatusCode::SeeOther);
    assert_eq!(backend.name_reads(), 2, "one read per candidate up to the match");
    assert!(backend.created_classes().is_empty());
    assert_eq!(backend.engine().focused(), Some(main.native_id()));
    context.sessions().terminate_all();
}

#[rstest]
fn empty_capabilities_create_one_default_view(backend: RecordingBackend) {
    let context = backend.context(1);

    let response = post_session(&context, &json!({ "desiredCapabilities": {} }));

    assert_eq!(response.status(), StatusCode::SeeOther);
    assert_eq!(backend.created_classes(), [""]);
    let windows = backend.engine().windows();
    assert_eq!(windows.len(), 1);
    assert_eq!(
        backend.engine().focused(),
        windows.first().map(ViewHandle::native_id)
    );

    let session_id = response.session_id().expect("session id");
    let handle = get(&context, session_id, "/window_handle");
    let handles = get(&context, session_id, "/window_handles");
    assert_eq!(handles.value(), &json!([handle.value().clone()]));
    let session = context.sessions().lookup(session_id).expect("session");
    assert_eq!(session.lifecycle(), Lifecycle::Running);
    context.sessions().terminate_all();
}

#[rstest]
fn desired_window_falls_back_to_desired_class(backend: RecordingBackend) {
    let context = backend.context(1);

    let response = post_session(
        &context,
        &json!({ "desiredCapabilities": { "browserStartWindow": "missing", "browserClass": "popup" } }),
    );

    assert_eq!(response.status(), StatusCode::SeeOther);
    assert_eq!(backend.created_classes(), ["popup"]);
    context.sessions().terminate_all();
}

#[rstest]
fn unsupported_required_class_ends_the_session(backend: RecordingBackend) {
    let context = backend.context(1);

    let response = post_session(
        &context,
        &json!({
            "desiredCapabilities": {},
            "requiredCapabilities": { "browserClass": "dialog" }
        }),
    );

    assert_eq!(response.status(), StatusCode::UnknownError);
    assert_eq!(response.message(), Some("No view ids after initialization"));
    assert_eq!(backend.created_classes(), ["dialog"]);
    let seen = backend.seen_sessions();
    let [session] = seen.as_slice() else {
        panic!("expected one session during creation, saw {seen:?}");
    };
    assert_eq!(session.lifecycle(), Lifecycle::Terminated);
    assert!(context.sessions().is_empty());
    let listed = Dispatcher::new().dispatch(&context, "GET", "/sessions", b"");
    assert_eq!(listed.value(), &json!([]));
}

#[rstest]
fn deleted_session_releases_the_window_it_created(backend: RecordingBackend) {
    let context = backend.context(1);
    for _ in 0..3 {
        let created = post_session(&context, &json!({ "desiredCapabilities": {} }));
        let session_id = created.session_id().expect("session id").to_owned();
        let windows = backend.engine().windows();
        let [window] = windows.as_slice() else {
            panic!("expected one open window, found {windows:?}");
        };
        let released = window
            .downcast_ref::<HeadlessView>()
            .expect("headless window")
            .release_flag();
        drop(windows);

        let deleted = Dispatcher::new().dispatch(
            &context,
            "DELETE",
            &format!("/session/{session_id}"),
            b"",
        );

        assert_eq!(deleted.status(), StatusCode::Success);
        assert!(released.load(Ordering::SeqCst));
        assert!(backend.engine().windows().is_empty());
    }

    let any = post_session(
        &context,
        &json!({ "desiredCapabilities": { "browserStartWindow": "*" } }),
    );
    assert_eq!(any.status(), StatusCode::SeeOther);
    assert_eq!(backend.created_classes(), ["", "", "", ""]);
    context.sessions().terminate_all();
}

#[rstest]
fn second_session_is_refused_while_the_first_runs(backend: RecordingBackend) {
    let context = backend.context(1);
    let first = post_session(&context, &json!({ "desiredCapabilities": {} }));
    let first_id = first.session_id().expect("first session id").to_owned();

    let second = post_session(&context, &json!({ "desiredCapabilities": {} }));

    assert_eq!(second.status(), StatusCode::UnknownError);
    assert_eq!(
        second.message(),
        Some("cannot start session: only one session at the moment")
    );
    let session = context.sessions().lookup(&first_id).expect("first session");
    assert_eq!(session.lifecycle(), Lifecycle::Running);
    assert_eq!(context.sessions().len(), 1);
    context.sessions().terminate_all();
}

#[rstest]
#[case(json!({}))]
#[case(json!({ "desiredCapabilities": "browser" }))]
#[case(json!({ "requiredCapabilities": {} }))]
fn missing_desired_capabilities_is_a_bad_request(
    backend: RecordingBackend,
    #[case] body: Value,
) {
    let context = backend.context(1);

    let response = post_session(&context, &body);

    assert_eq!(response.status(), StatusCode::BadRequest);
    assert_eq!(
        response.message(),
        Some("Missing or invalid 'desiredCapabilities'")
    );
    assert!(context.sessions().is_empty());
}

#[rstest]
fn non_string_capability_falls_through_to_the_next_strategy(backend: RecordingBackend) {
    let context = backend.context(1);

    let response = post_session(
        &context,
        &json!({
            "desiredCapabilities": { "browserClass": "popup" },
            "requiredCapabilities": { "browserStartWindow": 5, "browserClass": ["x"] }
        }),
    );

    assert_eq!(response.status(), StatusCode::SeeOther);
    assert_eq!(backend.created_classes(), ["popup"]);
    assert_eq!(backend.name_reads(), 0);
    context.sessions().terminate_all();
}

#[rstest]
fn first_failed_name_read_stops_the_search(backend: RecordingBackend) {
    let broken = backend.open_named("broken");
    RecordingBackend::break_window(&broken);
    backend.open_named("main");
    let context = backend.context(1);

    let response = post_session(
        &context,
        &json!({ "desiredCapabilities": { "browserStartWindow": "main" } }),
    );

    assert_eq!(response.status(), StatusCode::SeeOther);
    assert_eq!(backend.name_reads(), 1);
    assert_eq!(backend.created_classes(), [""]);
    context.sessions().terminate_all();
}

#[derive(Debug)]
struct ForeignView;

impl NativeView for ForeignView {
    fn native_id(&self) -> String {
        "foreign-1".to_owned()
    }

    fn release(&self) {}
}

#[test]
fn missing_executor_is_a_bad_request() {
    let view = ViewHandle::new(ForeignView);
    let mut enumerator = MockViewEnumerator::new();
    enumerator
        .expect_enumerate_views()
        .returning(move |_| vec![view.clone()]);
    let mut executors = MockViewCmdExecutorFactory::new();
    executors.expect_create_executor().returning(|_, _| None);
    let mut factory = MockViewFactory::new();
    factory.expect_create_view_by_class_name().never();

    let mut backends = ViewBackends::new();
    backends
        .register_factory(Arc::new(factory))
        .register_enumerator(Arc::new(enumerator))
        .register_executor_factory(Arc::new(executors));
    let context = ServerContext::new(
        Arc::new(SessionManager::default()),
        Arc::new(backends),
        "",
    );

    let response = post_session(
        &context,
        &json!({ "desiredCapabilities": { "browserStartWindow": "*" } }),
    );

    assert_eq!(response.status(), StatusCode::BadRequest);
    assert_eq!(response.message(), Some("cant get view executor."));
    assert!(context.sessions().is_empty());
}
