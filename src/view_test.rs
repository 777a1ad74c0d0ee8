use std::time::Duration;

use serde_json::{Value, json};
use viewport::draft::DraftState;
use viewport::overlay::BadgeTone;

use super::*;
use crate::locator::{ElementId, SurfaceReporter, ViewportLocator};
use crate::test_support::{MockReply, MockServer};

fn owner() -> Session {
    Session::with_token("tok-1")
}

fn signed_mark() -> Value {
    json!({ "_id": "s1", "documentId": "d1", "text": "Ada", "x": 100, "y": 700, "page": 0, "status": "signed" })
}

async fn backend(marks: Value) -> MockServer {
    let server = MockServer::start().await;
    server.route("GET", "/api/docs", MockReply::json(json!([{ "_id": "d1", "path": "1-a.pdf", "finalized": false }])));
    server.route("GET", "/api/signatures/d1", MockReply::json(marks));
    server
}

fn show_page(reporter: &SurfaceReporter, zoom: f64) {
    reporter.container(ElementId(2), 1400.0, 900.0);
    reporter.canvas(ElementId(1), 595.0 * zoom, 842.0 * zoom, Point::new(0.0, 0.0));
}

async fn next(view: &mut ViewSession) -> ViewEvent {
    tokio::time::timeout(Duration::from_secs(3), view.next_event())
        .await
        .expect("view produced no event")
        .expect("view closed")
}

/// Pump events until the document is loaded and, if `want_geometry`, the
/// canvas has been seen too.
async fn settle(view: &mut ViewSession, want_geometry: bool) {
    loop {
        if let ViewEvent::Notice(notice) = next(view).await {
            panic!("unexpected notice: {notice:?}");
        }
        if view.document().is_some() && (!want_geometry || view.geometry().is_some()) {
            return;
        }
    }
}

async fn open_owner(server: &MockServer, zoom: Option<f64>) -> (SurfaceReporter, ViewSession) {
    let (reporter, locator) = ViewportLocator::spawn();
    if let Some(zoom) = zoom {
        show_page(&reporter, zoom);
    }
    let mut view = ViewSession::open(server.api(), owner(), "d1", ViewMode::Owner, locator).unwrap();
    settle(&mut view, zoom.is_some()).await;
    (reporter, view)
}

#[tokio::test]
async fn owner_view_requires_session() {
    let server = MockServer::start().await;
    let (_reporter, locator) = ViewportLocator::spawn();
    let err = ViewSession::open(server.api(), Session::anonymous(), "d1", ViewMode::Owner, locator)
        .err()
        .unwrap();
    assert!(matches!(err, ClientError::NotAuthenticated));
}

#[tokio::test]
async fn blank_document_id_is_rejected() {
    let server = MockServer::start().await;
    let (_reporter, locator) = ViewportLocator::spawn();
    let err = ViewSession::open(server.api(), owner(), "  ", ViewMode::Owner, locator).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
}

#[tokio::test]
async fn loads_document_and_paints_marks_at_zoom() {
    let server = backend(json!([signed_mark()])).await;
    let (_reporter, view) = open_owner(&server, Some(2.0)).await;

    assert_eq!(view.source(), Some(&DocumentSource::Original("uploads/1-a.pdf".into())));
    assert_eq!(view.marks().len(), 1);
    let frame = view.layer().unwrap().content();
    assert_eq!(frame.markers[0].position, Point::new(200.0, 284.0));
    assert_eq!(frame.markers[0].label, "Ada");
    assert!(server.requests_to("HEAD", "/uploads/finalized/signed_1-a.pdf").is_empty());
}

#[tokio::test]
async fn marks_without_geometry_paint_nothing() {
    let server = backend(json!([signed_mark()])).await;
    let (_reporter, view) = open_owner(&server, None).await;
    assert_eq!(view.marks().len(), 1);
    assert!(view.layer().is_none());
    assert!(view.geometry().is_none());
}

#[tokio::test]
async fn repaint_is_idempotent() {
    let server = backend(json!([signed_mark()])).await;
    let (_reporter, mut view) = open_owner(&server, Some(1.0)).await;
    let before = view.layer().unwrap().content().clone();

    view.set_tracking(false);
    assert_eq!(view.layer().unwrap().content(), &before);

    view.set_tracking(true);
    let tracked = view.layer().unwrap().content().clone();
    assert_eq!(tracked.markers[0].badge.as_ref().unwrap().tone, BadgeTone::Positive);

    view.set_tracking(false);
    assert_eq!(view.layer().unwrap().content(), &before);
}

#[tokio::test]
async fn save_without_geometry_sends_nothing() {
    let server = backend(json!([])).await;
    let (_reporter, mut view) = open_owner(&server, None).await;
    view.begin_signature().unwrap();

    let err = view.save_signature().await.unwrap_err();

    assert!(matches!(err, ClientError::ViewportNotReady));
    assert_eq!(err.kind(), ErrorKind::GeometryUnavailable);
    assert!(server.requests_to("POST", "/api/signatures").is_empty());
    assert!(view.draft().is_placing());
}

#[tokio::test]
async fn save_posts_pdf_coordinates_and_reloads() {
    let server = backend(json!([])).await;
    server.route("POST", "/api/signatures", MockReply::json(json!({ "_id": "s-new" })));
    let (_reporter, mut view) = open_owner(&server, Some(1.0)).await;

    view.begin_signature().unwrap();
    view.drag_to(Point::new(150.0, 300.0)).unwrap();
    let id = view.save_signature().await.unwrap();

    assert_eq!(id, "s-new");
    assert_eq!(view.last_signature_id(), Some("s-new"));
    assert_eq!(view.draft().state(), &DraftState::Idle);
    let body = server.requests_to("POST", "/api/signatures")[0].json();
    assert_eq!(body["x"], 150.0);
    assert_eq!(body["y"], 542.0);
    assert_eq!(body["page"], 0);
    assert_eq!(body["text"], "Signature");
    assert_eq!(body["fontColor"], "#0066ff");

    assert_eq!(next(&mut view).await, ViewEvent::Loaded);
    assert_eq!(server.requests_to("GET", "/api/signatures/d1").len(), 2);
}

#[tokio::test]
async fn failed_save_keeps_draft_for_retry() {
    let server = backend(json!([])).await;
    server.route("POST", "/api/signatures", MockReply::status(500, json!({ "msg": "db down" })));
    let (_reporter, mut view) = open_owner(&server, Some(1.0)).await;
    view.begin_signature().unwrap();

    let err = view.save_signature().await.unwrap_err();

    assert!(err.retryable());
    assert!(view.draft().is_placing());
    assert_eq!(view.last_signature_id(), None);
}

#[tokio::test]
async fn invite_validates_before_any_request() {
    let server = backend(json!([])).await;
    let (_reporter, view) = open_owner(&server, None).await;

    let blank = view.send_invite("   ").await.unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::ValidationFailure);
    let unsaved = view.send_invite("guest@x.io").await.unwrap_err();
    assert_eq!(unsaved.kind(), ErrorKind::ValidationFailure);

    assert!(server.requests().iter().all(|r| !r.path.ends_with("/public-link")));
}

#[tokio::test]
async fn invite_after_save_posts_link() {
    let server = backend(json!([])).await;
    server.route("POST", "/api/signatures", MockReply::json(json!({ "_id": "s-new" })));
    server.route("POST", "/api/signatures/s-new/public-link", MockReply::json(json!({ "msg": "sent" })));
    let (_reporter, mut view) = open_owner(&server, Some(1.0)).await;
    view.begin_signature().unwrap();
    view.save_signature().await.unwrap();

    view.send_invite("guest@x.io").await.unwrap();

    let sent = server.requests_to("POST", "/api/signatures/s-new/public-link");
    assert_eq!(sent[0].json(), json!({ "email": "guest@x.io" }));
}

#[tokio::test]
async fn finalize_returns_pdf_and_reloads() {
    let server = MockServer::start().await;
    server.route("GET", "/api/docs", MockReply::json(json!([{ "_id": "d1", "path": "1-a.pdf" }])));
    server.route("GET", "/api/signatures/d1", MockReply::json(json!([])));
    server.route("HEAD", "/uploads/finalized/signed_1-a.pdf", MockReply::empty(200));
    server.route("POST", "/api/signatures/finalize", MockReply::bytes(b"%PDF-flat", "application/pdf"));
    let (_reporter, mut view) = open_owner(&server, None).await;

    let bytes = view.finalize().await.unwrap();

    assert_eq!(bytes, b"%PDF-flat");
    assert_eq!(next(&mut view).await, ViewEvent::Loaded);
    assert!(view.source().unwrap().is_finalized());
}

#[tokio::test]
async fn load_failure_becomes_notice() {
    let server = MockServer::start().await;
    server.route("GET", "/api/docs", MockReply::status(503, json!({ "msg": "maintenance" })));
    let (_reporter, locator) = ViewportLocator::spawn();
    let mut view = ViewSession::open(server.api(), owner(), "d1", ViewMode::Owner, locator).unwrap();

    let ViewEvent::Notice(notice) = next(&mut view).await else {
        panic!("expected a notice");
    };
    assert_eq!(notice.kind, ErrorKind::NetworkFailure);
    assert_eq!(notice.message, "server returned 503: maintenance");
    assert!(view.document().is_none());

    view.reload().unwrap();
    assert!(matches!(next(&mut view).await, ViewEvent::Notice(_)));
}

#[tokio::test]
async fn results_after_close_are_ignored() {
    let server = MockServer::start().await;
    server.route(
        "GET",
        "/api/docs",
        MockReply::json(json!([{ "_id": "d1", "path": "1-a.pdf", "finalized": false }]))
            .delayed(Duration::from_millis(200)),
    );
    server.route("GET", "/api/signatures/d1", MockReply::json(json!([signed_mark()])));
    let (reporter, locator) = ViewportLocator::spawn();
    let mut view = ViewSession::open(server.api(), owner(), "d1", ViewMode::Owner, locator).unwrap();

    view.close();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(view.next_event().await, None);
    assert!(view.document().is_none());
    assert!(view.marks().is_empty());
    assert!(matches!(view.reload(), Err(ClientError::ViewClosed)));
    assert!(server.requests_to("GET", "/api/signatures/d1").is_empty());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!reporter.container(ElementId(2), 10.0, 10.0));
}

#[tokio::test]
async fn superseded_load_outcome_is_skipped() {
    let server = backend(json!([signed_mark()])).await;
    let (_reporter, locator) = ViewportLocator::spawn();
    let mut view = ViewSession::open(server.api(), owner(), "d1", ViewMode::Owner, locator).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.requests_to("GET", "/api/signatures/d1").len(), 1);

    let second = json!({ "_id": "s2", "documentId": "d1", "text": "Bo", "x": 10, "y": 20, "page": 0, "status": "pending" });
    server.route("GET", "/api/signatures/d1", MockReply::json(json!([signed_mark(), second])));
    view.reload().unwrap();

    assert_eq!(next(&mut view).await, ViewEvent::Loaded);
    assert_eq!(view.marks().len(), 2);
    assert_eq!(server.requests_to("GET", "/api/signatures/d1").len(), 2);
}

#[tokio::test]
async fn public_view_reads_without_auth_and_cannot_save() {
    let server = MockServer::start().await;
    server.route("GET", "/api/docs/d1/public", MockReply::json(json!({ "_id": "d1", "path": "1-a.pdf", "finalized": true })));
    server.route("GET", "/api/signatures/d1", MockReply::json(json!([])));
    let (reporter, locator) = ViewportLocator::spawn();
    show_page(&reporter, 1.0);
    let mut view = ViewSession::open(server.api(), Session::anonymous(), "d1", ViewMode::Public, locator).unwrap();
    settle(&mut view, true).await;

    assert_eq!(view.source().unwrap().path(), "uploads/finalized/signed_1-a.pdf");
    assert!(server.requests().iter().all(|r| r.authorization.is_none()));

    view.begin_signature().unwrap();
    assert_eq!(view.draft().draft().unwrap().style.text, "Signed by Guest");
    let err = view.save_signature().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
}

#[tokio::test]
async fn canvas_resize_repaints_on_same_layer() {
    let server = backend(json!([signed_mark()])).await;
    let (reporter, mut view) = open_owner(&server, Some(1.0)).await;
    let layer_id = view.layer().unwrap().id();

    reporter.canvas(ElementId(1), 1190.0, 1684.0, Point::new(0.0, 0.0));
    assert_eq!(next(&mut view).await, ViewEvent::Repainted);

    assert_eq!(view.layer().unwrap().id(), layer_id);
    assert_eq!(view.layer().unwrap().content().markers[0].position, Point::new(200.0, 284.0));
}
