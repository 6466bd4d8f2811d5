use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::{admin_routes, appointment_routes};
use shared_database::InMemoryStore;
use shared_utils::test_utils::{seed_directory, test_state, FixedClock, RecordingNotifier, TestAppointment};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn app(store: Arc<InMemoryStore>, today: &str) -> Router {
    let state = test_state(
        store,
        Arc::new(RecordingNotifier::new()),
        Arc::new(FixedClock::at(today, "06:00")),
    );
    Router::new()
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/admin", admin_routes(state))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn book_then_complete_an_appointment() {
    let app = app(Arc::new(InMemoryStore::new()), "2025-09-01");

    let response = app
        .clone()
        .oneshot(post_json(
            "/appointments",
            json!({
                "doctor_id": 1,
                "user_id": 42,
                "workplace_id": 7,
                "date": "2025-09-01",
                "time": "08:00",
                "duration_minutes": 30
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["appointment"]["slot"], "8:00AM - 8:30AM");
    assert_eq!(body["appointment"]["status"], "BOOKED");
    let id = body["appointment"]["id"].as_str().unwrap().to_string();

    let update = Request::patch(format!("/appointments/{}/status", id))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "COMPLETED" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(update).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let again = Request::patch(format!("/appointments/{}/status", id))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "CANCELLED" }).to_string()))
        .unwrap();
    let response = app.oneshot(again).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_bulk_failure_is_multi_status() {
    let store = Arc::new(InMemoryStore::new());
    TestAppointment::new(1, 7).insert(store.as_ref()).await.unwrap();
    let broken = TestAppointment::new(1, 7).at("09:00").insert(store.as_ref()).await.unwrap();
    store.fail_writes_for(broken.id).await;
    let app = app(store, "2025-08-30");

    let response = app
        .oneshot(post_json(
            "/appointments/bulk-reschedule",
            json!({ "doctor_id": 1, "workplace_id": 7, "extend_minutes": 30 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["failed"][0]["id"], broken.id.to_string());
}

#[tokio::test]
async fn cancel_day_reports_count() {
    let store = Arc::new(InMemoryStore::new());
    TestAppointment::new(1, 7).insert(store.as_ref()).await.unwrap();
    let app = app(store, "2025-08-30");

    let response = app
        .oneshot(post_json(
            "/appointments/cancel-day",
            json!({ "workplace_id": 7, "date": "2025-09-01", "reason": "Holiday" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 1);
}

#[tokio::test]
async fn manual_migration_returns_report_and_archives() {
    let store = Arc::new(InMemoryStore::new());
    seed_directory(&store).await;
    let appt = TestAppointment::new(1, 7).on("2025-10-20").insert(store.as_ref()).await.unwrap();
    let app = app(store, "2025-10-22");

    let response = app
        .clone()
        .oneshot(Request::post("/admin/migrations/run").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["trigger"], "manual");
    assert_eq!(report["archived"], 1);
    assert_eq!(report["today"], "2025-10-22");

    let lookup = Request::get(format!("/appointments/{}", appt.id)).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(lookup).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let past = Request::get("/appointments/past?doctor_id=1").body(Body::empty()).unwrap();
    let body = body_json(app.oneshot(past).await.unwrap()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["appointments"][0]["workplace_name"], "City Clinic");
}
