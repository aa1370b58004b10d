use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use parcel_dispatch::api::rest::router;
use parcel_dispatch::state::AppState;
use parcel_dispatch::store::seed::{apply_seed, SeedFile};
use parcel_dispatch::store::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn couriers() -> Vec<Value> {
    vec![
        json!({
            "uid": "c1-far",
            "email": "far@ebn.sn",
            "name": "Ousmane",
            "role": "coursier",
            "location": { "latitude": 14.95, "longitude": -16.90 }
        }),
        json!({
            "uid": "c2-near",
            "email": "near@ebn.sn",
            "name": "Aminata",
            "role": "coursier",
            "location": { "latitude": "14.7890", "longitude": "-16.9265" }
        }),
        json!({
            "uid": "c3-ghost",
            "email": "ghost@ebn.sn",
            "name": "No Fix",
            "role": "coursier"
        }),
        json!({
            "uid": "d1",
            "email": "driver@ebn.sn",
            "name": "Long Haul",
            "role": "chauffeur",
            "location": { "latitude": 14.7886, "longitude": -16.9261 }
        }),
    ]
}

fn shipments() -> Vec<Value> {
    vec![
        json!({
            "id": "door-1",
            "senderName": "Fatou",
            "recipientName": "Cheikh",
            "status": "pending",
            "routeInfo": { "deliveryMode": "porte_a_porte", "from": "Thiès", "to": "Dakar" },
            "sender": {
                "phone": "+221770000001",
                "location": { "latitude": 14.7886, "longitude": -16.9261 }
            },
            "createdAt": "2026-05-01T08:00:00Z"
        }),
        json!({
            "id": "relay-1",
            "senderName": "Moussa",
            "status": "pending",
            "routeInfo": { "deliveryMode": "point_relais" },
            "lat": 14.69,
            "lon": -17.44,
            "createdAt": "2026-05-01T09:00:00Z"
        }),
    ]
}

fn setup_with(users: Vec<Value>, shipments: Vec<Value>) -> axum::Router {
    let store = MemoryStore::new();
    apply_seed(&store, &SeedFile { users, shipments }).unwrap();
    let state = AppState::in_memory(Arc::new(store), 1024);
    router(Arc::new(state))
}

fn setup() -> axum::Router {
    setup_with(couriers(), shipments())
}

fn post_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["couriers"], 3);
    assert_eq!(body["shipments"], 2);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("reconcile_runs_total"));
}

#[tokio::test]
async fn eligible_couriers_exclude_positionless_and_drivers() {
    let app = setup();
    let response = app.oneshot(get_request("/couriers")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["c1-far", "c2-near"]);
}

#[tokio::test]
async fn accepting_first_door_to_door_shipment_uses_cold_start() {
    let app = setup();
    let response = app
        .oneshot(post_request("/shipments/door-1/accept"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let tracking = body["shipment"]["tracking_number"].as_str().unwrap();
    assert!(tracking.starts_with("EBN"));
    assert_eq!(body["shipment"]["status"], "picked-up");
    assert_eq!(body["shipment"]["coordinates"]["lat"], 14.7886);
    assert_eq!(body["assignment"]["success"], true);
    assert_eq!(body["assignment"]["courier_id"], "c1-far");
    assert_eq!(body["shipment"]["courier_name"], "Ousmane");
}

#[tokio::test]
async fn accepting_after_prior_assignment_picks_nearest() {
    let mut shipments = shipments();
    shipments.push(json!({
        "id": "archived",
        "routeInfo": { "deliveryMode": "porte_a_porte" },
        "trackingNumber": "EBN00000001AAAA",
        "coursierId": "c1-far",
        "coursierName": "Ousmane",
        "createdAt": "2026-04-01T08:00:00Z"
    }));
    let app = setup_with(couriers(), shipments);

    let response = app
        .oneshot(post_request("/shipments/door-1/accept"))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["assignment"]["courier_id"], "c2-near");
}

#[tokio::test]
async fn acceptance_succeeds_without_couriers() {
    let app = setup_with(vec![], shipments());
    let response = app
        .oneshot(post_request("/shipments/door-1/accept"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["shipment"]["tracking_number"].is_string());
    assert_eq!(body["assignment"]["success"], false);
    assert!(body["shipment"]["courier_id"].is_null());
}

#[tokio::test]
async fn relay_point_acceptance_skips_assignment() {
    let app = setup();
    let response = app
        .oneshot(post_request("/shipments/relay-1/accept"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["assignment"].is_null());
    assert!(body["shipment"]["courier_id"].is_null());
}

#[tokio::test]
async fn accepting_twice_returns_409() {
    let app = setup();
    let first = app
        .clone()
        .oneshot(post_request("/shipments/door-1/accept"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_request("/shipments/door-1/accept"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn accepting_unknown_shipment_returns_404() {
    let app = setup();
    let response = app
        .oneshot(post_request("/shipments/nope/accept"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_assign_keeps_same_courier() {
    let app = setup();
    app.clone()
        .oneshot(post_request("/shipments/door-1/accept"))
        .await
        .unwrap();

    let response = app
        .oneshot(post_request("/shipments/door-1/assign"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["courier_id"], "c1-far");
}

#[tokio::test]
async fn assigning_unaccepted_shipment_returns_409() {
    let app = setup();
    let response = app
        .clone()
        .oneshot(post_request("/shipments/door-1/assign"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(get_request("/couriers/c1-far/shipments"))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn acceptance_sweeps_older_backlog_in_background() {
    let mut shipments = shipments();
    shipments.push(json!({
        "id": "backlog-old",
        "routeInfo": { "deliveryMode": "porte_a_porte" },
        "trackingNumber": "EBN00000004DDDD",
        "lat": 14.7886,
        "lon": -16.9261,
        "createdAt": "2026-04-01T08:00:00Z"
    }));
    let app = setup_with(couriers(), shipments);

    let response = app
        .clone()
        .oneshot(post_request("/shipments/door-1/accept"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["assignment"]["courier_id"], "c1-far");

    let mut courier_name = Value::Null;
    for _ in 0..50 {
        let response = app
            .clone()
            .oneshot(get_request("/track/EBN00000004DDDD"))
            .await
            .unwrap();
        courier_name = body_json(response).await["courier_name"].clone();
        if !courier_name.is_null() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    // door-1 is now the reference, so the backlog goes to the nearest courier
    assert_eq!(courier_name, "Aminata");
}

#[tokio::test]
async fn reconcile_assigns_accepted_backlog() {
    let mut shipments = shipments();
    shipments.push(json!({
        "id": "backlog-2",
        "routeInfo": { "deliveryMode": "porte_a_porte" },
        "trackingNumber": "EBN00000002BBBB",
        "lat": "14.7886",
        "lon": "-16.9261",
        "createdAt": 1777622400000_i64
    }));
    shipments.push(json!({
        "id": "backlog-1",
        "routeInfo": { "deliveryMode": "porte_a_porte" },
        "trackingNumber": "EBN00000003CCCC",
        "lat": 14.7886,
        "lon": -16.9261,
        "createdAt": "2026-04-01T08:00:00Z"
    }));
    let app = setup_with(couriers(), shipments);

    let response = app
        .clone()
        .oneshot(post_request("/assignments/reconcile"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["assigned"], 2);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["errors"].as_array().unwrap().len(), 0);

    // oldest first: backlog-1 takes the cold start, backlog-2 the nearest courier
    let response = app
        .oneshot(get_request("/track/EBN00000002BBBB"))
        .await
        .unwrap();
    let tracked = body_json(response).await;
    assert_eq!(tracked["courier_name"], "Aminata");
}

#[tokio::test]
async fn best_courier_query_honours_first_flag() {
    let app = setup();

    let warm = app
        .clone()
        .oneshot(get_request("/couriers/best?lat=14.7886&lon=-16.9261"))
        .await
        .unwrap();
    assert_eq!(warm.status(), StatusCode::OK);
    assert_eq!(body_json(warm).await["courier"]["id"], "c2-near");

    let cold = app
        .oneshot(get_request("/couriers/best?lat=14.7886&lon=-16.9261&first=true"))
        .await
        .unwrap();
    assert_eq!(body_json(cold).await["courier"]["id"], "c1-far");
}

#[tokio::test]
async fn best_courier_rejects_out_of_range_latitude() {
    let app = setup();
    let response = app
        .oneshot(get_request("/couriers/best?lat=123.0&lon=0.0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn best_courier_is_null_with_empty_pool() {
    let app = setup_with(vec![], vec![]);
    let response = app
        .oneshot(get_request("/couriers/best?lat=14.7&lon=-17.4"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["courier"].is_null());
}

#[tokio::test]
async fn tracking_unknown_number_returns_404() {
    let app = setup();
    let response = app
        .oneshot(get_request("/track/EBN99999999ZZZZ"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn courier_shipments_lists_assignments() {
    let app = setup();
    app.clone()
        .oneshot(post_request("/shipments/door-1/accept"))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/couriers/c1-far/shipments"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "door-1");
}
