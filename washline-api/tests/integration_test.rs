use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use washline_api::middleware::auth::Claims;
use washline_api::state::{AppState, AuthConfig};
use washline_core::events::RecordingEventSink;
use washline_core::memory::InMemoryStore;
use washline_core::payment::MockPaymentGate;
use washline_domain::address::{CustomerAddress, Outlet};
use washline_order::machine::{OrderStateMachine, WorkflowRules};

const SECRET: &str = "test-secret";

struct TestApp {
    router: axum::Router,
    customer_id: Uuid,
    address_id: Uuid,
    outlet_id: Uuid,
}

fn test_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let customer_id = Uuid::new_v4();
    let address_id = Uuid::new_v4();
    let outlet_id = Uuid::new_v4();

    store.seed_outlet(Outlet {
        id: outlet_id,
        name: "Washline Menteng".into(),
        lat: -6.2000,
        lng: 106.8166,
    });
    store.seed_address(CustomerAddress {
        id: address_id,
        customer_id,
        line: "Jl. Kenanga 12".into(),
        district: "Menteng".into(),
        city: "Jakarta Pusat".into(),
        province: "DKI Jakarta".into(),
        postal_code: "10310".into(),
        lat: Some(-6.1600),
        lng: Some(106.8166),
    });

    let machine = Arc::new(OrderStateMachine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        Arc::new(MockPaymentGate),
        Arc::new(RecordingEventSink::new()),
        WorkflowRules::default(),
    ));

    let router = washline_api::app(AppState {
        machine,
        auth: AuthConfig {
            secret: SECRET.into(),
        },
    });

    TestApp {
        router,
        customer_id,
        address_id,
        outlet_id,
    }
}

fn token(subject: Uuid, role: &str) -> String {
    let claims = Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        outlet_id: None,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn authed_post(uri: &str, bearer: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_order(app: &TestApp) -> Value {
    let customer = token(app.customer_id, "CUSTOMER");
    let response = app
        .router
        .clone()
        .oneshot(authed_post(
            "/v1/orders",
            &customer,
            json!({
                "address_id": app.address_id,
                "outlet_id": app.outlet_id,
                "scheduled_pickup_at": (Utc::now() + Duration::hours(2)).to_rfc3339(),
                "items": [
                    {"name": "Shirt", "quantity": 3},
                    {"name": "Pants", "quantity": 2}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_order_returns_waiting_for_pickup() {
    let app = test_app();
    let body = create_order(&app).await;

    assert_eq!(body["order"]["status"], "WaitingForPickup");
    assert_eq!(body["order"]["payment_status"], "WaitingPayment");
    assert_eq!(body["pickup_job"]["status"], "Pending");
    assert_eq!(body["pickup_job"]["job_type"], "Pickup");
}

#[tokio::test]
async fn test_scheduling_too_soon_is_a_bad_request() {
    let app = test_app();
    let customer = token(app.customer_id, "CUSTOMER");
    let response = app
        .router
        .clone()
        .oneshot(authed_post(
            "/v1/orders",
            &customer,
            json!({
                "address_id": app.address_id,
                "outlet_id": app.outlet_id,
                "scheduled_pickup_at": (Utc::now() + Duration::minutes(5)).to_rfc3339(),
                "items": [{"name": "Shirt", "quantity": 1}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_claim_is_exclusive_over_http() {
    let app = test_app();
    let body = create_order(&app).await;
    let job_id = body["pickup_job"]["id"].as_str().unwrap().to_string();

    let first = token(Uuid::new_v4(), "DRIVER");
    let response = app
        .router
        .clone()
        .oneshot(authed_post(
            &format!("/v1/jobs/{}/claim", job_id),
            &first,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let claimed = body_json(response).await;
    assert_eq!(claimed["job"]["status"], "Assigned");
    assert_eq!(claimed["order_status"], "DriverOnWayToCustomer");

    let second = token(Uuid::new_v4(), "DRIVER");
    let response = app
        .router
        .clone()
        .oneshot(authed_post(
            &format!("/v1/jobs/{}/claim", job_id),
            &second,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_customer_cannot_claim_jobs() {
    let app = test_app();
    let body = create_order(&app).await;
    let job_id = body["pickup_job"]["id"].as_str().unwrap().to_string();

    let customer = token(app.customer_id, "CUSTOMER");
    let response = app
        .router
        .clone()
        .oneshot(authed_post(
            &format!("/v1/jobs/{}/claim", job_id),
            &customer,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_station_out_of_order_conflicts() {
    let app = test_app();
    let body = create_order(&app).await;
    let order_id = body["order"]["id"].as_str().unwrap().to_string();
    let job_id = body["pickup_job"]["id"].as_str().unwrap().to_string();

    // Run the pickup leg so the order reaches the outlet.
    let driver = token(Uuid::new_v4(), "DRIVER");
    for step in ["claim", "arrive", "start", "complete"] {
        let response = app
            .router
            .clone()
            .oneshot(authed_post(
                &format!("/v1/jobs/{}/{}", job_id, step),
                &driver,
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "driver step {}", step);
    }

    // Ironing before washing is refused.
    let worker = token(Uuid::new_v4(), "WORKER");
    let response = app
        .router
        .clone()
        .oneshot(authed_post(
            &format!("/v1/orders/{}/stations/Ironing/start", order_id),
            &worker,
            json!({"declared_items": [{"name": "Shirt", "quantity": 3}, {"name": "Pants", "quantity": 2}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Washing goes first.
    let response = app
        .router
        .clone()
        .oneshot(authed_post(
            &format!("/v1/orders/{}/stations/Washing/start", order_id),
            &worker,
            json!({"declared_items": [{"name": "Shirt", "quantity": 3}, {"name": "Pants", "quantity": 2}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = body_json(response).await;
    assert_eq!(receipt["order_status"], "BeingWashed");
    assert_eq!(receipt["verification"], "Verified");
}
