//! Integration tests for the session client against an in-process mock
//! backend. Each test spins up its own axum router on an ephemeral port,
//! so the full reqwest round trip (headers, status classification, 401
//! interception) is exercised for real.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use sensor_hub_client::{ApiError, SensorReadingCreate, SessionClient};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> SessionClient {
    SessionClient::builder()
        .base_url(format!("http://{}/api", addr))
        .build()
}

#[tokio::test]
async fn bearer_header_attached_after_set_token_and_omitted_after_clear() {
    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();

    let app = Router::new().route(
        "/api/readings",
        get(move |headers: HeaderMap| {
            let record = record.clone();
            async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                record.lock().unwrap().push(auth);
                Json(json!([]))
            }
        }),
    );
    let client = client_for(serve(app).await);

    client.set_token("t1");
    client.get_readings().await.unwrap();

    client.clear_token();
    client.get_readings().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].as_deref(), Some("Bearer t1"));
    assert_eq!(seen[1], None);
}

#[tokio::test]
async fn unauthorized_clears_token_and_fires_callback_once() {
    let app = Router::new().route(
        "/api/readings",
        get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "token expired"}))) }),
    );
    let addr = serve(app).await;

    let fired = Arc::new(AtomicUsize::new(0));
    let client = SessionClient::builder()
        .base_url(format!("http://{}/api", addr))
        .token("stale")
        .on_unauthorized({
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build();

    let err = client.get_readings().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationFailed(_)));
    assert_eq!(err.server_message(), Some("token expired"));

    // token dropped, callback exactly once, error still propagated
    assert_eq!(client.token(), None);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_posts_to_auth_path_derived_from_base_url() {
    let app = Router::new().route(
        "/auth/login",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["username"], "ana");
            assert_eq!(body["password"], "secret");
            Json(json!({"token": "tok-1"}))
        }),
    );
    let addr = serve(app).await;

    let client = SessionClient::default();
    client.set_base_url(&format!("http://{}/api/", addr));
    assert_eq!(client.base_url(), format!("http://{}/api", addr));

    let auth = client.login("ana", "secret").await.unwrap();
    assert_eq!(auth.token, "tok-1");
}

#[tokio::test]
async fn login_rejection_is_authentication_failed_with_server_message() {
    let app = Router::new().route(
        "/auth/login",
        post(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad credentials"}))) }),
    );
    let addr = serve(app).await;

    let fired = Arc::new(AtomicUsize::new(0));
    let client = SessionClient::builder()
        .base_url(format!("http://{}/api", addr))
        .on_unauthorized({
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build();

    let err = client.login("ana", "nope").await.unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationFailed(_)));
    assert_eq!(err.server_message(), Some("bad credentials"));

    // the interceptor is response-wide, not per-endpoint
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn register_conflict_and_invalid_input_are_distinguishable() {
    let app = Router::new().route(
        "/auth/register",
        post(|Json(body): Json<Value>| async move {
            if body["username"] == "taken" {
                (StatusCode::CONFLICT, "username already in use".to_string())
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    json!([{"field": "password", "message": "must not be blank"}]).to_string(),
                )
            }
        }),
    );
    let client = client_for(serve(app).await);

    let err = client.register("taken", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(err.server_message(), Some("username already in use"));

    let err = client.register("new", "").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert_eq!(err.server_message(), Some("password: must not be blank"));
}

#[tokio::test]
async fn create_reading_returns_server_assigned_fields() {
    let app = Router::new().route(
        "/api/readings",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["sensorId"], "A");
            assert_eq!(body["value"], 12.5);
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": 7,
                    "sensorId": "A",
                    "value": 12.5,
                    "timestamp": "2024-05-01T10:00:00Z"
                })),
            )
        }),
    );
    let client = client_for(serve(app).await);

    let created = client
        .create_reading(&SensorReadingCreate {
            sensor_id: "A".to_string(),
            value: 12.5,
        })
        .await
        .unwrap();

    assert_eq!(created.id, 7);
    assert_eq!(created.sensor_id, "A");
    assert_eq!(created.value, Some(12.5));
    assert_eq!(
        created.timestamp,
        "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap()
    );
}

#[tokio::test]
async fn readings_by_sensor_hits_the_sensor_path() {
    let app = Router::new().route(
        "/api/readings/:sensor_id",
        get(|Path(sensor_id): Path<String>| async move {
            Json(json!([{
                "id": 1,
                "sensorId": sensor_id,
                "value": 3.0,
                "timestamp": "2024-01-01T00:00:00Z"
            }]))
        }),
    );
    let client = client_for(serve(app).await);

    let readings = client.get_readings_by_sensor("pressure-1").await.unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].sensor_id, "pressure-1");
}

#[tokio::test]
async fn reading_with_missing_value_deserializes_as_none() {
    let app = Router::new().route(
        "/api/readings",
        get(|| async {
            Json(json!([{
                "id": 1,
                "sensorId": "A",
                "timestamp": "2024-01-01T00:00:00Z"
            }]))
        }),
    );
    let client = client_for(serve(app).await);

    let readings = client.get_readings().await.unwrap();
    assert_eq!(readings[0].value, None);
}

#[tokio::test]
async fn test_connection_true_on_success_false_on_server_error() {
    let ok = Router::new().route("/api/readings", get(|| async { Json(json!([])) }));
    assert!(client_for(serve(ok).await).test_connection().await);

    let broken = Router::new().route(
        "/api/readings",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    assert!(!client_for(serve(broken).await).test_connection().await);
}

#[tokio::test]
async fn test_connection_false_when_unreachable() {
    // bind then drop, so the port is known to refuse connections
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr);
    assert!(!client.test_connection().await);

    // the same failure classifies as NetworkUnreachable on a normal call
    let err = client.get_readings().await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkUnreachable(_)));
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let app = Router::new().route("/api/readings", get(|| async { "definitely not json" }));
    let client = client_for(serve(app).await);

    let err = client.get_readings().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn server_error_carries_status() {
    let app = Router::new().route(
        "/api/readings",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    );
    let client = client_for(serve(app).await);

    match client.get_readings().await.unwrap_err() {
        ApiError::ServerError { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message.as_deref(), Some("maintenance"));
        }
        other => panic!("expected ServerError, got {:?}", other),
    }
}
