use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::Service;

use sdip_incidents::api::handlers::AppStateInner;
use sdip_incidents::api::routes::create_router;
use sdip_incidents::config::ServiceIdentity;
use sdip_incidents::errors::Dispatcher;

// Helper to create test app
fn create_test_app() -> axum::Router {
    use std::sync::Arc;

    let identity = ServiceIdentity {
        service_id: "testservice".to_string(),
        env_name: "TEST".to_string(),
    };
    let state = Arc::new(AppStateInner {
        dispatcher: Dispatcher::new(identity),
    });
    create_router(state)
}

// Helper to send a request and parse the JSON response
async fn send_request(
    app: &mut axum::Router,
    request: Request<Body>,
) -> (StatusCode, Value) {
    let response = app.call(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };

    (status, json)
}

fn configure_request(content_type: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/configure")
        .header("content-type", content_type)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_returns_200() {
    let mut app = create_test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_request(&mut app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn unknown_route_returns_a_page_not_found_incident() {
    let mut app = create_test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/nope")
        .header("host", "lol.com")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_request(&mut app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["sdipErrorCodes"][0], "SDIP_4041");
    assert_eq!(body["request"], "GET /nope");
    let message = body["messages"][0].as_str().unwrap();
    assert!(message.contains("lol.com/nope"));
    assert!(message.contains("lol.com/api-docs"));
}

#[tokio::test]
async fn malformed_json_body_returns_the_document_not_json_incident() {
    let mut app = create_test_app();
    let request = configure_request("application/json", "{oops");
    let (status, body) = send_request(&mut app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["sdipErrorCodes"][0], "SDIP_4007");
    assert!(body["messages"][0]
        .as_str()
        .unwrap()
        .starts_with("The provided document is not JSON"));
}

#[tokio::test]
async fn structurally_wrong_json_returns_the_mapping_incident() {
    let mut app = create_test_app();
    let payload = json!({ "context": 1, "sparqlEndpoint": "http://scania.com/neptune/sparql" });
    let request = configure_request("application/json", &payload.to_string());
    let (status, body) = send_request(&mut app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["sdipErrorCodes"][0], "SDIP_40055");
}

#[tokio::test]
async fn missing_body_returns_the_no_body_incident() {
    let mut app = create_test_app();
    let request = configure_request("application/json", "");
    let (status, body) = send_request(&mut app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["sdipErrorCodes"][0], "SDIP_40026");
    assert_eq!(body["messages"][0], "No body was provided. Body is required.");
}

#[tokio::test]
async fn wrong_content_type_returns_the_unsupported_media_type_incident() {
    let mut app = create_test_app();
    let request = configure_request("text/plain", "context=x");
    let (status, body) = send_request(&mut app, request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["sdipErrorCodes"][0], "SDIP_4151");
    assert!(body["messages"][0]
        .as_str()
        .unwrap()
        .contains("[\"application/json\"]"));
}

#[tokio::test]
async fn unacceptable_accept_header_returns_the_not_acceptable_incident() {
    let mut app = create_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/configure")
        .header("content-type", "application/json")
        .header("accept", "text/html")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send_request(&mut app, request).await;

    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["sdipErrorCodes"][0], "SDIP_4061");
}

#[tokio::test]
async fn empty_field_values_return_the_invalid_field_incident() {
    let mut app = create_test_app();
    let payload = json!({ "context": "", "sparqlEndpoint": "" });
    let request = configure_request("application/json", &payload.to_string());
    let (status, body) = send_request(&mut app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["sdipErrorCodes"][0], "SDIP_40025");
    assert!(body["messages"][0]
        .as_str()
        .unwrap()
        .contains("'context', 'sparqlEndpoint'"));
}

#[tokio::test]
async fn valid_configuration_is_accepted() {
    let mut app = create_test_app();
    let payload = json!({
        "context": "{\"@context\": {}}",
        "sparqlEndpoint": "http://scania.com/neptune/sparql"
    });
    let request = configure_request("application/json", &payload.to_string());
    let (status, body) = send_request(&mut app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "configured");
}

#[tokio::test]
async fn incident_payload_carries_timestamp_and_request_line() {
    let mut app = create_test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/missing?domain=vehicle")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_request(&mut app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(body["request"], "GET /missingdomain=vehicle");
    assert_eq!(
        body["sdipErrorCodes"].as_array().unwrap().len(),
        body["messages"].as_array().unwrap().len()
    );
}
