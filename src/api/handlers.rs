use axum::{
    extract::{Request, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::errors::{
    BodyCause, Dispatcher, FieldViolation, RequestContext, ServiceFailure,
};

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

/// The one media type the configuration endpoints produce and consume.
const SUPPORTED_MEDIA_TYPE: &str = "application/json";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub dispatcher: Dispatcher,
}

/// Configuration submitted by operators; the representative body-consuming
/// endpoint of this service.
#[derive(Debug, Deserialize)]
pub struct ConfigureRequest {
    pub context: String,
    #[serde(rename = "sparqlEndpoint")]
    pub sparql_endpoint: String,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sdip-incidents",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": START_TIME.elapsed().as_secs(),
    }))
}

/// `POST /configure`. Every way the body can be unusable is normalized into
/// a `ServiceFailure` and answered by the dispatcher, so clients always get
/// an `Incident` payload.
pub async fn configure(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let context = RequestContext::from_parts(&parts);

    if let Some(accept) = header_value(&parts.headers, header::ACCEPT) {
        if !accepts_json(&accept) {
            return state.dispatcher.handle(
                ServiceFailure::NotAcceptable {
                    supported: vec![SUPPORTED_MEDIA_TYPE.to_owned()],
                },
                Some(context),
            );
        }
    }

    match header_value(&parts.headers, header::CONTENT_TYPE) {
        Some(content_type) if content_type.starts_with(SUPPORTED_MEDIA_TYPE) => {}
        _ => {
            return state.dispatcher.handle(
                ServiceFailure::UnsupportedMediaType {
                    supported: vec![SUPPORTED_MEDIA_TYPE.to_owned()],
                },
                Some(context),
            );
        }
    }

    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return state.dispatcher.handle(
                ServiceFailure::BodyNotReadable {
                    message: err.to_string(),
                    cause: None,
                },
                Some(context),
            );
        }
    };
    if bytes.is_empty() {
        return state.dispatcher.handle(
            ServiceFailure::BodyNotReadable {
                message: "Required request body is missing".to_owned(),
                cause: None,
            },
            Some(context),
        );
    }

    // two-stage parse: syntax errors and structural mapping errors carry
    // different error codes
    let value: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => {
            return state.dispatcher.handle(
                ServiceFailure::BodyNotReadable {
                    message: err.to_string(),
                    cause: Some(BodyCause::JsonSyntax {
                        message: err.to_string(),
                        payload: String::from_utf8_lossy(&bytes).into_owned(),
                    }),
                },
                Some(context),
            );
        }
    };
    let configure: ConfigureRequest = match serde_json::from_value(value) {
        Ok(configure) => configure,
        Err(err) => {
            return state.dispatcher.handle(
                ServiceFailure::BodyNotReadable {
                    message: err.to_string(),
                    cause: Some(BodyCause::JsonMapping {
                        message: err.to_string(),
                    }),
                },
                Some(context),
            );
        }
    };

    let violations = validate_configure(&configure);
    if !violations.is_empty() {
        return state
            .dispatcher
            .handle(ServiceFailure::InvalidFields(violations), Some(context));
    }

    info!(
        sparql_endpoint = %configure.sparql_endpoint,
        "Service configured"
    );
    Json(serde_json::json!({ "status": "configured" })).into_response()
}

/// Fallback for unmatched routes.
pub async fn not_found(State(state): State<AppState>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    let context = RequestContext::from_parts(&parts);
    let host = header_value(&parts.headers, header::HOST).unwrap_or_default();
    state.dispatcher.handle(
        ServiceFailure::HandlerNotFound {
            host,
            url: parts.uri.path().to_owned(),
        },
        Some(context),
    )
}

fn validate_configure(configure: &ConfigureRequest) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    for (field, value) in [
        ("context", &configure.context),
        ("sparqlEndpoint", &configure.sparql_endpoint),
    ] {
        if value.trim().is_empty() {
            violations.push(FieldViolation {
                field: field.to_owned(),
                rejected_value: value.clone(),
            });
        }
    }
    violations
}

fn header_value(headers: &axum::http::HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

fn accepts_json(accept: &str) -> bool {
    accept.split(',').any(|entry| {
        let media = entry.split(';').next().unwrap_or("").trim();
        media == SUPPORTED_MEDIA_TYPE || media == "*/*" || media == "application/*"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_json_handles_wildcards_and_parameters() {
        assert!(accepts_json("application/json"));
        assert!(accepts_json("text/html, application/json;q=0.9"));
        assert!(accepts_json("*/*"));
        assert!(accepts_json("application/*"));
        assert!(!accepts_json("text/html"));
        assert!(!accepts_json("application/xml, text/plain"));
    }

    #[test]
    fn empty_fields_are_reported_as_violations() {
        let configure = ConfigureRequest {
            context: "".to_owned(),
            sparql_endpoint: "http://scania.com/neptune/sparql".to_owned(),
        };
        let violations = validate_configure(&configure);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "context");
    }
}
