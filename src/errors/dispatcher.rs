use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::config::ServiceIdentity;

use super::binding::{ArgumentCountMismatch, ErrorArg};
use super::codes::{SdipErrorCode, API_DOCS_PATH, SUPPORTMAIL};
use super::exception::{IncidentException, IncidentLogger, RequestContext, TracingLogger};

/// Why a request body could not be read.
#[derive(Debug)]
pub enum BodyCause {
    /// The payload is not syntactically valid JSON.
    JsonSyntax { message: String, payload: String },
    /// Valid JSON that cannot be mapped onto the expected structure.
    JsonMapping { message: String },
}

/// One field that failed validation. Covers both validation styles of the
/// boundary: per-field binding results and constraint violations carry the
/// same (name, rejected value) payload.
#[derive(Debug)]
pub struct FieldViolation {
    pub field: String,
    pub rejected_value: String,
}

/// Every failure family the dispatcher classifies, normalized to structural
/// data at the request-handling boundary.
#[derive(Debug)]
pub enum ServiceFailure {
    /// Already an incident; used as-is.
    Incident(IncidentException),
    /// The framework could not read the request body.
    BodyNotReadable {
        message: String,
        cause: Option<BodyCause>,
    },
    /// No route matched the requested path.
    HandlerNotFound { host: String, url: String },
    /// The request's Content-Type is not supported.
    UnsupportedMediaType { supported: Vec<String> },
    /// Content negotiation failed; no acceptable representation.
    NotAcceptable { supported: Vec<String> },
    /// Field or bean validation failed.
    InvalidFields(Vec<FieldViolation>),
    /// Anything else.
    Other(anyhow::Error),
}

/// Global failure handler: turns any failure into exactly one log entry and
/// one `Incident`-carrying HTTP response.
#[derive(Clone)]
pub struct Dispatcher {
    identity: ServiceIdentity,
    logger: Arc<dyn IncidentLogger>,
}

impl Dispatcher {
    pub fn new(identity: ServiceIdentity) -> Self {
        Self::with_logger(identity, Arc::new(TracingLogger))
    }

    pub fn with_logger(identity: ServiceIdentity, logger: Arc<dyn IncidentLogger>) -> Self {
        Self { identity, logger }
    }

    /// Classify the failure, attach the request context, log once and render
    /// once.
    pub fn handle(&self, failure: ServiceFailure, request: Option<RequestContext>) -> Response {
        match self.dispatch(failure, request) {
            Ok(response) => response,
            // a binding constructed by the dispatcher itself had the wrong
            // arity; that is a bug here, not a user problem
            Err(mismatch) => {
                tracing::error!("error binding constructed with wrong arity: {mismatch}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    fn dispatch(
        &self,
        failure: ServiceFailure,
        request: Option<RequestContext>,
    ) -> Result<Response, ArgumentCountMismatch> {
        let mut exception = self.classify(failure)?;
        if let Some(request) = request {
            exception.set_request_used(request);
        }
        exception.print_to_log(&self.identity);
        let (status, incident) = exception.create_http_error_response();
        Ok((status, Json(incident)).into_response())
    }

    // Branch order matters: a body-not-readable failure with an unrecognized
    // shape falls through to the generic fallback.
    fn classify(
        &self,
        failure: ServiceFailure,
    ) -> Result<IncidentException, ArgumentCountMismatch> {
        match failure {
            ServiceFailure::Incident(exception) => Ok(exception),
            ServiceFailure::BodyNotReadable { message, cause } => match cause {
                Some(BodyCause::JsonSyntax { message, payload }) => self.incident(
                    SdipErrorCode::DocumentNotJson,
                    vec![ErrorArg::from(message), ErrorArg::from(payload)],
                ),
                Some(BodyCause::JsonMapping { message }) => self.incident(
                    SdipErrorCode::JsonMappingError,
                    vec![ErrorArg::from(message)],
                ),
                None if message
                    .to_lowercase()
                    .starts_with("required request body is missing") =>
                {
                    self.incident(SdipErrorCode::NoBody, vec![])
                }
                None if message.to_lowercase().starts_with("json parse error:") => self.incident(
                    SdipErrorCode::DocumentNotJson2,
                    vec![ErrorArg::from(message)],
                ),
                None => self.fallback(message),
            },
            ServiceFailure::HandlerNotFound { host, url } => self.incident(
                SdipErrorCode::PageNotFound,
                vec![
                    ErrorArg::from(format!("{host}{url}")),
                    ErrorArg::from(format!("{host}{API_DOCS_PATH}")),
                ],
            ),
            ServiceFailure::UnsupportedMediaType { supported } => self.incident(
                SdipErrorCode::UnsupportedMediaType,
                vec![ErrorArg::from(media_type_list(&supported))],
            ),
            ServiceFailure::NotAcceptable { supported } => self.incident(
                SdipErrorCode::NotAcceptable,
                vec![ErrorArg::from(media_type_list(&supported))],
            ),
            ServiceFailure::InvalidFields(violations) => {
                let fields = violations
                    .iter()
                    .map(|v| format!("'{}'", v.field))
                    .collect::<Vec<_>>()
                    .join(", ");
                let values = violations
                    .iter()
                    .map(|v| format!("'{}' had value '{}'", v.field, v.rejected_value))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.incident(
                    SdipErrorCode::InvalidField,
                    vec![ErrorArg::from(fields), ErrorArg::from(values)],
                )
            }
            ServiceFailure::Other(err) => self.fallback(err.to_string()),
        }
    }

    fn incident(
        &self,
        code: SdipErrorCode,
        args: Vec<ErrorArg>,
    ) -> Result<IncidentException, ArgumentCountMismatch> {
        IncidentException::of(code, args, self.logger.clone())
    }

    fn fallback(&self, message: String) -> Result<IncidentException, ArgumentCountMismatch> {
        self.incident(
            SdipErrorCode::UnknownReasonError,
            vec![ErrorArg::from(message), ErrorArg::from(SUPPORTMAIL)],
        )
    }
}

/// `["application/json", "text/turtle"]` rendering of a supported-media-type
/// list.
fn media_type_list(media_types: &[String]) -> String {
    let quoted = media_types
        .iter()
        .map(|m| format!("\"{m}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{quoted}]")
}
