//! Centralized incident model: error codes with paired message templates,
//! the exception type that accumulates them during one request, and the
//! dispatcher that turns any failure into an HTTP response plus a log entry.

pub mod binding;
pub mod codes;
pub mod dispatcher;
pub mod exception;
pub mod incident;
pub mod template;

pub use binding::{ArgumentCountMismatch, ErrorArg, ErrorBinding};
pub use codes::{ErrorCode, SdipErrorCode, ERRORCODE_PREFIX, SUPPORTMAIL};
pub use dispatcher::{BodyCause, Dispatcher, FieldViolation, ServiceFailure};
pub use exception::{IncidentException, IncidentLogger, RequestContext, TracingLogger};
pub use incident::Incident;
