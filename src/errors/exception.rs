use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;

use crate::config::ServiceIdentity;

use super::binding::{ArgumentCountMismatch, ErrorArg, ErrorBinding};
use super::codes::{ErrorCode, FALLBACK_EXIT_CODE};
use super::incident::Incident;
use super::template;

const NO_BINDINGS_WARNING: &str = "No error bindings set within the IncidentException. \
     You should not see this message. Ensure that you didn't forgot to add an errorBinding \
     or that you didn't.";

/// Sink for the one error-level entry an incident produces.
///
/// The core depends only on this abstraction; the caller picks the concrete
/// sink (production code uses [`TracingLogger`], tests capture the entries).
pub trait IncidentLogger: Send + Sync {
    fn error(&self, entry: &str);
}

/// Production logger, forwards to the tracing facade.
pub struct TracingLogger;

impl IncidentLogger for TracingLogger {
    fn error(&self, entry: &str) {
        tracing::error!("{entry}");
    }
}

/// Snapshot of the request that caused an incident: method, path, query and
/// headers, taken at the request-handling boundary.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: String,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        query: Option<String>,
        headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query,
            headers,
        }
    }

    pub fn from_parts(parts: &axum::http::request::Parts) -> Self {
        Self {
            method: parts.method.to_string(),
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(ToOwned::to_owned),
            headers: parts
                .headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        value.to_str().unwrap_or("<non-ascii>").to_owned(),
                    )
                })
                .collect(),
        }
    }

    fn request_line(&self) -> String {
        format!(
            "{} {}{}",
            self.method,
            self.path,
            self.query.as_deref().unwrap_or("")
        )
    }
}

/// A failure in flight: one or more error bindings accumulated during a
/// single request, plus the context needed to render the HTTP payload and the
/// log entry.
pub struct IncidentException {
    bindings: Vec<ErrorBinding>,
    logger: Arc<dyn IncidentLogger>,
    request: Option<RequestContext>,
    action_details: Option<String>,
    source: Option<anyhow::Error>,
    execution_id: Option<String>,
    populate_error: Option<String>,
}

impl IncidentException {
    /// An exception with no bindings yet; callers accumulate via
    /// [`add_incident`](Self::add_incident).
    pub fn new(logger: Arc<dyn IncidentLogger>) -> Self {
        Self {
            bindings: Vec::new(),
            logger,
            request: None,
            action_details: None,
            source: None,
            execution_id: None,
            populate_error: None,
        }
    }

    /// An exception seeded with one binding.
    pub fn of(
        code: impl ErrorCode + 'static,
        args: Vec<ErrorArg>,
        logger: Arc<dyn IncidentLogger>,
    ) -> Result<Self, ArgumentCountMismatch> {
        let mut exception = Self::new(logger);
        exception.add_incident(ErrorBinding::new(code, args)?);
        Ok(exception)
    }

    /// Attach the lower-level failure this incident wraps; its error chain is
    /// appended to the log entry as a trailing block.
    pub fn set_source(&mut self, source: anyhow::Error) {
        self.source = Some(source);
    }

    /// Annotate with the high-level operation in progress when the failure
    /// occurred. Applied once to the first HTTP message, then cleared.
    pub fn set_action_details(&mut self, action: impl Into<String>) {
        self.action_details = Some(action.into());
    }

    /// Log-only note that the failure occurred while populating a derived
    /// value.
    pub fn set_populate_error(&mut self, populate: impl Into<String>) {
        self.populate_error = Some(populate.into());
    }

    /// Correlation id; when non-empty, one extra structured log line is
    /// emitted per binding.
    pub fn set_execution_id(&mut self, execution_id: impl Into<String>) {
        self.execution_id = Some(execution_id.into());
    }

    pub fn set_request_used(&mut self, request: RequestContext) {
        self.request = Some(request);
    }

    /// Append a binding. Never deduplicates; insertion order is rendering
    /// order.
    pub fn add_incident(&mut self, binding: ErrorBinding) {
        self.bindings.push(binding);
    }

    pub fn bindings(&self) -> &[ErrorBinding] {
        &self.bindings
    }

    /// `Err(self)` iff at least one binding has been added. Lets callers
    /// collect several problems (e.g. multiple invalid fields) before
    /// deciding whether to abort.
    pub fn throw_if_any_incidents(self) -> Result<(), Self> {
        if self.bindings.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Exit status for a fatal run: the sole binding's registered exit code,
    /// or 1000 when zero or several bindings make the cause ambiguous.
    pub fn exit_code(&self) -> i32 {
        match self.bindings.as_slice() {
            [binding] => binding.error_code().exit_code(),
            _ => FALLBACK_EXIT_CODE,
        }
    }

    /// Terminate the process with [`exit_code`](Self::exit_code). Only used
    /// outside the HTTP path, e.g. startup validation.
    pub fn run_exit(&self) -> ! {
        std::process::exit(self.exit_code())
    }

    /// Render the HTTP response: one labeled code and one message per binding
    /// in insertion order, plus the worst status representing them all.
    pub fn create_http_error_response(&mut self) -> (StatusCode, Incident) {
        let mut incident = Incident::new();
        let mut worst_status = 0;
        for binding in &self.bindings {
            incident.add_sdip_error_code(binding.error_code().label());
            incident.add_message(template::render(
                &binding.error_code().http_message(),
                &binding.http_args(),
            ));
            worst_status = pick_worst_status(worst_status, binding.error_code().http_status());
        }
        incident.timestamp = Utc::now().timestamp_millis();
        if let Some(request) = &self.request {
            incident.request = request.request_line();
        }

        if let Some(action) = self.action_details.as_deref() {
            if !action.is_empty() {
                if let Some(first) = incident.messages.first_mut() {
                    *first = format!("(Error occured in Action - {action}) {first}");
                }
                self.action_details = None;
            }
        }

        // a status outside 4xx/5xx here means error codes and status codes
        // got mixed up (or a CLI-only code leaked in); answer 500 rather
        // than an invalid HTTP status
        if !is_4xx(worst_status) && !is_5xx(worst_status) {
            worst_status = 500;
        }
        let status = StatusCode::from_u16(worst_status as u16)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, incident)
    }

    /// Emit the full log entry: per-binding lines with the service-identity
    /// prefix, the request line and headers, and every wrapped failure's
    /// error chain.
    pub fn print_to_log(&self, identity: &ServiceIdentity) {
        if self.bindings.is_empty() {
            self.logger.error(NO_BINDINGS_WARNING);
            return;
        }

        let prefix = format!("{}_{}_", identity.env_name, identity.service_id);
        let mut error_codes = Vec::new();
        let mut messages = Vec::new();
        let mut failures: Vec<&anyhow::Error> = Vec::new();

        for binding in &self.bindings {
            failures.extend(binding.failures());
            let label = binding.error_code().label();
            let rendered =
                template::render(&self.log_template_for(binding), &binding.log_args());
            error_codes.push(format!("{prefix}{label}"));
            messages.push(format!("{prefix}{label}: {rendered}"));
            if let Some(execution_id) = self.execution_id.as_deref() {
                if !execution_id.is_empty() {
                    self.logger
                        .error(&format!("{execution_id}-{label}-{rendered}"));
                }
            }
        }

        let mut entry = String::new();
        entry.push_str(&error_codes.join(", "));
        entry.push_str("\n\n");
        for message in &messages {
            entry.push_str(message);
            entry.push('\n');
        }
        entry.push('\n');

        if let Some(request) = &self.request {
            entry.push_str(&format!("    {}\n", request.request_line()));
            for (name, value) in &request.headers {
                entry.push_str(&format!("        {name}: {value}\n"));
            }
        }
        for failure in failures {
            entry.push_str(&format!("    {failure:?}"));
        }
        self.logger.error(&entry);

        if let Some(source) = &self.source {
            self.logger.error(&format!("{source:?}"));
        }
    }

    // Log templates get at most one contextual prefix phrase; the populate
    // wording wins over the action wording when both annotations are set.
    fn log_template_for(&self, binding: &ErrorBinding) -> String {
        let log_message = binding.error_code().log_message();
        if let Some(populate) = self.populate_error.as_deref() {
            if !populate.is_empty() {
                return format!("Error occured while populating {populate}{log_message}");
            }
        }
        if let Some(action) = self.action_details.as_deref() {
            if !action.is_empty() {
                return format!("(Error occured in Action - {action}) {log_message}");
            }
        }
        log_message
    }
}

impl fmt::Debug for IncidentException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncidentException")
            .field(
                "bindings",
                &self
                    .bindings
                    .iter()
                    .map(|b| b.error_code().label())
                    .collect::<Vec<_>>(),
            )
            .field("action_details", &self.action_details)
            .field("execution_id", &self.execution_id)
            .finish_non_exhaustive()
    }
}

// Display lists the bound code labels so an incident escaping as a plain
// error still names its causes.
impl fmt::Display for IncidentException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            return write!(f, "incident with no error bindings");
        }
        let labels = self
            .bindings
            .iter()
            .map(|b| b.error_code().label())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "incident: {labels}")
    }
}

impl std::error::Error for IncidentException {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

fn is_4xx(status: i32) -> bool {
    (400..500).contains(&status)
}

fn is_5xx(status: i32) -> bool {
    (500..600).contains(&status)
}

/// Fold one more binding's status into the running worst status.
///
/// Same 4xx keeps it, a different 4xx degrades to generic 400, any 5xx in the
/// mix escalates to generic 500 unless every 5xx is the same code. An
/// unclassified running value (first binding, or a non-HTTP sentinel) is
/// simply replaced.
fn pick_worst_status(worst_status: i32, status: i32) -> i32 {
    if is_4xx(worst_status) {
        if is_4xx(status) {
            if status != worst_status {
                400
            } else {
                worst_status
            }
        } else {
            500
        }
    } else if is_5xx(worst_status) {
        if is_5xx(status) && status == worst_status {
            worst_status
        } else {
            500
        }
    } else {
        status
    }
}
