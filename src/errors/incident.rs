use serde::{Deserialize, Serialize};

/// Sentinel request description when no request context was attached.
pub const REQUEST_NOT_AVAILABLE: &str = "REQUEST DATA NOT AVAILABLE";

/// The payload returned to the user for one failed request.
///
/// Created fresh each time an `IncidentException` renders a response; never
/// persisted or reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    /// Labeled error codes, e.g. `["SDIP_4003"]`, in insertion order.
    #[serde(rename = "sdipErrorCodes")]
    pub sdip_error_codes: Vec<String>,
    /// Rendered HTTP messages, parallel to the code list.
    pub messages: Vec<String>,
    /// Creation time, epoch millis.
    pub timestamp: i64,
    /// `"{method} {path}{query}"` of the originating request, or the
    /// not-available sentinel.
    pub request: String,
}

impl Incident {
    pub fn new() -> Self {
        Self {
            sdip_error_codes: Vec::new(),
            messages: Vec::new(),
            timestamp: 0,
            request: REQUEST_NOT_AVAILABLE.to_owned(),
        }
    }

    pub fn add_sdip_error_code(&mut self, code: impl Into<String>) {
        self.sdip_error_codes.push(code.into());
    }

    pub fn add_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

impl Default for Incident {
    fn default() -> Self {
        Self::new()
    }
}
