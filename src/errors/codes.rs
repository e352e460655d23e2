use std::collections::HashMap;
use std::sync::RwLock;

/// Prefix used when rendering a numeric code as a label, e.g. `SDIP_4003`.
pub const ERRORCODE_PREFIX: &str = "SDIP_";

/// Support contact handed to users when the service fails for an unknown reason.
pub const SUPPORTMAIL: &str = "DL7167@scania.com";

/// Environment name used when none was supplied at startup.
pub const EMPTY_ENVIRONMENT_VAR: &str = " LOCAL";

/// Process exit code when zero or more than one error binding is present;
/// a single exit status cannot represent multiple simultaneous causes.
pub const FALLBACK_EXIT_CODE: i32 = 1000;

/// Where clients are pointed when they request a URL that does not exist.
pub const API_DOCS_PATH: &str = "/api-docs";

/// Accessors for the information assigned to an error code.
///
/// The two message templates use positional `{0}`, `{1}`, ... placeholders and
/// can be rebound late (localization or test overrides); the rest of an error
/// code is immutable after registration.
pub trait ErrorCode: Send + Sync {
    /// HTTP status for this code, or `-1` for CLI/startup-only codes.
    fn http_status(&self) -> i32;

    /// Globally unique numeric identifier.
    fn numeric_code(&self) -> u32;

    /// Template for the message returned to HTTP clients.
    fn http_message(&self) -> String;

    /// Template for the message written to the log.
    fn log_message(&self) -> String;

    /// Process exit status when this code is the sole cause of a fatal run.
    fn exit_code(&self) -> i32;

    /// Labeled form, e.g. `SDIP_40025`.
    fn label(&self) -> String {
        format!("{}{}", ERRORCODE_PREFIX, self.numeric_code())
    }
}

/// Error codes shared by all services on the platform.
///
/// This is a representative subset of the platform table: every code the
/// dispatcher constructs plus a spread of 4xx/5xx and CLI-only entries. The
/// full table is supplied as static platform data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdipErrorCode {
    // 400
    InvalidSparqlEndpointData,
    InvalidIdData,
    InvalidContextData,
    InvalidOntologyData,
    InvalidShaclData,
    DocumentNotJson,
    InvalidField,
    NoBody,
    DocumentNotJson2,
    NoDomainConfigurationsExist,
    ApplicationUnconfigured,
    JsonMappingError,
    // 404
    PageNotFound,
    ConfigurationNotFound,
    TokenNotFound,
    // 406
    NotAcceptable,
    // 415
    UnsupportedMediaType,
    // 500
    UnknownReasonError,
    IoError,
    ConfigurationError,
    UnknownParsingError,
    // 503
    RdfStoreUnreachable,
    UnableToCommunicateWithDatabase,
    // CLI-only codes (http status -1)
    BothTokenAndUrlOrNeither,
    FailedToParseArguments,
    ArgumentNotAValidUrl,
    UnsupportedDatabase,
    ResponseNotJsonDocument,
}

struct CodeEntry {
    http_status: i32,
    numeric_code: u32,
    http_message: String,
    log_message: String,
}

impl CodeEntry {
    fn http(status: i32, code: u32, http_message: &str, log_message: &str) -> Self {
        Self {
            http_status: status,
            numeric_code: code,
            http_message: http_message.to_owned(),
            log_message: log_message.to_owned(),
        }
    }

    // CLI-only entries are never returned over HTTP; the placeholder message
    // keeps the accessors total.
    fn cli(code: u32, log_message: &str) -> Self {
        Self {
            http_status: -1,
            numeric_code: code,
            http_message: "ERROR".to_owned(),
            log_message: log_message.to_owned(),
        }
    }
}

lazy_static::lazy_static! {
    static ref REGISTRY: RwLock<HashMap<SdipErrorCode, CodeEntry>> =
        RwLock::new(build_registry());
}

fn build_registry() -> HashMap<SdipErrorCode, CodeEntry> {
    use SdipErrorCode::*;

    let mut table = HashMap::new();
    table.insert(InvalidSparqlEndpointData, CodeEntry::http(400, 4001,
        "The value for the field \"sparqlEndpoint\" not a valid URL, change the value for this field to be on the form \"http://scania.com/neptune/sparql\\\".",
        "The value for the field \"sparqlEndpoint\" is not a valid URL, sparqlEndpoint was: {0}"));
    table.insert(InvalidIdData, CodeEntry::http(400, 4002,
        "The value for the field \"id\" not a valid id.",
        "The value for the field \"id\"\" is not valid. "));
    table.insert(InvalidContextData, CodeEntry::http(400, 4003,
        "The value for the field \"context\" is not a valid context, the context needs to be described in JSON-LD(https://json-ld.org/spec/latest/json-ld/).",
        "The value for the field \"context\" is not a valid context, context was: {0}"));
    table.insert(InvalidOntologyData, CodeEntry::http(400, 4004,
        "The value for the field \"ontology\" is not a valid ontology, the ontology needs to be in OWL(https://www.w3.org/TR/owl2-syntax/) and described in RDF/XML(https://www.w3.org/TR/rdf-syntax-grammar/), Turtle(https://www.w3.org/TR/turtle/) or JSON-LD(https://json-ld.org/spec/latest/json-ld/).",
        "The value for the field \"ontology\" is not a valid ontology, ontology was: {0}"));
    table.insert(InvalidShaclData, CodeEntry::http(400, 4005,
        "The value for the field \"shacl\" is not a valid shacl file, the shacl needs to be SHACL(https://www.w3.org/TR/shacl/) and described in RDF/XML(https://www.w3.org/TR/rdf-syntax-grammar/), Turtle(https://www.w3.org/TR/turtle/) or JSON-LD(https://json-ld.org/spec/latest/json-ld/).",
        "The value for the field \"shacl\" is not a valid shacl-file, shacl was: {0}."));
    table.insert(DocumentNotJson, CodeEntry::http(400, 4007,
        "The provided document is not JSON(https://www.json.org/), {0}",
        "The provided document is not JSON, error: {0}, document:\n {1}"));
    table.insert(InvalidField, CodeEntry::http(400, 40025,
        "The value for fields {0} was missing or set to an empty value. Try again with a value set.",
        "The value for field was missing or set to an empty value. Validation failures was: {1}"));
    table.insert(NoBody, CodeEntry::http(400, 40026,
        "No body was provided. Body is required.",
        "No body was provided. Body is required."));
    table.insert(DocumentNotJson2, CodeEntry::http(400, 40039,
        "The provided document is not JSON(https://www.json.org/), {0}",
        "The provided document is not JSON, error: {0}"));
    table.insert(NoDomainConfigurationsExist, CodeEntry::http(404, 40049,
        "No Domain Configurations exist in SDCS. Please configure a domain. /domain (POST)",
        "No Domain Configurations exist in SDCS. Please configure a domain. /domain (POST)"));
    table.insert(ApplicationUnconfigured, CodeEntry::http(400, 40050,
        "This service is not yet configured, you should configure it by calling POST /configure.",
        "This service is not yet configured, the user should configure it by calling POST /configure before calling endpoint again."));
    table.insert(JsonMappingError, CodeEntry::http(400, 40055,
        "Json mapping exception: {0}",
        "Json mapping exception: {0}"));
    table.insert(PageNotFound, CodeEntry::http(404, 4041,
        "The url {0} does not exist in the platform. To see what urls are available go to {1}",
        "The url {0} does not exist in the platform. The user has been told to go to the api documentation."));
    table.insert(ConfigurationNotFound, CodeEntry::http(404, 4043,
        "No configuration with id {0} found.",
        "No configuration with id {0} found."));
    table.insert(TokenNotFound, CodeEntry::http(404, 4044,
        "No HttpHeader Authorization token was found.",
        "No HttpHeader Authorization token was found."));
    table.insert(NotAcceptable, CodeEntry::http(406, 4061,
        "The server is unable to serve a request with the media type required by the client. Supported media-types are: {0}.",
        "The server is unable to serve a request with the media type required by the client. Supported media-types are: {0}."));
    table.insert(UnsupportedMediaType, CodeEntry::http(415, 4151,
        "The value for HTTP header Content-Type is not a valid media type for this endpoint. Supported media-types are: {0}.",
        "The value for HTTP header Content-Type is not a valid media type for this endpoint. Supported media-types are: {0}."));
    table.insert(UnknownReasonError, CodeEntry::http(500, 5001,
        "The service was unable to fulfill the request for an unknown reason {0}, contact support on mail {1} if the issue persists.",
        "The service was unable to fulfill the request for an unknown reason {0}, contact support on mail {1} if the issue persists."));
    table.insert(IoError, CodeEntry::http(500, 5004,
        "The service was unable to fulfill the request due to an IO error, contact support on mail {0} if the issue persists.",
        "The service was unable to fulfill the request due to an IO error, see stacktrace for more information."));
    table.insert(ConfigurationError, CodeEntry::http(500, 5009,
        "Something went wrong when retrieving configuration details. Configuration is incomplete and invalid, this should never happen. contact support on mail {0}.",
        "Something went wrong when retrieving configuration details. Configuration is incomplete and invalid, this should never happen."));
    table.insert(UnknownParsingError, CodeEntry::http(500, 50013,
        "An unknown Error occured while parsing JSONArray into Model object with the following error message: {0} ",
        "An unknown Error occured while parsing JSONArray into Model object with the following error message: {0} "));
    table.insert(RdfStoreUnreachable, CodeEntry::http(503, 5031,
        "The service was unable to communicate with the rdf store endpoint, contact support on mail {1} if the issue persists.",
        "The service was unable to communicate with the rdf store endpoint {0}, the user has been told to contact support."));
    table.insert(UnableToCommunicateWithDatabase, CodeEntry::http(503, 5032,
        "Unable to communicate with the configuration persistence layer. Database answered: \"{0}\". Contact support on mail {1} if the issue persists.",
        "Unable to communicate with the configuration persistence layer. Database answered: \"{0}\". The user has been told to contact support."));
    table.insert(BothTokenAndUrlOrNeither, CodeEntry::cli(101,
        "Both -t/--token and -u/--url needs to specified or neither, but never only one of them."));
    table.insert(FailedToParseArguments, CodeEntry::cli(102,
        "Failed to parse arguments from command line due to the following error: {0}"));
    table.insert(ArgumentNotAValidUrl, CodeEntry::cli(103,
        "The argument for the config host -ch/--configHost is not a valid URL. was: {0}"));
    table.insert(UnsupportedDatabase, CodeEntry::cli(202,
        "The database string provided is not a supported database, supported databases are mongodb and dynamodb."));
    table.insert(ResponseNotJsonDocument, CodeEntry::cli(310,
        "The provided configuration from endpoint {0} does not seem to be json. Got the following error message when parsing: {1}"));
    table
}

impl SdipErrorCode {
    /// Every registered code, in registry order. Used by the arity sweeps in
    /// the binding tests.
    pub fn all() -> &'static [SdipErrorCode] {
        use SdipErrorCode::*;
        &[
            InvalidSparqlEndpointData,
            InvalidIdData,
            InvalidContextData,
            InvalidOntologyData,
            InvalidShaclData,
            DocumentNotJson,
            InvalidField,
            NoBody,
            DocumentNotJson2,
            NoDomainConfigurationsExist,
            ApplicationUnconfigured,
            JsonMappingError,
            PageNotFound,
            ConfigurationNotFound,
            TokenNotFound,
            NotAcceptable,
            UnsupportedMediaType,
            UnknownReasonError,
            IoError,
            ConfigurationError,
            UnknownParsingError,
            RdfStoreUnreachable,
            UnableToCommunicateWithDatabase,
            BothTokenAndUrlOrNeither,
            FailedToParseArguments,
            ArgumentNotAValidUrl,
            UnsupportedDatabase,
            ResponseNotJsonDocument,
        ]
    }

    fn read<T>(self, f: impl FnOnce(&CodeEntry) -> T) -> T {
        let registry = REGISTRY.read().unwrap_or_else(|e| e.into_inner());
        f(&registry[&self])
    }

    /// Rebind the HTTP message template (localization or test override).
    /// Intended for startup/test setup, not concurrent request handling.
    pub fn set_http_message(self, template: impl Into<String>) {
        let mut registry = REGISTRY.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = registry.get_mut(&self) {
            entry.http_message = template.into();
        }
    }

    /// Rebind the log message template (localization or test override).
    pub fn set_log_message(self, template: impl Into<String>) {
        let mut registry = REGISTRY.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = registry.get_mut(&self) {
            entry.log_message = template.into();
        }
    }
}

impl ErrorCode for SdipErrorCode {
    fn http_status(&self) -> i32 {
        self.read(|e| e.http_status)
    }

    fn numeric_code(&self) -> u32 {
        self.read(|e| e.numeric_code)
    }

    fn http_message(&self) -> String {
        self.read(|e| e.http_message.clone())
    }

    fn log_message(&self) -> String {
        self.read(|e| e.log_message.clone())
    }

    fn exit_code(&self) -> i32 {
        self.read(|e| e.numeric_code as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in SdipErrorCode::all() {
            assert!(
                seen.insert(code.numeric_code()),
                "duplicate numeric code {}",
                code.numeric_code()
            );
        }
    }

    #[test]
    fn cli_only_codes_carry_the_sentinel_status() {
        assert_eq!(SdipErrorCode::FailedToParseArguments.http_status(), -1);
        assert_eq!(SdipErrorCode::FailedToParseArguments.http_message(), "ERROR");
    }

    #[test]
    fn exit_code_equals_numeric_code() {
        for code in SdipErrorCode::all() {
            assert_eq!(code.exit_code(), code.numeric_code() as i32);
        }
    }

    #[test]
    fn label_is_prefixed_numeric_code() {
        assert_eq!(SdipErrorCode::InvalidContextData.label(), "SDIP_4003");
    }
}
