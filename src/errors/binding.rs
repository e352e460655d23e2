use thiserror::Error;

use super::codes::ErrorCode;
use super::template;

/// One argument supplied to an error binding.
///
/// Failure arguments count towards the required-argument check but are never
/// substituted into a template; they surface as error chains in the log
/// instead.
#[derive(Debug)]
pub enum ErrorArg {
    Value(String),
    Failure(anyhow::Error),
}

impl ErrorArg {
    pub fn failure(err: impl Into<anyhow::Error>) -> Self {
        Self::Failure(err.into())
    }
}

impl From<&str> for ErrorArg {
    fn from(value: &str) -> Self {
        Self::Value(value.to_owned())
    }
}

impl From<String> for ErrorArg {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

/// Raised when the arguments given to [`ErrorBinding::new`] do not match the
/// placeholder requirements of the error code's templates. A programming
/// error in the caller; it always propagates.
#[derive(Debug, Error)]
#[error(
    "Number of arguments required by template strings '{http_template}' and '{log_template}' \
     doesnt match the number of arguments given [{given}]."
)]
pub struct ArgumentCountMismatch {
    pub http_template: String,
    pub log_template: String,
    pub given: String,
}

/// Binds one error code to the concrete arguments its templates need.
/// Created at instantiation of an `IncidentException` or appended to one.
pub struct ErrorBinding {
    code: Box<dyn ErrorCode>,
    args: Vec<ErrorArg>,
}

impl std::fmt::Debug for ErrorBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorBinding")
            .field("code", &self.code.numeric_code())
            .field("args", &self.args)
            .finish()
    }
}

impl ErrorBinding {
    /// Pair an error code with its template arguments.
    ///
    /// The non-failure arguments must match the larger placeholder count of
    /// the two templates: a binding has to satisfy whichever template needs
    /// more data, even if the other ignores trailing arguments.
    pub fn new(
        code: impl ErrorCode + 'static,
        args: Vec<ErrorArg>,
    ) -> Result<Self, ArgumentCountMismatch> {
        let real_args = args
            .iter()
            .filter(|arg| !matches!(arg, ErrorArg::Failure(_)))
            .count();
        let required = template::placeholder_count(&code.http_message())
            .max(template::placeholder_count(&code.log_message()));
        if real_args != required {
            return Err(ArgumentCountMismatch {
                http_template: code.http_message(),
                log_template: code.log_message(),
                given: args
                    .iter()
                    .map(|arg| match arg {
                        ErrorArg::Value(v) => v.clone(),
                        ErrorArg::Failure(e) => e.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
            });
        }
        Ok(Self {
            code: Box::new(code),
            args,
        })
    }

    pub fn error_code(&self) -> &dyn ErrorCode {
        self.code.as_ref()
    }

    /// Non-failure arguments with CR and LF stripped, for HTTP message
    /// rendering. No binding can inject line breaks into a response.
    pub fn http_args(&self) -> Vec<String> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                ErrorArg::Value(v) => Some(v.replace(['\r', '\n'], "")),
                ErrorArg::Failure(_) => None,
            })
            .collect()
    }

    /// Non-failure arguments verbatim, for log message rendering.
    pub fn log_args(&self) -> Vec<String> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                ErrorArg::Value(v) => Some(v.clone()),
                ErrorArg::Failure(_) => None,
            })
            .collect()
    }

    /// The failure-typed arguments, rendered as error chains in the log.
    pub fn failures(&self) -> impl Iterator<Item = &anyhow::Error> {
        self.args.iter().filter_map(|arg| match arg {
            ErrorArg::Value(_) => None,
            ErrorArg::Failure(e) => Some(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::codes::{ErrorCode, SdipErrorCode, SUPPORTMAIL};
    use super::super::template::placeholder_count;
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn matching_argument_count_never_fails_for_any_registered_code() {
        for code in SdipErrorCode::all() {
            let required = placeholder_count(&code.http_message())
                .max(placeholder_count(&code.log_message()));
            let args = (0..required)
                .map(|i| ErrorArg::from(i.to_string()))
                .collect();
            assert!(
                ErrorBinding::new(*code, args).is_ok(),
                "{:?} rejected a matching argument list",
                code
            );
        }
    }

    #[test]
    fn one_argument_short_always_fails() {
        for code in SdipErrorCode::all() {
            let required = placeholder_count(&code.http_message())
                .max(placeholder_count(&code.log_message()));
            if required == 0 {
                continue;
            }
            let args = (0..required - 1)
                .map(|i| ErrorArg::from(i.to_string()))
                .collect();
            assert!(
                ErrorBinding::new(*code, args).is_err(),
                "{:?} accepted a short argument list",
                code
            );
        }
    }

    #[test]
    fn failure_arguments_are_counted_but_not_substituted() {
        // UnknownReasonError needs two real args; a failure rides along
        let binding = ErrorBinding::new(
            SdipErrorCode::UnknownReasonError,
            vec![
                ErrorArg::failure(anyhow!("db went away")),
                ErrorArg::from("boom"),
                ErrorArg::from(SUPPORTMAIL),
            ],
        )
        .unwrap();
        assert_eq!(binding.http_args(), vec!["boom", SUPPORTMAIL]);
        assert_eq!(binding.failures().count(), 1);
    }

    #[test]
    fn a_failure_alone_satisfies_a_zero_placeholder_code() {
        let binding = ErrorBinding::new(
            SdipErrorCode::ApplicationUnconfigured,
            vec![ErrorArg::failure(anyhow!("cause"))],
        );
        assert!(binding.is_ok());
    }

    #[test]
    fn mismatch_error_names_both_templates_and_the_arguments() {
        let err = ErrorBinding::new(
            SdipErrorCode::InvalidContextData,
            vec![ErrorArg::from("a"), ErrorArg::from("b")],
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("is not a valid context"));
        assert!(message.contains("[a,b]"));
    }

    #[test]
    fn http_args_strip_line_breaks_log_args_keep_them() {
        let binding = ErrorBinding::new(
            SdipErrorCode::DocumentNotJson,
            vec![ErrorArg::from("{\n\rjsonthingy}"), ErrorArg::from("ignore")],
        )
        .unwrap();
        assert_eq!(binding.http_args()[0], "{jsonthingy}");
        assert_eq!(binding.log_args()[0], "{\n\rjsonthingy}");
    }
}
