//! Failures surfaced by the favorites services.
//!
//! Nothing here knows about HTTP or terminals; front ends pick the
//! presentation from the [`ErrorCode`].

use serde_json::Value;

/// Failure category a front end can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The backend refused the request as malformed.
    InvalidRequest,
    /// Credentials are missing or expired.
    Unauthorized,
    /// The signed-in role may not do this.
    Forbidden,
    /// The listing no longer exists.
    NotFound,
    /// The backend or the device store could not be reached.
    ServiceUnavailable,
    /// The backend did not answer in time.
    Timeout,
    /// The backend answered with something this client cannot read.
    InternalError,
}

impl ErrorCode {
    /// Text shown when the collaborator that failed gave no message.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "The request was not accepted",
            Self::Unauthorized => "Sign in to continue",
            Self::Forbidden => "Your account cannot do this",
            Self::NotFound => "This listing is no longer available",
            Self::ServiceUnavailable => "The marketplace is unavailable right now",
            Self::Timeout => "The marketplace took too long to answer",
            Self::InternalError => "Something went wrong",
        }
    }
}

/// A categorised failure with a displayable message.
///
/// The message is never blank: a blank input is replaced by the code's
/// [`ErrorCode::fallback_message`].
///
/// # Examples
/// ```
/// use marketplace_client::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("  ");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.message(), ErrorCode::NotFound.fallback_message());
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

impl Error {
    /// Build an error of `code`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.fallback_message().to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            details: None,
        }
    }

    /// Failure category.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Message for a dismissible notification.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured context, such as the HTTP status behind a rejection.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured context.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// [`ErrorCode::Timeout`].
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t")]
    fn blank_messages_fall_back_to_the_code_text(#[case] message: &str) {
        let error = Error::new(ErrorCode::ServiceUnavailable, message);
        assert_eq!(error.message(), "The marketplace is unavailable right now");
        assert_eq!(error.to_string(), error.message());
    }

    #[rstest]
    #[case::timeout(Error::timeout("slow"), ErrorCode::Timeout)]
    #[case::unavailable(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
    #[case::unauthorized(Error::unauthorized("login"), ErrorCode::Unauthorized)]
    #[case::internal(Error::internal("garbled"), ErrorCode::InternalError)]
    fn helpers_set_expected_codes(#[case] error: Error, #[case] expected: ErrorCode) {
        assert_eq!(error.code(), expected);
    }

    #[test]
    fn details_travel_with_the_error() {
        let error = Error::invalid_request("bad id").with_details(json!({ "status": 422 }));
        assert_eq!(error.details(), Some(&json!({ "status": 422 })));
        assert_eq!(error.to_string(), "bad id");
    }
}
