//! Any errors that pricewise-web might generate, and supporting implementations.

use std::error::Error;
use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use backtrace::Backtrace;
use pricewise_serpapi::SerpApiError;
use serde_json::json;
use thiserror::Error;

/// The Standard Error for most of Pricewise
pub struct HandlerError {
    /// The wrapped error value.
    kind: HandlerErrorKind,
    /// The backtrace related to the wrapped error.
    pub(crate) backtrace: Backtrace,
}

/// An error that happened in a web handler.
#[derive(Error, Debug)]
pub enum HandlerErrorKind {
    /// A generic error, when there is nothing more specific to say.
    #[error("Internal error")]
    Internal,

    /// A required search parameter, or the provider's API key, is missing.
    #[error("Missing 'keyword', 'max_price', or API key is not set.")]
    MissingParameters,

    /// A numeric search parameter could not be read as a number.
    #[error("Price and rating parameters must be valid numbers.")]
    InvalidNumber,

    /// The upstream shopping search failed.
    #[error(transparent)]
    Upstream(#[from] SerpApiError),
}

impl HandlerErrorKind {
    /// Convert the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingParameters | Self::InvalidNumber => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<HandlerErrorKind> for actix_web::Error {
    fn from(kind: HandlerErrorKind) -> Self {
        let error: HandlerError = kind.into();
        error.into()
    }
}

impl HandlerError {
    /// Access the wrapped error.
    pub fn kind(&self) -> &HandlerErrorKind {
        &self.kind
    }

    /// Get an `HandlerError` representing an `Internal` error.
    pub fn internal() -> Self {
        HandlerErrorKind::Internal.into()
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind.source()
    }
}

impl<T> From<T> for HandlerError
where
    HandlerErrorKind: From<T>,
{
    fn from(item: T) -> Self {
        HandlerError {
            kind: HandlerErrorKind::from(item),
            backtrace: Backtrace::new(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::fmt::Debug for HandlerError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        // Sentry will scan the printed debug information for `HandlerError`
        // to determine the "event type" to display and to group events by:
        // to make sure different errors don't get grouped together, we format
        // the name of this debug struct as `HandlerError/<error name>`.
        // See `sentry::parse_type_from_debug` used by middleware/sentry.rs
        fmt.debug_struct(&format!("HandlerError/{:?}", &self.kind))
            .field("kind", &self.kind)
            .field("backtrace", &self.backtrace)
            .finish()
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.kind().to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::{HandlerError, HandlerErrorKind};
    use actix_web::{body::to_bytes, http::StatusCode, ResponseError};
    use pretty_assertions::assert_eq;
    use pricewise_serpapi::SerpApiError;
    use serde_json::{json, Value};

    async fn body_json(error: HandlerError) -> (StatusCode, Value) {
        let response = error.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body())
            .await
            .expect("body should be readable");
        let body = serde_json::from_slice(&bytes).expect("body should be JSON");
        (status, body)
    }

    #[actix_rt::test]
    async fn missing_parameters_are_a_bad_request() {
        let (status, body) = body_json(HandlerErrorKind::MissingParameters.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Missing 'keyword', 'max_price', or API key is not set." })
        );
    }

    #[actix_rt::test]
    async fn upstream_errors_are_server_errors_with_their_message() {
        let (status, body) = body_json(SerpApiError::Status(502).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "error": "API request failed with status 502" })
        );
    }

    #[test]
    fn debug_output_names_the_kind() {
        let error: HandlerError = HandlerErrorKind::InvalidNumber.into();
        assert!(format!("{:?}", error).starts_with("HandlerError/InvalidNumber"));
    }
}
