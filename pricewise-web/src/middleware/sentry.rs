//! Reports server errors from request handlers to Sentry.
//!
//! Only responses with a 5xx status that carry a [`HandlerError`] are
//! reported. Client errors, like a missing search keyword, are expected
//! traffic and stay out of Sentry.

use crate::errors::HandlerError;
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::Error as ActixError,
    http::StatusCode,
};
use futures_util::future::LocalBoxFuture;
use sentry::{
    protocol::{Event, Exception, Level},
    Hub,
};
use std::{
    error::Error as StdError,
    fmt,
    future::{ready, Ready},
    sync::Arc,
    task::{Context, Poll},
};

/// Factory for [`SentryMiddleware`].
#[derive(Debug, Default)]
pub struct Sentry;

impl<S> Transform<S, ServiceRequest> for Sentry
where
    S: Service<ServiceRequest, Response = ServiceResponse> + 'static,
    S::Future: 'static,
    S::Error: fmt::Debug,
{
    type Response = ServiceResponse;
    type Error = ActixError;
    type InitError = ();
    type Transform = SentryMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SentryMiddleware { service }))
    }
}

/// Middleware that sends server errors to Sentry.
#[derive(Debug)]
pub struct SentryMiddleware<S> {
    /// The wrapped service
    service: S,
}

impl<S> Service<ServiceRequest> for SentryMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse> + 'static,
    S::Future: 'static,
    S::Error: fmt::Debug,
{
    type Response = ServiceResponse;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx).map_err(|error| {
            tracing::error!(r#type = "web.sentry.polling-error", ?error, "Error polling service");
            HandlerError::internal().into()
        })
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let hub = Hub::current();
        let request = RequestSummary::of(&req);
        let fut = self.service.call(req);

        Box::pin(async move {
            let response = fut.await.map_err(|error| {
                tracing::error!(r#type = "web.sentry.handler-error", ?error, "handler error");
                HandlerError::internal()
            })?;

            if let Some(handler_error) = reportable_error(&response) {
                report(&hub, handler_error, &request, response.status());
            }

            Ok(response)
        })
    }
}

/// The parts of a request that are attached to its Sentry report. These are
/// taken before the request is handed to the handler.
#[derive(Debug, Clone, PartialEq)]
struct RequestSummary {
    /// The matched route pattern, or the raw path if nothing matched.
    route: String,
    /// The HTTP method.
    method: String,
}

impl RequestSummary {
    /// Summarize `req`. The query string is left out, since it may contain
    /// search keywords.
    fn of(req: &ServiceRequest) -> Self {
        Self {
            route: req
                .match_pattern()
                .unwrap_or_else(|| req.path().to_string()),
            method: req.method().to_string(),
        }
    }
}

/// The handler error behind `response`, if it is one that should be reported.
fn reportable_error(response: &ServiceResponse) -> Option<&HandlerError> {
    if !response.status().is_server_error() {
        return None;
    }
    response
        .response()
        .error()
        .and_then(|error| error.as_error::<HandlerError>())
}

/// Send `error` to Sentry, tagged with the request it came from.
fn report(hub: &Arc<Hub>, error: &HandlerError, request: &RequestSummary, status: StatusCode) {
    tracing::debug!(r#type = "web.sentry.report", %error, route = %request.route, "Reporting error to Sentry");
    hub.with_scope(
        |scope| {
            scope.set_transaction(Some(request.route.as_str()));
            scope.set_tag("http.method", &request.method);
            scope.set_tag("http.status_code", status.as_u16());
        },
        || hub.capture_event(error_event(error)),
    );
}

/// Build a Sentry event for `error`.
///
/// Sentry expects the exception chain ordered from the root cause to the
/// outermost error, so the `source()` chain is reversed.
fn error_event(error: &HandlerError) -> Event<'static> {
    let mut exceptions: Vec<Exception> =
        std::iter::successors(Some(error as &(dyn StdError + 'static)), |&e| e.source())
            .map(describe)
            .collect();
    exceptions.reverse();

    Event {
        exception: exceptions.into(),
        level: Level::Error,
        ..Default::default()
    }
}

/// Describe one link of an error chain. Only [`HandlerError`]s carry a
/// backtrace, so only they get a stack trace.
fn describe(error: &(dyn StdError + 'static)) -> Exception {
    let debug = format!("{:?}", error);
    let stacktrace = error.downcast_ref::<HandlerError>().and_then(|handler_error| {
        // The alternate format includes frame addresses.
        sentry_backtrace::parse_stacktrace(&format!("{:#?}", handler_error.backtrace))
    });

    Exception {
        ty: sentry::parse_type_from_debug(&debug).to_owned(),
        value: Some(error.to_string()),
        stacktrace,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::{describe, error_event, reportable_error, RequestSummary};
    use crate::errors::{HandlerError, HandlerErrorKind};
    use actix_web::{http::Method, test::TestRequest, HttpResponse};
    use pretty_assertions::assert_eq;
    use pricewise_serpapi::SerpApiError;
    use sentry::protocol::Level;

    fn response_for(error: HandlerError) -> actix_web::dev::ServiceResponse {
        TestRequest::default().to_srv_request().error_response(error)
    }

    #[test]
    fn server_errors_are_reportable() {
        let response = response_for(SerpApiError::Status(503).into());

        let error = reportable_error(&response).expect("server errors are reported");
        assert_eq!(error.to_string(), "API request failed with status 503");
    }

    #[test]
    fn client_errors_are_not_reportable() {
        let response = response_for(HandlerErrorKind::MissingParameters.into());
        assert!(reportable_error(&response).is_none());
    }

    #[test]
    fn successful_responses_are_not_reportable() {
        let response = TestRequest::default().to_srv_response(HttpResponse::Ok().finish());
        assert!(reportable_error(&response).is_none());
    }

    #[test]
    fn events_describe_the_error() {
        let error: HandlerError = SerpApiError::MissingResults.into();

        let event = error_event(&error);

        assert_eq!(event.level, Level::Error);
        assert_eq!(event.exception.values.len(), 1);
        assert_eq!(
            event.exception.values[0].value.as_deref(),
            Some("API response did not include 'shopping_results'")
        );
    }

    #[test]
    fn plain_errors_have_no_stack_trace() {
        let error = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");

        let exception = describe(&error);

        assert_eq!(exception.value.as_deref(), Some("disk on fire"));
        assert!(exception.stacktrace.is_none());
    }

    #[test]
    fn request_summaries_leave_out_the_query_string() {
        let request = TestRequest::with_uri("/api/search?keyword=secret")
            .method(Method::GET)
            .to_srv_request();

        assert_eq!(
            RequestSummary::of(&request),
            RequestSummary {
                route: "/api/search".to_string(),
                method: "GET".to_string(),
            }
        );
    }
}
