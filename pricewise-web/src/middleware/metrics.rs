//! Middlewares for reporting Metrics in Pricewise.

use crate::errors::HandlerError;
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web::Data,
    Error as ActixError,
};
use cadence::{CountedExt, StatsdClient, Timed};
use futures_util::future::LocalBoxFuture;
use std::{
    fmt,
    future::{ready, Ready},
    task::Context,
    time::Instant,
};

/// Factory for [`MetricsMiddleware`].
pub struct Metrics;

/// Middleware to record request metrics.
pub struct MetricsMiddleware<S> {
    /// The wrapped service.
    service: S,
}

impl<S> Transform<S, ServiceRequest> for Metrics
where
    S: Service<ServiceRequest, Response = ServiceResponse>,
    S::Future: 'static,
    S::Error: fmt::Debug,
{
    type Response = ServiceResponse;

    type Error = ActixError;

    type Transform = MetricsMiddleware<S>;

    type InitError = ();

    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddleware { service }))
    }
}

impl<S> Service<ServiceRequest> for MetricsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse>,
    S::Future: 'static,
    S::Error: fmt::Debug,
{
    type Response = ServiceResponse;

    type Error = ActixError;

    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx).map_err(|error| {
            tracing::error!(
                r#type = "web.metrics.polling-error",
                ?error,
                "Error polling service from metrics middleware"
            );
            HandlerError::internal().into()
        })
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let route = req
            .match_pattern()
            .unwrap_or_else(|| "unknown".to_string());
        let metrics_client = req.app_data::<Data<StatsdClient>>().cloned();
        let fut = self.service.call(req);

        Box::pin(async move {
            let response = fut.await.map_err(|error| {
                tracing::error!(?error, "handler error");
                HandlerError::internal()
            })?;
            if let Some(metrics_client) = metrics_client {
                metrics_client
                    .time_with_tags("response.time", start.elapsed())
                    .with_tag("route", &route)
                    .send();
                metrics_client
                    .incr(&format!("response.status_codes.{}", response.status().as_u16()))
                    .ok();
            } else {
                tracing::warn!(
                    r#type = "web.metrics.no-client",
                    "No metrics client configured, but metrics middleware attached"
                );
            }
            Ok(response)
        })
    }
}
