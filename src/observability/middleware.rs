use axum::{
    extract::{MatchedPath, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::{Status, TraceContextExt};
use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{error, info, instrument, warn, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::Metrics;

/// What the access log and the server span record about a request
struct RequestInfo {
    method: String,
    route: String,
    url: String,
    user_agent: String,
    client_ip: String,
}

impl RequestInfo {
    fn from_request(request: &Request) -> Self {
        let url = request.uri().to_string();
        // Templated route keeps item and category ids out of metric labels
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|path| path.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        Self {
            method: request.method().to_string(),
            route,
            url,
            user_agent: header_str(request.headers(), "user-agent")
                .unwrap_or("unknown")
                .to_string(),
            client_ip: client_ip(request.headers()),
        }
    }

    fn is_admin(&self) -> bool {
        self.route.starts_with("/api/admin")
    }

    fn span(&self) -> tracing::Span {
        let name = format!("{} {}", self.method, self.route);
        tracing::info_span!(
            target: "menu_rs::http",
            "{}", name,
            otel.name = %name,
            otel.kind = "server",
            http.method = %self.method,
            http.route = %self.route,
            http.url = %self.url,
            http.user_agent = %self.user_agent,
            client.address = %self.client_ip,
            menu.admin = self.is_admin(),
            http.response.status_code = tracing::field::Empty,
            http.response_time_ms = tracing::field::Empty,
        )
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`
fn client_ip(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn current_trace_id() -> String {
    tracing::Span::current()
        .context()
        .span()
        .span_context()
        .trace_id()
        .to_string()
}

/// Server span, access log and HTTP metrics for every request
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let info = RequestInfo::from_request(&request);
    let span = info.span();

    async move {
        let start = Instant::now();
        let trace_id = current_trace_id();
        metrics.increment_in_flight(&info.method, &info.route);

        info!(
            trace_id = %trace_id,
            method = %info.method,
            path = %info.route,
            client_ip = %info.client_ip,
            "Processing request"
        );

        let response = next.run(request).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();
        let span = tracing::Span::current();
        span.record("http.response.status_code", status);
        span.record("http.response_time_ms", elapsed.as_millis() as u64);
        span.context().span().set_status(if status >= 500 {
            Status::error("HTTP server error")
        } else {
            Status::Ok
        });

        metrics.record_http_request(&info.method, &info.route, status, elapsed.as_secs_f64());
        metrics.decrement_in_flight(&info.method, &info.route);

        log_completion(&trace_id, &info, status, elapsed);
        response
    }
    .instrument(span)
    .await
}

/// 5xx are errors; 4xx are expected traffic such as expired admin sessions
fn log_completion(trace_id: &str, info: &RequestInfo, status: u16, elapsed: Duration) {
    let duration_ms = elapsed.as_millis() as u64;
    if status >= 500 {
        error!(
            trace_id = %trace_id,
            method = %info.method,
            path = %info.route,
            status_code = status,
            duration_ms,
            user_agent = %info.user_agent,
            "Request failed"
        );
    } else if status >= 400 {
        warn!(
            trace_id = %trace_id,
            method = %info.method,
            path = %info.route,
            status_code = status,
            duration_ms,
            "Request rejected"
        );
    } else {
        info!(
            trace_id = %trace_id,
            method = %info.method,
            path = %info.route,
            status_code = status,
            duration_ms,
            "Request completed"
        );
    }
}

/// Await `future`, then report whether it succeeded and how long it took
async fn timed<F, T, E>(future: F, report: impl FnOnce(bool, Duration)) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let result = future.await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => info!(duration_ms = elapsed.as_millis() as u64, "Operation completed"),
        Err(e) => error!(
            error = %e,
            duration_ms = elapsed.as_millis() as u64,
            "Operation failed"
        ),
    }
    report(result.is_ok(), elapsed);
    result
}

/// Metrics and logs around direct DynamoDB administration calls
pub struct DatabaseTracingMiddleware {
    metrics: Arc<Metrics>,
}

impl DatabaseTracingMiddleware {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    #[instrument(skip_all, fields(operation = %operation, table = %table))]
    pub async fn trace_operation<F, T, E>(
        &self,
        operation: &str,
        table: &str,
        future: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        timed(future, |success, elapsed| {
            self.metrics
                .record_database_operation(operation, table, success, elapsed.as_secs_f64())
        })
        .await
    }
}

/// Wraps the admin service calls with business metrics and logs
pub struct BusinessTracingMiddleware {
    metrics: Arc<Metrics>,
}

impl BusinessTracingMiddleware {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    /// Category or item change on one menu
    #[instrument(skip_all, fields(operation = %operation, kind = %kind))]
    pub async fn trace_menu_operation<F, T, E>(
        &self,
        operation: &str,
        kind: &str,
        future: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        timed(future, |success, _| {
            self.metrics.record_menu_operation(operation, kind, success)
        })
        .await
    }

    /// Image upload into the `kind` folder
    #[instrument(skip_all, fields(kind = %kind))]
    pub async fn trace_upload<F, T, E>(&self, kind: &str, future: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        timed(future, |success, _| {
            self.metrics.record_image_upload(kind, success)
        })
        .await
    }
}
