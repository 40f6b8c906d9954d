//! Request logging middleware.

mod ids;
mod parent_context;
mod spans;

use std::time::{Duration, Instant};

use salvo::{Depot, FlowCtrl, Handler, Request, Response, async_trait, http::StatusCode};
use tracing::{Instrument as _, error, field, info, info_span, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt as _;

use crate::config::observability::ObservabilityConfig;

use super::metrics::{self, InFlight};

/// Depot key holding the resolved request id.
const REQUEST_ID_DEPOT_KEY: &str = "request_id";

/// Assigns request ids, opens the `http.request` span, records metrics and logs the outcome.
#[derive(Debug, Clone)]
pub(crate) struct RequestLogging {
    slow_threshold: Duration,
    propagate_parent: bool,
}

impl Default for RequestLogging {
    fn default() -> Self {
        Self {
            slow_threshold: Duration::from_secs(1),
            propagate_parent: false,
        }
    }
}

impl RequestLogging {
    pub(crate) fn new(config: &ObservabilityConfig) -> Self {
        Self {
            slow_threshold: config.slow_request_threshold(),
            propagate_parent: config.propagates_parent(),
        }
    }
}

#[async_trait]
impl Handler for RequestLogging {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        // Scrapes would otherwise dominate the request metrics.
        if req.uri().path() == "/metrics" {
            ctrl.call_next(req, depot, res).await;
            return;
        }

        let started = Instant::now();
        let request_id = ids::resolve(req);

        depot.insert(REQUEST_ID_DEPOT_KEY, request_id.clone());
        ids::echo(res, &request_id);

        let method = req.method().to_string();
        let path = req.uri().path().to_owned();
        let names = spans::request_span_name(&method, &path);
        let _in_flight = InFlight::start();

        let span = info_span!(
            parent: None,
            "http.request",
            otel.name = %names.otel_span_name,
            otel.kind = "server",
            request_id = %request_id,
            method = %method,
            path = %path,
            remote_addr = %req.remote_addr(),
            status = field::Empty,
            duration_ms = field::Empty,
        );

        if self.propagate_parent
            && let Some(parent) = parent_context::remote_parent(req.headers())
            && let Err(source) = span.set_parent(parent)
        {
            warn!("failed to attach remote parent to request span: {source}");
        }

        ctrl.call_next(req, depot, res)
            .instrument(span.clone())
            .await;

        let elapsed = started.elapsed();
        let status = res.status_code.unwrap_or(StatusCode::OK);
        let duration_ms = elapsed.as_millis();

        metrics::observe_request(&method, &names.otel_path, status, elapsed.as_secs_f64());

        span.record("status", status.as_u16());
        span.record("duration_ms", duration_ms);

        span.in_scope(|| {
            if status.is_server_error() {
                error!(status = status.as_u16(), duration_ms, "request.completed");
            } else if status.is_client_error() {
                warn!(status = status.as_u16(), duration_ms, "request.completed");
            } else {
                info!(status = status.as_u16(), duration_ms, "request.completed");
            }

            if elapsed > self.slow_threshold {
                warn!(
                    duration_ms,
                    threshold_ms = self.slow_threshold.as_millis(),
                    "slow request"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use salvo::{
        Router, Service, handler,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use super::*;

    #[handler]
    async fn echo_request_id(depot: &mut Depot, res: &mut Response) {
        let request_id = depot
            .get::<String>(REQUEST_ID_DEPOT_KEY)
            .cloned()
            .unwrap_or_default();

        res.render(request_id);
    }

    fn service() -> Service {
        Service::new(
            Router::new()
                .hoop(RequestLogging::default())
                .push(Router::with_path("echo").get(echo_request_id)),
        )
    }

    fn header(res: &Response) -> Option<String> {
        res.headers()
            .get(ids::REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    #[tokio::test]
    async fn caller_request_id_is_kept() -> TestResult {
        let mut res = TestClient::get("http://example.com/echo")
            .add_header(ids::REQUEST_ID_HEADER, "req-123", true)
            .send(&service())
            .await;

        assert_eq!(header(&res).as_deref(), Some("req-123"));
        assert_eq!(res.take_string().await?, "req-123");

        Ok(())
    }

    #[tokio::test]
    async fn unusable_request_ids_are_replaced() -> TestResult {
        let mut res = TestClient::get("http://example.com/echo")
            .add_header(ids::REQUEST_ID_HEADER, "   ", true)
            .send(&service())
            .await;

        let generated = res.take_string().await?;

        assert!(uuid::Uuid::parse_str(&generated).is_ok(), "{generated}");
        assert_eq!(header(&res), Some(generated));

        Ok(())
    }
}
