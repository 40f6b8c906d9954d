//! Prometheus request metrics and the `/metrics` endpoint.

use std::sync::LazyLock;

use prometheus::{
    Encoder as _, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use salvo::{
    Response, handler,
    http::{
        StatusCode,
        header::{CONTENT_TYPE, HeaderValue},
    },
};
use tracing::error;

const NAMESPACE: &str = "trusioo_json";

const DURATION_BUCKETS: [f64; 12] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

#[derive(Debug)]
struct HttpMetrics {
    registry: Registry,
    requests: IntCounterVec,
    duration: HistogramVec,
    in_flight: IntGauge,
}

impl HttpMetrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some(NAMESPACE.to_string()), None)?;

        let requests = IntCounterVec::new(
            Opts::new(
                "http_requests_total",
                "HTTP requests by method, route and status.",
            ),
            &["method", "route", "status"],
        )?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration by method and route.",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["method", "route"],
        )?;

        let in_flight = IntGauge::new("http_requests_in_flight", "HTTP requests being served.")?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self {
            registry,
            requests,
            duration,
            in_flight,
        })
    }

    fn encode(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buffer = Vec::new();

        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;

        Ok(buffer)
    }
}

static METRICS: LazyLock<Option<HttpMetrics>> = LazyLock::new(|| {
    HttpMetrics::new()
        .inspect_err(|source| error!("failed to register HTTP metrics: {source}"))
        .ok()
});

/// Counts a request as in flight until dropped.
#[derive(Debug)]
pub(super) struct InFlight(Option<IntGauge>);

impl InFlight {
    pub(super) fn start() -> Self {
        let gauge = METRICS.as_ref().map(|metrics| metrics.in_flight.clone());

        if let Some(gauge) = &gauge {
            gauge.inc();
        }

        Self(gauge)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(gauge) = &self.0 {
            gauge.dec();
        }
    }
}

pub(super) fn observe_request(method: &str, route: &str, status: StatusCode, seconds: f64) {
    let Some(metrics) = METRICS.as_ref() else {
        return;
    };

    metrics
        .requests
        .with_label_values(&[method, route, status.as_str()])
        .inc();

    metrics
        .duration
        .with_label_values(&[method, route])
        .observe(seconds);
}

#[handler]
pub(crate) async fn metrics_handler(res: &mut Response) {
    let Some(metrics) = METRICS.as_ref() else {
        res.status_code(StatusCode::SERVICE_UNAVAILABLE);
        return;
    };

    match metrics.encode() {
        Ok(body) => {
            res.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
            );
            res.render(String::from_utf8_lossy(&body).into_owned());
        }
        Err(source) => {
            error!("failed to encode metrics: {source}");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
