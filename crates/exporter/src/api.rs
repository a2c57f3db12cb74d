//! HTTP API for metric ingestion and Prometheus scraping

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use monitor_lib::{MetricSet, UpdatePayload};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Request-level instrumentation of the exporter itself
#[derive(Clone)]
pub struct HttpMetrics {
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
}

impl HttpMetrics {
    /// Create the HTTP metrics and register them on `registry`
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "exporter_http_requests_total",
                "Total HTTP requests handled by the exporter.",
            ),
            &["method", "path", "status"],
        )?;
        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "exporter_http_request_duration_seconds",
                "HTTP request handling time in seconds.",
            ),
            &["method", "path"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
        })
    }

    fn observe(&self, method: &str, path: &str, status: StatusCode, elapsed: Duration) {
        self.requests_total
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.request_duration_seconds
            .with_label_values(&[method, path])
            .observe(elapsed.as_secs_f64());
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub metrics: MetricSet,
    pub http_metrics: HttpMetrics,
}

impl AppState {
    /// Wrap a metric set, registering request instrumentation alongside it
    pub fn new(metrics: MetricSet) -> prometheus::Result<Self> {
        let http_metrics = HttpMetrics::register(metrics.registry())?;
        Ok(Self {
            metrics,
            http_metrics,
        })
    }
}

/// Ingest one metrics record - returns 200 for any structurally valid body, 400 otherwise
async fn update(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            state.metrics.record_invalid();
            warn!(error = %rejection, "Failed to read metrics update body");
            return (StatusCode::BAD_REQUEST, "Invalid request");
        }
    };

    match UpdatePayload::parse(&body) {
        Ok(payload) => {
            state.metrics.record_update(&payload);
            debug!(
                failure = payload.is_failure(),
                prediction = ?payload.prediction,
                "Metrics updated"
            );
            (StatusCode::OK, "Metrics updated successfully")
        }
        Err(e) => {
            state.metrics.record_invalid();
            warn!(error = %e, "Rejected invalid metrics update");
            (StatusCode::BAD_REQUEST, "Invalid request")
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Record method, route and status of every tracked request
async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    state
        .http_metrics
        .observe(&method, &path, response.status(), start.elapsed());

    response
}

/// Create the API router
///
/// The scrape endpoint is left out of request tracking so consecutive
/// scrapes return identical output.
pub fn create_router(state: Arc<AppState>) -> Router {
    let tracked = Router::new()
        .route("/update", post(update))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests));

    Router::new()
        .merge(tracked)
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting exporter API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
