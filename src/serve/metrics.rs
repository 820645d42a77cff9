// ============================================================
// Layer 7 — API Metrics (Prometheus)
// ============================================================
// Exposed as text on GET /metrics:
//
//   http_requests_total{method, handler, status}          counter
//   http_request_duration_seconds{method, handler}        histogram
//   heart_predictions_total{status="Positive"|"Negative"} counter
//
// The metrics live in their own Registry rather than the
// process-wide default, so each AppState (and each test) starts
// from zero.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::Result;

pub struct ApiMetrics {
    registry:        Registry,
    pub requests:    IntCounterVec,
    pub latency:     HistogramVec,
    pub predictions: IntCounterVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "handler", "status"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        let latency = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency in seconds")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["method", "handler"],
        )?;
        registry.register(Box::new(latency.clone()))?;

        let predictions = IntCounterVec::new(
            Opts::new("heart_predictions_total", "Predictions served, by diagnosis"),
            &["status"],
        )?;
        registry.register(Box::new(predictions.clone()))?;

        Ok(Self { registry, requests, latency, predictions })
    }

    pub fn observe_request(&self, method: &str, handler: &str, status: u16, seconds: f64) {
        self.requests
            .with_label_values(&[method, handler, &status.to_string()])
            .inc();
        self.latency.with_label_values(&[method, handler]).observe(seconds);
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
