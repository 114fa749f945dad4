use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static SIGN_IN_ATTEMPTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static FEEDBACK_SUBMISSIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static DRIVER_REFRESHES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Registers every collector once. Later calls are no-ops.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let sign_in_attempts = IntCounterVec::new(
        Opts::new("sign_in_attempts_total", "Sign-in attempts by outcome"),
        &["outcome"],
    )?;
    let feedback_submissions = IntCounterVec::new(
        Opts::new("feedback_submissions_total", "Feedback submissions by outcome"),
        &["outcome"],
    )?;
    let driver_refreshes = IntCounterVec::new(
        Opts::new("driver_refreshes_total", "Driver feed fetches by outcome"),
        &["outcome"],
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(request_duration.clone()))?;
    registry.register(Box::new(sign_in_attempts.clone()))?;
    registry.register(Box::new(feedback_submissions.clone()))?;
    registry.register(Box::new(driver_refreshes.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = SIGN_IN_ATTEMPTS_TOTAL.set(sign_in_attempts);
    let _ = FEEDBACK_SUBMISSIONS_TOTAL.set(feedback_submissions);
    let _ = DRIVER_REFRESHES_TOTAL.set(driver_refreshes);
    Ok(())
}

pub fn get_metrics() -> anyhow::Result<String> {
    let registry = REGISTRY
        .get()
        .ok_or_else(|| anyhow::anyhow!("metrics registry not initialized"))?;
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn record_http(method: &str, path: &str, status: &str, seconds: f64) {
    let labels = [method, path, status];
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&labels).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram.with_label_values(&labels).observe(seconds);
    }
}

fn count(metric: &OnceLock<IntCounterVec>, outcome: &str) {
    if let Some(counter) = metric.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_sign_in(outcome: &str) {
    count(&SIGN_IN_ATTEMPTS_TOTAL, outcome);
}

pub fn record_feedback(outcome: &str) {
    count(&FEEDBACK_SUBMISSIONS_TOTAL, outcome);
}

pub fn record_refresh(outcome: &str) {
    count(&DRIVER_REFRESHES_TOTAL, outcome);
}
