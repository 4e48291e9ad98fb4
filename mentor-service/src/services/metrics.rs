//! Metrics module for mentor-service.
//! Prometheus metrics for relay calls, metered actions and fallbacks.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Relay round-trip duration by outcome
pub static RELAY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("mentor_relay_duration_seconds", "Chat relay call duration"),
        &["outcome"]
    )
    .expect("Failed to register RELAY_DURATION")
});

/// Metered actions by outcome (completed / insufficient / provider_error)
pub static METERED_ACTIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Model alias fallbacks
pub static MODEL_FALLBACKS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    METERED_ACTIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "mentor_metered_actions_total",
                "Credit-metered actions by outcome"
            ),
            &["action", "outcome"]
        )
        .expect("Failed to register METERED_ACTIONS_TOTAL")
    });

    MODEL_FALLBACKS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "mentor_model_fallbacks_total",
                "Model alias resolutions that fell back to the default"
            ),
            &["reason"]
        )
        .expect("Failed to register MODEL_FALLBACKS_TOTAL")
    });
}

/// Record a metered action outcome.
pub fn record_action(action: &str, outcome: &str) {
    if let Some(counter) = METERED_ACTIONS_TOTAL.get() {
        counter.with_label_values(&[action, outcome]).inc();
    }
}

/// Render all registered metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
