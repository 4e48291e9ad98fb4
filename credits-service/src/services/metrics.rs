//! Metrics module for credits-service.
//! Prometheus metrics for ledger operations and charge outcomes.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "credits_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Charge attempts by outcome (committed / insufficient / not_found)
pub static CHARGES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Accounts provisioned with the default allotment
pub static ACCOUNTS_PROVISIONED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Premium activations
pub static PREMIUM_ACTIVATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    CHARGES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "credits_charges_total",
                "Total charge attempts by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register CHARGES_TOTAL")
    });

    ACCOUNTS_PROVISIONED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "credits_accounts_provisioned_total",
                "Accounts provisioned with the default allotment"
            ),
            &["source"]
        )
        .expect("Failed to register ACCOUNTS_PROVISIONED_TOTAL")
    });

    PREMIUM_ACTIVATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "credits_premium_activations_total",
                "Premium plan activations from confirmed billing events"
            ),
            &["result"]
        )
        .expect("Failed to register PREMIUM_ACTIVATIONS_TOTAL")
    });
}

/// Record a charge attempt outcome.
pub fn record_charge(outcome: &str) {
    if let Some(counter) = CHARGES_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
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
