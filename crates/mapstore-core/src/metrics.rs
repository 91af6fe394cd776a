//! Central metrics registry and metric definitions
//!
//! Metrics are registered lazily on first access using once_cell::Lazy.

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

// ===== API Request Metrics =====

/// Total number of API requests by method, endpoint, and status code
pub static API_REQUEST_COUNT: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "mapstore_api_requests_total",
        "Total number of API requests",
        &["method", "endpoint", "status"]
    )
    .expect("Failed to register API request counter")
});

/// API request duration histogram
pub static API_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "mapstore_api_request_duration_seconds",
        "API request duration in seconds",
        &["method", "endpoint"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register API request duration histogram")
});

// ===== Store Metrics =====

/// Store transactions by kind (`view`/`update`) and outcome (`commit`/`rollback`/`error`)
pub static STORE_TRANSACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "mapstore_store_transactions_total",
        "Total number of store transactions",
        &["kind", "outcome"]
    )
    .expect("Failed to register store transactions counter")
});

// ===== Authorization Metrics =====

/// Authorization checks that were denied, by resource type and action
pub static AUTHZ_DENIALS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "mapstore_authz_denials_total",
        "Total number of denied authorization checks",
        &["resource", "action"]
    )
    .expect("Failed to register authorization denial counter")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let _ = &*API_REQUEST_COUNT;
        let _ = &*API_REQUEST_DURATION;
        let _ = &*STORE_TRANSACTIONS;
        let _ = &*AUTHZ_DENIALS;
    }

    #[test]
    fn test_store_metrics_increment() {
        STORE_TRANSACTIONS
            .with_label_values(&["update", "commit"])
            .inc();

        let metrics = prometheus::gather();
        assert!(metrics
            .iter()
            .any(|m| m.get_name() == "mapstore_store_transactions_total"));
    }
}
