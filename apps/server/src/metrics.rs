//! Prometheus metrics for business operations.

use crate::{Error, Result};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, Encoder,
    HistogramVec, IntCounterVec, Registry, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    static ref OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "cmdb_business_operations_total",
        "Business operations by outcome",
        &["operation", "outcome"],
        REGISTRY
    )
    .expect("metric cmdb_business_operations_total registers once");
    static ref OPERATION_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        "cmdb_business_operation_duration_seconds",
        "Business operation latency",
        &["operation"],
        REGISTRY
    )
    .expect("metric cmdb_business_operation_duration_seconds registers once");
}

/// Times one service operation and records its outcome when finished.
pub struct OperationTimer {
    operation: &'static str,
    started: Instant,
}

impl OperationTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
        }
    }

    pub fn finish<T>(self, result: &Result<T>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        OPERATIONS_TOTAL
            .with_label_values(&[self.operation, outcome])
            .inc();
        OPERATION_DURATION
            .with_label_values(&[self.operation])
            .observe(self.started.elapsed().as_secs_f64());
    }
}

/// Render every registered metric in the Prometheus text format.
pub fn render() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| Error::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| Error::Internal(format!("Metrics are not UTF-8: {}", e)))
}
