//! Metric recording helpers

use prometheus::{Encoder, TextEncoder};

use super::*;

/// Encode all registered metrics in the Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording scheduler metrics
pub struct SchedulerMetrics;

impl SchedulerMetrics {
    /// Record a trigger accepted by the platform
    pub fn record_armed(trigger: &str) {
        TRIGGERS_ARMED_TOTAL.with_label_values(&[trigger]).inc();
    }

    /// Record a trigger rejected by the platform
    pub fn record_arm_failure() {
        ARM_FAILURES_TOTAL.inc();
    }

    /// Record an operation that was skipped
    pub fn record_skipped(reason: &str) {
        OPERATIONS_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a recurring re-arm
    pub fn record_reschedule(kind: &str) {
        RESCHEDULES_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record an attachment fetch failure
    pub fn record_attachment_failure() {
        ATTACHMENT_FAILURES_TOTAL.inc();
    }

    /// Update the content pool size
    pub fn set_pool_size(size: usize) {
        CONTENT_POOL_SIZE.set(size as i64);
    }
}

/// Helper struct for recording schedule store metrics
pub struct ScheduleMetrics;

impl ScheduleMetrics {
    /// Update the number of stored schedules
    pub fn set_entries(count: usize) {
        SCHEDULE_ENTRIES.set(count as i64);
    }

    /// Record a failed write
    pub fn record_persistence_failure() {
        PERSISTENCE_FAILURES_TOTAL.inc();
    }

    /// Record a malformed record dropped during load
    pub fn record_skipped_record() {
        SCHEDULE_RECORDS_SKIPPED_TOTAL.inc();
    }
}

/// Helper struct for recording event metrics
pub struct EventMetrics;

impl EventMetrics {
    /// Record an emitted event
    pub fn record_emitted(event_type: &str) {
        EVENTS_EMITTED_TOTAL.with_label_values(&[event_type]).inc();
    }

    /// Update the number of registered listeners
    pub fn set_listeners(count: usize) {
        LISTENERS_ACTIVE.set(count as i64);
    }
}
