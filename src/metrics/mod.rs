//! Prometheus metrics for the notification engine.
//!
//! This module tracks:
//! - Trigger arming (armed by trigger kind, platform rejections)
//! - Skipped operations (permission denied, empty pool, invalid schedule)
//! - Lifecycle events emitted to listeners
//! - Recurring re-arms (daily, interval, boot reconciliation)
//! - Schedule persistence and attachment failures

mod helpers;

pub use helpers::{encode_metrics, EventMetrics, ScheduleMetrics, SchedulerMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "notification_pool";

lazy_static! {
    // ============================================================================
    // Scheduler Metrics
    // ============================================================================

    /// Triggers accepted by the platform, by trigger kind
    pub static ref TRIGGERS_ARMED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_triggers_armed_total", METRIC_PREFIX),
        "Total triggers accepted by the platform notification service",
        &["trigger"]
    ).unwrap();

    /// Triggers the platform refused to add
    pub static ref ARM_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_arm_failures_total", METRIC_PREFIX),
        "Total triggers rejected by the platform notification service"
    ).unwrap();

    /// Operations skipped without arming, by reason
    pub static ref OPERATIONS_SKIPPED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_operations_skipped_total", METRIC_PREFIX),
        "Total scheduling operations skipped",
        &["reason"]
    ).unwrap();

    /// Recurring notifications re-armed, by kind
    pub static ref RESCHEDULES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_reschedules_total", METRIC_PREFIX),
        "Total recurring notifications re-armed",
        &["kind"]
    ).unwrap();

    /// Attachments that could not be fetched
    pub static ref ATTACHMENT_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_attachment_failures_total", METRIC_PREFIX),
        "Total notification attachments that could not be fetched"
    ).unwrap();

    /// Items in the content pool
    pub static ref CONTENT_POOL_SIZE: IntGauge = register_int_gauge!(
        format!("{}_content_pool_size", METRIC_PREFIX),
        "Number of items in the content pool"
    ).unwrap();

    // ============================================================================
    // Schedule Store Metrics
    // ============================================================================

    /// Persisted recurring schedules
    pub static ref SCHEDULE_ENTRIES: IntGauge = register_int_gauge!(
        format!("{}_schedule_entries", METRIC_PREFIX),
        "Number of recurring schedules in the schedule store"
    ).unwrap();

    /// Failed schedule store writes
    pub static ref PERSISTENCE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_persistence_failures_total", METRIC_PREFIX),
        "Total schedule store writes that failed"
    ).unwrap();

    /// Persisted records skipped while loading
    pub static ref SCHEDULE_RECORDS_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_schedule_records_skipped_total", METRIC_PREFIX),
        "Total malformed schedule records skipped on load"
    ).unwrap();

    // ============================================================================
    // Event Metrics
    // ============================================================================

    /// Lifecycle events emitted, by type
    pub static ref EVENTS_EMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_emitted_total", METRIC_PREFIX),
        "Total lifecycle events emitted to listeners",
        &["type"]
    ).unwrap();

    /// Registered listeners
    pub static ref LISTENERS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_listeners_active", METRIC_PREFIX),
        "Number of registered event listeners"
    ).unwrap();
}
