//! Content-pool notification scheduling.
//!
//! The engine draws notification content from a replaceable pool, arms
//! one-shot, daily and interval triggers with a platform notification
//! service, persists recurring schedules and re-arms them with fresh content
//! after every delivery.

// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod telemetry;

// Domain
pub mod content;
pub mod events;
pub mod permission;
pub mod schedule;

// Platform seam and the engine driving it
pub mod engine;
pub mod platform;

pub use content::ContentItem;
pub use engine::{EngineConfig, EngineDeps, EngineSnapshot, NotificationEngine};
pub use error::{EngineError, Result};
pub use events::{NotificationEvent, NotificationListener};
pub use schedule::{DailyTime, RecurrenceConfig};
