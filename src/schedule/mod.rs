//! Recurrence descriptions and their durable store.

mod recurrence;
mod store;

pub use recurrence::{DailyTime, RecurrenceConfig, ScheduleError};
pub use store::ScheduleStore;
