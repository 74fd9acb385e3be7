//! Lifecycle events and listener fan-out.

mod bus;
mod types;

pub use bus::{EventBus, EventStream, ListenerId};
pub use types::{NotificationEvent, NotificationListener};
