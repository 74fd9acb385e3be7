//! Notification content and the pool it is drawn from.

mod item;
mod pool;

pub use item::ContentItem;
pub use pool::ContentPool;
