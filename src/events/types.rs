use serde::{Deserialize, Serialize};

/// Lifecycle event for one notification identifier.
///
/// Serialized as `{"type": "scheduled", "identifier": "..."}` for hosts that
/// forward events over a message channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// The platform accepted a trigger
    Scheduled { identifier: String },
    /// The platform is presenting the notification
    Delivered { identifier: String },
    /// The user opened the notification
    Opened { identifier: String },
}

impl NotificationEvent {
    pub fn scheduled(identifier: impl Into<String>) -> Self {
        Self::Scheduled {
            identifier: identifier.into(),
        }
    }

    pub fn delivered(identifier: impl Into<String>) -> Self {
        Self::Delivered {
            identifier: identifier.into(),
        }
    }

    pub fn opened(identifier: impl Into<String>) -> Self {
        Self::Opened {
            identifier: identifier.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::Scheduled { identifier }
            | Self::Delivered { identifier }
            | Self::Opened { identifier } => identifier,
        }
    }

    /// Event type label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scheduled { .. } => "scheduled",
            Self::Delivered { .. } => "delivered",
            Self::Opened { .. } => "opened",
        }
    }
}

/// Receiver of lifecycle events.
///
/// Called on the engine's worker task; implementations should hand the event
/// off rather than block.
pub trait NotificationListener: Send + Sync {
    fn on_notification_event(&self, event: &NotificationEvent);
}
