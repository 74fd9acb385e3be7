use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::content::ContentItem;
use crate::platform::PlatformEvent;

use super::EngineSnapshot;

/// Work queued for the engine worker. Host calls and platform callbacks share
/// this one queue, which is what serializes every state mutation.
pub(crate) enum Command {
    CreateOneShot {
        identifier: String,
    },
    CreateDelayed {
        identifier: String,
        delay_seconds: i64,
    },
    CreateDaily {
        identifier: String,
        hour: i64,
        minute: i64,
        second: i64,
    },
    CreateRepeating {
        identifier: String,
        first_fire_at: DateTime<Utc>,
        interval_seconds: i64,
        /// Caller-supplied content instead of a pool draw
        content: Option<ContentItem>,
    },
    CreateWithContent {
        identifier: String,
        content: ContentItem,
    },
    UpdateContentPool {
        items: Vec<ContentItem>,
    },
    UpdateScheduledTime {
        identifier: String,
        new_time: DateTime<Utc>,
        interval_seconds: i64,
    },
    Cancel {
        identifier: String,
    },
    CancelAll,
    Platform(PlatformEvent),
    Flush(oneshot::Sender<()>),
    Snapshot(oneshot::Sender<EngineSnapshot>),
}

impl Command {
    /// Operation name used in logs
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::CreateOneShot { .. } => "create_one_shot",
            Command::CreateDelayed { .. } => "create_delayed",
            Command::CreateDaily { .. } => "create_daily",
            Command::CreateRepeating { content: None, .. } => "create_repeating",
            Command::CreateRepeating { content: Some(_), .. } => "create_scheduled_with_content",
            Command::CreateWithContent { .. } => "create_with_content",
            Command::UpdateContentPool { .. } => "update_content_pool",
            Command::UpdateScheduledTime { .. } => "update_scheduled_time",
            Command::Cancel { .. } => "cancel",
            Command::CancelAll => "cancel_all",
            Command::Platform(PlatformEvent::WillPresent { .. }) => "delivered",
            Command::Platform(PlatformEvent::UserResponded { .. }) => "opened",
            Command::Flush(_) => "flush",
            Command::Snapshot(_) => "snapshot",
        }
    }

    /// Identifier the command targets, `*` for pool-wide commands
    pub(crate) fn identifier(&self) -> &str {
        match self {
            Command::CreateOneShot { identifier }
            | Command::CreateDelayed { identifier, .. }
            | Command::CreateDaily { identifier, .. }
            | Command::CreateRepeating { identifier, .. }
            | Command::CreateWithContent { identifier, .. }
            | Command::UpdateScheduledTime { identifier, .. }
            | Command::Cancel { identifier }
            | Command::Platform(PlatformEvent::WillPresent { identifier })
            | Command::Platform(PlatformEvent::UserResponded { identifier }) => identifier.as_str(),
            Command::UpdateContentPool { .. }
            | Command::CancelAll
            | Command::Flush(_)
            | Command::Snapshot(_) => "*",
        }
    }
}
