use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentItem;
use crate::schedule::DailyTime;

use super::Attachment;

/// Errors reported by the platform when adding a trigger.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// The platform refused the request
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The notification service could not be reached
    #[error("notification service unavailable: {0}")]
    Unavailable(String),
}

/// When the platform should present a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Fire `seconds` after arming, optionally every `seconds` thereafter
    TimeInterval { seconds: u64, repeats: bool },
    /// Fire at the next matching wall-clock time, optionally every day
    Calendar { time: DailyTime, repeats: bool },
}

impl TriggerSpec {
    pub fn one_shot(seconds: u64) -> Self {
        Self::TimeInterval {
            seconds,
            repeats: false,
        }
    }

    pub fn every(seconds: u64) -> Self {
        Self::TimeInterval {
            seconds,
            repeats: true,
        }
    }

    pub fn daily(time: DailyTime) -> Self {
        Self::Calendar {
            time,
            repeats: true,
        }
    }

    pub fn repeats(&self) -> bool {
        match self {
            Self::TimeInterval { repeats, .. } | Self::Calendar { repeats, .. } => *repeats,
        }
    }

    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TimeInterval { .. } => "time_interval",
            Self::Calendar { .. } => "calendar",
        }
    }

    /// Wait until the next fire, measured from the local wall-clock `now`.
    pub fn delay_from(&self, now: NaiveDateTime) -> Duration {
        match self {
            Self::TimeInterval { seconds, .. } => Duration::from_secs(*seconds),
            Self::Calendar { time, .. } => (time.next_after(now) - now)
                .to_std()
                .unwrap_or_default(),
        }
    }
}

/// Rendered notification content handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Play the default sound
    #[serde(default = "default_sound")]
    pub sound: bool,
    /// Badge number to show while the notification is pending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
}

fn default_sound() -> bool {
    true
}

impl NotificationPayload {
    /// Payload with the default sound and a badge of 1
    pub fn from_content(content: &ContentItem, attachment: Option<Attachment>) -> Self {
        Self {
            title: content.title().to_string(),
            body: content.body().to_string(),
            attachment,
            sound: true,
            badge: Some(1),
        }
    }
}

/// A notification request as armed with the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    pub payload: NotificationPayload,
    pub trigger: TriggerSpec,
}

impl NotificationRequest {
    pub fn new(
        identifier: impl Into<String>,
        payload: NotificationPayload,
        trigger: TriggerSpec,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            payload,
            trigger,
        }
    }
}

/// Callbacks the platform raises for armed notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// A notification is about to be presented
    WillPresent { identifier: String },
    /// The user interacted with a presented notification
    UserResponded { identifier: String },
}

/// The OS-level notification service.
///
/// Arming a request with an identifier that is already pending replaces it.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Register a trigger. Resolves once the platform accepted or refused it.
    async fn arm(&self, request: NotificationRequest) -> Result<(), PlatformError>;

    /// Remove pending (not yet delivered) requests
    async fn cancel(&self, identifiers: &[String]);

    /// Remove every pending request
    async fn cancel_all(&self);

    /// Requests still waiting to fire
    async fn pending_requests(&self) -> Vec<NotificationRequest>;

    /// Identifiers of requests still waiting to fire
    async fn pending_identifiers(&self) -> HashSet<String> {
        self.pending_requests()
            .await
            .into_iter()
            .map(|request| request.identifier)
            .collect()
    }

    /// Set the application badge number
    async fn set_badge_count(&self, count: u32);
}
