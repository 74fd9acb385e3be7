//! The scheduling and content-selection engine.
//!
//! # Execution model
//!
//! `NotificationEngine` is a cheap, cloneable handle. All state (content pool,
//! schedule store, permission gate) is owned by a single worker task that
//! processes commands one at a time, in submission order. Host calls and
//! platform callbacks travel through the same queue, so a `cancel` racing a
//! delivery re-arm resolves to whichever was queued last.
//!
//! Every host-facing operation is fire-and-forget: outcomes surface only as
//! lifecycle events on the bus and in the logs.
//!
//! # Startup
//!
//! `NotificationEngine::initialize` is the only way to build an engine. Before
//! any queued command runs the worker loads persisted schedules, installs the
//! content pool, resolves notification permission and, when granted, re-arms
//! daily schedules the platform no longer has pending.

mod command;
mod rescheduler;
mod scheduler;
mod worker;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::EngineSettings;
use crate::content::ContentItem;
use crate::error::{EngineError, Result};
use crate::events::{EventBus, EventStream, ListenerId, NotificationListener};
use crate::permission::{AuthorizationOptions, PermissionService, PermissionState};
use crate::platform::{AttachmentFetcher, NoAttachments, NotificationService, PlatformEvent};
use crate::schedule::RecurrenceConfig;
use crate::storage::KeyValueStore;

use command::Command;
use worker::EngineWorker;

/// Tunables for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay used by one-shot notifications
    pub one_shot_delay_seconds: u64,
    /// Lower bound for computed delays
    pub min_delay_seconds: u64,
    /// Storage key holding the schedule store
    pub storage_key: String,
    /// Capabilities requested when prompting for permission
    pub authorization: AuthorizationOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::from(&EngineSettings::default())
    }
}

impl From<&EngineSettings> for EngineConfig {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            one_shot_delay_seconds: settings.one_shot_delay_seconds,
            min_delay_seconds: settings.min_delay_seconds,
            storage_key: settings.storage_key.clone(),
            authorization: AuthorizationOptions {
                alert: settings.request_alert,
                badge: settings.request_badge,
                sound: settings.request_sound,
            },
        }
    }
}

/// Platform collaborators the engine drives
#[derive(Clone)]
pub struct EngineDeps {
    pub notifications: Arc<dyn NotificationService>,
    pub permissions: Arc<dyn PermissionService>,
    pub storage: Arc<dyn KeyValueStore>,
    pub attachments: Arc<dyn AttachmentFetcher>,
}

impl EngineDeps {
    /// Dependencies without attachment support
    pub fn new(
        notifications: Arc<dyn NotificationService>,
        permissions: Arc<dyn PermissionService>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            notifications,
            permissions,
            storage,
            attachments: Arc::new(NoAttachments),
        }
    }

    pub fn with_attachments(mut self, attachments: Arc<dyn AttachmentFetcher>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Point-in-time view of the worker's state
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub permission: PermissionState,
    pub pool_size: usize,
    pub schedules: HashMap<String, RecurrenceConfig>,
}

/// Handle to the process-wide notification engine.
#[derive(Clone)]
pub struct NotificationEngine {
    commands: mpsc::UnboundedSender<Command>,
    events: Arc<EventBus>,
}

impl NotificationEngine {
    /// Start the engine worker. Must be called from within a tokio runtime.
    ///
    /// Returns immediately; startup (schedule load, permission, reconciliation)
    /// runs on the worker ahead of any command submitted through the handle.
    pub fn initialize(deps: EngineDeps, config: EngineConfig, content: Vec<ContentItem>) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let events = Arc::new(EventBus::new());

        let worker_events = events.clone();
        tokio::spawn(async move {
            let worker = EngineWorker::start(deps, config, content, worker_events).await;
            worker.run(receiver).await;
        });

        Self { commands, events }
    }

    /// Show a pool notification after the one-shot delay
    pub fn create_one_shot(&self, identifier: impl Into<String>) {
        self.submit(Command::CreateOneShot {
            identifier: identifier.into(),
        });
    }

    /// Show a pool notification after `delay_seconds` (at least the minimum delay)
    pub fn create_delayed(&self, identifier: impl Into<String>, delay_seconds: i64) {
        self.submit(Command::CreateDelayed {
            identifier: identifier.into(),
            delay_seconds,
        });
    }

    /// Show a pool notification every day at the given local time
    pub fn create_daily(&self, identifier: impl Into<String>, hour: u32, minute: u32, second: u32) {
        self.submit(Command::CreateDaily {
            identifier: identifier.into(),
            hour: hour.into(),
            minute: minute.into(),
            second: second.into(),
        });
    }

    /// Repeat every `interval_seconds`, or fire once at `first_fire_at` when the
    /// interval is not positive
    pub fn create_repeating(
        &self,
        identifier: impl Into<String>,
        first_fire_at: DateTime<Utc>,
        interval_seconds: i64,
    ) {
        self.submit(Command::CreateRepeating {
            identifier: identifier.into(),
            first_fire_at,
            interval_seconds,
            content: None,
        });
    }

    /// One-shot notification with caller-supplied content
    pub fn create_with_content(&self, identifier: impl Into<String>, content: ContentItem) {
        self.submit(Command::CreateWithContent {
            identifier: identifier.into(),
            content,
        });
    }

    /// `create_repeating` with caller-supplied content
    pub fn create_scheduled_with_content(
        &self,
        identifier: impl Into<String>,
        content: ContentItem,
        fire_at: DateTime<Utc>,
        interval_seconds: i64,
    ) {
        self.submit(Command::CreateRepeating {
            identifier: identifier.into(),
            first_fire_at: fire_at,
            interval_seconds,
            content: Some(content),
        });
    }

    /// Replace the content pool. Already-armed notifications keep their content.
    pub fn update_content_pool(&self, items: Vec<ContentItem>) {
        self.submit(Command::UpdateContentPool { items });
    }

    /// Move a still-pending notification to a new time/interval, keeping its
    /// content. No-op when nothing is pending for `identifier`.
    pub fn update_scheduled_time(
        &self,
        identifier: impl Into<String>,
        new_time: DateTime<Utc>,
        interval_seconds: i64,
    ) {
        self.submit(Command::UpdateScheduledTime {
            identifier: identifier.into(),
            new_time,
            interval_seconds,
        });
    }

    /// Remove the pending trigger and stored recurrence for `identifier`
    pub fn cancel(&self, identifier: impl Into<String>) {
        self.submit(Command::Cancel {
            identifier: identifier.into(),
        });
    }

    /// Remove every pending trigger and stored recurrence
    pub fn cancel_all(&self) {
        self.submit(Command::CancelAll);
    }

    /// Platform callback: a notification is being presented
    pub fn on_will_present(&self, identifier: impl Into<String>) {
        self.submit(Command::Platform(PlatformEvent::WillPresent {
            identifier: identifier.into(),
        }));
    }

    /// Platform callback: the user opened a notification
    pub fn on_user_responded(&self, identifier: impl Into<String>) {
        self.submit(Command::Platform(PlatformEvent::UserResponded {
            identifier: identifier.into(),
        }));
    }

    /// Forward platform callbacks from `receiver` into the engine queue
    pub fn attach_platform_events(
        &self,
        mut receiver: mpsc::UnboundedReceiver<PlatformEvent>,
    ) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                engine.submit(Command::Platform(event));
            }
            tracing::debug!("Platform event source closed");
        })
    }

    /// Register a listener. The engine keeps only a weak reference.
    pub fn subscribe(&self, listener: &Arc<dyn NotificationListener>) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Stream of lifecycle events, registered until dropped
    pub fn subscribe_stream(&self) -> EventStream {
        self.events.subscribe_stream()
    }

    /// Wait until every command submitted before this call has been processed
    pub async fn flush(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.submit(Command::Flush(done));
        wait.await.map_err(|_| EngineError::EngineStopped)
    }

    /// Current worker state, after previously submitted commands
    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        let (reply, wait) = oneshot::channel();
        self.submit(Command::Snapshot(reply));
        wait.await.map_err(|_| EngineError::EngineStopped)
    }

    fn submit(&self, command: Command) {
        let operation = command.name();
        let identifier = command.identifier().to_string();

        if self.commands.send(command).is_err() {
            EngineError::EngineStopped.log(operation, &identifier);
        }
    }
}
