use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::content::{ContentItem, ContentPool};
use crate::error::{EngineError, Result};
use crate::events::{EventBus, NotificationEvent};
use crate::metrics::SchedulerMetrics;
use crate::permission::{PermissionGate, PermissionStatus};
use crate::platform::{
    AttachmentFetcher, NotificationPayload, NotificationRequest, NotificationService, TriggerSpec,
};
use crate::schedule::ScheduleStore;

use super::command::Command;
use super::{EngineConfig, EngineDeps, EngineSnapshot};

/// Sole owner of the engine's mutable state.
pub(crate) struct EngineWorker {
    pub(super) notifications: Arc<dyn NotificationService>,
    pub(super) attachments: Arc<dyn AttachmentFetcher>,
    pub(super) pool: ContentPool,
    pub(super) store: ScheduleStore,
    pub(super) permission: PermissionGate,
    pub(super) events: Arc<EventBus>,
    pub(super) config: EngineConfig,
}

impl EngineWorker {
    /// Run the startup sequence: load schedules, install content, resolve
    /// permission, then reconcile.
    pub(crate) async fn start(
        deps: EngineDeps,
        config: EngineConfig,
        content: Vec<ContentItem>,
        events: Arc<EventBus>,
    ) -> Self {
        let store = ScheduleStore::load(deps.storage.clone(), config.storage_key.clone()).await;

        let mut worker = Self {
            notifications: deps.notifications,
            attachments: deps.attachments,
            pool: ContentPool::default(),
            store,
            permission: PermissionGate::new(deps.permissions, config.authorization),
            events,
            config,
        };

        worker.install_pool(content);

        match worker.permission.ensure().await {
            PermissionStatus::Granted => worker.reconcile().await,
            PermissionStatus::Denied => tracing::warn!(
                stored = worker.store.len(),
                "Notification permission denied, recurring notifications stay unarmed"
            ),
        }

        tracing::info!("Notification engine initialized");
        worker
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }

        tracing::info!("Notification engine stopped");
    }

    async fn handle(&mut self, command: Command) {
        let operation = command.name();
        let identifier = command.identifier().to_string();

        let result = match command {
            Command::CreateOneShot { identifier } => self.create_one_shot(&identifier).await,
            Command::CreateDelayed {
                identifier,
                delay_seconds,
            } => self.create_delayed(&identifier, delay_seconds).await,
            Command::CreateDaily {
                identifier,
                hour,
                minute,
                second,
            } => self.create_daily(&identifier, hour, minute, second).await,
            Command::CreateRepeating {
                identifier,
                first_fire_at,
                interval_seconds,
                content,
            } => {
                self.create_repeating(&identifier, first_fire_at, interval_seconds, content)
                    .await
            }
            Command::CreateWithContent {
                identifier,
                content,
            } => self.create_with_content(&identifier, content).await,
            Command::UpdateContentPool { items } => {
                self.install_pool(items);
                Ok(())
            }
            Command::UpdateScheduledTime {
                identifier,
                new_time,
                interval_seconds,
            } => {
                self.update_scheduled_time(&identifier, new_time, interval_seconds)
                    .await
            }
            Command::Cancel { identifier } => {
                self.cancel(&identifier).await;
                Ok(())
            }
            Command::CancelAll => {
                self.cancel_all().await;
                Ok(())
            }
            Command::Platform(event) => self.handle_platform_event(event).await,
            Command::Flush(done) => {
                let _ = done.send(());
                Ok(())
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
                Ok(())
            }
        };

        if let Err(e) = result {
            SchedulerMetrics::record_skipped(e.skip_reason());
            e.log(operation, &identifier);
        }
    }

    fn install_pool(&mut self, items: Vec<ContentItem>) {
        self.pool.replace(items);
        SchedulerMetrics::set_pool_size(self.pool.len());
        tracing::info!(items = self.pool.len(), "Content pool updated");
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            permission: self.permission.state(),
            pool_size: self.pool.len(),
            schedules: self.store.load_all(),
        }
    }

    pub(super) fn draw(&self) -> Result<ContentItem> {
        self.pool.draw().ok_or(EngineError::EmptyPool)
    }

    /// Seconds from now until `fire_at`, floored at the minimum delay
    pub(super) fn delay_until(&self, fire_at: DateTime<Utc>) -> u64 {
        self.floor_delay((fire_at - Utc::now()).num_seconds())
    }

    pub(super) fn floor_delay(&self, seconds: i64) -> u64 {
        seconds.max(self.config.min_delay_seconds as i64).max(0) as u64
    }

    /// Render `content` and arm it under `identifier`.
    pub(super) async fn arm(
        &self,
        identifier: &str,
        content: &ContentItem,
        trigger: TriggerSpec,
    ) -> Result<()> {
        self.permission.check()?;
        let payload = self.build_payload(identifier, content).await;
        self.arm_request(NotificationRequest::new(identifier, payload, trigger))
            .await
    }

    /// Hand a request to the platform. `Scheduled` is emitted only after the
    /// platform accepted it.
    pub(super) async fn arm_request(&self, request: NotificationRequest) -> Result<()> {
        self.permission.check()?;

        let identifier = request.identifier.clone();
        let trigger = request.trigger;

        match self.notifications.arm(request).await {
            Ok(()) => {
                SchedulerMetrics::record_armed(trigger.kind());
                tracing::info!(
                    identifier = %identifier,
                    trigger = ?trigger,
                    "Notification scheduled"
                );
                self.events.emit(&NotificationEvent::scheduled(identifier));
                Ok(())
            }
            Err(source) => {
                SchedulerMetrics::record_arm_failure();
                Err(EngineError::Arm { identifier, source })
            }
        }
    }

    async fn build_payload(&self, identifier: &str, content: &ContentItem) -> NotificationPayload {
        let attachment = match content.image() {
            None => None,
            Some(uri) => match self.attachments.fetch(uri).await {
                Ok(attachment) => Some(attachment),
                Err(e) => {
                    SchedulerMetrics::record_attachment_failure();
                    EngineError::from(e).log("fetch_attachment", identifier);
                    None
                }
            },
        };

        NotificationPayload::from_content(content, attachment)
    }
}
