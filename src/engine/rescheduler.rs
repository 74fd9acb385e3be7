//! Platform callbacks and recurring re-arms.
//!
//! Daily schedules are re-armed with freshly drawn content after every
//! delivery and every open. Interval schedules are re-armed only on delivery,
//! as a one-shot `seconds` from the delivery time, which replaces the
//! platform's own repeat so each occurrence gets new content.

use crate::error::Result;
use crate::events::NotificationEvent;
use crate::metrics::SchedulerMetrics;
use crate::platform::{PlatformEvent, TriggerSpec};
use crate::schedule::{DailyTime, RecurrenceConfig};

use super::worker::EngineWorker;

impl EngineWorker {
    pub(super) async fn handle_platform_event(&mut self, event: PlatformEvent) -> Result<()> {
        match event {
            PlatformEvent::WillPresent { identifier } => self.on_delivered(&identifier).await,
            PlatformEvent::UserResponded { identifier } => self.on_opened(&identifier).await,
        }
    }

    #[tracing::instrument(name = "engine.delivered", skip(self))]
    async fn on_delivered(&mut self, identifier: &str) -> Result<()> {
        tracing::info!(identifier = %identifier, "Notification delivered");
        self.events.emit(&NotificationEvent::delivered(identifier));

        match self.store.get(identifier).copied() {
            Some(RecurrenceConfig::DailyAt(time)) => {
                self.rearm_daily(identifier, time, "daily").await
            }
            Some(RecurrenceConfig::RepeatingInterval { seconds }) => {
                self.rearm_interval(identifier, seconds, "interval").await
            }
            None => {
                tracing::debug!(identifier = %identifier, "No recurrence stored, lifecycle complete");
                Ok(())
            }
        }
    }

    #[tracing::instrument(name = "engine.opened", skip(self))]
    async fn on_opened(&mut self, identifier: &str) -> Result<()> {
        tracing::info!(identifier = %identifier, "Notification opened");
        self.events.emit(&NotificationEvent::opened(identifier));

        let result = match self.store.get(identifier).copied() {
            Some(RecurrenceConfig::DailyAt(time)) => {
                self.rearm_daily(identifier, time, "daily").await
            }
            Some(RecurrenceConfig::RepeatingInterval { .. }) | None => Ok(()),
        };

        self.notifications.set_badge_count(0).await;
        result
    }

    /// Re-arm every stored schedule that the platform no longer has pending.
    /// Runs once at startup, after permission was granted.
    pub(super) async fn reconcile(&mut self) {
        let pending = self.notifications.pending_identifiers().await;
        let missing: Vec<(String, RecurrenceConfig)> = self
            .store
            .sorted_entries()
            .into_iter()
            .filter(|(identifier, _)| !pending.contains(identifier))
            .collect();

        tracing::info!(
            stored = self.store.len(),
            pending = pending.len(),
            missing = missing.len(),
            "Reconciling stored schedules"
        );

        for (identifier, config) in missing {
            let result = match config {
                RecurrenceConfig::DailyAt(time) => {
                    self.rearm_daily(&identifier, time, "reconcile").await
                }
                // Same shape as the delivery re-arm: the next occurrence is
                // one interval away and carries fresh content.
                RecurrenceConfig::RepeatingInterval { seconds } => {
                    self.rearm_interval(&identifier, seconds, "reconcile").await
                }
            };

            if let Err(e) = result {
                SchedulerMetrics::record_skipped(e.skip_reason());
                e.log("reconcile", &identifier);
            }
        }
    }

    async fn rearm_daily(&mut self, identifier: &str, time: DailyTime, kind: &str) -> Result<()> {
        let content = self.draw()?;
        self.arm(identifier, &content, TriggerSpec::daily(time)).await?;
        SchedulerMetrics::record_reschedule(kind);
        Ok(())
    }

    async fn rearm_interval(&mut self, identifier: &str, seconds: u64, kind: &str) -> Result<()> {
        let content = self.draw()?;
        self.arm(identifier, &content, TriggerSpec::one_shot(seconds))
            .await?;
        SchedulerMetrics::record_reschedule(kind);
        Ok(())
    }
}
