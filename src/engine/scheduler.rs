//! Host-facing scheduling operations.
//!
//! Each operation checks permission first and returns an `EngineError` for
//! the worker to log when it cannot arm anything.

use chrono::{DateTime, Utc};

use crate::content::ContentItem;
use crate::error::Result;
use crate::platform::{NotificationRequest, TriggerSpec};
use crate::schedule::{DailyTime, RecurrenceConfig};

use super::worker::EngineWorker;

impl EngineWorker {
    #[tracing::instrument(name = "engine.create_one_shot", skip(self))]
    pub(super) async fn create_one_shot(&mut self, identifier: &str) -> Result<()> {
        self.permission.check()?;
        let content = self.draw()?;
        let delay = self.config.one_shot_delay_seconds;
        self.arm_one_shot(identifier, &content, delay).await
    }

    #[tracing::instrument(name = "engine.create_delayed", skip(self))]
    pub(super) async fn create_delayed(&mut self, identifier: &str, delay_seconds: i64) -> Result<()> {
        self.permission.check()?;
        let content = self.draw()?;
        let delay = self.floor_delay(delay_seconds);
        self.arm_one_shot(identifier, &content, delay).await
    }

    #[tracing::instrument(name = "engine.create_with_content", skip(self, content))]
    pub(super) async fn create_with_content(
        &mut self,
        identifier: &str,
        content: ContentItem,
    ) -> Result<()> {
        self.permission.check()?;
        let delay = self.config.one_shot_delay_seconds;
        self.arm_one_shot(identifier, &content, delay).await
    }

    #[tracing::instrument(name = "engine.create_daily", skip(self))]
    pub(super) async fn create_daily(
        &mut self,
        identifier: &str,
        hour: i64,
        minute: i64,
        second: i64,
    ) -> Result<()> {
        self.permission.check()?;
        let time = DailyTime::new(hour, minute, second)?;
        let content = self.draw()?;

        self.store.put(identifier, RecurrenceConfig::daily(time)).await;
        self.notifications.cancel(&[identifier.to_string()]).await;

        self.arm(identifier, &content, TriggerSpec::daily(time)).await
    }

    #[tracing::instrument(name = "engine.create_repeating", skip(self, content))]
    pub(super) async fn create_repeating(
        &mut self,
        identifier: &str,
        first_fire_at: DateTime<Utc>,
        interval_seconds: i64,
        content: Option<ContentItem>,
    ) -> Result<()> {
        self.permission.check()?;
        let content = match content {
            Some(content) => content,
            None => self.draw()?,
        };

        if interval_seconds > 0 {
            let seconds = interval_seconds as u64;
            self.store
                .put(identifier, RecurrenceConfig::repeating(seconds)?)
                .await;
            self.arm(identifier, &content, TriggerSpec::every(seconds)).await
        } else {
            let delay = self.delay_until(first_fire_at);
            self.arm_one_shot(identifier, &content, delay).await
        }
    }

    #[tracing::instrument(name = "engine.update_scheduled_time", skip(self))]
    pub(super) async fn update_scheduled_time(
        &mut self,
        identifier: &str,
        new_time: DateTime<Utc>,
        interval_seconds: i64,
    ) -> Result<()> {
        self.permission.check()?;

        let pending = self
            .notifications
            .pending_requests()
            .await
            .into_iter()
            .find(|request| request.identifier == identifier);

        let Some(existing) = pending else {
            tracing::debug!(identifier = %identifier, "Nothing pending, scheduled time left unchanged");
            return Ok(());
        };

        let trigger = if interval_seconds > 0 {
            let seconds = interval_seconds as u64;
            self.store
                .put(identifier, RecurrenceConfig::repeating(seconds)?)
                .await;
            TriggerSpec::every(seconds)
        } else {
            self.forget_recurrence(identifier).await;
            TriggerSpec::one_shot(self.delay_until(new_time))
        };

        // Arming under the same identifier replaces the pending request, and
        // its staged attachment stays with the carried-over payload.
        self.arm_request(NotificationRequest::new(identifier, existing.payload, trigger))
            .await
    }

    #[tracing::instrument(name = "engine.cancel", skip(self))]
    pub(super) async fn cancel(&mut self, identifier: &str) {
        self.notifications.cancel(&[identifier.to_string()]).await;
        self.store.remove(identifier).await;
        tracing::info!(identifier = %identifier, "Notification cancelled");
    }

    #[tracing::instrument(name = "engine.cancel_all", skip(self))]
    pub(super) async fn cancel_all(&mut self) {
        self.notifications.cancel_all().await;
        self.store.clear().await;
        tracing::info!("All notifications cancelled");
    }

    /// Arm a non-repeating trigger, replacing any recurrence the identifier had.
    async fn arm_one_shot(
        &mut self,
        identifier: &str,
        content: &ContentItem,
        seconds: u64,
    ) -> Result<()> {
        self.forget_recurrence(identifier).await;
        self.arm(identifier, content, TriggerSpec::one_shot(seconds))
            .await
    }

    async fn forget_recurrence(&mut self, identifier: &str) {
        if self.store.contains(identifier) {
            self.store.remove(identifier).await;
        }
    }
}
