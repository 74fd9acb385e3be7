//! In-process notification center.
//!
//! Keeps armed requests in memory and fires them with tokio timers, raising
//! the same callbacks a real platform would. Used by the host binary and by
//! tests that need real trigger timing.
//!
//! Like a real platform, the center owns staged attachment files once a
//! request is armed and deletes them when the request stops being pending.

use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::permission::{AuthorizationOptions, PermissionService, PermissionStatus};

use super::{NotificationRequest, NotificationService, PlatformError, PlatformEvent};

struct PendingEntry {
    request: NotificationRequest,
    /// Distinguishes re-arms of the same identifier
    generation: u64,
    timer: JoinHandle<()>,
}

/// Timer-driven `NotificationService`.
pub struct LocalNotificationCenter {
    /// identifier -> pending request
    pending: Arc<DashMap<String, PendingEntry>>,
    events: mpsc::UnboundedSender<PlatformEvent>,
    generation: AtomicU64,
    badge: Arc<AtomicU32>,
}

impl LocalNotificationCenter {
    /// Create a center and the receiver for its delivery callbacks
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PlatformEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let center = Arc::new(Self {
            pending: Arc::new(DashMap::new()),
            events,
            generation: AtomicU64::new(0),
            badge: Arc::new(AtomicU32::new(0)),
        });
        (center, receiver)
    }

    /// Simulate the user tapping a presented notification
    pub fn respond(&self, identifier: impl Into<String>) -> bool {
        self.events
            .send(PlatformEvent::UserResponded {
                identifier: identifier.into(),
            })
            .is_ok()
    }

    pub fn badge_count(&self) -> u32 {
        self.badge.load(Ordering::Relaxed)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    async fn remove_entries(&self, identifiers: impl IntoIterator<Item = String>) -> usize {
        let mut removed = Vec::new();
        for identifier in identifiers {
            if let Some((_, entry)) = self.pending.remove(&identifier) {
                entry.timer.abort();
                removed.push(entry.request);
            }
        }

        for request in &removed {
            discard_attachment(request).await;
        }
        removed.len()
    }
}

#[async_trait]
impl NotificationService for LocalNotificationCenter {
    async fn arm(&self, request: NotificationRequest) -> Result<(), PlatformError> {
        if self.events.is_closed() {
            return Err(PlatformError::Unavailable(
                "delivery callbacks are no longer received".to_string(),
            ));
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let (start_tx, start_rx) = oneshot::channel();

        let timer = tokio::spawn(run_trigger(
            self.pending.clone(),
            self.events.clone(),
            self.badge.clone(),
            request.clone(),
            generation,
            start_rx,
        ));

        let identifier = request.identifier.clone();
        tracing::debug!(
            identifier = %identifier,
            trigger = ?request.trigger,
            "Request armed"
        );

        let staged = request
            .payload
            .attachment
            .as_ref()
            .map(|a| a.local_path.clone());
        let previous = self.pending.insert(
            identifier,
            PendingEntry {
                request,
                generation,
                timer,
            },
        );

        // The timer may only remove its own entry once it is in the map
        let _ = start_tx.send(());

        if let Some(previous) = previous {
            previous.timer.abort();
            // A replacement may carry over the previous request's file
            let shared = previous
                .request
                .payload
                .attachment
                .as_ref()
                .is_some_and(|a| Some(&a.local_path) == staged.as_ref());
            if !shared {
                discard_attachment(&previous.request).await;
            }
        }
        Ok(())
    }

    async fn cancel(&self, identifiers: &[String]) {
        let removed = self.remove_entries(identifiers.iter().cloned()).await;
        tracing::debug!(requested = identifiers.len(), removed, "Pending requests removed");
    }

    async fn cancel_all(&self) {
        let identifiers: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        let removed = self.remove_entries(identifiers).await;
        tracing::debug!(removed, "All pending requests removed");
    }

    async fn pending_requests(&self) -> Vec<NotificationRequest> {
        self.pending
            .iter()
            .map(|entry| entry.value().request.clone())
            .collect()
    }

    async fn set_badge_count(&self, count: u32) {
        self.badge.store(count, Ordering::Relaxed);
    }
}

impl Drop for LocalNotificationCenter {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            entry.value().timer.abort();
        }
    }
}

async fn run_trigger(
    pending: Arc<DashMap<String, PendingEntry>>,
    events: mpsc::UnboundedSender<PlatformEvent>,
    badge: Arc<AtomicU32>,
    request: NotificationRequest,
    generation: u64,
    start: oneshot::Receiver<()>,
) {
    if start.await.is_err() {
        return;
    }

    let repeats = request.trigger.repeats();
    loop {
        let delay = request.trigger.delay_from(Local::now().naive_local());
        tokio::time::sleep(delay).await;

        if !repeats {
            // A one-shot request is no longer pending once it fires
            let removed =
                pending.remove_if(&request.identifier, |_, entry| entry.generation == generation);
            if removed.is_some() {
                discard_attachment(&request).await;
            }
        }

        if let Some(count) = request.payload.badge {
            badge.store(count, Ordering::Relaxed);
        }

        tracing::info!(
            identifier = %request.identifier,
            title = %request.payload.title,
            body = %request.payload.body,
            "Presenting notification"
        );

        let delivered = events.send(PlatformEvent::WillPresent {
            identifier: request.identifier.clone(),
        });
        if delivered.is_err() || !repeats {
            break;
        }
    }
}

/// Delete the staged attachment file of a request that left the pending set.
async fn discard_attachment(request: &NotificationRequest) {
    let Some(attachment) = &request.payload.attachment else {
        return;
    };

    match tokio::fs::remove_file(&attachment.local_path).await {
        Ok(()) => tracing::debug!(
            identifier = %request.identifier,
            path = %attachment.local_path.display(),
            "Attachment file removed"
        ),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            identifier = %request.identifier,
            path = %attachment.local_path.display(),
            error = %e,
            "Failed to remove attachment file"
        ),
    }
}

/// `PermissionService` that is undetermined until the user is prompted, then
/// answers with a fixed outcome.
pub struct SimulatedPermissions {
    grant: bool,
    prompted: AtomicBool,
}

impl SimulatedPermissions {
    pub fn new(grant: bool) -> Self {
        Self {
            grant,
            prompted: AtomicBool::new(false),
        }
    }

    fn outcome(&self) -> PermissionStatus {
        if self.grant {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

#[async_trait]
impl PermissionService for SimulatedPermissions {
    async fn current_status(&self) -> PermissionStatus {
        if self.prompted.load(Ordering::Relaxed) {
            self.outcome()
        } else {
            PermissionStatus::Denied
        }
    }

    async fn request(&self, options: AuthorizationOptions) -> PermissionStatus {
        self.prompted.store(true, Ordering::Relaxed);
        let outcome = self.outcome();
        tracing::info!(options = ?options, outcome = ?outcome, "Simulated permission prompt answered");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItem;
    use crate::platform::{Attachment, NotificationPayload, TriggerSpec};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn request(identifier: &str, trigger: TriggerSpec) -> NotificationRequest {
        NotificationRequest::new(
            identifier,
            NotificationPayload::from_content(&ContentItem::new("t", "b"), None),
            trigger,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_and_leaves_pending() {
        let (center, mut events) = LocalNotificationCenter::new();
        center.arm(request("once", TriggerSpec::one_shot(5))).await.unwrap();
        assert!(center.pending_identifiers().await.contains("once"));

        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(
            events.recv().await,
            Some(PlatformEvent::WillPresent {
                identifier: "once".to_string()
            })
        );
        assert!(center.pending_requests().await.is_empty());
        assert_eq!(center.badge_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_stays_pending() {
        let (center, mut events) = LocalNotificationCenter::new();
        center.arm(request("pulse", TriggerSpec::every(10))).await.unwrap();

        tokio::time::sleep(Duration::from_secs(25)).await;

        assert!(events.recv().await.is_some());
        assert!(events.recv().await.is_some());
        assert_eq!(center.pending_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_delivery() {
        let (center, mut events) = LocalNotificationCenter::new();
        center.arm(request("a", TriggerSpec::one_shot(5))).await.unwrap();
        center.arm(request("b", TriggerSpec::one_shot(5))).await.unwrap();

        center.cancel(&["a".to_string()]).await;
        assert_eq!(center.pending_count(), 1);

        center.cancel_all().await;
        assert_eq!(center.pending_count(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let (center, mut events) = LocalNotificationCenter::new();
        center.arm(request("x", TriggerSpec::one_shot(5))).await.unwrap();
        center.arm(request("x", TriggerSpec::one_shot(50))).await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(events.try_recv().is_err());
        assert_eq!(center.pending_count(), 1);
    }

    fn staged_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "notification-pool-staged-{}-{}.jpg",
            name,
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, b"image").unwrap();
        path
    }

    fn with_attachment(identifier: &str, trigger: TriggerSpec, path: &Path) -> NotificationRequest {
        let attachment = Attachment {
            identifier: uuid::Uuid::new_v4().to_string(),
            local_path: path.to_path_buf(),
            source: format!("file://{}", path.display()),
        };
        NotificationRequest::new(
            identifier,
            NotificationPayload::from_content(&ContentItem::new("t", "b"), Some(attachment)),
            trigger,
        )
    }

    #[tokio::test]
    async fn test_cancel_deletes_staged_attachment() {
        let (center, _events) = LocalNotificationCenter::new();
        let daily_file = staged_file("cancel");
        let other_file = staged_file("cancel-all");

        center
            .arm(with_attachment("pulse", TriggerSpec::every(3600), &daily_file))
            .await
            .unwrap();
        center
            .arm(with_attachment("other", TriggerSpec::one_shot(3600), &other_file))
            .await
            .unwrap();
        assert!(daily_file.exists());

        center.cancel(&["pulse".to_string()]).await;
        assert!(!daily_file.exists());
        assert!(other_file.exists());

        center.cancel_all().await;
        assert!(!other_file.exists());
    }

    #[tokio::test]
    async fn test_replacement_deletes_previous_attachment_unless_reused() {
        let (center, _events) = LocalNotificationCenter::new();
        let first = staged_file("first");
        let second = staged_file("second");

        center
            .arm(with_attachment("x", TriggerSpec::one_shot(3600), &first))
            .await
            .unwrap();
        center
            .arm(with_attachment("x", TriggerSpec::one_shot(1800), &first))
            .await
            .unwrap();
        assert!(first.exists());

        center
            .arm(with_attachment("x", TriggerSpec::one_shot(3600), &second))
            .await
            .unwrap();
        assert!(!first.exists());
        assert!(second.exists());

        center.cancel_all().await;
    }

    #[tokio::test]
    async fn test_one_shot_delivery_deletes_attachment() {
        let (center, mut events) = LocalNotificationCenter::new();
        let file = staged_file("delivered");

        center
            .arm(with_attachment("once", TriggerSpec::one_shot(0), &file))
            .await
            .unwrap();

        assert!(events.recv().await.is_some());
        assert!(!file.exists());
        assert_eq!(center.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_respond_and_badge() {
        let (center, mut events) = LocalNotificationCenter::new();
        assert!(center.respond("x"));
        assert_eq!(
            events.recv().await,
            Some(PlatformEvent::UserResponded {
                identifier: "x".to_string()
            })
        );

        center.set_badge_count(3).await;
        assert_eq!(center.badge_count(), 3);
    }

    #[tokio::test]
    async fn test_simulated_permissions() {
        let granting = SimulatedPermissions::new(true);
        assert_eq!(granting.current_status().await, PermissionStatus::Denied);
        assert_eq!(
            granting.request(AuthorizationOptions::default()).await,
            PermissionStatus::Granted
        );
        assert_eq!(granting.current_status().await, PermissionStatus::Granted);

        let refusing = SimulatedPermissions::new(false);
        assert_eq!(
            refusing.request(AuthorizationOptions::default()).await,
            PermissionStatus::Denied
        );
    }
}
