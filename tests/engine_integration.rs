//! End-to-end engine behavior against recording platform collaborators.
//!
//! The mocks answer immediately, so `flush()` is enough to observe the
//! outcome of everything queued before it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use notification_pool::content::ContentItem;
use notification_pool::engine::{EngineConfig, EngineDeps, NotificationEngine};
use notification_pool::events::{EventStream, NotificationEvent, NotificationListener};
use notification_pool::metrics::ATTACHMENT_FAILURES_TOTAL;
use notification_pool::permission::{AuthorizationOptions, PermissionService, PermissionState, PermissionStatus};
use notification_pool::platform::{
    FileAttachments, LocalNotificationCenter, NotificationPayload, NotificationRequest, NotificationService, PlatformError,
    TriggerSpec,
};
use notification_pool::schedule::{DailyTime, RecurrenceConfig, ScheduleStore};
use notification_pool::storage::{KeyValueStore, MemoryKeyValueStore};

#[derive(Default)]
struct RecordingPlatform {
    pending: Mutex<HashMap<String, NotificationRequest>>,
    armed: Mutex<Vec<NotificationRequest>>,
    cancelled: Mutex<Vec<String>>,
    badge: Mutex<Option<u32>>,
    reject: AtomicBool,
}

impl RecordingPlatform {
    fn with_pending(requests: Vec<NotificationRequest>) -> Arc<Self> {
        let platform = Self::default();
        {
            let mut pending = platform.pending.lock().unwrap();
            for request in requests {
                pending.insert(request.identifier.clone(), request);
            }
        }
        Arc::new(platform)
    }

    fn armed(&self) -> Vec<NotificationRequest> {
        self.armed.lock().unwrap().clone()
    }

    fn armed_for(&self, identifier: &str) -> Vec<NotificationRequest> {
        self.armed()
            .into_iter()
            .filter(|r| r.identifier == identifier)
            .collect()
    }

    fn clear_armed(&self) {
        self.armed.lock().unwrap().clear();
    }

    fn is_pending(&self, identifier: &str) -> bool {
        self.pending.lock().unwrap().contains_key(identifier)
    }

    fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationService for RecordingPlatform {
    async fn arm(&self, request: NotificationRequest) -> Result<(), PlatformError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(PlatformError::Rejected("quota exceeded".to_string()));
        }
        self.armed.lock().unwrap().push(request.clone());
        self.pending
            .lock()
            .unwrap()
            .insert(request.identifier.clone(), request);
        Ok(())
    }

    async fn cancel(&self, identifiers: &[String]) {
        let mut pending = self.pending.lock().unwrap();
        for identifier in identifiers {
            pending.remove(identifier);
            self.cancelled.lock().unwrap().push(identifier.clone());
        }
    }

    async fn cancel_all(&self) {
        self.pending.lock().unwrap().clear();
    }

    async fn pending_requests(&self) -> Vec<NotificationRequest> {
        self.pending.lock().unwrap().values().cloned().collect()
    }

    async fn set_badge_count(&self, count: u32) {
        *self.badge.lock().unwrap() = Some(count);
    }
}

struct FixedPermissions(PermissionStatus);

#[async_trait]
impl PermissionService for FixedPermissions {
    async fn current_status(&self) -> PermissionStatus {
        self.0
    }

    async fn request(&self, _options: AuthorizationOptions) -> PermissionStatus {
        self.0
    }
}

#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<NotificationEvent>>,
}

impl NotificationListener for RecordingListener {
    fn on_notification_event(&self, event: &NotificationEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

struct Harness {
    engine: NotificationEngine,
    platform: Arc<RecordingPlatform>,
    storage: Arc<MemoryKeyValueStore>,
    events: EventStream,
}

fn sample_pool() -> Vec<ContentItem> {
    vec![
        ContentItem::new("Morning", "Rise and shine"),
        ContentItem::new("Noon", "Lunch time"),
        ContentItem::new("Evening", "Wind down"),
    ]
}

fn daily_request(identifier: &str, time: DailyTime) -> NotificationRequest {
    let content = ContentItem::new("Stale", "Armed before restart");
    NotificationRequest::new(
        identifier,
        NotificationPayload::from_content(&content, None),
        TriggerSpec::daily(time),
    )
}

fn start(
    platform: Arc<RecordingPlatform>,
    storage: Arc<MemoryKeyValueStore>,
    permission: PermissionStatus,
    content: Vec<ContentItem>,
) -> Harness {
    let deps = EngineDeps::new(
        platform.clone(),
        Arc::new(FixedPermissions(permission)),
        storage.clone(),
    );
    let engine = NotificationEngine::initialize(deps, EngineConfig::default(), content);
    let events = engine.subscribe_stream();
    Harness {
        engine,
        platform,
        storage,
        events,
    }
}

fn granted(content: Vec<ContentItem>) -> Harness {
    start(
        Arc::new(RecordingPlatform::default()),
        Arc::new(MemoryKeyValueStore::new()),
        PermissionStatus::Granted,
        content,
    )
}

async fn persisted(storage: Arc<MemoryKeyValueStore>) -> ScheduleStore {
    let backend: Arc<dyn KeyValueStore> = storage;
    ScheduleStore::load(backend, EngineConfig::default().storage_key).await
}

#[tokio::test]
async fn test_one_shot_arms_pool_content_and_emits_scheduled() {
    let mut h = granted(sample_pool());

    h.engine.create_one_shot("hello");
    h.engine.flush().await.unwrap();

    let armed = h.platform.armed_for("hello");
    assert_eq!(armed.len(), 1);
    assert_eq!(armed[0].trigger, TriggerSpec::one_shot(1));
    assert!(sample_pool()
        .iter()
        .any(|item| item.title() == armed[0].payload.title && item.body() == armed[0].payload.body));
    assert_eq!(armed[0].payload.badge, Some(1));
    assert!(armed[0].payload.sound);

    assert_eq!(h.events.drain(), vec![NotificationEvent::scheduled("hello")]);
}

#[tokio::test]
async fn test_delayed_enforces_minimum_delay() {
    let h = granted(sample_pool());

    h.engine.create_delayed("soon", 90);
    h.engine.create_delayed("now", 0);
    h.engine.create_delayed("past", -30);
    h.engine.flush().await.unwrap();

    assert_eq!(h.platform.armed_for("soon")[0].trigger, TriggerSpec::one_shot(90));
    assert_eq!(h.platform.armed_for("now")[0].trigger, TriggerSpec::one_shot(1));
    assert_eq!(h.platform.armed_for("past")[0].trigger, TriggerSpec::one_shot(1));
}

#[tokio::test]
async fn test_empty_pool_never_arms() {
    let mut h = granted(Vec::new());

    h.engine.create_one_shot("a");
    h.engine.create_delayed("b", 10);
    h.engine.create_daily("c", 9, 0, 0);
    h.engine.flush().await.unwrap();

    assert!(h.platform.armed().is_empty());
    assert!(h.events.drain().is_empty());
    assert!(h.engine.snapshot().await.unwrap().schedules.is_empty());
}

#[tokio::test]
async fn test_emptied_pool_skips_one_shot() {
    let mut h = granted(sample_pool());

    h.engine.update_content_pool(Vec::new());
    h.engine.create_one_shot("id");
    h.engine.flush().await.unwrap();

    assert!(h.platform.armed().is_empty());
    assert!(h.events.drain().is_empty());
}

#[tokio::test]
async fn test_replaced_pool_is_used_for_new_arms() {
    let h = granted(sample_pool());
    let fresh = ContentItem::new("Only", "The one and only");

    h.engine.update_content_pool(vec![fresh.clone()]);
    for i in 0..5 {
        h.engine.create_one_shot(format!("id-{i}"));
    }
    h.engine.flush().await.unwrap();

    let armed = h.platform.armed();
    assert_eq!(armed.len(), 5);
    assert!(armed.iter().all(|r| r.payload.title == "Only"));
    assert_eq!(h.engine.snapshot().await.unwrap().pool_size, 1);
}

#[tokio::test]
async fn test_permission_denied_skips_everything() {
    let mut h = start(
        Arc::new(RecordingPlatform::default()),
        Arc::new(MemoryKeyValueStore::new()),
        PermissionStatus::Denied,
        sample_pool(),
    );

    h.engine.create_one_shot("a");
    h.engine.create_daily("b", 8, 30, 0);
    h.engine.create_repeating("c", Utc::now(), 60);
    h.engine.flush().await.unwrap();

    assert!(h.platform.armed().is_empty());
    assert!(h.events.drain().is_empty());

    let snapshot = h.engine.snapshot().await.unwrap();
    assert_eq!(snapshot.permission, PermissionState::Denied);
    assert!(snapshot.schedules.is_empty());
}

#[tokio::test]
async fn test_daily_is_persisted_and_armed() {
    let mut h = granted(sample_pool());
    let nine = DailyTime::new(9, 0, 0).unwrap();

    h.engine.create_daily("morning", 9, 0, 0);
    h.engine.flush().await.unwrap();

    let armed = h.platform.armed_for("morning");
    assert_eq!(armed.len(), 1);
    assert_eq!(armed[0].trigger, TriggerSpec::daily(nine));
    assert!(h.platform.cancelled.lock().unwrap().contains(&"morning".to_string()));
    assert_eq!(h.events.drain(), vec![NotificationEvent::scheduled("morning")]);

    let store = persisted(h.storage.clone()).await;
    assert_eq!(store.get("morning"), Some(&RecurrenceConfig::daily(nine)));
}

#[tokio::test]
async fn test_daily_with_invalid_time_is_skipped() {
    let h = granted(sample_pool());

    h.engine.create_daily("bad", 24, 0, 0);
    h.engine.create_daily("worse", 7, 61, 0);
    h.engine.flush().await.unwrap();

    assert!(h.platform.armed().is_empty());
    assert!(h.engine.snapshot().await.unwrap().schedules.is_empty());
}

#[tokio::test]
async fn test_daily_delivery_rearms_once_after_delivered_event() {
    let mut h = granted(sample_pool());
    let nine = DailyTime::new(9, 0, 0).unwrap();

    h.engine.create_daily("morning", 9, 0, 0);
    h.engine.flush().await.unwrap();
    h.platform.clear_armed();
    h.events.drain();

    h.engine.on_will_present("morning");
    h.engine.flush().await.unwrap();

    let armed = h.platform.armed_for("morning");
    assert_eq!(armed.len(), 1);
    assert_eq!(armed[0].trigger, TriggerSpec::daily(nine));
    assert_eq!(
        h.events.drain(),
        vec![
            NotificationEvent::delivered("morning"),
            NotificationEvent::scheduled("morning"),
        ]
    );
}

#[tokio::test]
async fn test_repeating_delivery_rearms_relative_to_delivery() {
    let mut h = granted(sample_pool());

    h.engine
        .create_repeating("pulse", Utc::now() + Duration::seconds(5), 30);
    h.engine.flush().await.unwrap();

    assert_eq!(h.platform.armed_for("pulse")[0].trigger, TriggerSpec::every(30));
    assert_eq!(
        h.engine.snapshot().await.unwrap().schedules.get("pulse"),
        Some(&RecurrenceConfig::RepeatingInterval { seconds: 30 })
    );
    h.platform.clear_armed();
    h.events.drain();

    h.engine.on_will_present("pulse");
    h.engine.flush().await.unwrap();

    let armed = h.platform.armed_for("pulse");
    assert_eq!(armed.len(), 1);
    assert_eq!(armed[0].trigger, TriggerSpec::one_shot(30));
    assert_eq!(
        h.events.drain(),
        vec![
            NotificationEvent::delivered("pulse"),
            NotificationEvent::scheduled("pulse"),
        ]
    );
}

#[tokio::test]
async fn test_repeating_without_interval_fires_once_at_time() {
    let h = granted(sample_pool());

    h.engine
        .create_repeating("once", Utc::now() + Duration::seconds(120), 0);
    h.engine.create_repeating("overdue", Utc::now() - Duration::seconds(60), 0);
    h.engine.flush().await.unwrap();

    match h.platform.armed_for("once")[0].trigger {
        TriggerSpec::TimeInterval { seconds, repeats } => {
            assert!(!repeats);
            assert!((118..=120).contains(&seconds), "got {seconds}");
        }
        other => panic!("unexpected trigger {other:?}"),
    }
    assert_eq!(h.platform.armed_for("overdue")[0].trigger, TriggerSpec::one_shot(1));
    assert!(h.engine.snapshot().await.unwrap().schedules.is_empty());
}

#[tokio::test]
async fn test_one_shot_delivery_ends_lifecycle() {
    let mut h = granted(sample_pool());

    h.engine.create_one_shot("once");
    h.engine.flush().await.unwrap();
    h.platform.clear_armed();
    h.events.drain();

    h.engine.on_will_present("once");
    h.engine.flush().await.unwrap();

    assert!(h.platform.armed().is_empty());
    assert_eq!(h.events.drain(), vec![NotificationEvent::delivered("once")]);
}

#[tokio::test]
async fn test_one_shot_replaces_stored_recurrence() {
    let h = granted(sample_pool());

    h.engine.create_daily("id", 7, 0, 0);
    h.engine.create_one_shot("id");
    h.engine.flush().await.unwrap();

    assert!(!h.engine.snapshot().await.unwrap().schedules.contains_key("id"));
    assert!(!persisted(h.storage.clone()).await.contains("id"));
}

#[tokio::test]
async fn test_open_rearms_daily_and_resets_badge() {
    let mut h = granted(sample_pool());

    h.engine.create_daily("morning", 6, 45, 0);
    h.engine.create_repeating("pulse", Utc::now(), 60);
    h.engine.flush().await.unwrap();
    h.platform.clear_armed();
    h.events.drain();

    h.engine.on_user_responded("morning");
    h.engine.on_user_responded("pulse");
    h.engine.flush().await.unwrap();

    assert_eq!(h.platform.armed_for("morning").len(), 1);
    assert!(h.platform.armed_for("pulse").is_empty());
    assert_eq!(*h.platform.badge.lock().unwrap(), Some(0));
    assert_eq!(
        h.events.drain(),
        vec![
            NotificationEvent::opened("morning"),
            NotificationEvent::scheduled("morning"),
            NotificationEvent::opened("pulse"),
        ]
    );
}

#[tokio::test]
async fn test_cancel_removes_pending_and_stored() {
    let h = granted(sample_pool());

    h.engine.create_daily("morning", 9, 0, 0);
    h.engine.create_one_shot("other");
    h.engine.flush().await.unwrap();
    assert!(h.platform.is_pending("morning"));

    h.engine.cancel("morning");
    h.engine.flush().await.unwrap();

    assert!(!h.platform.is_pending("morning"));
    assert!(h.platform.is_pending("other"));
    assert!(!h.engine.snapshot().await.unwrap().schedules.contains_key("morning"));
    assert!(!persisted(h.storage.clone()).await.contains("morning"));
}

#[tokio::test]
async fn test_cancel_all_clears_everything() {
    let h = granted(sample_pool());

    h.engine.create_daily("a", 9, 0, 0);
    h.engine.create_repeating("b", Utc::now(), 300);
    h.engine.create_one_shot("c");
    h.engine.flush().await.unwrap();
    assert_eq!(h.platform.pending_len(), 3);

    h.engine.cancel_all();
    h.engine.flush().await.unwrap();

    assert_eq!(h.platform.pending_len(), 0);
    assert!(h.engine.snapshot().await.unwrap().schedules.is_empty());
    assert!(persisted(h.storage.clone()).await.is_empty());
}

#[tokio::test]
async fn test_cancel_racing_delivery_stays_consistent() {
    for cancel_first in [false, true] {
        let h = granted(sample_pool());

        h.engine.create_daily("race", 9, 0, 0);
        h.engine.flush().await.unwrap();

        if cancel_first {
            h.engine.cancel("race");
            h.engine.on_will_present("race");
        } else {
            h.engine.on_will_present("race");
            h.engine.cancel("race");
        }
        h.engine.flush().await.unwrap();

        let stored = h.engine.snapshot().await.unwrap().schedules.contains_key("race");
        assert_eq!(stored, h.platform.is_pending("race"));
        assert!(!stored);
    }
}

#[tokio::test]
async fn test_arm_failure_keeps_store_entry_and_emits_nothing() {
    let mut h = granted(sample_pool());
    h.platform.reject.store(true, Ordering::SeqCst);

    h.engine.create_daily("morning", 9, 0, 0);
    h.engine.flush().await.unwrap();

    assert!(h.events.drain().is_empty());
    assert!(!h.platform.is_pending("morning"));
    assert!(persisted(h.storage.clone()).await.contains("morning"));

    // Next boot reconciles it once the platform accepts again
    let restarted = start(
        Arc::new(RecordingPlatform::default()),
        h.storage.clone(),
        PermissionStatus::Granted,
        sample_pool(),
    );
    restarted.engine.flush().await.unwrap();
    assert_eq!(restarted.platform.armed_for("morning").len(), 1);
}

#[tokio::test]
async fn test_boot_reconciliation_arms_missing_daily_once() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let nine = DailyTime::new(9, 0, 0).unwrap();
    let eighteen = DailyTime::new(18, 0, 0).unwrap();
    {
        let mut store = persisted(storage.clone()).await;
        store.put("morning", RecurrenceConfig::daily(nine)).await;
        store.put("evening", RecurrenceConfig::daily(eighteen)).await;
        store
            .put("pulse", RecurrenceConfig::repeating(60).unwrap())
            .await;
    }

    let platform = RecordingPlatform::with_pending(vec![daily_request("evening", eighteen)]);
    let mut h = start(platform, storage, PermissionStatus::Granted, sample_pool());
    h.engine.flush().await.unwrap();

    let morning = h.platform.armed_for("morning");
    assert_eq!(morning.len(), 1);
    assert_eq!(morning[0].trigger, TriggerSpec::daily(nine));
    assert!(h.platform.armed_for("evening").is_empty());
    assert_eq!(h.platform.armed_for("pulse").len(), 1);
    assert_eq!(h.platform.armed().len(), 2);
    assert_eq!(
        h.events.drain(),
        vec![
            NotificationEvent::scheduled("morning"),
            NotificationEvent::scheduled("pulse"),
        ]
    );
    assert_eq!(h.engine.snapshot().await.unwrap().schedules.len(), 3);
}

#[tokio::test]
async fn test_boot_reconciliation_rearms_missing_interval() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    {
        let mut store = persisted(storage.clone()).await;
        store
            .put("pulse", RecurrenceConfig::repeating(60).unwrap())
            .await;
        store
            .put("tick", RecurrenceConfig::repeating(15).unwrap())
            .await;
    }

    let content = ContentItem::new("Stale", "Armed before restart");
    let still_armed = NotificationRequest::new(
        "tick",
        NotificationPayload::from_content(&content, None),
        TriggerSpec::every(15),
    );
    let platform = RecordingPlatform::with_pending(vec![still_armed]);
    let h = start(platform, storage, PermissionStatus::Granted, sample_pool());
    h.engine.flush().await.unwrap();

    let pulse = h.platform.armed_for("pulse");
    assert_eq!(pulse.len(), 1);
    assert_eq!(pulse[0].trigger, TriggerSpec::one_shot(60));
    assert!(sample_pool().iter().any(|item| item.title() == pulse[0].payload.title));
    assert!(h.platform.armed_for("tick").is_empty());

    let stored = h.engine.snapshot().await.unwrap().schedules;
    for identifier in ["pulse", "tick"] {
        assert_eq!(stored.contains_key(identifier), h.platform.is_pending(identifier));
    }
}

#[tokio::test]
async fn test_no_reconciliation_without_permission() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    {
        let mut store = persisted(storage.clone()).await;
        store
            .put("morning", RecurrenceConfig::daily(DailyTime::new(9, 0, 0).unwrap()))
            .await;
    }

    let h = start(
        Arc::new(RecordingPlatform::default()),
        storage,
        PermissionStatus::Denied,
        sample_pool(),
    );
    h.engine.flush().await.unwrap();

    assert!(h.platform.armed().is_empty());
    assert_eq!(h.engine.snapshot().await.unwrap().schedules.len(), 1);
}

#[tokio::test]
async fn test_update_scheduled_time_keeps_content() {
    let mut h = granted(sample_pool());

    h.engine.create_delayed("later", 600);
    h.engine.flush().await.unwrap();
    let original = h.platform.armed_for("later")[0].payload.clone();
    h.platform.clear_armed();
    h.events.drain();

    h.engine
        .update_scheduled_time("later", Utc::now() + Duration::seconds(120), 0);
    h.engine.flush().await.unwrap();

    let armed = h.platform.armed_for("later");
    assert_eq!(armed.len(), 1);
    assert_eq!(armed[0].payload, original);
    match armed[0].trigger {
        TriggerSpec::TimeInterval { seconds, repeats } => {
            assert!(!repeats);
            assert!((118..=120).contains(&seconds), "got {seconds}");
        }
        other => panic!("unexpected trigger {other:?}"),
    }
    assert_eq!(h.events.drain(), vec![NotificationEvent::scheduled("later")]);
}

#[tokio::test]
async fn test_update_scheduled_time_to_interval() {
    let h = granted(sample_pool());

    h.engine.create_one_shot("tick");
    h.engine.flush().await.unwrap();

    h.engine.update_scheduled_time("tick", Utc::now(), 45);
    h.engine.flush().await.unwrap();

    let armed = h.platform.armed_for("tick");
    assert_eq!(armed.last().map(|r| r.trigger), Some(TriggerSpec::every(45)));
    assert_eq!(
        h.engine.snapshot().await.unwrap().schedules.get("tick"),
        Some(&RecurrenceConfig::RepeatingInterval { seconds: 45 })
    );
}

#[tokio::test]
async fn test_update_scheduled_time_without_pending_is_noop() {
    let mut h = granted(sample_pool());

    h.engine
        .update_scheduled_time("ghost", Utc::now() + Duration::seconds(60), 0);
    h.engine.flush().await.unwrap();

    assert!(h.platform.armed().is_empty());
    assert!(h.events.drain().is_empty());
}

#[tokio::test]
async fn test_caller_content_bypasses_pool() {
    let h = granted(Vec::new());
    let custom = ContentItem::new("Custom", "Supplied by the caller");

    h.engine.create_with_content("custom", custom.clone());
    h.engine.create_scheduled_with_content("custom-repeat", custom, Utc::now(), 120);
    h.engine.flush().await.unwrap();

    assert_eq!(h.platform.armed_for("custom")[0].payload.title, "Custom");
    let repeat = &h.platform.armed_for("custom-repeat")[0];
    assert_eq!(repeat.payload.title, "Custom");
    assert_eq!(repeat.trigger, TriggerSpec::every(120));
}

#[tokio::test]
async fn test_attachment_failure_degrades_to_plain_notification() {
    let platform = Arc::new(RecordingPlatform::default());
    let deps = EngineDeps::new(
        platform.clone(),
        Arc::new(FixedPermissions(PermissionStatus::Granted)),
        Arc::new(MemoryKeyValueStore::new()),
    )
    .with_attachments(Arc::new(FileAttachments::default()));
    let content = vec![ContentItem::new("Picture", "With image").with_image("https://cdn.example.com/a.png")];
    let engine = NotificationEngine::initialize(deps, EngineConfig::default(), content);

    let failures_before = ATTACHMENT_FAILURES_TOTAL.get();
    engine.create_one_shot("pic");
    engine.flush().await.unwrap();

    let armed = platform.armed_for("pic");
    assert_eq!(armed.len(), 1);
    assert!(armed[0].payload.attachment.is_none());
    assert!(ATTACHMENT_FAILURES_TOTAL.get() > failures_before);
}

#[tokio::test]
async fn test_listener_receives_events_until_dropped() {
    let h = granted(sample_pool());
    let recorder = Arc::new(RecordingListener::default());
    let listener: Arc<dyn NotificationListener> = recorder.clone();
    h.engine.subscribe(&listener);

    h.engine.create_one_shot("first");
    h.engine.flush().await.unwrap();
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![NotificationEvent::scheduled("first")]
    );

    drop(listener);
    drop(recorder);
    h.engine.create_one_shot("second");
    h.engine.flush().await.unwrap();
}

#[tokio::test]
async fn test_unsubscribed_listener_gets_nothing() {
    let h = granted(sample_pool());
    let recorder = Arc::new(RecordingListener::default());
    let listener: Arc<dyn NotificationListener> = recorder.clone();
    let id = h.engine.subscribe(&listener);

    assert!(h.engine.unsubscribe(id));
    h.engine.create_one_shot("quiet");
    h.engine.flush().await.unwrap();

    assert!(recorder.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_staged_attachments_follow_pending_requests() {
    let scratch = std::env::temp_dir().join(format!("notification-pool-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&scratch).unwrap();
    let image = scratch.join("cat.png");
    std::fs::write(&image, b"png").unwrap();

    let (center, _callbacks) = LocalNotificationCenter::new();
    let deps = EngineDeps::new(
        center.clone(),
        Arc::new(FixedPermissions(PermissionStatus::Granted)),
        Arc::new(MemoryKeyValueStore::new()),
    )
    .with_attachments(Arc::new(FileAttachments::new(scratch.join("staging"))));
    let content = vec![ContentItem::new("Cat", "Look").with_image(format!("file://{}", image.display()))];
    let engine = NotificationEngine::initialize(deps, EngineConfig::default(), content);

    let staged_path = |requests: Vec<NotificationRequest>| {
        requests
            .into_iter()
            .find_map(|r| r.payload.attachment.map(|a| a.local_path))
    };

    engine.create_delayed("cat", 600);
    engine.flush().await.unwrap();
    let staged = staged_path(center.pending_requests().await).expect("attachment staged");
    assert!(staged.exists());

    engine.update_scheduled_time("cat", Utc::now() + Duration::seconds(300), 0);
    engine.flush().await.unwrap();
    assert_eq!(staged_path(center.pending_requests().await), Some(staged.clone()));
    assert!(staged.exists());

    engine.create_delayed("cat", 900);
    engine.flush().await.unwrap();
    assert!(!staged.exists());

    engine.cancel("cat");
    engine.flush().await.unwrap();
    assert_eq!(center.pending_count(), 0);
    assert_eq!(std::fs::read_dir(scratch.join("staging")).unwrap().count(), 0);
    assert!(image.exists());

    let _ = std::fs::remove_dir_all(scratch);
}
