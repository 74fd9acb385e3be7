use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::signal;

use notification_pool::config::Settings;
use notification_pool::content::ContentItem;
use notification_pool::engine::{EngineConfig, EngineDeps, NotificationEngine};
use notification_pool::metrics::encode_metrics;
use notification_pool::platform::{FileAttachments, LocalNotificationCenter, SimulatedPermissions};
use notification_pool::storage::create_key_value_store;
use notification_pool::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!(backend = %settings.storage.backend, "Configuration loaded");

    let storage = create_key_value_store(&settings.storage);
    let (center, platform_events) = LocalNotificationCenter::new();
    let permissions = Arc::new(SimulatedPermissions::new(settings.simulator.grant_permission));
    let attachments = Arc::new(FileAttachments::new(
        Path::new(&settings.storage.path).join("attachments"),
    ));

    let content = match &settings.content.pool_path {
        Some(path) => load_content_pool(path).await?,
        None => default_content_pool(),
    };

    let deps = EngineDeps::new(center.clone(), permissions, storage).with_attachments(attachments);
    let engine = NotificationEngine::initialize(deps, EngineConfig::from(&settings.engine), content);
    let forwarder = engine.attach_platform_events(platform_events);

    let mut events = engine.subscribe_stream();
    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => tracing::info!(event = %json, "Lifecycle event"),
                Err(e) => tracing::warn!(error = %e, "Failed to encode lifecycle event"),
            }
        }
    });

    let interval = settings.simulator.demo_interval_seconds;
    if interval > 0 {
        engine.create_one_shot("welcome");
        engine.create_repeating("pulse", Utc::now(), interval as i64);
        tracing::info!(interval_seconds = interval, "Demo notifications requested");
    }

    shutdown_signal().await;

    if let Err(e) = engine.flush().await {
        tracing::warn!(error = %e, "Engine did not drain before shutdown");
    }
    let snapshot = engine.snapshot().await?;
    tracing::info!(
        pool_size = snapshot.pool_size,
        schedules = snapshot.schedules.len(),
        pending = center.pending_count(),
        badge = center.badge_count(),
        "Engine state at shutdown"
    );
    match encode_metrics() {
        Ok(text) => tracing::debug!(metrics = %text, "Final metrics"),
        Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
    }

    forwarder.abort();
    event_log.abort();
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn load_content_pool(path: &str) -> Result<Vec<ContentItem>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading content pool {}", path))?;
    let values: Vec<serde_json::Value> =
        serde_json::from_str(&raw).with_context(|| format!("parsing content pool {}", path))?;

    let items = ContentItem::parse_pool(&values);
    tracing::info!(path = %path, items = items.len(), "Content pool loaded");
    Ok(items)
}

fn default_content_pool() -> Vec<ContentItem> {
    vec![
        ContentItem::new("Good morning", "A fresh day, a fresh start."),
        ContentItem::new("Take a break", "Stand up and stretch for a minute."),
        ContentItem::new("Stay hydrated", "Time for a glass of water."),
    ]
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received terminate signal, shutting down"),
    }
}
