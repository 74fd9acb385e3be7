use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub otel: OtelConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Delay in seconds used by one-shot notifications
    #[serde(default = "default_one_shot_delay")]
    pub one_shot_delay_seconds: u64,
    /// Lower bound for any computed trigger delay
    #[serde(default = "default_min_delay")]
    pub min_delay_seconds: u64,
    /// Storage key holding all persisted schedules
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_true")]
    pub request_alert: bool,
    #[serde(default = "default_true")]
    pub request_badge: bool,
    #[serde(default = "default_true")]
    pub request_sound: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend type: "memory", "file" or "redis"
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Directory used by the file backend
    #[serde(default = "default_storage_path")]
    pub path: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentConfig {
    /// JSON file with an array of `{title, body, image?}` objects
    pub pool_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
    /// Emit log lines as JSON objects
    #[serde(default)]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    /// Outcome of the simulated authorization prompt
    #[serde(default = "default_true")]
    pub grant_permission: bool,
    /// Interval of the demo repeating notification (0 disables it)
    #[serde(default)]
    pub demo_interval_seconds: u64,
}

fn default_one_shot_delay() -> u64 {
    1
}

fn default_min_delay() -> u64 {
    1
}

fn default_storage_key() -> String {
    "notification_with_pool_daily_schedule_times".to_string()
}

fn default_true() -> bool {
    true
}

fn default_storage_backend() -> String {
    "file".to_string()
}

fn default_storage_path() -> String {
    ".notification-pool".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_prefix() -> String {
    "notification_pool".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "notification-pool".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("engine.one_shot_delay_seconds", 1)?
            .set_default("engine.min_delay_seconds", 1)?
            .set_default("storage.backend", "file")?
            .set_default("storage.path", ".notification-pool")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // NOTIFICATION_POOL__STORAGE__BACKEND=redis, NOTIFICATION_POOL__OTEL__ENABLED=true, ...
            .add_source(
                Environment::with_prefix("NOTIFICATION_POOL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            one_shot_delay_seconds: default_one_shot_delay(),
            min_delay_seconds: default_min_delay(),
            storage_key: default_storage_key(),
            request_alert: true,
            request_badge: true,
            request_sound: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
            redis_url: default_redis_url(),
            redis_prefix: default_redis_prefix(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
            json_logs: false,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            grant_permission: true,
            demo_interval_seconds: 0,
        }
    }
}
