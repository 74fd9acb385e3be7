mod settings;

pub use settings::{
    ContentConfig, EngineSettings, OtelConfig, Settings, SimulatorConfig, StorageConfig,
};
