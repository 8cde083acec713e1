//! Configuration module

pub mod loader;

pub use loader::{
    load_config, AlertsSection, ConfigError, KeeperConfig, LoggingSection, ServiceSection,
    StorageSection, SweepSection, TelegramSection,
};
