pub mod config;
pub mod identity;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use identity::BotIdentity;
