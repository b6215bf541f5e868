//! Configuration management for RenderForge.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only the changed section is modified)
//! - Environment overrides for the store URL and service key
//!
//! # Example
//!
//! ```no_run
//! use rf_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new(".config/renderforge.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Output folder: {}", config.settings().paths.output_folder);
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EngineSettings, LoggingSettings, PathSettings, RenderSettings, Settings,
    StoreSettings, SERVICE_KEY_ENV, STORE_URL_ENV,
};
