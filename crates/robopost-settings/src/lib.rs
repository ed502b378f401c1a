//! RoboPost Settings Crate
//!
//! Handles the post-processor configuration: loading it from JSON or TOML,
//! applying the recovery rules for missing or out-of-range values, and
//! describing the settings to a slicer's post-processing plugin host.

pub mod config;
pub mod error;
pub mod schema;

pub use config::{default_config_path, PostProcessConfig, RobotSettings};
pub use error::{ConfigError, SettingsError, SettingsResult};
pub use schema::{plugin_schema, PluginSchema, SettingDefinition, SettingType};
