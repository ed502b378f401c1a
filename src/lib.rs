//! # RoboPost
//!
//! A G-code post-processor for printing with a robot arm. Slicer output is
//! rewritten so that the robot's digital outputs follow the extruder:
//! - On/off, direction and speed-mode pins switched with `M62`/`M63`
//! - Optional dwells while extruding without moving
//! - Optional per-line debug comments
//!
//! ## Architecture
//!
//! RoboPost is organized as a workspace with multiple crates:
//!
//! 1. **robopost-core** - Pin state model and error types
//! 2. **robopost-settings** - Configuration loading, recovery rules, plugin schema
//! 3. **robopost-gcode** - Line classification, state transitions, document driver
//! 4. **robopost** - Command-line binary that integrates all crates

pub mod cli;

pub use robopost_core::{
    Activity, Direction, GcodeError, PinLevel, PinState, Result, RobotPin, SpeedMode,
};

pub use robopost_gcode::{
    join_layers, split_layers, transform, LineClass, LineClassifier, SequenceDriver,
    StateTransitionEmitter, TransformStats,
};

pub use robopost_settings::{
    default_config_path, plugin_schema, PostProcessConfig, RobotSettings, SettingsError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging on stderr with:
/// - RUST_LOG environment variable support (default level INFO)
/// - Human readable output, or one JSON object per event when `json` is set
///
/// Stdout is left free for processed G-code.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
