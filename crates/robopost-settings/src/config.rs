//! Configuration for the robot extruder post-processor
//!
//! Two layers:
//! - [`RobotSettings`] is what a user or plugin host supplies. Every value may
//!   be missing or out of range.
//! - [`PostProcessConfig`] is the validated, immutable configuration the
//!   G-code transform consumes. It is produced by [`RobotSettings::resolve`],
//!   which substitutes defaults instead of failing.
//!
//! Settings files are JSON or TOML, chosen by file extension. Keys may use the
//! plugin host spelling (`ACV_pin`, `SET_SPEED`, ...) or snake case.

use robopost_core::RobotPin;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, SettingsError, SettingsResult};

/// Default on/off pin
pub const DEFAULT_ACV_PIN: u32 = 0;
/// Default direction pin
pub const DEFAULT_DIR_PIN: u32 = 1;
/// Default speed pin
pub const DEFAULT_SPD_PIN: u32 = 2;
/// Default stationary feed rate in mm/s
pub const DEFAULT_SET_SPEED: f64 = 15.0;

/// User supplied post-processor settings
///
/// A pin key left out of a settings file is unset, the same as an explicit
/// `null`. Only [`RobotSettings::default`] fills in the canonical pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotSettings {
    /// Digital pin turning the extruder on (high) and off (low)
    #[serde(default, alias = "ACV_pin", skip_serializing_if = "Option::is_none")]
    pub acv_pin: Option<i64>,
    /// Digital pin for extruding forwards (high) and backwards (low)
    #[serde(default, alias = "DIR_pin", skip_serializing_if = "Option::is_none")]
    pub dir_pin: Option<i64>,
    /// Digital pin for extruding proportional to robot speed (high) or at set speed (low)
    #[serde(default, alias = "SPD_pin", skip_serializing_if = "Option::is_none")]
    pub spd_pin: Option<i64>,
    /// Add a dwell when extruding without moving
    #[serde(alias = "DWELL")]
    pub dwell: bool,
    /// Extruder feed rate (mm/s) while the robot is stopped
    #[serde(alias = "SET_SPEED")]
    pub set_speed: f64,
    /// Add a debug comment after every motion line
    #[serde(alias = "DEBUG")]
    pub debug: bool,
}

impl Default for RobotSettings {
    fn default() -> Self {
        Self {
            acv_pin: Some(DEFAULT_ACV_PIN as i64),
            dir_pin: Some(DEFAULT_DIR_PIN as i64),
            spd_pin: Some(DEFAULT_SPD_PIN as i64),
            dwell: false,
            set_speed: DEFAULT_SET_SPEED,
            debug: false,
        }
    }
}

impl RobotSettings {
    /// Create settings with every value at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        tracing::debug!("Loaded robot settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Apply the recovery rules and produce the configuration used for processing
    ///
    /// - If any pin is missing or negative, all three fall back to 0, 1 and 2.
    /// - A stationary feed rate that is not a positive number becomes 15.0.
    pub fn resolve(&self) -> PostProcessConfig {
        let pins = [self.acv_pin, self.dir_pin, self.spd_pin]
            .map(|pin| pin.and_then(|value| u32::try_from(value).ok()));

        let (acv_pin, dir_pin, spd_pin) = match pins {
            [Some(acv), Some(dir), Some(spd)] => (acv, dir, spd),
            _ => {
                tracing::warn!(
                    "Robot pins incomplete or invalid ({:?}, {:?}, {:?}), using defaults {}, {}, {}",
                    self.acv_pin,
                    self.dir_pin,
                    self.spd_pin,
                    DEFAULT_ACV_PIN,
                    DEFAULT_DIR_PIN,
                    DEFAULT_SPD_PIN
                );
                (DEFAULT_ACV_PIN, DEFAULT_DIR_PIN, DEFAULT_SPD_PIN)
            }
        };

        PostProcessConfig {
            acv_pin,
            dir_pin,
            spd_pin,
            dwell: self.dwell,
            set_speed: sanitize_set_speed(self.set_speed),
            debug: self.debug,
        }
    }
}

fn sanitize_set_speed(set_speed: f64) -> f64 {
    if set_speed.is_finite() && set_speed > 0.0 {
        set_speed
    } else {
        tracing::warn!(
            "Stationary feed rate {} is not positive, using {}",
            set_speed,
            DEFAULT_SET_SPEED
        );
        DEFAULT_SET_SPEED
    }
}

/// Validated configuration for one transform run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostProcessConfig {
    acv_pin: u32,
    dir_pin: u32,
    spd_pin: u32,
    dwell: bool,
    set_speed: f64,
    debug: bool,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        RobotSettings::default().resolve()
    }
}

impl PostProcessConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the three pin numbers (on/off, direction, speed)
    pub fn with_pins(mut self, acv_pin: u32, dir_pin: u32, spd_pin: u32) -> Self {
        self.acv_pin = acv_pin;
        self.dir_pin = dir_pin;
        self.spd_pin = spd_pin;
        self
    }

    /// Enable or disable dwell insertion
    pub fn with_dwell(mut self, dwell: bool) -> Self {
        self.dwell = dwell;
        self
    }

    /// Set the stationary feed rate, falling back to the default when not positive
    pub fn with_set_speed(mut self, set_speed: f64) -> Self {
        self.set_speed = sanitize_set_speed(set_speed);
        self
    }

    /// Enable or disable debug comments
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Pin number wired to the given output
    pub fn pin(&self, pin: RobotPin) -> u32 {
        match pin {
            RobotPin::Active => self.acv_pin,
            RobotPin::Direction => self.dir_pin,
            RobotPin::Speed => self.spd_pin,
        }
    }

    /// Whether dwells are inserted for stationary extrusion
    pub fn dwell_enabled(&self) -> bool {
        self.dwell
    }

    /// Extruder feed rate (mm/s) while the robot is stopped
    pub fn set_speed(&self) -> f64 {
        self.set_speed
    }

    /// Whether debug comments are appended
    pub fn debug_enabled(&self) -> bool {
        self.debug
    }
}

impl From<&RobotSettings> for PostProcessConfig {
    fn from(settings: &RobotSettings) -> Self {
        settings.resolve()
    }
}

/// Default location of the settings file
///
/// `<config dir>/robopost/config.toml`, or `None` on platforms without a
/// config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("robopost").join("config.toml"))
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into()),
        }
    }
}
