//! Post-processing plugin settings schema
//!
//! Slicer post-processing hosts describe a script's settings with a JSON
//! document (label, type, default, minimum value and so on for each key).
//! [`plugin_schema`] builds that document for the robot extruder settings so
//! a host can render the settings dialog and hand back a [`RobotSettings`]
//! compatible JSON object.
//!
//! [`RobotSettings`]: crate::RobotSettings

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::config::{DEFAULT_ACV_PIN, DEFAULT_DIR_PIN, DEFAULT_SET_SPEED, DEFAULT_SPD_PIN};
use crate::error::SettingsResult;

/// Value type of a plugin setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    /// Integer
    Int,
    /// Floating point
    Float,
    /// Boolean checkbox
    Bool,
}

/// Description of a single plugin setting
#[derive(Debug, Clone, Serialize)]
pub struct SettingDefinition {
    /// Settings key, also the key in the settings object
    #[serde(skip)]
    pub key: &'static str,
    /// Label shown in the settings dialog
    pub label: &'static str,
    /// Tooltip text
    pub description: &'static str,
    /// Value type
    #[serde(rename = "type")]
    pub value_type: SettingType,
    /// Display unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    /// Smallest accepted value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_value: Option<&'static str>,
    /// Values below this are flagged in the dialog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_value_warning: Option<&'static str>,
    /// Default value
    pub default_value: Value,
    /// Expression deciding whether the setting is editable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<&'static str>,
}

impl SettingDefinition {
    fn new(
        key: &'static str,
        label: &'static str,
        description: &'static str,
        value_type: SettingType,
        default_value: Value,
    ) -> Self {
        Self {
            key,
            label,
            description,
            value_type,
            unit: None,
            minimum_value: None,
            minimum_value_warning: None,
            default_value,
            enabled: None,
        }
    }

    fn with_minimum(mut self, minimum: &'static str) -> Self {
        self.minimum_value = Some(minimum);
        self
    }
}

/// Settings document for the plugin host
#[derive(Debug, Clone, Serialize)]
pub struct PluginSchema {
    /// Display name of the script
    pub name: &'static str,
    /// Unique script key
    pub key: &'static str,
    /// Free-form metadata, empty
    pub metadata: Map<String, Value>,
    /// Schema version understood by the host
    pub version: u32,
    /// Settings in dialog order
    #[serde(serialize_with = "serialize_settings")]
    pub settings: Vec<SettingDefinition>,
}

fn serialize_settings<S>(settings: &[SettingDefinition], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(settings.iter().map(|setting| (setting.key, setting)))
}

impl PluginSchema {
    /// Look up a setting by key
    pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
        self.settings.iter().find(|setting| setting.key == key)
    }

    /// Render the schema as pretty-printed JSON
    pub fn to_json(&self) -> SettingsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build the settings schema for the robot extruder post-processor
pub fn plugin_schema() -> PluginSchema {
    let mut set_speed = SettingDefinition::new(
        "SET_SPEED",
        "Stationary Feed Rate",
        "Feed rate (mm/s) for extruder when robot is stopped. This will determine the time the robot will dwell for when extruding and not moving.",
        SettingType::Float,
        json!(DEFAULT_SET_SPEED),
    )
    .with_minimum("0");
    set_speed.unit = Some("mm/s");
    set_speed.minimum_value_warning = Some("0.1");
    set_speed.enabled = Some("DWELL");

    PluginSchema {
        name: "Print with Robot",
        key: "PrintWithRobot",
        metadata: Map::new(),
        version: 2,
        settings: vec![
            SettingDefinition::new(
                "ACV_pin",
                "On/Off Pin",
                "Digital pin for turning extruder on (high) and off (low).",
                SettingType::Int,
                json!(DEFAULT_ACV_PIN),
            )
            .with_minimum("0"),
            SettingDefinition::new(
                "DIR_pin",
                "Direction Pin",
                "Digital pin for extruding forwards (high) and backwards (low).",
                SettingType::Int,
                json!(DEFAULT_DIR_PIN),
            )
            .with_minimum("0"),
            SettingDefinition::new(
                "SPD_pin",
                "Speed Pin",
                "Digital pin for extruding proportional to robot speed (high) or at set speed (low).",
                SettingType::Int,
                json!(DEFAULT_SPD_PIN),
            )
            .with_minimum("0"),
            SettingDefinition::new(
                "DWELL",
                "Add Dwells",
                "Add a dwell when G0/G1 with E but no X, Y or Z movement. Eg 'G1 E-1.0'",
                SettingType::Bool,
                json!(false),
            ),
            set_speed,
            SettingDefinition::new(
                "DEBUG",
                "Debug Comments",
                "Add comments after every line for debug purposes",
                SettingType::Bool,
                json!(false),
            ),
        ],
    }
}
