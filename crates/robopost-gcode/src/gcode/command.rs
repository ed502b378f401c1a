//! Commands inserted into the G-code stream
//!
//! Every inserted command is a complete line ending in `\n`. The exact text
//! is significant: robot controllers and downstream tooling match on it.

use std::fmt;

use robopost_core::{PinLevel, PinState, PinTransition, RobotPin};
use robopost_settings::PostProcessConfig;

/// Immediate digital output write (`M62`/`M63`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinCommand {
    /// Controller pin number
    pub pin_number: u32,
    /// The state change being written
    pub transition: PinTransition,
}

impl PinCommand {
    /// Create a pin command for a transition on the given pin number
    pub fn new(pin_number: u32, transition: PinTransition) -> Self {
        Self {
            pin_number,
            transition,
        }
    }
}

impl fmt::Display for PinCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "M{} P{} ;{}: {}",
            self.transition.level.m_code(),
            self.pin_number,
            self.transition.pin.label(),
            self.transition.text
        )
    }
}

/// Timed pause while the extruder runs at its set speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellCommand {
    /// Pause length in seconds
    pub seconds: f64,
}

impl DwellCommand {
    /// Create a dwell of the given length
    pub fn new(seconds: f64) -> Self {
        Self { seconds }
    }
}

impl fmt::Display for DwellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "G4 P{:.5} ;Robot Dwell", self.seconds)
    }
}

/// Per-line debug comment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugComment {
    /// Pin state after the line was processed
    pub state: PinState,
    /// Extrusion distance parsed from the line, `None` without an `E` word
    pub extrusion: Option<f64>,
    /// Dwell time computed for the line, whether or not it was emitted
    pub dwell_seconds: Option<f64>,
}

impl fmt::Display for DebugComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            ";{}, E_value: {}, Dwell_time: {}",
            self.state,
            format_optional(self.extrusion),
            format_optional(self.dwell_seconds)
        )
    }
}

/// Format a float the shortest way that round-trips
///
/// Whole numbers keep a trailing `.0`. Magnitudes below 1e-4 or from 1e16 up
/// use scientific notation with a signed exponent of at least two digits
/// (`6.666666666666667e-06`, `1e+16`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{value:e}");
        return match scientific.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => scientific,
        };
    }

    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Debug value that was never computed for the line prints as a bare `0`
fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "0".to_string(), format_float)
}

fn format_flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn all_pins_off(config: &PostProcessConfig) -> String {
    let writes: Vec<String> = RobotPin::ALL
        .iter()
        .map(|&pin| format!("M{} P{}", PinLevel::Low.m_code(), config.pin(pin)))
        .collect();
    format!("{} ;Turn all Robot pins off\n", writes.join(" "))
}

/// Header placed before the first layer
///
/// Summarizes the configuration and drives every pin low.
pub fn header(config: &PostProcessConfig) -> String {
    format!(
        ";Using Print with Robot post processing script:\n\
         ;  On/Off Pin: {}\n\
         ;  Direction Pin: {}\n\
         ;  Speed Pin: {}\n\
         ;  Add Dwell: {}\n\
         ;  Stationary Feed Rate: {}\n\
         ;  Debug Comments: {}\n\
         {}",
        config.pin(RobotPin::Active),
        config.pin(RobotPin::Direction),
        config.pin(RobotPin::Speed),
        format_flag(config.dwell_enabled()),
        format_float(config.set_speed()),
        format_flag(config.debug_enabled()),
        all_pins_off(config)
    )
}

/// Footer appended to the last layer, driving every pin low
pub fn footer(config: &PostProcessConfig) -> String {
    format!("\n{}", all_pins_off(config))
}
