//! Robot extruder pin state
//!
//! The robot controller exposes three digital outputs to the extruder:
//! an on/off pin, a direction pin and a speed-mode pin. `PinState` is the
//! last level written to each of them, and the only thing that decides
//! whether a new pin command needs to be emitted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Level of a digital output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinLevel {
    /// Output low (`M63`)
    Low,
    /// Output high (`M62`)
    High,
}

impl PinLevel {
    /// M-code that drives a pin high immediately
    pub const HIGH_MCODE: u8 = 62;
    /// M-code that drives a pin low immediately
    pub const LOW_MCODE: u8 = 63;

    /// The M-code number that sets this level
    pub fn m_code(self) -> u8 {
        match self {
            Self::Low => Self::LOW_MCODE,
            Self::High => Self::HIGH_MCODE,
        }
    }
}

/// Physical output driven by the post-processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotPin {
    /// Extruder on/off
    Active,
    /// Extrude forwards (high) or backwards (low)
    Direction,
    /// Proportional to robot speed (high) or fixed set speed (low)
    Speed,
}

impl RobotPin {
    /// All pins in emission order
    pub const ALL: [RobotPin; 3] = [RobotPin::Active, RobotPin::Direction, RobotPin::Speed];

    /// Label written into the comment of a pin command
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Robot Extruder active",
            Self::Direction => "Robot Extruder direction",
            Self::Speed => "Robot Extruder speed",
        }
    }
}

impl fmt::Display for RobotPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Common behaviour of the three binary pin axes
pub trait PinSignal: Copy + PartialEq {
    /// The pin this signal is written to
    const PIN: RobotPin;

    /// 0 for the low state, 1 for the high state
    fn bit(self) -> u8;

    /// Human readable description of the state
    fn text(self) -> &'static str;

    /// Output level for this state
    fn level(self) -> PinLevel {
        if self.bit() == 0 {
            PinLevel::Low
        } else {
            PinLevel::High
        }
    }
}

/// Extruder on/off state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Activity {
    /// Extruder stopped
    #[default]
    Off,
    /// Extruder running
    On,
}

impl PinSignal for Activity {
    const PIN: RobotPin = RobotPin::Active;

    fn bit(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    fn text(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::On => "On",
        }
    }
}

/// Extrusion direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Retracting
    #[default]
    Backward,
    /// Extruding
    Forward,
}

impl Direction {
    /// Direction implied by the sign of an extrusion distance
    pub fn from_extrusion(e: f64) -> Self {
        if e < 0.0 {
            Self::Backward
        } else {
            Self::Forward
        }
    }
}

impl PinSignal for Direction {
    const PIN: RobotPin = RobotPin::Direction;

    fn bit(self) -> u8 {
        match self {
            Self::Backward => 0,
            Self::Forward => 1,
        }
    }

    fn text(self) -> &'static str {
        match self {
            Self::Backward => "Backward",
            Self::Forward => "Forward",
        }
    }
}

/// Extruder speed source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpeedMode {
    /// Extrude at the configured stationary feed rate
    #[default]
    SetSpeed,
    /// Extrude proportionally to the robot's travel speed
    Proportional,
}

impl PinSignal for SpeedMode {
    const PIN: RobotPin = RobotPin::Speed;

    fn bit(self) -> u8 {
        match self {
            Self::SetSpeed => 0,
            Self::Proportional => 1,
        }
    }

    fn text(self) -> &'static str {
        match self {
            Self::SetSpeed => "Use set speed",
            Self::Proportional => "Proportional to robot speed",
        }
    }
}

/// A single pin write required to move from one state to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinTransition {
    /// Pin to write
    pub pin: RobotPin,
    /// New level of the pin
    pub level: PinLevel,
    /// Description of the new state
    pub text: &'static str,
}

impl PinTransition {
    fn of<S: PinSignal>(signal: S) -> Self {
        Self {
            pin: S::PIN,
            level: signal.level(),
            text: signal.text(),
        }
    }
}

/// Persisted state of the three extruder pins
///
/// Starts with every pin low. Only changes through [`PinState::apply`], which
/// keeps the recorded state in step with the pin commands that were emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PinState {
    /// On/off pin
    pub activity: Activity,
    /// Direction pin
    pub direction: Direction,
    /// Speed mode pin
    pub speed: SpeedMode,
}

impl PinState {
    /// Create a state with every pin low
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin writes needed to reach `desired`, in activity, direction, speed order
    pub fn transitions_to(&self, desired: &PinState) -> Vec<PinTransition> {
        let mut transitions = Vec::with_capacity(3);
        if self.activity != desired.activity {
            transitions.push(PinTransition::of(desired.activity));
        }
        if self.direction != desired.direction {
            transitions.push(PinTransition::of(desired.direction));
        }
        if self.speed != desired.speed {
            transitions.push(PinTransition::of(desired.speed));
        }
        transitions
    }

    /// Move to `desired`, returning the pin writes that were required
    pub fn apply(&mut self, desired: PinState) -> Vec<PinTransition> {
        let transitions = self.transitions_to(&desired);
        *self = desired;
        transitions
    }
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ACV_state: {}, DIR_state: {}, SPD_state: {}",
            self.activity.bit(),
            self.direction.bit(),
            self.speed.bit()
        )
    }
}
