//! Data models for RoboPost
//!
//! Contains the persisted robot extruder pin state and the value types
//! describing each digital output.

pub mod pins;

pub use pins::{
    Activity, Direction, PinLevel, PinSignal, PinState, PinTransition, RobotPin, SpeedMode,
};
