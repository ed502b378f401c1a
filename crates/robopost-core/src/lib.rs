//! # RoboPost Core
//!
//! Core types and error handling for RoboPost.
//! Provides the robot extruder pin state model shared by the settings
//! and G-code processing crates.

pub mod data;
pub mod error;

pub use data::{
    Activity, Direction, PinLevel, PinSignal, PinState, PinTransition, RobotPin, SpeedMode,
};

pub use error::{GcodeError, Result};
