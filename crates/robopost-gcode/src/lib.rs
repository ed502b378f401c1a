//! # RoboPost G-code
//!
//! Single-pass G-code post-processing for robot-mounted extruders.
//! Classifies motion lines, tracks the extruder pin state across the whole
//! document and inserts pin and dwell commands where the state changes.

pub mod gcode;

pub use gcode::{
    command::{footer, header, DebugComment, DwellCommand, PinCommand},
    driver::{transform, SequenceDriver},
    emitter::{Annotation, MotionPlan, StateTransitionEmitter, TransformStats},
    layers::{join_layers, split_layers, LAYER_MARKER},
    parser::{tokenize, LineClass, LineClassifier, MotionLine, ParameterError, Token},
};
