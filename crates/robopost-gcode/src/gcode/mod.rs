//! G-Code post-processing
//!
//! This module provides:
//! - Line tokenizing and motion classification
//! - Pin, dwell and debug command formatting
//! - Pin state transition emission
//! - Whole-document driving with header and footer
//! - Splitting documents into layers

pub mod command;
pub mod driver;
pub mod emitter;
pub mod layers;
pub mod parser;
