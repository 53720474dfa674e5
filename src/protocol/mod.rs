//! Protocol definitions for the LED controller.
//!
//! This module contains the wire-level pieces:
//! - Command types and their line encoding
//! - Parsing of user command text
//! - Reassembly of inbound device lines

pub mod command;
pub mod line;
pub mod parser;

pub use command::{Command, LINE_TERMINATOR, PRESETS};
pub use line::{DIAGNOSTIC_MARKER, LineDecoder, is_diagnostic};
pub use parser::parse;
