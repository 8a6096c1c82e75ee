//! Where finished reports go.
//!
//! This module handles:
//! - Colored console output
//! - Numbered text result files

pub mod console;
pub mod results;

pub use console::ConsoleOutput;
pub use results::{reports_json, ResultWriter};
