//! CLI utilities for the Obsidian builder
//!
//! Provides shared CLI functionality:
//! - Terminal output formatting
//! - Progress indicators
//! - Interactive prompts

#![warn(missing_docs)]

pub mod output;
pub mod progress;
pub mod prompt;

pub use output::Status;
pub use prompt::{BuildInputs, Prompter};
