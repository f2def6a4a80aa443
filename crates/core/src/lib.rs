//! Core utilities for the Obsidian WebView APK builder
//!
//! This crate provides shared functionality used by every other crate:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: one TOML-backed value object describing a run
//! - **Process execution**: structured command results, streaming with capture
//! - **Health checks**: read-only probes of the build environment
//!
//! # Example
//!
//! ```rust,no_run
//! use obsidian_core::{config::Config, health::HealthChecker};
//!
//! let config = Config::load(None).expect("invalid configuration");
//! let report = HealthChecker::new()
//!     .with_builder_checks(&config.schema)
//!     .run();
//!
//! if !report.is_healthy() {
//!     eprintln!("Environment issues detected!");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod health;
pub mod process;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{BuilderConfig, Config};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::health::{HealthChecker, HealthReport, HealthStatus};
    pub use crate::process::{CommandResult, CommandRunner, SystemRunner};
}
