//! Android project generation and build for the Obsidian builder
//!
//! This crate turns a [`BuildRequest`] into an installable debug APK:
//! - Input normalization and derived names
//! - Escaping for every syntax user input lands in
//! - Template rendering and project scaffolding
//! - Gradle bootstrap (managed install, system PATH, or download)
//! - Build orchestration and the stage pipeline

#![warn(missing_docs)]

pub mod bootstrap;
pub mod build;
pub mod error;
pub mod escape;
pub mod pipeline;
pub mod request;
pub mod scaffold;
pub mod templates;

pub use bootstrap::{BuildToolInstallation, GradleBootstrapper, ToolProvider, ToolSource};
pub use build::{BuildOrchestrator, BuildResult};
pub use error::{BootstrapError, BuildError};
pub use pipeline::{Pipeline, PipelineOutcome, Stage};
pub use request::BuildRequest;
pub use scaffold::{ProjectFile, ProjectTree, ScaffoldedProject, Scaffolder};
