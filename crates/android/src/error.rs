//! Error types for bootstrapping the build tool and running the build

use obsidian_core::error::{Error, ErrorCode};
use obsidian_core::process::CommandResult;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while locating or installing Gradle
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// HTTP request could not be completed
    #[error("Download of {url} failed: {source}")]
    Download {
        /// Requested URL
        url: String,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Download of {url} failed with HTTP {status}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Status code
        status: u16,
    },

    /// No usable expected digest
    #[error("Checksum for {url} unavailable: {reason}")]
    ChecksumUnavailable {
        /// Checksum URL or archive URL
        url: String,
        /// What went wrong
        reason: String,
    },

    /// Archive digest differs from the expected one
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Published digest
        expected: String,
        /// Digest of the downloaded bytes
        actual: String,
    },

    /// Archive could not be read
    #[error("Invalid distribution archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Archive entry would escape the install directory
    #[error("Archive entry '{0}' escapes the install directory")]
    UnsafeEntry(String),

    /// Unpacked distribution has no launcher
    #[error("Gradle executable not found at {0}")]
    MissingExecutable(PathBuf),

    /// Filesystem failure
    #[error("{action} {path}: {source}")]
    Io {
        /// What was attempted
        action: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl BootstrapError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

impl From<BootstrapError> for Error {
    fn from(err: BootstrapError) -> Self {
        let (code, suggestion) = match &err {
            BootstrapError::Download { .. } | BootstrapError::HttpStatus { .. } => (
                ErrorCode::DownloadFailed,
                "Check your network connection, or install Gradle 7.x and put it on PATH",
            ),
            BootstrapError::ChecksumUnavailable { .. } => (
                ErrorCode::DownloadFailed,
                "Set gradle.sha256 in obsidian.toml, or gradle.verify_checksum = false to skip",
            ),
            BootstrapError::ChecksumMismatch { .. } => (
                ErrorCode::ChecksumMismatch,
                "The download was corrupted or tampered with; run again or check gradle.sha256",
            ),
            BootstrapError::Archive(_) | BootstrapError::UnsafeEntry(_) => (
                ErrorCode::ArchiveError,
                "Delete the tools directory and run again",
            ),
            BootstrapError::MissingExecutable(_) => (
                ErrorCode::BuildToolMissing,
                "Delete the tools directory and run again",
            ),
            BootstrapError::Io { .. } => (
                ErrorCode::IoError,
                "Make sure paths.tools_dir is writable",
            ),
        };
        let message = err.to_string();
        Error::new(code, message)
            .with_suggestion(suggestion)
            .with_source(err)
    }
}

/// Failures of the build step
#[derive(Debug, Error)]
pub enum BuildError {
    /// Gradle exited non-zero
    #[error("Gradle exited with status {}", .result.exit_code)]
    ToolFailed {
        /// Captured output
        result: CommandResult,
        /// Preserved project directory
        project_dir: PathBuf,
    },

    /// Gradle reported success but produced no package
    #[error("Gradle succeeded but {} was not produced", .expected.display())]
    MissingArtifact {
        /// Where the package should have been
        expected: PathBuf,
        /// Preserved project directory
        project_dir: PathBuf,
    },

    /// Delivering the package would place it inside the project that is removed afterwards
    #[error(
        "Output directory {} lies inside the project directory {}",
        .output_dir.display(),
        .project_dir.display()
    )]
    OutputInsideProject {
        /// Configured output directory
        output_dir: PathBuf,
        /// Project directory being built
        project_dir: PathBuf,
    },

    /// Moving the package or cleaning up failed
    #[error("{action} {path}: {source}")]
    Io {
        /// What was attempted
        action: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Project directory kept for inspection, if any
    pub fn preserved_dir(&self) -> Option<&PathBuf> {
        match self {
            BuildError::ToolFailed { project_dir, .. }
            | BuildError::MissingArtifact { project_dir, .. } => Some(project_dir),
            BuildError::OutputInsideProject { .. } | BuildError::Io { .. } => None,
        }
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        let mut out = match &err {
            BuildError::ToolFailed { result, .. } => {
                Error::new(ErrorCode::BuildFailed, err.to_string())
                    .with_context(format!("Last output lines:\n{}", result.tail(15)))
                    .with_suggestion(
                        "Scroll up for the Gradle error; check JAVA_HOME and the Android SDK path",
                    )
            }
            BuildError::MissingArtifact { .. } => {
                Error::new(ErrorCode::ArtifactMissing, err.to_string())
                    .with_suggestion("Check build.task and build.artifact_path in obsidian.toml")
            }
            BuildError::OutputInsideProject { .. } => {
                Error::new(ErrorCode::InvalidPath, err.to_string())
                    .with_suggestion("Point paths.output_dir outside paths.build_dir")
            }
            BuildError::Io { .. } => Error::new(ErrorCode::IoError, err.to_string())
                .with_suggestion("Make sure paths.output_dir exists and is writable"),
        };
        if let Some(dir) = err.preserved_dir() {
            let note = format!("Project kept at {}", dir.display());
            out.context = Some(match out.context.take() {
                Some(ctx) => format!("{}\n{}", note, ctx),
                None => note,
            });
        }
        out.with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_mismatch_code() {
        let err: Error = BootstrapError::ChecksumMismatch {
            expected: "aa".into(),
            actual: "bb".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ChecksumMismatch);
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_tool_failed_keeps_tail_and_dir() {
        let err: Error = BuildError::ToolFailed {
            result: CommandResult::new(1, "", "FAILURE: Build failed with an exception."),
            project_dir: PathBuf::from("temp_build"),
        }
        .into();
        assert_eq!(err.code, ErrorCode::BuildFailed);
        let ctx = err.context.unwrap();
        assert!(ctx.contains("Project kept at temp_build"));
        assert!(ctx.contains("FAILURE: Build failed"));
    }

    #[test]
    fn test_missing_artifact_code() {
        let err: Error = BuildError::MissingArtifact {
            expected: PathBuf::from("app-debug.apk"),
            project_dir: PathBuf::from("temp_build"),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ArtifactMissing);
    }
}
