//! Build orchestration
//!
//! Runs the Gradle task in the scaffolded project, then moves the debug APK
//! to the output directory and removes the project. On any failure the
//! project is left in place for inspection.

use crate::bootstrap::BuildToolInstallation;
use crate::error::BuildError;
use obsidian_core::config::{path_within, BuilderConfig};
use obsidian_core::error::Result;
use obsidian_core::process::{CommandResult, CommandRunner};
use std::fs;
use std::path::{Path, PathBuf};

/// A finished build
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Final location of the package
    pub apk: PathBuf,
    /// Package size in bytes
    pub size_bytes: u64,
    /// Captured tool output
    pub output: CommandResult,
    /// Project directory, when kept by configuration
    pub kept_project: Option<PathBuf>,
}

/// Runs Gradle through a [`CommandRunner`]
pub struct BuildOrchestrator<'a, R: CommandRunner> {
    config: &'a BuilderConfig,
    runner: R,
}

impl<'a, R: CommandRunner> BuildOrchestrator<'a, R> {
    /// Orchestrator using `runner` for the tool invocation
    pub fn new(config: &'a BuilderConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Arguments after the executable: task then flags
    pub fn arguments(&self) -> Vec<&str> {
        std::iter::once(self.config.build.task.as_str())
            .chain(self.config.build.flags.iter().map(String::as_str))
            .collect()
    }

    /// Where the tool leaves the package inside `project_dir`
    pub fn artifact_in(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.config.build.artifact_path)
    }

    /// Build `project_dir` and deliver the package as `apk_file_name`
    pub fn build(
        &self,
        tool: &BuildToolInstallation,
        project_dir: &Path,
        apk_file_name: &str,
    ) -> Result<BuildResult> {
        let output_dir = &self.config.paths.output_dir;
        if path_within(output_dir, project_dir) {
            return Err(BuildError::OutputInsideProject {
                output_dir: output_dir.clone(),
                project_dir: project_dir.to_path_buf(),
            }
            .into());
        }

        let args = self.arguments();
        tracing::info!(
            tool = %tool.executable.display(),
            args = ?args,
            dir = %project_dir.display(),
            "Running build"
        );

        let output = self.runner.run(&tool.executable, &args, project_dir)?;
        if !output.success {
            tracing::error!(exit_code = output.exit_code, "Build tool failed");
            return Err(BuildError::ToolFailed {
                result: output,
                project_dir: project_dir.to_path_buf(),
            }
            .into());
        }

        let artifact = self.artifact_in(project_dir);
        if !artifact.is_file() {
            tracing::error!(expected = %artifact.display(), "Build succeeded without a package");
            return Err(BuildError::MissingArtifact {
                expected: artifact,
                project_dir: project_dir.to_path_buf(),
            }
            .into());
        }

        fs::create_dir_all(output_dir).map_err(io_err("Creating", output_dir))?;
        let dest = output_dir.join(apk_file_name);
        move_file(&artifact, &dest)?;
        let size_bytes = fs::metadata(&dest).map(|m| m.len()).unwrap_or(0);
        tracing::info!(apk = %dest.display(), size_bytes, "Package delivered");

        let kept_project = if self.config.build.keep_build_dir {
            Some(project_dir.to_path_buf())
        } else {
            fs::remove_dir_all(project_dir).map_err(io_err("Removing", project_dir))?;
            tracing::debug!(dir = %project_dir.display(), "Project directory removed");
            None
        };

        Ok(BuildResult {
            apk: dest,
            size_bytes,
            output,
            kept_project,
        })
    }
}

/// Move `from` to `to`, replacing `to`; copies across filesystems
fn move_file(from: &Path, to: &Path) -> std::result::Result<(), BuildError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    let partial = to.with_extension("apk.part");
    fs::copy(from, &partial).map_err(io_err("Copying package to", &partial))?;
    fs::rename(&partial, to).map_err(io_err("Replacing", to))?;
    fs::remove_file(from).map_err(io_err("Removing", from))?;
    Ok(())
}

fn io_err(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> BuildError {
    let path = path.to_path_buf();
    move |source| BuildError::Io {
        action,
        path,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::ToolSource;
    use obsidian_core::error::ErrorCode;
    use std::cell::RefCell;

    /// Records invocations and optionally drops an APK where Gradle would
    struct FakeGradle {
        exit_code: i32,
        produce_apk: bool,
        calls: RefCell<Vec<(PathBuf, Vec<String>, PathBuf)>>,
    }

    impl FakeGradle {
        fn new(exit_code: i32, produce_apk: bool) -> Self {
            Self {
                exit_code,
                produce_apk,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for FakeGradle {
        fn run(&self, program: &Path, args: &[&str], dir: &Path) -> Result<CommandResult> {
            self.calls.borrow_mut().push((
                program.to_path_buf(),
                args.iter().map(|s| s.to_string()).collect(),
                dir.to_path_buf(),
            ));
            if self.produce_apk {
                let apk = dir.join("app/build/outputs/apk/debug/app-debug.apk");
                fs::create_dir_all(apk.parent().unwrap()).unwrap();
                fs::write(&apk, b"PK\x03\x04apk").unwrap();
            }
            let stderr = if self.exit_code == 0 { "" } else { "BUILD FAILED" };
            Ok(CommandResult::new(self.exit_code, "BUILD", stderr))
        }
    }

    fn tool() -> BuildToolInstallation {
        BuildToolInstallation {
            executable: PathBuf::from("/opt/gradle/bin/gradle"),
            version: "7.6.4".to_string(),
            source: ToolSource::System,
        }
    }

    fn setup(dir: &Path) -> BuilderConfig {
        let mut config = BuilderConfig::default();
        config.paths.build_dir = dir.join("temp_build");
        config.paths.output_dir = dir.join("out");
        fs::create_dir_all(&config.paths.build_dir).unwrap();
        config
    }

    #[test]
    fn test_success_moves_apk_and_removes_project() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        let fake = FakeGradle::new(0, true);
        let orchestrator = BuildOrchestrator::new(&config, &fake);

        let result = orchestrator
            .build(&tool(), &config.paths.build_dir, "My_App.apk")
            .unwrap();

        assert_eq!(result.apk, dir.path().join("out/My_App.apk"));
        assert_eq!(fs::read(&result.apk).unwrap(), b"PK\x03\x04apk");
        assert_eq!(result.size_bytes, 7);
        assert!(!config.paths.build_dir.exists());
        assert!(result.kept_project.is_none());

        let calls = fake.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, PathBuf::from("/opt/gradle/bin/gradle"));
        assert_eq!(calls[0].1, vec!["assembleDebug", "--no-daemon", "--stacktrace"]);
        assert_eq!(calls[0].2, config.paths.build_dir);
    }

    #[test]
    fn test_failure_preserves_project_and_moves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        let fake = FakeGradle::new(1, false);
        let orchestrator = BuildOrchestrator::new(&config, &fake);

        let err = orchestrator
            .build(&tool(), &config.paths.build_dir, "My_App.apk")
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::BuildFailed);
        assert!(err.context.unwrap().contains("BUILD FAILED"));
        assert!(config.paths.build_dir.exists());
        assert!(!dir.path().join("out/My_App.apk").exists());
    }

    #[test]
    fn test_zero_exit_without_apk_is_inconsistency() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        let fake = FakeGradle::new(0, false);
        let orchestrator = BuildOrchestrator::new(&config, &fake);

        let err = orchestrator
            .build(&tool(), &config.paths.build_dir, "x.apk")
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ArtifactMissing);
        assert!(config.paths.build_dir.exists());
    }

    #[test]
    fn test_keep_build_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = setup(dir.path());
        config.build.keep_build_dir = true;
        let fake = FakeGradle::new(0, true);

        let result = BuildOrchestrator::new(&config, &fake)
            .build(&tool(), &config.paths.build_dir, "x.apk")
            .unwrap();
        assert_eq!(result.kept_project, Some(config.paths.build_dir.clone()));
        assert!(config.paths.build_dir.exists());
    }

    #[test]
    fn test_existing_output_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        fs::create_dir_all(&config.paths.output_dir).unwrap();
        fs::write(config.paths.output_dir.join("x.apk"), b"old").unwrap();
        let fake = FakeGradle::new(0, true);

        let result = BuildOrchestrator::new(&config, &fake)
            .build(&tool(), &config.paths.build_dir, "x.apk")
            .unwrap();
        assert_eq!(fs::read(result.apk).unwrap(), b"PK\x03\x04apk");
    }

    #[test]
    fn test_output_inside_project_is_refused_before_building() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = setup(dir.path());
        config.paths.output_dir = config.paths.build_dir.join("out");
        let fake = FakeGradle::new(0, true);

        let err = BuildOrchestrator::new(&config, &fake)
            .build(&tool(), &config.paths.build_dir, "x.apk")
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidPath);
        assert!(fake.calls.borrow().is_empty());
        assert!(config.paths.build_dir.exists());
    }

    #[test]
    fn test_move_file_keeps_destination_when_source_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.apk");
        fs::write(&dest, b"previous").unwrap();

        assert!(move_file(&dir.path().join("missing.apk"), &dest).is_err());
        assert_eq!(fs::read(&dest).unwrap(), b"previous");
    }

    #[test]
    fn test_custom_task_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = setup(dir.path());
        config.build.task = "assembleRelease".to_string();
        config.build.flags = vec!["--offline".to_string()];
        let fake = FakeGradle::new(0, false);
        let orchestrator = BuildOrchestrator::new(&config, &fake);
        assert_eq!(orchestrator.arguments(), vec!["assembleRelease", "--offline"]);
    }
}
