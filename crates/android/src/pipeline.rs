//! End-to-end build pipeline
//!
//! `Idle → InputsCollected → ToolReady → Scaffolded → Building → Succeeded`,
//! with any error moving the pipeline to `Failed`. Stages run strictly in
//! order and a finished pipeline cannot be restarted.

use crate::bootstrap::{BuildToolInstallation, ToolProvider};
use crate::build::{BuildOrchestrator, BuildResult};
use crate::request::BuildRequest;
use crate::scaffold::{ScaffoldedProject, Scaffolder};
use obsidian_core::config::BuilderConfig;
use obsidian_core::error::{Error, Result};
use obsidian_core::process::CommandRunner;

/// Pipeline position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Nothing done yet
    Idle,
    /// Inputs validated and the icon decoded
    InputsCollected,
    /// Build tool available
    ToolReady,
    /// Project written to disk
    Scaffolded,
    /// Build tool running
    Building,
    /// Package delivered
    Succeeded,
    /// Halted on an error
    Failed,
}

impl Stage {
    /// The stage that normally follows this one
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::InputsCollected),
            Stage::InputsCollected => Some(Stage::ToolReady),
            Stage::ToolReady => Some(Stage::Scaffolded),
            Stage::Scaffolded => Some(Stage::Building),
            Stage::Building => Some(Stage::Succeeded),
            Stage::Succeeded | Stage::Failed => None,
        }
    }

    /// No further transitions possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Succeeded | Stage::Failed)
    }

    /// Short label for status output
    pub fn label(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::InputsCollected => "inputs collected",
            Stage::ToolReady => "build tool ready",
            Stage::Scaffolded => "project scaffolded",
            Stage::Building => "building",
            Stage::Succeeded => "succeeded",
            Stage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Tool that performed the build
    pub tool: BuildToolInstallation,
    /// Scaffolded project
    pub project: ScaffoldedProject,
    /// Delivered package
    pub build: BuildResult,
}

type Observer<'a> = Box<dyn FnMut(Stage) + 'a>;

/// Drives one build from validated inputs to a delivered package
pub struct Pipeline<'a, T: ToolProvider, R: CommandRunner> {
    config: &'a BuilderConfig,
    tools: T,
    runner: R,
    stage: Stage,
    observer: Option<Observer<'a>>,
}

impl<'a, T: ToolProvider, R: CommandRunner> Pipeline<'a, T, R> {
    /// Pipeline with the given tool provider and command runner
    pub fn new(config: &'a BuilderConfig, tools: T, runner: R) -> Self {
        Self {
            config,
            tools,
            runner,
            stage: Stage::Idle,
            observer: None,
        }
    }

    /// Call `f` on every stage entered
    pub fn on_stage(mut self, f: impl FnMut(Stage) + 'a) -> Self {
        self.observer = Some(Box::new(f));
        self
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to `next`.
    ///
    /// Only the immediate successor, or `Failed` from a non-terminal stage,
    /// is accepted.
    pub fn advance(&mut self, next: Stage) -> Result<()> {
        let allowed = if next == Stage::Failed {
            !self.stage.is_terminal()
        } else {
            self.stage.next() == Some(next)
        };
        if !allowed {
            return Err(Error::invalid_state(format!(
                "Cannot move pipeline from '{}' to '{}'",
                self.stage, next
            )));
        }

        tracing::debug!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
        if let Some(observer) = self.observer.as_mut() {
            observer(next);
        }
        Ok(())
    }

    /// Record a failure and pass the error through
    fn guard<V>(&mut self, result: Result<V>) -> Result<V> {
        if result.is_err() && !self.stage.is_terminal() {
            self.stage = Stage::Failed;
            if let Some(observer) = self.observer.as_mut() {
                observer(Stage::Failed);
            }
        }
        result
    }

    /// Run every stage for `request`
    pub fn run(&mut self, request: &BuildRequest) -> Result<PipelineOutcome> {
        let step = self.advance(Stage::InputsCollected);
        self.guard(step)?;
        let icon = {
            let _span = tracing::info_span!("probe_icon").entered();
            obsidian_image::probe_icon(&request.icon_path).map_err(Error::from)
        };
        let icon = self.guard(icon)?;

        let tool = {
            let _span = tracing::info_span!("resolve_tool").entered();
            self.tools.resolve()
        };
        let tool = self.guard(tool)?;
        let step = self.advance(Stage::ToolReady);
        self.guard(step)?;

        let project = {
            let _span = tracing::info_span!("scaffold").entered();
            Scaffolder::new(self.config).scaffold_with_icon(request, &icon)
        };
        let project = self.guard(project)?;
        let step = self.advance(Stage::Scaffolded);
        self.guard(step)?;

        let step = self.advance(Stage::Building);
        self.guard(step)?;
        let build = {
            let _span = tracing::info_span!("build").entered();
            BuildOrchestrator::new(self.config, &self.runner).build(
                &tool,
                &project.root,
                &request.apk_file_name(),
            )
        };
        let build = self.guard(build)?;
        let step = self.advance(Stage::Succeeded);
        self.guard(step)?;

        Ok(PipelineOutcome {
            tool,
            project,
            build,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::ToolSource;
    use image::{Rgba, RgbaImage};
    use obsidian_core::error::ErrorCode;
    use obsidian_core::process::CommandResult;
    use std::cell::{Cell, RefCell};
    use std::path::Path;

    struct FakeTools {
        calls: Cell<usize>,
        fail: bool,
    }

    impl FakeTools {
        fn ok() -> Self {
            Self { calls: Cell::new(0), fail: false }
        }

        fn failing() -> Self {
            Self { calls: Cell::new(0), fail: true }
        }
    }

    impl ToolProvider for FakeTools {
        fn resolve(&self) -> Result<BuildToolInstallation> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(Error::new(ErrorCode::DownloadFailed, "offline"));
            }
            Ok(BuildToolInstallation {
                executable: "gradle".into(),
                version: "7.6.4".into(),
                source: ToolSource::System,
            })
        }
    }

    /// Gradle stand-in that writes the debug APK
    struct FakeRunner {
        calls: Cell<usize>,
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, _program: &Path, _args: &[&str], dir: &Path) -> Result<CommandResult> {
            self.calls.set(self.calls.get() + 1);
            let apk = dir.join("app/build/outputs/apk/debug/app-debug.apk");
            std::fs::create_dir_all(apk.parent().unwrap()).unwrap();
            std::fs::write(apk, b"apk").unwrap();
            Ok(CommandResult::new(0, "BUILD SUCCESSFUL", ""))
        }
    }

    fn setup(dir: &Path) -> (BuilderConfig, BuildRequest) {
        let icon = dir.join("icon.png");
        RgbaImage::from_pixel(100, 60, Rgba([255, 0, 0, 255]))
            .save_with_format(&icon, image::ImageFormat::Png)
            .unwrap();
        let mut config = BuilderConfig::default();
        config.paths.build_dir = dir.join("temp_build");
        config.paths.output_dir = dir.join("out");
        let request = BuildRequest::new("Demo App", "example.com", &icon.to_string_lossy()).unwrap();
        (config, request)
    }

    #[test]
    fn test_full_run_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let (config, request) = setup(dir.path());
        let tools = FakeTools::ok();
        let runner = FakeRunner { calls: Cell::new(0) };
        let seen = RefCell::new(Vec::new());

        let outcome = {
            let mut pipeline =
                Pipeline::new(&config, &tools, &runner).on_stage(|s| seen.borrow_mut().push(s));
            let outcome = pipeline.run(&request).unwrap();
            assert_eq!(pipeline.stage(), Stage::Succeeded);
            outcome
        };

        assert_eq!(outcome.build.apk, dir.path().join("out/Demo_App.apk"));
        assert!(outcome.build.apk.is_file());
        assert!(!config.paths.build_dir.exists());
        assert_eq!(runner.calls.get(), 1);
        assert_eq!(
            seen.into_inner(),
            vec![
                Stage::InputsCollected,
                Stage::ToolReady,
                Stage::Scaffolded,
                Stage::Building,
                Stage::Succeeded
            ]
        );
    }

    #[test]
    fn test_unreadable_icon_stops_before_tool_and_build() {
        let dir = tempfile::tempdir().unwrap();
        let (config, mut request) = setup(dir.path());
        let bad = dir.path().join("icon.txt");
        std::fs::write(&bad, "not an image").unwrap();
        request.icon_path = bad;
        let tools = FakeTools::ok();
        let runner = FakeRunner { calls: Cell::new(0) };

        let mut pipeline = Pipeline::new(&config, &tools, &runner);
        let err = pipeline.run(&request).unwrap_err();

        assert_eq!(err.code, ErrorCode::UnsupportedImage);
        assert_eq!(pipeline.stage(), Stage::Failed);
        assert_eq!(tools.calls.get(), 0);
        assert_eq!(runner.calls.get(), 0);
        assert!(!config.paths.build_dir.exists());
    }

    #[test]
    fn test_tool_failure_halts_before_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        let (config, request) = setup(dir.path());
        let tools = FakeTools::failing();
        let runner = FakeRunner { calls: Cell::new(0) };

        let mut pipeline = Pipeline::new(&config, &tools, &runner);
        let err = pipeline.run(&request).unwrap_err();

        assert_eq!(err.code, ErrorCode::DownloadFailed);
        assert_eq!(pipeline.stage(), Stage::Failed);
        assert_eq!(runner.calls.get(), 0);
        assert!(!config.paths.build_dir.exists());
    }

    #[test]
    fn test_failed_pipeline_cannot_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let (config, request) = setup(dir.path());
        let tools = FakeTools::failing();
        let runner = FakeRunner { calls: Cell::new(0) };

        let mut pipeline = Pipeline::new(&config, &tools, &runner);
        pipeline.run(&request).unwrap_err();
        let err = pipeline.run(&request).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert_eq!(tools.calls.get(), 1);
    }

    #[test]
    fn test_advance_rejects_skips_and_backward_moves() {
        let config = BuilderConfig::default();
        let tools = FakeTools::ok();
        let runner = FakeRunner { calls: Cell::new(0) };
        let mut pipeline = Pipeline::new(&config, &tools, &runner);

        assert!(pipeline.advance(Stage::Scaffolded).is_err());
        pipeline.advance(Stage::InputsCollected).unwrap();
        assert!(pipeline.advance(Stage::Idle).is_err());
        assert!(pipeline.advance(Stage::InputsCollected).is_err());
        pipeline.advance(Stage::ToolReady).unwrap();
        pipeline.advance(Stage::Failed).unwrap();
        assert!(pipeline.advance(Stage::Scaffolded).is_err());
        assert!(pipeline.advance(Stage::Failed).is_err());
    }

    #[test]
    fn test_stage_order() {
        let mut stage = Stage::Idle;
        let mut order = vec![stage];
        while let Some(next) = stage.next() {
            order.push(next);
            stage = next;
        }
        assert_eq!(order.len(), 6);
        assert_eq!(order.last(), Some(&Stage::Succeeded));
        assert!(Stage::Failed.next().is_none());
    }
}
