//! Obsidian CLI
//!
//! Turns a website into an installable Android WebView APK.

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use obsidian_android::{BuildRequest, GradleBootstrapper, Pipeline, Scaffolder, Stage, ToolProvider};
use obsidian_cli::output::{self, Status};
use obsidian_cli::progress;
use obsidian_cli::Prompter;
use obsidian_core::config::Config;
use obsidian_core::error::{exit_codes, Error};
use obsidian_core::health::HealthChecker;
use obsidian_core::process::SystemRunner;
use obsidian_telemetry::{TelemetryConfig, Timer};
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "obsidian")]
#[command(about = "Turn a website into an installable Android WebView APK")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct AppArgs {
    /// Application display name
    #[arg(long)]
    name: Option<String>,

    /// Website to wrap
    #[arg(long)]
    url: Option<String>,

    /// Square PNG or JPEG icon
    #[arg(long)]
    icon: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a debug APK for a website
    Build {
        #[command(flatten)]
        app: AppArgs,

        /// Keep the generated project after a successful build
        #[arg(long)]
        keep_build_dir: bool,
    },

    /// Generate the Android project without building it
    Scaffold {
        #[command(flatten)]
        app: AppArgs,
    },

    /// Locate or download the Gradle distribution
    Bootstrap,

    /// Check the build environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        output::set_color(Some(false));
    }
    obsidian_telemetry::init_with_config(
        TelemetryConfig::from_verbosity(cli.verbose, cli.quiet).with_ansi(!cli.no_color),
    )?;

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => std::process::exit(report_error(&e)),
    };
    if let Some(path) = &config.path {
        tracing::debug!(path = %path.display(), "Using configuration file");
    }

    let exit_code = match cli.command {
        Commands::Build { app, keep_build_dir } => {
            if keep_build_dir {
                config.schema.build.keep_build_dir = true;
            }
            run_build(app, &config, cli.quiet)
        }
        Commands::Scaffold { app } => run_scaffold(app, &config, cli.quiet),
        Commands::Bootstrap => run_bootstrap(&config, cli.quiet),
        Commands::Doctor { json } => run_doctor(&config, json),
    };

    std::process::exit(exit_code);
}

/// Print an error with its context and suggestion, returning its exit code
fn report_error(err: &Error) -> i32 {
    tracing::error!(code = %err.code, category = err.code.category(), "{}", err.message);
    Status::error(&format!("[{}] {}", err.code, err.message));
    if let Some(context) = &err.context {
        for line in context.lines() {
            Status::detail(line);
        }
    }
    if let Some(suggestion) = &err.suggestion {
        Status::info(suggestion);
    }
    err.exit_code()
}

/// Prompt for whatever was not passed on the command line
fn collect_request(app: AppArgs) -> Result<BuildRequest, Error> {
    let inputs = Prompter::stdio()
        .build_inputs(app.name, app.url, app.icon)
        .map_err(|e| Error::invalid_input(e.to_string()).with_source(e))?;
    BuildRequest::new(&inputs.app_name, &inputs.url, &inputs.icon_path)
}

fn stage_step(stage: Stage) -> Option<usize> {
    match stage {
        Stage::InputsCollected => Some(1),
        Stage::ToolReady => Some(2),
        Stage::Scaffolded => Some(3),
        Stage::Building => Some(4),
        Stage::Succeeded => Some(5),
        Stage::Idle | Stage::Failed => None,
    }
}

fn run_build(app: AppArgs, config: &Config, quiet: bool) -> i32 {
    if !quiet {
        Status::header("Obsidian WebView APK builder");
    }

    let request = match collect_request(app) {
        Ok(request) => request,
        Err(e) => return report_error(&e),
    };
    tracing::info!(
        app = %request.app_name,
        url = %request.target_url,
        package = %request.package_id,
        "Build requested"
    );

    let timer = Timer::start("build");
    let spinner: RefCell<Option<ProgressBar>> = RefCell::new(None);
    let tools = GradleBootstrapper::new(&config.schema).with_progress(!quiet);
    let runner = SystemRunner { quiet };

    let mut pipeline = Pipeline::new(&config.schema, tools, runner).on_stage(|stage| {
        if stage == Stage::Building && quiet {
            *spinner.borrow_mut() = Some(progress::spinner("Compiling APK"));
        }
        if stage.is_terminal() {
            if let Some(pb) = spinner.borrow_mut().take() {
                match stage {
                    Stage::Succeeded => progress::finish_success(&pb, "APK compiled"),
                    _ => progress::finish_error(&pb, "Build failed"),
                }
            }
        }
        if !quiet {
            if let Some(step) = stage_step(stage) {
                Status::step(step, 5, &capitalize(stage.label()));
            }
        }
    });

    match pipeline.run(&request) {
        Ok(outcome) => {
            let elapsed = timer.stop();
            Status::success(&format!(
                "{} ({}) built in {}",
                outcome.build.apk.display(),
                output::format_size(outcome.build.size_bytes),
                output::format_duration(elapsed)
            ));
            if !quiet {
                Status::detail(&format!(
                    "Gradle {} ({})",
                    outcome.tool.version, outcome.tool.source
                ));
                if let Some(dir) = &outcome.build.kept_project {
                    Status::detail(&format!("Project kept at {}", dir.display()));
                }
            }
            exit_codes::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn run_scaffold(app: AppArgs, config: &Config, quiet: bool) -> i32 {
    let request = match collect_request(app) {
        Ok(request) => request,
        Err(e) => return report_error(&e),
    };
    let icon = match obsidian_image::probe_icon(&request.icon_path) {
        Ok(icon) => icon,
        Err(e) => return report_error(&Error::from(e)),
    };

    match Scaffolder::new(&config.schema).scaffold_with_icon(&request, &icon) {
        Ok(project) => {
            if !quiet {
                Status::success(&format!(
                    "Project for {} written to {}",
                    request.package_id,
                    project.root.display()
                ));
                Status::detail(&format!(
                    "{} files, {} launcher icons",
                    project.files.len(),
                    project.icons.icons.len()
                ));
            }
            exit_codes::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn run_bootstrap(config: &Config, quiet: bool) -> i32 {
    let tools = GradleBootstrapper::new(&config.schema).with_progress(!quiet);
    match tools.resolve() {
        Ok(tool) => {
            if quiet {
                println!("{}", tool.executable.display());
            } else {
                Status::success(&format!(
                    "Gradle {} ({}) at {}",
                    tool.version,
                    tool.source,
                    tool.executable.display()
                ));
            }
            exit_codes::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn run_doctor(config: &Config, json: bool) -> i32 {
    let report = HealthChecker::new()
        .with_builder_checks(&config.schema)
        .run();

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                Status::error(&format!("Could not serialize report: {}", e));
                return exit_codes::FAILURE;
            }
        }
    } else {
        Status::header("Environment");
        for check in &report.checks {
            let line = match &check.message {
                Some(message) => format!("{}: {} ({}ms)", check.name, message, check.duration_ms),
                None => format!("{} ({}ms)", check.name, check.duration_ms),
            };
            if check.status.is_healthy() {
                Status::success(&line);
            } else if check.status.is_operational() {
                Status::warning(&line);
            } else {
                Status::error(&line);
            }
        }
        Status::info(&format!(
            "{} checks in {}ms, {} need attention",
            report.checks.len(),
            report.total_duration_ms,
            report.failed_checks().len()
        ));
    }

    if report.status.is_operational() {
        exit_codes::SUCCESS
    } else {
        exit_codes::ENVIRONMENT_ERROR
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
