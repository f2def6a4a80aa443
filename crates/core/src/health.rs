//! Health check system for verifying the build environment
//!
//! Read-only probes used by `obsidian doctor`:
//! - Operating system release
//! - Java and Gradle toolchains
//! - Android SDK layout (build-tools, platforms, cmdline-tools)
//! - Disk space, working directory permissions and process limits

use crate::config::BuilderConfig;
use crate::process::{command_exists, run_command};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All checks passed
    Healthy,
    /// Some optional checks failed
    Degraded,
    /// Required checks failed
    Unhealthy,
}

impl HealthStatus {
    /// Returns true if status is healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Returns true if status is healthy or degraded (still operational)
    #[must_use]
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Individual health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,
    /// Status of the check
    pub status: HealthStatus,
    /// Optional message with details
    pub message: Option<String>,
    /// Duration of the check in milliseconds
    pub duration_ms: u64,
    /// Additional details as key-value pairs
    pub details: BTreeMap<String, String>,
}

impl CheckResult {
    /// Create a healthy check result
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
            duration_ms: 0,
            details: BTreeMap::new(),
        }
    }

    /// Create an unhealthy check result with a message
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            duration_ms: 0,
            details: BTreeMap::new(),
        }
    }

    /// Create a degraded check result with a message
    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            duration_ms: 0,
            details: BTreeMap::new(),
        }
    }

    /// Set the duration of the check
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Add a detail key-value pair
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Overall health report containing all check results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status based on all checks
    pub status: HealthStatus,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Total duration of all checks in milliseconds
    pub total_duration_ms: u64,
    /// Timestamp when the report was generated
    pub timestamp: String,
    /// Version of the tool
    pub version: String,
}

impl HealthReport {
    /// Create a new health report from check results
    #[must_use]
    pub fn new(checks: Vec<CheckResult>, duration: Duration) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            checks,
            total_duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Returns true if overall status is healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Get all checks that failed (not healthy)
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| !c.status.is_healthy())
            .collect()
    }
}

/// Health checker with configurable checks
pub struct HealthChecker {
    checks: Vec<Box<dyn HealthCheck>>,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    /// Create a new health checker with no checks
    #[must_use]
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Add a health check
    #[must_use]
    pub fn add_check(mut self, check: impl HealthCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Checks relevant to building a WebView APK with the given configuration
    #[must_use]
    pub fn with_builder_checks(self, config: &BuilderConfig) -> Self {
        self.add_check(OsReleaseCheck::new("/etc/os-release"))
            .add_check(EnvVarCheck::optional("JAVA_HOME"))
            .add_check(CommandCheck::new("java", Some("-version")))
            .add_check(CommandCheck::optional("javac", Some("-version")))
            .add_check(CommandCheck::optional("gradle", Some("--version")))
            .add_check(AndroidSdkCheck::new(config.android.sdk_dir.clone()))
            .add_check(PathCheck::writable("."))
            .add_check(DiskSpaceCheck::new(".", 1024 * 1024 * 1024)) // 1GB for Gradle caches
            .add_check(ProcessLimitsCheck)
    }

    /// Run all health checks
    #[must_use]
    pub fn run(&self) -> HealthReport {
        let start = Instant::now();
        let mut results = Vec::new();

        for check in &self.checks {
            let check_start = Instant::now();
            let result = check.check().with_duration(check_start.elapsed());
            tracing::debug!(check = %result.name, status = ?result.status, "Health check finished");
            results.push(result);
        }

        HealthReport::new(results, start.elapsed())
    }
}

/// Trait for implementing health checks
pub trait HealthCheck: Send + Sync {
    /// Perform the health check and return a result
    fn check(&self) -> CheckResult;
}

/// First non-empty line of a command's output; `java -version` prints to stderr
fn first_line(stdout: &str, stderr: &str) -> String {
    stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Check if a command is available
pub struct CommandCheck {
    command: String,
    version_arg: Option<String>,
    required: bool,
}

impl CommandCheck {
    /// Create a required command check
    pub fn new(command: impl Into<String>, version_arg: Option<&str>) -> Self {
        Self {
            command: command.into(),
            version_arg: version_arg.map(String::from),
            required: true,
        }
    }

    /// Create an optional command check (degraded if missing, not unhealthy)
    pub fn optional(command: impl Into<String>, version_arg: Option<&str>) -> Self {
        Self {
            command: command.into(),
            version_arg: version_arg.map(String::from),
            required: false,
        }
    }
}

impl HealthCheck for CommandCheck {
    fn check(&self) -> CheckResult {
        if !command_exists(&self.command) {
            return if self.required {
                CheckResult::unhealthy(&self.command, format!("{} is not installed", self.command))
            } else {
                CheckResult::degraded(
                    &self.command,
                    format!("{} is not installed (optional)", self.command),
                )
            };
        }

        let Some(ref arg) = self.version_arg else {
            return CheckResult::healthy(&self.command);
        };

        match run_command(&self.command, &[arg]) {
            Ok(output) => {
                let version = first_line(&output.stdout, &output.stderr);
                if output.success {
                    CheckResult::healthy(&self.command).with_detail("version", version)
                } else {
                    CheckResult::degraded(&self.command, format!("`{} {}` failed", self.command, arg))
                        .with_detail("output", version)
                }
            }
            Err(e) => CheckResult::degraded(&self.command, e.message),
        }
    }
}

/// Check if an environment variable is set
pub struct EnvVarCheck {
    var_name: String,
    required: bool,
}

impl EnvVarCheck {
    /// Create a required environment variable check
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
            required: true,
        }
    }

    /// Create an optional environment variable check
    pub fn optional(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
            required: false,
        }
    }
}

impl HealthCheck for EnvVarCheck {
    fn check(&self) -> CheckResult {
        match std::env::var(&self.var_name) {
            Ok(value) => {
                let shown = if value.chars().count() > 50 {
                    format!("{}...", value.chars().take(50).collect::<String>())
                } else {
                    value
                };
                CheckResult::healthy(&self.var_name).with_detail("value", shown)
            }
            Err(_) if self.required => {
                CheckResult::unhealthy(&self.var_name, format!("{} is not set", self.var_name))
            }
            Err(_) => CheckResult::degraded(
                &self.var_name,
                format!("{} is not set (optional)", self.var_name),
            ),
        }
    }
}

/// Report the distribution name from an os-release file
pub struct OsReleaseCheck {
    path: PathBuf,
}

impl OsReleaseCheck {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HealthCheck for OsReleaseCheck {
    fn check(&self) -> CheckResult {
        let result = CheckResult::healthy("os")
            .with_detail("family", std::env::consts::OS)
            .with_detail("arch", std::env::consts::ARCH);

        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return result;
        };

        match parse_pretty_name(&content) {
            Some(name) => result.with_detail("release", name),
            None => result,
        }
    }
}

/// Extract `PRETTY_NAME` from os-release content
pub fn parse_pretty_name(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        line.strip_prefix("PRETTY_NAME=")
            .map(|v| v.trim().trim_matches('"').to_string())
    })
}

/// Inspect the Android SDK directory layout
pub struct AndroidSdkCheck {
    sdk_dir: PathBuf,
}

impl AndroidSdkCheck {
    pub fn new(sdk_dir: impl Into<PathBuf>) -> Self {
        Self {
            sdk_dir: sdk_dir.into(),
        }
    }
}

fn list_dir_names(dir: &Path) -> Option<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Some(names)
}

impl HealthCheck for AndroidSdkCheck {
    fn check(&self) -> CheckResult {
        if !self.sdk_dir.is_dir() {
            return CheckResult::unhealthy(
                "android_sdk",
                format!("Android SDK directory not found: {}", self.sdk_dir.display()),
            )
            .with_detail("path", self.sdk_dir.display().to_string());
        }

        let mut result = CheckResult::healthy("android_sdk")
            .with_detail("path", self.sdk_dir.display().to_string());
        let mut missing = Vec::new();

        for sub in ["build-tools", "platforms"] {
            match list_dir_names(&self.sdk_dir.join(sub)) {
                Some(names) if !names.is_empty() => {
                    result = result.with_detail(sub, names.join(", "));
                }
                _ => missing.push(sub),
            }
        }

        let cmdline = self.sdk_dir.join("cmdline-tools");
        if cmdline.is_dir() {
            result = result.with_detail("cmdline-tools", cmdline.display().to_string());
        }

        if missing.is_empty() {
            result
        } else {
            CheckResult {
                status: HealthStatus::Unhealthy,
                message: Some(format!("Missing SDK components: {}", missing.join(", "))),
                ..result
            }
        }
    }
}

/// Check available disk space
pub struct DiskSpaceCheck {
    path: String,
    min_bytes: u64,
}

impl DiskSpaceCheck {
    /// Create a disk space check for a path with minimum required bytes
    pub fn new(path: impl Into<String>, min_bytes: u64) -> Self {
        Self {
            path: path.into(),
            min_bytes,
        }
    }
}

/// Available kilobytes from `df -k` output
fn parse_df_available_kb(output: &str) -> Option<u64> {
    let line = output.lines().nth(1)?;
    line.split_whitespace().nth(3)?.parse().ok()
}

impl HealthCheck for DiskSpaceCheck {
    fn check(&self) -> CheckResult {
        let available_kb = match run_command("df", &["-k", &self.path]) {
            Ok(output) if output.success => parse_df_available_kb(&output.stdout),
            _ => None,
        };

        // Can't check, assume OK
        let Some(available_kb) = available_kb else {
            return CheckResult::healthy("disk_space");
        };

        let available_mb = available_kb / 1024;
        if available_kb * 1024 >= self.min_bytes {
            CheckResult::healthy("disk_space")
                .with_detail("available_mb", available_mb.to_string())
                .with_detail("path", &self.path)
        } else {
            CheckResult::degraded(
                "disk_space",
                format!("Low disk space: {} MB available", available_mb),
            )
            .with_detail("available_mb", available_mb.to_string())
            .with_detail("required_mb", (self.min_bytes / 1024 / 1024).to_string())
        }
    }
}

/// Check if a path exists and is accessible
pub struct PathCheck {
    path: String,
    check_writable: bool,
}

impl PathCheck {
    /// Create a check for a readable path
    pub fn readable(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            check_writable: false,
        }
    }

    /// Create a check for a writable path
    pub fn writable(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            check_writable: true,
        }
    }
}

impl HealthCheck for PathCheck {
    fn check(&self) -> CheckResult {
        let path = Path::new(&self.path);

        if !path.exists() {
            return CheckResult::unhealthy(&self.path, "Path does not exist");
        }

        if self.check_writable {
            let metadata = match std::fs::metadata(path) {
                Ok(m) => m,
                Err(e) => return CheckResult::unhealthy(&self.path, e.to_string()),
            };

            if metadata.permissions().readonly() {
                return CheckResult::unhealthy(&self.path, "Path is read-only");
            }
        }

        CheckResult::healthy(&self.path)
            .with_detail("exists", "true")
            .with_detail("writable", self.check_writable.to_string())
    }
}

/// Report `ulimit -a`; Gradle needs generous open-file and process limits
pub struct ProcessLimitsCheck;

impl HealthCheck for ProcessLimitsCheck {
    fn check(&self) -> CheckResult {
        if cfg!(not(unix)) {
            return CheckResult::healthy("process_limits");
        }

        match run_command("sh", &["-c", "ulimit -a"]) {
            Ok(output) if output.success => {
                let mut result = CheckResult::healthy("process_limits");
                for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
                    if let Some((key, value)) = split_limit_line(line) {
                        result = result.with_detail(key, value);
                    }
                }
                result
            }
            _ => CheckResult::degraded("process_limits", "Could not query process limits"),
        }
    }
}

/// Split a `ulimit -a` line into a label and its value (the last token)
fn split_limit_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let idx = line.rfind(char::is_whitespace)?;
    let (label, value) = line.split_at(idx);
    Some((label.trim().to_string(), value.trim().to_string()))
}
