//! Configuration schema definitions
//!
//! Every fixed path, pinned version and colour the builder uses lives here,
//! so a run is fully described by one [`BuilderConfig`] value.

use crate::error::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BuilderConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub android: AndroidConfig,

    #[serde(default)]
    pub gradle: GradleConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub theme: ThemeConfig,
}

impl BuilderConfig {
    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.paths.build_dir.as_os_str().is_empty() {
            problems.push("paths.build_dir must not be empty".to_string());
        }
        if self.paths.tools_dir.as_os_str().is_empty() {
            problems.push("paths.tools_dir must not be empty".to_string());
        }
        if path_within(&self.paths.output_dir, &self.paths.build_dir) {
            problems.push("paths.output_dir must not be paths.build_dir or inside it".to_string());
        }
        if path_within(&self.paths.tools_dir, &self.paths.build_dir) {
            problems.push("paths.tools_dir must not be paths.build_dir or inside it".to_string());
        }

        let a = &self.android;
        if !(a.min_sdk <= a.target_sdk && a.target_sdk <= a.compile_sdk) {
            problems.push(format!(
                "android SDK levels must satisfy min_sdk ({}) <= target_sdk ({}) <= compile_sdk ({})",
                a.min_sdk, a.target_sdk, a.compile_sdk
            ));
        }
        if a.version_code == 0 {
            problems.push("android.version_code must be positive".to_string());
        }

        if semver_like(&self.gradle.version).is_none() {
            problems.push(format!("gradle.version '{}' is not a version", self.gradle.version));
        }
        if semver_like(&self.gradle.min_version).is_none() {
            problems.push(format!(
                "gradle.min_version '{}' is not a version",
                self.gradle.min_version
            ));
        }
        if !self.gradle.distribution_url.starts_with("https://")
            && !self.gradle.distribution_url.starts_with("http://")
        {
            problems.push("gradle.distribution_url must be an http(s) URL".to_string());
        }
        if let Some(sum) = &self.gradle.sha256 {
            if sum.len() != 64 || !sum.chars().all(|c| c.is_ascii_hexdigit()) {
                problems.push("gradle.sha256 must be 64 hex characters".to_string());
            }
        }

        if self.build.task.trim().is_empty() {
            problems.push("build.task must not be empty".to_string());
        }

        for (name, value) in self.theme.colors() {
            if !is_hex_color(value) {
                problems.push(format!("theme.{} '{}' is not a #RRGGBB colour", name, value));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::new(
                ErrorCode::ConfigValidationError,
                format!("Invalid configuration: {}", problems.join("; ")),
            ))
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Intermediate project directory, wiped at the start of every run
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Where the finished APK is placed
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where managed build tool distributions are unpacked
    #[serde(default = "default_tools_dir")]
    pub tools_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
            output_dir: default_output_dir(),
            tools_dir: default_tools_dir(),
        }
    }
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("temp_build")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_tools_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("obsidian-builder").join("tools"))
        .unwrap_or_else(|| PathBuf::from(".obsidian").join("tools"))
}

/// Android project settings written into the generated build files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AndroidConfig {
    #[serde(default = "default_sdk_dir")]
    pub sdk_dir: PathBuf,

    #[serde(default = "default_compile_sdk")]
    pub compile_sdk: u32,

    #[serde(default = "default_min_sdk")]
    pub min_sdk: u32,

    #[serde(default = "default_compile_sdk")]
    pub target_sdk: u32,

    /// Android Gradle Plugin version
    #[serde(default = "default_agp_version")]
    pub agp_version: String,

    /// `org.gradle.jvmargs` for the generated project
    #[serde(default = "default_jvm_args")]
    pub jvm_args: String,

    #[serde(default = "default_version_code")]
    pub version_code: u32,

    #[serde(default = "default_version_name")]
    pub version_name: String,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            sdk_dir: default_sdk_dir(),
            compile_sdk: default_compile_sdk(),
            min_sdk: default_min_sdk(),
            target_sdk: default_compile_sdk(),
            agp_version: default_agp_version(),
            jvm_args: default_jvm_args(),
            version_code: default_version_code(),
            version_name: default_version_name(),
        }
    }
}

fn default_sdk_dir() -> PathBuf {
    std::env::var_os("ANDROID_HOME")
        .or_else(|| std::env::var_os("ANDROID_SDK_ROOT"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/opt/android-sdk"))
}

fn default_compile_sdk() -> u32 {
    33
}

fn default_min_sdk() -> u32 {
    24
}

fn default_agp_version() -> String {
    "7.3.1".to_string()
}

fn default_jvm_args() -> String {
    "-Xmx1536m -Dfile.encoding=UTF-8".to_string()
}

fn default_version_code() -> u32 {
    1
}

fn default_version_name() -> String {
    "1.0".to_string()
}

/// Pinned build tool distribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradleConfig {
    /// Version fetched when no compatible Gradle is available
    #[serde(default = "default_gradle_version")]
    pub version: String,

    /// Oldest system Gradle accepted (same major version as `version`)
    #[serde(default = "default_gradle_min_version")]
    pub min_version: String,

    /// Distribution URL; `{version}` is substituted
    #[serde(default = "default_distribution_url")]
    pub distribution_url: String,

    /// Expected SHA-256 of the archive. When unset the publisher's
    /// `<url>.sha256` companion file is used.
    #[serde(default)]
    pub sha256: Option<String>,

    #[serde(default = "default_true")]
    pub verify_checksum: bool,

    /// Accept a compatible `gradle` found on PATH
    #[serde(default = "default_true")]
    pub prefer_system: bool,
}

impl GradleConfig {
    /// Distribution URL with the version substituted
    pub fn resolved_url(&self) -> String {
        self.distribution_url.replace("{version}", &self.version)
    }
}

impl Default for GradleConfig {
    fn default() -> Self {
        Self {
            version: default_gradle_version(),
            min_version: default_gradle_min_version(),
            distribution_url: default_distribution_url(),
            sha256: None,
            verify_checksum: true,
            prefer_system: true,
        }
    }
}

fn default_gradle_version() -> String {
    "7.6.4".to_string()
}

fn default_gradle_min_version() -> String {
    "7.4".to_string()
}

fn default_distribution_url() -> String {
    "https://services.gradle.org/distributions/gradle-{version}-bin.zip".to_string()
}

fn default_true() -> bool {
    true
}

/// Build invocation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    #[serde(default = "default_task")]
    pub task: String,

    #[serde(default = "default_flags")]
    pub flags: Vec<String>,

    /// APK location relative to the project root
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Keep the intermediate project after a successful build
    #[serde(default)]
    pub keep_build_dir: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            task: default_task(),
            flags: default_flags(),
            artifact_path: default_artifact_path(),
            keep_build_dir: false,
        }
    }
}

fn default_task() -> String {
    "assembleDebug".to_string()
}

fn default_flags() -> Vec<String> {
    vec!["--no-daemon".to_string(), "--stacktrace".to_string()]
}

fn default_artifact_path() -> PathBuf {
    ["app", "build", "outputs", "apk", "debug", "app-debug.apk"]
        .iter()
        .collect()
}

/// Colours of the generated app
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeConfig {
    #[serde(default = "default_background")]
    pub primary: String,

    #[serde(default = "default_primary_variant")]
    pub primary_variant: String,

    #[serde(default = "default_on_primary")]
    pub on_primary: String,

    #[serde(default = "default_accent")]
    pub accent: String,

    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default = "default_primary_variant")]
    pub status_bar: String,
}

impl ThemeConfig {
    /// Name/value pairs, for validation
    pub fn colors(&self) -> [(&'static str, &str); 6] {
        [
            ("primary", &self.primary),
            ("primary_variant", &self.primary_variant),
            ("on_primary", &self.on_primary),
            ("accent", &self.accent),
            ("background", &self.background),
            ("status_bar", &self.status_bar),
        ]
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary: default_background(),
            primary_variant: default_primary_variant(),
            on_primary: default_on_primary(),
            accent: default_accent(),
            background: default_background(),
            status_bar: default_primary_variant(),
        }
    }
}

fn default_background() -> String {
    "#121212".to_string()
}

fn default_primary_variant() -> String {
    "#000000".to_string()
}

fn default_on_primary() -> String {
    "#FFFFFF".to_string()
}

fn default_accent() -> String {
    "#00E5FF".to_string()
}

/// Absolute form of `path` with `.` and `..` resolved lexically
pub fn normalize_path(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// True when `path` is `dir` or lies beneath it, after normalization
pub fn path_within(path: &Path, dir: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(dir))
}

/// `#RRGGBB`
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse `major.minor[.patch]`, padding a missing patch with zero
pub fn semver_like(version: &str) -> Option<semver::Version> {
    let version = version.trim();
    let padded = match version.matches('.').count() {
        1 => format!("{}.0", version),
        _ => version.to_string(),
    };
    semver::Version::parse(&padded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        BuilderConfig::default().validate().unwrap();
    }

    #[test]
    fn test_resolved_url() {
        let gradle = GradleConfig::default();
        assert_eq!(
            gradle.resolved_url(),
            "https://services.gradle.org/distributions/gradle-7.6.4-bin.zip"
        );
    }

    #[test]
    fn test_sdk_order_is_checked() {
        let mut config = BuilderConfig::default();
        config.android.min_sdk = 34;
        let err = config.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert!(err.message.contains("min_sdk"));
    }

    #[test]
    fn test_bad_colour_is_rejected() {
        let mut config = BuilderConfig::default();
        config.theme.accent = "cyan".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("theme.accent"));
    }

    #[test]
    fn test_bad_checksum_is_rejected() {
        let mut config = BuilderConfig::default();
        config.gradle.sha256 = Some("abc".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_inside_build_dir_is_rejected() {
        let mut config = BuilderConfig::default();
        config.paths.build_dir = PathBuf::from("temp_build");
        config.paths.output_dir = PathBuf::from("temp_build/out");
        let err = config.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert!(err.message.contains("paths.output_dir"));
    }

    #[test]
    fn test_output_equal_to_build_dir_by_another_spelling_is_rejected() {
        let mut config = BuilderConfig::default();
        config.paths.build_dir = PathBuf::from("temp_build");
        config.paths.output_dir = PathBuf::from("./temp_build");
        assert!(config.validate().is_err());

        config.paths.output_dir = PathBuf::from("dist/../temp_build/");
        assert!(config.validate().is_err());

        let cwd = std::env::current_dir().unwrap();
        config.paths.output_dir = cwd.join("temp_build");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tools_inside_build_dir_is_rejected() {
        let mut config = BuilderConfig::default();
        config.paths.build_dir = PathBuf::from("/work/temp_build");
        config.paths.tools_dir = PathBuf::from("/work/temp_build/tools");
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("paths.tools_dir"));
    }

    #[test]
    fn test_sibling_directories_are_accepted() {
        let mut config = BuilderConfig::default();
        config.paths.build_dir = PathBuf::from("temp_build");
        config.paths.output_dir = PathBuf::from("temp_build_out");
        config.paths.tools_dir = PathBuf::from("/opt/obsidian/tools");
        config.validate().unwrap();
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(normalize_path(Path::new("./x")), cwd.join("x"));
        assert!(path_within(Path::new("/a/b"), Path::new("/a")));
        assert!(!path_within(Path::new("/ab"), Path::new("/a")));
    }

    #[test]
    fn test_semver_like() {
        assert_eq!(semver_like("7.4"), Some(semver::Version::new(7, 4, 0)));
        assert_eq!(semver_like("7.6.4"), Some(semver::Version::new(7, 6, 4)));
        assert!(semver_like("seven").is_none());
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#00E5FF"));
        assert!(!is_hex_color("00E5FF"));
        assert!(!is_hex_color("#00E5F"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: BuilderConfig = toml::from_str(
            r##"
            [paths]
            build_dir = "scratch"

            [theme]
            accent = "#FF00FF"
            "##,
        )
        .unwrap();
        assert_eq!(config.paths.build_dir, PathBuf::from("scratch"));
        assert_eq!(config.paths.output_dir, PathBuf::from("."));
        assert_eq!(config.theme.accent, "#FF00FF");
        assert_eq!(config.android.agp_version, "7.3.1");
        assert_eq!(config.build.task, "assembleDebug");
    }
}
