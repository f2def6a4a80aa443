//! Gradle bootstrap
//!
//! Resolution order:
//! 1. a managed install under `<tools_dir>/gradle-<version>`
//! 2. a compatible `gradle` on PATH
//! 3. download of the pinned distribution, verified and unpacked into the
//!    tools directory, where later runs find it as (1)

use crate::error::BootstrapError;
use indicatif::ProgressBar;
use obsidian_core::config::{BuilderConfig, GradleConfig, semver_like};
use obsidian_core::error::Result;
use obsidian_core::process::{run_command, which_command};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

static GRADLE_VERSION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*Gradle\s+(\d+\.\d+(?:\.\d+)?)").expect("static regex is valid")
});

/// Where a build tool came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSource {
    /// Preinstalled and found on PATH
    System,
    /// Fetched by this tool into the tools directory
    Managed,
}

impl std::fmt::Display for ToolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolSource::System => write!(f, "system"),
            ToolSource::Managed => write!(f, "managed"),
        }
    }
}

/// A usable Gradle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildToolInstallation {
    /// Launcher to invoke
    pub executable: PathBuf,
    /// Reported or pinned version
    pub version: String,
    /// Where it came from
    pub source: ToolSource,
}

/// Supplies a build tool for the pipeline
pub trait ToolProvider {
    /// Find or install the build tool
    fn resolve(&self) -> Result<BuildToolInstallation>;
}

impl<T: ToolProvider + ?Sized> ToolProvider for &T {
    fn resolve(&self) -> Result<BuildToolInstallation> {
        (**self).resolve()
    }
}

/// Finds or installs the pinned Gradle distribution
#[derive(Debug, Clone)]
pub struct GradleBootstrapper<'a> {
    gradle: &'a GradleConfig,
    tools_dir: PathBuf,
    show_progress: bool,
}

impl<'a> GradleBootstrapper<'a> {
    /// Bootstrapper for the configured version and tools directory
    pub fn new(config: &'a BuilderConfig) -> Self {
        Self {
            gradle: &config.gradle,
            tools_dir: config.paths.tools_dir.clone(),
            show_progress: true,
        }
    }

    /// Draw a progress bar while downloading (default on)
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// `<tools_dir>/gradle-<version>`
    pub fn managed_dir(&self) -> PathBuf {
        self.tools_dir.join(format!("gradle-{}", self.gradle.version))
    }

    /// Launcher inside the managed install
    pub fn managed_executable(&self) -> PathBuf {
        launcher_in(&self.managed_dir())
    }

    /// Download destination
    pub fn archive_path(&self) -> PathBuf {
        self.tools_dir
            .join(format!("gradle-{}-bin.zip", self.gradle.version))
    }

    /// Managed install left by an earlier run
    pub fn find_managed(&self) -> Option<BuildToolInstallation> {
        let executable = self.managed_executable();
        executable.is_file().then(|| BuildToolInstallation {
            executable,
            version: self.gradle.version.clone(),
            source: ToolSource::Managed,
        })
    }

    /// Compatible `gradle` on PATH, if any
    pub fn find_system(&self) -> Option<BuildToolInstallation> {
        let executable = which_command("gradle")?;
        let output = match run_command(&executable.to_string_lossy(), &["--version"]) {
            Ok(result) if result.success => result.stdout,
            Ok(result) => {
                tracing::debug!(exit_code = result.exit_code, "gradle --version failed");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Could not run system gradle");
                return None;
            }
        };

        let version = parse_gradle_version(&output)?;
        if !self.is_compatible(&version) {
            tracing::info!(
                found = %version,
                pinned = %self.gradle.version,
                min = %self.gradle.min_version,
                "System Gradle is not compatible, ignoring it"
            );
            return None;
        }

        Some(BuildToolInstallation {
            executable,
            version: version.to_string(),
            source: ToolSource::System,
        })
    }

    /// Same major version as the pinned one and at least `min_version`
    pub fn is_compatible(&self, version: &semver::Version) -> bool {
        let (Some(pinned), Some(min)) = (
            semver_like(&self.gradle.version),
            semver_like(&self.gradle.min_version),
        ) else {
            return false;
        };
        version.major == pinned.major && *version >= min
    }

    /// Download, verify and unpack the pinned distribution
    pub fn fetch(&self) -> Result<BuildToolInstallation> {
        fs::create_dir_all(&self.tools_dir)
            .map_err(|e| BootstrapError::io("Creating", &self.tools_dir, e))?;

        let url = self.gradle.resolved_url();
        let client = http_client()?;

        let expected = if self.gradle.verify_checksum {
            Some(self.expected_digest(&client, &url)?)
        } else {
            tracing::warn!(url = %url, "Checksum verification disabled");
            None
        };

        let archive = self.archive_path();
        tracing::info!(url = %url, dest = %archive.display(), "Downloading Gradle");
        let actual = self.download(&client, &url, &archive)?;

        if let Some(expected) = expected {
            verify_digest(&archive, &expected, &actual)?;
            tracing::debug!(sha256 = %actual, "Checksum verified");
        }

        Ok(self.unpack(&archive)?)
    }

    /// Digest from config, else from the publisher's `<url>.sha256`
    fn expected_digest(
        &self,
        client: &reqwest::blocking::Client,
        url: &str,
    ) -> std::result::Result<String, BootstrapError> {
        if let Some(sum) = &self.gradle.sha256 {
            return Ok(sum.to_ascii_lowercase());
        }

        let sum_url = format!("{}.sha256", url);
        let body = client
            .get(&sum_url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| BootstrapError::ChecksumUnavailable {
                url: sum_url.clone(),
                reason: e.to_string(),
            })?;

        parse_digest(&body).ok_or_else(|| BootstrapError::ChecksumUnavailable {
            url: sum_url,
            reason: "response is not a SHA-256 hex digest".to_string(),
        })
    }

    /// Stream `url` into `dest`, returning the hex SHA-256 of the bytes
    fn download(
        &self,
        client: &reqwest::blocking::Client,
        url: &str,
        dest: &Path,
    ) -> std::result::Result<String, BootstrapError> {
        let response = client
            .get(url)
            .send()
            .map_err(|source| BootstrapError::Download {
                url: url.to_string(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(BootstrapError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let pb = if self.show_progress {
            obsidian_cli::progress::download_bar(response.content_length(), "Gradle")
        } else {
            ProgressBar::hidden()
        };

        let result = write_hashed(pb.wrap_read(response), dest);
        match &result {
            Ok(_) => obsidian_cli::progress::finish_success(&pb, "Gradle downloaded"),
            Err(_) => {
                obsidian_cli::progress::finish_error(&pb, "Download interrupted");
                let _ = fs::remove_file(dest);
            }
        }
        result
    }

    /// Unpack `archive` into the managed directory and delete it.
    ///
    /// Entries are extracted into a staging directory first so an interrupted
    /// unpack never looks like a finished install.
    pub fn unpack(&self, archive: &Path) -> std::result::Result<BuildToolInstallation, BootstrapError> {
        let staging = self
            .tools_dir
            .join(format!(".gradle-{}.staging", self.gradle.version));
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .map_err(|e| BootstrapError::io("Removing", &staging, e))?;
        }

        extract_zip(archive, &staging)?;

        let unpacked = staging.join(format!("gradle-{}", self.gradle.version));
        let launcher = launcher_in(&unpacked);
        if !launcher.is_file() {
            let _ = fs::remove_dir_all(&staging);
            return Err(BootstrapError::MissingExecutable(
                self.managed_executable(),
            ));
        }
        mark_executable(&launcher)?;

        let target = self.managed_dir();
        if target.exists() {
            fs::remove_dir_all(&target).map_err(|e| BootstrapError::io("Removing", &target, e))?;
        }
        fs::rename(&unpacked, &target).map_err(|e| BootstrapError::io("Moving", &unpacked, e))?;
        let _ = fs::remove_dir_all(&staging);
        fs::remove_file(archive).map_err(|e| BootstrapError::io("Removing", archive, e))?;

        let executable = self.managed_executable();
        if !executable.is_file() {
            return Err(BootstrapError::MissingExecutable(executable));
        }
        tracing::info!(path = %executable.display(), "Gradle installed");
        Ok(BuildToolInstallation {
            executable,
            version: self.gradle.version.clone(),
            source: ToolSource::Managed,
        })
    }
}

impl ToolProvider for GradleBootstrapper<'_> {
    fn resolve(&self) -> Result<BuildToolInstallation> {
        if let Some(install) = self.find_managed() {
            tracing::info!(path = %install.executable.display(), "Using managed Gradle");
            return Ok(install);
        }
        if self.gradle.prefer_system {
            if let Some(install) = self.find_system() {
                tracing::info!(
                    path = %install.executable.display(),
                    version = %install.version,
                    "Using system Gradle"
                );
                return Ok(install);
            }
        }
        self.fetch()
    }
}

/// `bin/gradle` (or `bin\gradle.bat`) under a distribution root
fn launcher_in(root: &Path) -> PathBuf {
    let name = if cfg!(windows) { "gradle.bat" } else { "gradle" };
    root.join("bin").join(name)
}

fn http_client() -> std::result::Result<reqwest::blocking::Client, BootstrapError> {
    reqwest::blocking::Client::builder()
        .user_agent(concat!("obsidian-builder/", env!("CARGO_PKG_VERSION")))
        .timeout(None::<std::time::Duration>)
        .build()
        .map_err(|source| BootstrapError::Download {
            url: String::new(),
            source,
        })
}

/// Version from `gradle --version` output
pub fn parse_gradle_version(output: &str) -> Option<semver::Version> {
    let caps = GRADLE_VERSION_LINE.captures(output)?;
    semver_like(caps.get(1)?.as_str())
}

/// First token of a `.sha256` file, if it is a hex digest
pub fn parse_digest(body: &str) -> Option<String> {
    let token = body.split_whitespace().next()?;
    (token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit()))
        .then(|| token.to_ascii_lowercase())
}

/// Compare digests; on mismatch the archive is deleted
pub fn verify_digest(
    archive: &Path,
    expected: &str,
    actual: &str,
) -> std::result::Result<(), BootstrapError> {
    if expected.eq_ignore_ascii_case(actual) {
        return Ok(());
    }
    let _ = fs::remove_file(archive);
    Err(BootstrapError::ChecksumMismatch {
        expected: expected.to_ascii_lowercase(),
        actual: actual.to_ascii_lowercase(),
    })
}

/// Writer that hashes everything passing through
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Copy `reader` to a new file at `dest`, returning the hex SHA-256
fn write_hashed(mut reader: impl io::Read, dest: &Path) -> std::result::Result<String, BootstrapError> {
    let file = File::create(dest).map_err(|e| BootstrapError::io("Creating", dest, e))?;
    let mut writer = HashingWriter {
        inner: BufWriter::new(file),
        hasher: Sha256::new(),
    };
    io::copy(&mut reader, &mut writer).map_err(|e| BootstrapError::io("Writing", dest, e))?;
    writer
        .flush()
        .map_err(|e| BootstrapError::io("Writing", dest, e))?;
    Ok(hex::encode(writer.hasher.finalize()))
}

/// Extract every entry of `archive` below `dest`
fn extract_zip(archive: &Path, dest: &Path) -> std::result::Result<(), BootstrapError> {
    let file = File::open(archive).map_err(|e| BootstrapError::io("Opening", archive, e))?;
    let mut zip = zip::ZipArchive::new(file)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let rel = entry
            .enclosed_name()
            .ok_or_else(|| BootstrapError::UnsafeEntry(entry.name().to_string()))?;
        let out = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| BootstrapError::io("Creating", &out, e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| BootstrapError::io("Creating", parent, e))?;
        }
        let mut target = File::create(&out).map_err(|e| BootstrapError::io("Creating", &out, e))?;
        io::copy(&mut entry, &mut target).map_err(|e| BootstrapError::io("Writing", &out, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out, fs::Permissions::from_mode(mode & 0o777))
                .map_err(|e| BootstrapError::io("Setting permissions on", &out, e))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> std::result::Result<(), BootstrapError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .map_err(|e| BootstrapError::io("Reading", path, e))?
        .permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms).map_err(|e| BootstrapError::io("Setting permissions on", path, e))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> std::result::Result<(), BootstrapError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::write::SimpleFileOptions;

    fn config_in(dir: &Path) -> BuilderConfig {
        let mut config = BuilderConfig::default();
        config.paths.tools_dir = dir.join("tools");
        config.gradle.prefer_system = false;
        config
    }

    /// Minimal distribution layout with a launcher script
    fn write_distribution(path: &Path, version: &str) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opts = SimpleFileOptions::default;
        zip.add_directory(format!("gradle-{}/", version), opts()).unwrap();
        zip.start_file(format!("gradle-{}/bin/gradle", version), opts().unix_permissions(0o644))
            .unwrap();
        zip.write_all(b"#!/bin/sh\necho gradle\n").unwrap();
        zip.start_file(format!("gradle-{}/bin/gradle.bat", version), opts())
            .unwrap();
        zip.write_all(b"@echo gradle\r\n").unwrap();
        zip.start_file(format!("gradle-{}/lib/gradle-launcher.jar", version), opts())
            .unwrap();
        zip.write_all(b"PK").unwrap();
        zip.finish().unwrap();
    }

    fn sha256_file(path: &Path) -> String {
        let mut data = Vec::new();
        File::open(path).unwrap().read_to_end(&mut data).unwrap();
        hex::encode(Sha256::digest(&data))
    }

    #[test]
    fn test_parse_gradle_version() {
        let out = "\n------------------------------------------------------------\nGradle 7.6.4\n------------------------------------------------------------\n\nBuild time:   2024-02-05\n";
        assert_eq!(parse_gradle_version(out), Some(semver::Version::new(7, 6, 4)));
        assert_eq!(parse_gradle_version("Gradle 8.5\n"), Some(semver::Version::new(8, 5, 0)));
        assert_eq!(parse_gradle_version("Welcome to Gradle!"), None);
    }

    #[test]
    fn test_compatibility() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let boot = GradleBootstrapper::new(&config);
        assert!(boot.is_compatible(&semver::Version::new(7, 4, 0)));
        assert!(boot.is_compatible(&semver::Version::new(7, 6, 4)));
        assert!(!boot.is_compatible(&semver::Version::new(7, 3, 3)));
        assert!(!boot.is_compatible(&semver::Version::new(8, 5, 0)));
        assert!(!boot.is_compatible(&semver::Version::new(6, 9, 0)));
    }

    #[test]
    fn test_parse_digest() {
        let sum = "a".repeat(64);
        assert_eq!(parse_digest(&format!("{}  gradle.zip\n", sum)), Some(sum.clone()));
        assert_eq!(parse_digest(&sum.to_uppercase()), Some(sum));
        assert_eq!(parse_digest("<html>not found</html>"), None);
        assert_eq!(parse_digest(""), None);
    }

    #[test]
    fn test_existing_managed_install_is_used_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let boot = GradleBootstrapper::new(&config).with_progress(false);
        let exe = boot.managed_executable();
        fs::create_dir_all(exe.parent().unwrap()).unwrap();
        fs::write(&exe, "#!/bin/sh\n").unwrap();

        let install = boot.resolve().unwrap();
        assert_eq!(install.source, ToolSource::Managed);
        assert_eq!(install.executable, exe);
        assert_eq!(install.version, "7.6.4");
        // Idempotent.
        assert_eq!(boot.resolve().unwrap(), install);
    }

    #[test]
    fn test_unpack_installs_and_removes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let boot = GradleBootstrapper::new(&config).with_progress(false);
        fs::create_dir_all(&config.paths.tools_dir).unwrap();
        let archive = boot.archive_path();
        write_distribution(&archive, "7.6.4");

        let install = boot.unpack(&archive).unwrap();
        assert_eq!(install.source, ToolSource::Managed);
        assert!(install.executable.is_file());
        assert!(!archive.exists());
        assert!(boot.managed_dir().join("lib/gradle-launcher.jar").is_file());
        assert!(boot.find_managed().is_some());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&install.executable).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_unpack_without_launcher_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let boot = GradleBootstrapper::new(&config).with_progress(false);
        fs::create_dir_all(&config.paths.tools_dir).unwrap();
        let archive = boot.archive_path();
        // Distribution for a different version: no gradle-7.6.4/bin/gradle.
        write_distribution(&archive, "7.5.1");

        let err = boot.unpack(&archive).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingExecutable(_)));
        assert!(boot.find_managed().is_none());
    }

    #[test]
    fn test_unsafe_entry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
        zip.start_file("../escape.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"x").unwrap();
        zip.finish().unwrap();

        let err = extract_zip(&archive, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, BootstrapError::UnsafeEntry(_)));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_checksum_mismatch_deletes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("gradle-7.6.4-bin.zip");
        write_distribution(&archive, "7.6.4");
        let actual = sha256_file(&archive);

        verify_digest(&archive, &actual.to_uppercase(), &actual).unwrap();
        assert!(archive.exists());

        let err = verify_digest(&archive, &"0".repeat(64), &actual).unwrap_err();
        assert!(matches!(err, BootstrapError::ChecksumMismatch { .. }));
        assert!(!archive.exists());
    }

    #[test]
    fn test_write_hashed_matches_file_digest() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("blob");
        let digest = write_hashed(&b"hello gradle"[..], &dest).unwrap();
        assert_eq!(digest, sha256_file(&dest));
        assert_eq!(fs::read(&dest).unwrap(), b"hello gradle");
    }
}
