//! Project scaffolding
//!
//! The whole tree is rendered in memory first, then the build directory is
//! recreated from scratch and every file written. Launcher icons are written
//! last, into `app/src/main/res`.

use crate::request::BuildRequest;
use crate::templates::{self, TemplateParams};
use obsidian_core::config::BuilderConfig;
use obsidian_core::error::{Error, ErrorCode, Result, ResultExt};
use obsidian_image::{IconSet, SourceIcon};
use std::path::{Path, PathBuf};

/// Main source set, relative to the project root
const MAIN_DIR: &str = "app/src/main";

/// Contents of one generated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectFile {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Binary(Vec<u8>),
}

impl ProjectFile {
    fn as_bytes(&self) -> &[u8] {
        match self {
            ProjectFile::Text(s) => s.as_bytes(),
            ProjectFile::Binary(b) => b,
        }
    }
}

/// Ordered set of files relative to the project root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTree {
    files: Vec<(PathBuf, ProjectFile)>,
}

impl ProjectTree {
    /// Render every text artifact for `request`
    pub fn render(request: &BuildRequest, config: &BuilderConfig) -> Self {
        let p = TemplateParams::new(request, config);
        let main = Path::new(MAIN_DIR);
        let res = main.join("res");
        let java = main.join("java").join(request.package_dir());

        let mut tree = Self::default();
        tree.push("settings.gradle", templates::settings_gradle(&p));
        tree.push("local.properties", templates::local_properties(&p));
        tree.push("gradle.properties", templates::gradle_properties(&p));
        tree.push("app/build.gradle", templates::app_build_gradle(&p));
        tree.push(main.join("AndroidManifest.xml"), templates::manifest(&p));
        tree.push(java.join("MainActivity.java"), templates::main_activity_java(&p));
        tree.push(res.join("values/strings.xml"), templates::strings_xml(&p));
        tree.push(res.join("values/styles.xml"), templates::styles_xml(&p));
        tree.push(res.join("layout/activity_main.xml"), templates::layout_xml(&p));
        tree.push(res.join("drawable/neon_progress.xml"), templates::progress_drawable_xml(&p));
        tree.push(res.join("menu/main_menu.xml"), templates::menu_xml(&p));
        tree
    }

    /// Append a text file
    pub fn push(&mut self, path: impl Into<PathBuf>, content: String) {
        self.files.push((path.into(), ProjectFile::Text(content)));
    }

    /// Append a binary file
    pub fn push_binary(&mut self, path: impl Into<PathBuf>, content: Vec<u8>) {
        self.files.push((path.into(), ProjectFile::Binary(content)));
    }

    /// Look a file up by relative path
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&ProjectFile> {
        let path = path.as_ref();
        self.files.iter().find(|(p, _)| p == path).map(|(_, f)| f)
    }

    /// Relative paths in write order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(p, _)| p.as_path())
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the tree has no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file under `root`, creating parents on demand.
    ///
    /// Stops at the first failure.
    pub fn write_to(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.files.len());
        for (rel, file) in &self.files {
            let path = root.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Creating {}", parent.display()))?;
            }
            std::fs::write(&path, file.as_bytes())
                .with_context(|| format!("Writing {}", path.display()))?;
            tracing::trace!(path = %rel.display(), "File written");
            written.push(path);
        }
        Ok(written)
    }
}

/// Outcome of a scaffold run
#[derive(Debug, Clone)]
pub struct ScaffoldedProject {
    /// Project root (the build directory)
    pub root: PathBuf,
    /// Text artifacts written, in order
    pub files: Vec<PathBuf>,
    /// Launcher icons written
    pub icons: IconSet,
}

impl ScaffoldedProject {
    /// `app/src/main/res` under the root
    pub fn res_dir(&self) -> PathBuf {
        self.root.join(MAIN_DIR).join("res")
    }
}

/// Lays out the Android project in the configured build directory
#[derive(Debug, Clone)]
pub struct Scaffolder<'a> {
    config: &'a BuilderConfig,
}

impl<'a> Scaffolder<'a> {
    /// Scaffolder writing into `config.paths.build_dir`
    pub fn new(config: &'a BuilderConfig) -> Self {
        Self { config }
    }

    /// Directory the project is written to
    pub fn root(&self) -> &Path {
        &self.config.paths.build_dir
    }

    /// Decode the request's icon, then lay out the project
    pub fn scaffold(&self, request: &BuildRequest) -> Result<ScaffoldedProject> {
        let icon = obsidian_image::probe_icon(&request.icon_path)?;
        self.scaffold_with_icon(request, &icon)
    }

    /// Lay out the project using an already decoded icon
    pub fn scaffold_with_icon(
        &self,
        request: &BuildRequest,
        icon: &SourceIcon,
    ) -> Result<ScaffoldedProject> {
        let root = self.root().to_path_buf();
        let tree = ProjectTree::render(request, self.config);
        // Icons are rendered before anything on disk changes.
        let rendered = obsidian_image::render_icons(icon);

        reset_dir(&root)?;
        std::fs::create_dir_all(root.join(MAIN_DIR).join("java").join(request.package_dir()))
            .with_context(|| format!("Creating package directory in {}", root.display()))?;

        let files = tree.write_to(&root)?;
        tracing::info!(root = %root.display(), files = files.len(), "Project files written");

        let res_dir = root.join(MAIN_DIR).join("res");
        let icons = obsidian_image::write_icons(rendered, &res_dir)?;
        tracing::info!(count = icons.icons.len(), "Launcher icons written");

        Ok(ScaffoldedProject { root, files, icons })
    }
}

/// Remove `dir` if it exists and create it empty
fn reset_dir(dir: &Path) -> Result<()> {
    if dir.file_name().is_none() {
        return Err(Error::new(
            ErrorCode::InvalidPath,
            format!("Refusing to use '{}' as the build directory", dir.display()),
        )
        .with_suggestion("Set paths.build_dir to a dedicated directory such as temp_build"));
    }
    if dir.exists() {
        tracing::debug!(dir = %dir.display(), "Removing previous build directory");
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("Removing {}", dir.display()))?;
    }
    std::fs::create_dir_all(dir).with_context(|| format!("Creating {}", dir.display()))?;
    Ok(())
}
