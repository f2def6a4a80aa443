//! Renderers for every text artifact of the generated project
//!
//! Each renderer is a pure function of [`TemplateParams`]. Operator input is
//! escaped for the syntax it lands in via [`crate::escape`].

mod activity;
mod gradle;
mod resources;

pub use activity::main_activity_java;
pub use gradle::{app_build_gradle, gradle_properties, local_properties, settings_gradle};
pub use resources::{
    layout_xml, manifest, menu_xml, progress_drawable_xml, strings_xml, styles_xml,
};

use crate::request::BuildRequest;
use obsidian_core::config::{AndroidConfig, BuilderConfig, ThemeConfig};

/// Inputs shared by all renderers
#[derive(Debug, Clone, Copy)]
pub struct TemplateParams<'a> {
    /// Display label
    pub app_name: &'a str,
    /// `com.<identifier>.web`
    pub package_id: &'a str,
    /// Sanitized token used as the Gradle root project name
    pub identifier: &'a str,
    /// URL the WebView opens
    pub target_url: &'a str,
    /// SDK levels, plugin version and JVM settings
    pub android: &'a AndroidConfig,
    /// App colours
    pub theme: &'a ThemeConfig,
}

impl<'a> TemplateParams<'a> {
    /// Borrow everything from a request and the run configuration
    pub fn new(request: &'a BuildRequest, config: &'a BuilderConfig) -> Self {
        Self {
            app_name: request.label(),
            package_id: &request.package_id,
            identifier: &request.identifier,
            target_url: &request.target_url,
            android: &config.android,
            theme: &config.theme,
        }
    }
}

/// `#RRGGBB` as an opaque Java ARGB int literal, e.g. `0xFF00E5FF`
pub(crate) fn argb_literal(hex: &str) -> String {
    format!("0xFF{}", hex.trim_start_matches('#').to_ascii_uppercase())
}
