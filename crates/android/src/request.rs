//! Operator inputs and the names derived from them

use obsidian_core::error::{Error, ErrorCode, Result};
use std::path::{Path, PathBuf};
use url::Url;

/// Identifier used when the app name has no usable characters
pub const FALLBACK_IDENTIFIER: &str = "myapp";

/// Java reserved words and literals; none may appear as a package segment
const JAVA_RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "null", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while", "var", "record", "yield",
];

/// Characters no common filesystem accepts in a file name
const RESERVED_FILE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Everything one build needs from the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Display label, kept verbatim
    pub app_name: String,
    /// Absolute http(s) URL loaded by the WebView
    pub target_url: String,
    /// Source icon, quotes stripped and `~` expanded
    pub icon_path: PathBuf,
    /// Lowercase ASCII alphanumeric token, `[a-z][a-z0-9]*`
    pub identifier: String,
    /// `com.<identifier>.web`
    pub package_id: String,
}

impl BuildRequest {
    /// Validate and normalize raw inputs.
    ///
    /// The name never fails (it falls back to [`FALLBACK_IDENTIFIER`]); an
    /// empty or non-http(s) URL and an empty icon path are input errors.
    pub fn new(app_name: &str, target_url: &str, icon_path: &str) -> Result<Self> {
        let app_name = app_name.trim().to_string();
        let target_url = normalize_url(target_url)?;
        let icon_path = normalize_icon_path(icon_path)?;
        let identifier = derive_identifier(&app_name);
        let package_id = package_id_for(&identifier);

        Ok(Self {
            app_name,
            target_url,
            icon_path,
            identifier,
            package_id,
        })
    }

    /// Label shown under the launcher icon; falls back to the identifier
    pub fn label(&self) -> &str {
        if self.app_name.is_empty() {
            &self.identifier
        } else {
            &self.app_name
        }
    }

    /// Output file name for the finished package
    pub fn apk_file_name(&self) -> String {
        apk_file_name(&self.app_name)
    }

    /// Package directory relative to `app/src/main/java`
    pub fn package_dir(&self) -> PathBuf {
        self.package_id.split('.').collect()
    }
}

/// Reduce a display name to a valid Java package segment
pub fn derive_identifier(app_name: &str) -> String {
    let mut id: String = app_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if id.is_empty() {
        return FALLBACK_IDENTIFIER.to_string();
    }
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert_str(0, "app");
    }
    if JAVA_RESERVED.contains(&id.as_str()) {
        id.push_str("app");
    }
    id
}

/// `com.<identifier>.web`
pub fn package_id_for(identifier: &str) -> String {
    format!("com.{}.web", identifier)
}

/// Filesystem-safe `<name>.apk`
pub fn apk_file_name(app_name: &str) -> String {
    let mut stem = String::with_capacity(app_name.len());
    let mut in_space = false;
    for c in app_name.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                stem.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if RESERVED_FILE_CHARS.contains(&c) || c.is_control() {
            stem.push('_');
        } else {
            stem.push(c);
        }
    }
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        stem = FALLBACK_IDENTIFIER.to_string();
    }
    format!("{}.apk", stem)
}

/// Accept an absolute http(s) URL, or a bare host that gets `https://`
pub fn normalize_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::new(ErrorCode::InvalidUrl, "Website URL is empty")
            .with_suggestion("Enter the address the app should open, e.g. https://example.com"));
    }

    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let parsed = Url::parse(&candidate).map_err(|e| {
        Error::new(ErrorCode::InvalidUrl, format!("Invalid URL '{}': {}", raw, e))
            .with_suggestion("Use an absolute address such as https://example.com")
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::new(
                ErrorCode::InvalidUrl,
                format!("Unsupported URL scheme '{}'", other),
            )
            .with_suggestion("Only http and https URLs can be wrapped"));
        }
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::new(ErrorCode::InvalidUrl, format!("URL '{}' has no host", raw)));
    }

    Ok(parsed.to_string())
}

/// Strip one level of surrounding quotes and expand `~`
pub fn normalize_icon_path(raw: &str) -> Result<PathBuf> {
    let mut trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            trimmed = &trimmed[1..trimmed.len() - 1];
            break;
        }
    }
    if trimmed.is_empty() {
        return Err(Error::invalid_input("Icon path is empty")
            .with_suggestion("Provide the path to a PNG or JPEG image"));
    }
    let expanded = shellexpand::tilde(trimmed);
    Ok(Path::new(expanded.as_ref()).to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identifier_strips_and_lowercases() {
        assert_eq!(derive_identifier("My Cool App!"), "mycoolapp");
        assert_eq!(derive_identifier("Café Ümlaut"), "cafmlaut");
    }

    #[test]
    fn test_identifier_fallback() {
        assert_eq!(derive_identifier(""), "myapp");
        assert_eq!(derive_identifier("!!! ???"), "myapp");
        assert_eq!(derive_identifier("日本語"), "myapp");
    }

    #[test]
    fn test_identifier_leading_digit_and_keyword() {
        assert_eq!(derive_identifier("9 Lives"), "app9lives");
        assert_eq!(derive_identifier("Class"), "classapp");
        assert_eq!(derive_identifier("New"), "newapp");
    }

    #[test]
    fn test_package_id() {
        let req = BuildRequest::new("My Cool App!", "https://example.com", "icon.png").unwrap();
        assert_eq!(req.identifier, "mycoolapp");
        assert_eq!(req.package_id, "com.mycoolapp.web");
        assert_eq!(req.package_dir(), PathBuf::from("com/mycoolapp/web"));
    }

    #[test]
    fn test_apk_file_name() {
        assert_eq!(apk_file_name("My Cool App!"), "My_Cool_App!.apk");
        assert_eq!(apk_file_name("  spaced   out  "), "spaced_out.apk");
        assert_eq!(apk_file_name("a/b:c"), "a_b_c.apk");
        assert_eq!(apk_file_name(""), "myapp.apk");
        assert_eq!(apk_file_name(".."), "myapp.apk");
    }

    #[test]
    fn test_url_validation() {
        assert_eq!(normalize_url("https://example.com").unwrap(), "https://example.com/");
        assert_eq!(normalize_url("example.com/path").unwrap(), "https://example.com/path");
        assert_eq!(
            normalize_url("http://example.com/a?b=c&d=\"e\"").unwrap(),
            "http://example.com/a?b=c&d=%22e%22"
        );
    }

    #[test]
    fn test_url_rejections() {
        for bad in ["", "   ", "ftp://example.com", "javascript://alert(1)", "http://"] {
            let err = normalize_url(bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidUrl, "input {:?}", bad);
        }
    }

    #[test]
    fn test_icon_path_quotes_and_tilde() {
        assert_eq!(
            normalize_icon_path("\"/tmp/my icon.png\"").unwrap(),
            PathBuf::from("/tmp/my icon.png")
        );
        assert_eq!(normalize_icon_path("'/tmp/a.png'").unwrap(), PathBuf::from("/tmp/a.png"));
        let expanded = normalize_icon_path("~/icon.png").unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~') || dirs_home_missing());
        assert!(normalize_icon_path("  ").is_err());
    }

    fn dirs_home_missing() -> bool {
        std::env::var_os("HOME").is_none()
    }

    #[test]
    fn test_empty_name_uses_fallback_label() {
        let req = BuildRequest::new("   ", "example.com", "icon.png").unwrap();
        assert_eq!(req.label(), "myapp");
        assert_eq!(req.apk_file_name(), "myapp.apk");
    }

    proptest! {
        #[test]
        fn prop_identifier_is_java_segment(name in any::<String>()) {
            let id = derive_identifier(&name);
            prop_assert!(!id.is_empty());
            prop_assert!(id.starts_with(|c: char| c.is_ascii_lowercase()));
            prop_assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
            prop_assert!(!JAVA_RESERVED.contains(&id.as_str()));
        }

        #[test]
        fn prop_package_id_has_three_segments(name in any::<String>()) {
            let pkg = package_id_for(&derive_identifier(&name));
            let segments: Vec<&str> = pkg.split('.').collect();
            prop_assert_eq!(segments.len(), 3);
            prop_assert_eq!(segments[0], "com");
            prop_assert_eq!(segments[2], "web");
        }

        #[test]
        fn prop_apk_file_name_is_safe(name in any::<String>()) {
            let file = apk_file_name(&name);
            prop_assert!(file.ends_with(".apk"));
            prop_assert!(file.len() > 4);
            prop_assert!(!file.chars().any(|c| RESERVED_FILE_CHARS.contains(&c) || c.is_control()));
            prop_assert!(!file.chars().any(char::is_whitespace));
        }
    }
}
