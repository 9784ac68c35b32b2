use std::collections::BTreeSet;
use std::path::Path;

/// Structural and document-metadata elements that are never selectable content.
pub const DEFAULT_EXCLUDED_ELEMENTS: &[&str] = &[
    "Fragment",
    "React.Fragment",
    "Html",
    "Head",
    "body",
    "Main",
    "NextScript",
    "html",
    "head",
    "title",
    "meta",
    "link",
    "script",
    "style",
    "base",
    "noscript",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// `NODE_ENV=development` selects development; anything else, including
    /// an unset variable, is treated as a production build.
    pub fn from_env() -> Self {
        Self::from_node_env(std::env::var("NODE_ENV").ok().as_deref())
    }

    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("development") => BuildMode::Development,
            _ => BuildMode::Production,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaggerOptions {
    pub mode: BuildMode,

    /// File extensions (without the dot) that hold markup
    pub extensions: Vec<String>,

    /// Directory names whose contents are third-party code
    pub vendor_dirs: Vec<String>,

    /// Resolved element names that never receive an identity
    pub excluded_elements: BTreeSet<String>,

    /// Produce a source map alongside the tagged code
    pub source_maps: bool,
}

impl TaggerOptions {
    pub fn from_env() -> Self {
        Self {
            mode: BuildMode::from_env(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_source_maps(mut self, enabled: bool) -> Self {
        self.source_maps = enabled;
        self
    }

    pub fn is_excluded(&self, element_name: &str) -> bool {
        self.excluded_elements.contains(element_name)
    }

    /// Whether `file_path` should be tagged at all under these options.
    pub fn applies_to(&self, file_path: &str) -> bool {
        if self.mode != BuildMode::Development {
            return false;
        }

        let has_markup_extension = Path::new(file_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|allowed| allowed == ext))
            .unwrap_or(false);
        if !has_markup_extension {
            return false;
        }

        !file_path
            .split(['/', '\\'])
            .any(|component| self.vendor_dirs.iter().any(|vendor| vendor == component))
    }
}

impl Default for TaggerOptions {
    fn default() -> Self {
        Self {
            mode: BuildMode::Development,
            extensions: ["js", "jsx", "ts", "tsx"].iter().map(|s| s.to_string()).collect(),
            vendor_dirs: vec!["node_modules".to_string()],
            excluded_elements: DEFAULT_EXCLUDED_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            source_maps: false,
        }
    }
}

/// Project-relative, forward-slash form of `path` used inside identities.
///
/// Paths outside `root` are kept as given, minus any leading separator.
pub fn relative_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let display = relative.to_string_lossy().replace('\\', "/");
    display.trim_start_matches('/').to_string()
}
