use glob::Pattern;
use liveedit_tagger::{BuildMode, TaggerOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "liveedit.config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Invalid exclude pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
}

/// Live edit configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Source directory containing JSX/TSX files
    #[serde(default = "default_src_dir")]
    pub src_dir: String,

    /// File extensions to tag, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names holding third-party code
    #[serde(default = "default_vendor_dirs")]
    pub vendor_dirs: Vec<String>,

    /// Glob patterns, relative to the project root, for files to leave alone
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Where tagged files are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    /// Write a `.map` file next to each tagged file
    #[serde(default)]
    pub source_maps: bool,
}

fn default_src_dir() -> String {
    "src".to_string()
}

fn default_extensions() -> Vec<String> {
    TaggerOptions::default().extensions
}

fn default_vendor_dirs() -> Vec<String> {
    TaggerOptions::default().vendor_dirs
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> Result<Self, ConfigError> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let path = config_path.display().to_string();
        let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Get absolute path to source directory
    pub fn get_src_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.src_dir)
    }

    pub fn get_out_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(self.out_dir.as_deref().unwrap_or("dist"))
    }

    pub fn exclude_patterns(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.exclude
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    pub fn to_tagger_options(&self, mode: BuildMode) -> TaggerOptions {
        TaggerOptions {
            extensions: self.extensions.clone(),
            vendor_dirs: self.vendor_dirs.clone(),
            ..TaggerOptions::default()
        }
        .with_mode(mode)
        .with_source_maps(self.source_maps)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            extensions: default_extensions(),
            vendor_dirs: default_vendor_dirs(),
            exclude: vec![],
            out_dir: None,
            source_maps: false,
        }
    }
}
