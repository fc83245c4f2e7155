use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GraphError, Result};

const DEFAULT_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "py", "java", "c", "h", "cpp", "cc", "cxx", "hpp",
    "hh", "go", "rs", "php", "rb", "css", "scss", "html", "htm", "json", "yaml", "yml",
];

const DEFAULT_LOCKFILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
    "Pipfile.lock",
    "composer.lock",
    "Gemfile.lock",
    "go.sum",
];

/// Tunables for archive filtering, block extraction and dependency scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Lower-case extensions admitted from the archive
    pub extensions: Vec<String>,
    /// Basenames that are never admitted
    pub lockfiles: Vec<String>,
    /// Raw score added when an import names the target file
    pub direct_import_score: u32,
    /// Lines after a signature searched for the opening brace
    pub brace_lookahead: usize,
    /// Lines scanned for the end of a block before giving up
    pub scan_window: usize,
    /// Bytes of each file scanned for references to other files
    pub max_scan_bytes: Option<usize>,
    /// Worker threads for per-file analysis; `None` uses the global pool
    pub threads: Option<usize>,
    pub categorization_timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            lockfiles: DEFAULT_LOCKFILES.iter().map(|s| s.to_string()).collect(),
            direct_import_score: 5,
            brace_lookahead: 3,
            scan_window: 200,
            max_scan_bytes: Some(1024 * 1024),
            threads: None,
            categorization_timeout_secs: 30,
        }
    }
}

impl AnalyzerConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AnalyzerConfig =
            toml::from_str(&contents).map_err(|err| GraphError::ConfigParse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(GraphError::config("at least one extension must be allowed"));
        }
        if self.direct_import_score == 0 {
            return Err(GraphError::config("direct_import_score must be positive"));
        }
        if self.scan_window == 0 {
            return Err(GraphError::config("scan_window must be at least 1"));
        }
        if self.threads == Some(0) {
            return Err(GraphError::config("threads must be at least 1"));
        }
        if self.max_scan_bytes == Some(0) {
            return Err(GraphError::config("max_scan_bytes must be positive when set"));
        }
        Ok(())
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        let lower = extension.to_ascii_lowercase();
        self.extensions.iter().any(|ext| *ext == lower)
    }

    pub fn is_lockfile(&self, basename: &str) -> bool {
        self.lockfiles.iter().any(|name| name == basename)
    }
}
