use serde::{Deserialize, Serialize};
use std::fmt;

/// Language tag used to pick an analyzer for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Java,
    C,
    Cpp,
    Json,
    Markdown,
    Css,
    Html,
    Yaml,
    Text,
    Go,
    Rust,
    Php,
    Ruby,
    #[serde(rename = "Other")]
    Other,
}

impl Language {
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "py" | "pyw" | "pyi" => Language::Python,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "json" => Language::Json,
            "md" | "markdown" => Language::Markdown,
            "css" | "scss" | "sass" | "less" => Language::Css,
            "html" | "htm" => Language::Html,
            "yaml" | "yml" => Language::Yaml,
            "txt" => Language::Text,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            _ => Language::Other,
        }
    }

    /// Classify an archive path by its extension
    pub fn from_path(path: &str) -> Self {
        let basename = path.rsplit('/').next().unwrap_or(path);
        match basename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Self::from_extension(ext),
            _ => Language::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Json => "json",
            Language::Markdown => "markdown",
            Language::Css => "css",
            Language::Html => "html",
            Language::Yaml => "yaml",
            Language::Text => "text",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Other => "Other",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
