use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning an archive into a dependency graph
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("invalid or corrupt archive: {0}")]
    InvalidArchive(String),

    #[error("no valid files: the archive contains no recognizable source files")]
    EmptyArchive,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("config validation error: {0}")]
    Config(String),

    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    #[error("analysis error in {path}: {message}")]
    Analysis { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, GraphError>;

impl GraphError {
    pub fn invalid_archive(msg: impl Into<String>) -> Self {
        GraphError::InvalidArchive(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        GraphError::Config(msg.into())
    }

    pub fn analysis(path: impl Into<String>, message: impl Into<String>) -> Self {
        GraphError::Analysis {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<zip::result::ZipError> for GraphError {
    fn from(err: zip::result::ZipError) -> Self {
        GraphError::InvalidArchive(err.to_string())
    }
}

/// Soft failures reported by a categorization adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CategorizeError {
    #[error("categorization failed: {0}")]
    Failed(String),

    #[error("malformed categorization response: {0}")]
    Malformed(String),

    #[error("categorization timed out after {0}s")]
    TimedOut(u64),
}
