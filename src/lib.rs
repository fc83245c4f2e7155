//! # REPOGRAPH
//!
//! Turns a zipped source repository into a file-level dependency graph.
//!
//! Each admissible file in the archive becomes a node carrying its size
//! metrics and the functions found in it; weighted directed edges connect
//! files that import or mention one another. Categories can be attached
//! afterwards by a (possibly slow) categorization adapter without blocking
//! graph construction.
//!
//! ## Output Formats
//!
//! - **JSON**: the full graph (`categories`, `nodes`, `edges`), pretty or compact
//! - **Summary**: a Markdown overview with the most depended-upon files
//!
//! ## Supported Languages
//!
//! JavaScript, TypeScript, Python, Java, C, C++, Go, Rust, PHP, Ruby.
//! JSON, CSS, HTML and YAML files become nodes without functions.

pub mod config;
pub mod core;
pub mod error;
pub mod formatters;
pub mod parsers;

pub use crate::config::AnalyzerConfig;
pub use crate::core::{CodebaseAnalyzer, Graph};
pub use crate::error::{CategorizeError, GraphError};
