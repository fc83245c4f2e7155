pub mod cache;
pub mod common;
pub mod cfamily;
pub mod go;
pub mod java;
pub mod javascript;
pub mod php;
pub mod python;
pub mod ruby;
pub mod rust;

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::AnalyzerConfig;
use crate::core::{FunctionSpan, Language};
use crate::error::Result;
use common::BlockLimits;

/// Function inventory and raw import specifiers of one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub functions: BTreeMap<String, FunctionSpan>,
    pub imports: Vec<String>,
}

impl FileAnalysis {
    pub fn empty() -> Self {
        Self::default()
    }
}

pub trait LanguageAnalyzer {
    fn analyze(&self, path: &str, content: &str) -> Result<FileAnalysis>;
    fn language_name(&self) -> &str;
}

pub struct AnalyzerFactory {
    limits: BlockLimits,
}

impl AnalyzerFactory {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            limits: BlockLimits::from_config(config),
        }
    }

    /// Analyzer for `language`, or `None` when the language has no extractor
    pub fn get_analyzer(&self, language: Language) -> Option<Box<dyn LanguageAnalyzer + Send + Sync>> {
        let limits = self.limits;
        match language {
            Language::JavaScript | Language::TypeScript => {
                Some(Box::new(javascript::JavaScriptAnalyzer::new(language, limits)))
            }
            Language::Python => Some(Box::new(python::PythonAnalyzer::new())),
            Language::Java => Some(Box::new(java::JavaAnalyzer::new(limits))),
            Language::C | Language::Cpp => Some(Box::new(cfamily::CFamilyAnalyzer::new(language, limits))),
            Language::Go => Some(Box::new(go::GoAnalyzer::new(limits))),
            Language::Rust => Some(Box::new(rust::RustAnalyzer::new(limits))),
            Language::Php => Some(Box::new(php::PhpAnalyzer::new(limits))),
            Language::Ruby => Some(Box::new(ruby::RubyAnalyzer::new(limits))),
            Language::Json
            | Language::Markdown
            | Language::Css
            | Language::Html
            | Language::Yaml
            | Language::Text
            | Language::Other => None,
        }
    }

    /// Analyze one file with the extractor for `language`
    pub fn analyze_file(&self, path: &str, language: Language, content: &str) -> FileAnalysis {
        match self.get_analyzer(language) {
            Some(analyzer) => analyze_recovering(&*analyzer, path, content),
            None => FileAnalysis::empty(),
        }
    }
}

/// Run `analyzer` on one file; errors and panics become an empty analysis so
/// a single bad file never aborts the batch
pub fn analyze_recovering(analyzer: &dyn LanguageAnalyzer, path: &str, content: &str) -> FileAnalysis {
    match catch_unwind(AssertUnwindSafe(|| analyzer.analyze(path, content))) {
        Ok(Ok(analysis)) => analysis,
        Ok(Err(err)) => {
            warn!("Failed to analyze {}: {}", path, err);
            FileAnalysis::empty()
        }
        Err(_) => {
            warn!(
                "Analyzer for {} panicked on {}; using empty result",
                analyzer.language_name(),
                path
            );
            FileAnalysis::empty()
        }
    }
}
