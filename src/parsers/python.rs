use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{dotted_to_path, ensure_text, indentation_block_length, FunctionTable};
use super::{FileAnalysis, LanguageAnalyzer};
use crate::error::Result;

const EXTRA_RESERVED: &[&str] = &["elif", "else", "return"];

static DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").expect("def regex")
});

static FROM_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*from\s+([.\w]+)\s+import\s+\(?([^#)]*)").expect("from-import regex")
});

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*import\s+([^#]+)").expect("import regex")
});

/// Indentation-aware extractor for Python sources
pub struct PythonAnalyzer;

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn imports_on_line(line: &str, imports: &mut Vec<String>) {
        if let Some(caps) = FROM_IMPORT.captures(line) {
            let module = &caps[1];
            if module.chars().all(|c| c == '.') {
                // `from . import a, b` names sibling modules
                for name in imported_names(&caps[2]) {
                    imports.push(dotted_to_path(&format!("{}{}", module, name)));
                }
            } else {
                imports.push(dotted_to_path(module));
            }
        } else if let Some(caps) = IMPORT.captures(line) {
            imports.extend(imported_names(&caps[1]).map(dotted_to_path));
        }
    }
}

impl Default for PythonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn imported_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .filter_map(|item| item.split_whitespace().next())
        .map(|name| name.trim_matches(|c| c == '(' || c == ')' || c == '\\'))
        .filter(|name| !name.is_empty() && *name != "*")
}

impl LanguageAnalyzer for PythonAnalyzer {
    fn analyze(&self, path: &str, content: &str) -> Result<FileAnalysis> {
        ensure_text(path, content)?;
        let lines: Vec<&str> = content.lines().collect();
        let mut table = FunctionTable::new(EXTRA_RESERVED);
        let mut imports = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if let Some(caps) = DEF.captures(line) {
                let name = &caps[1];
                if table.wants(name) {
                    table.record(name, index, indentation_block_length(&lines, index));
                }
                continue;
            }
            Self::imports_on_line(line, &mut imports);
        }

        let mut unique: Vec<String> = Vec::with_capacity(imports.len());
        for spec in imports {
            if !unique.contains(&spec) {
                unique.push(spec);
            }
        }

        Ok(FileAnalysis {
            functions: table.into_map(),
            imports: unique,
        })
    }

    fn language_name(&self) -> &str {
        "python"
    }
}
