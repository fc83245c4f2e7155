use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{
    brace_block_length, captures_with_offsets, ensure_text, ordered_unique, BlockLimits,
    FunctionTable,
};
use super::{FileAnalysis, LanguageAnalyzer};
use crate::error::Result;

const QUOTES: &[char] = &['"', '\'', '`'];

static FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)\s*(?:\[[^\]]*\]\s*)?\(")
        .expect("go func regex")
});

static SINGLE_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#).expect("go import regex")
});

static IMPORT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^\s*import\s*\((.*?)\)").expect("go import block regex")
});

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("quoted regex"));

pub struct GoAnalyzer {
    limits: BlockLimits,
}

impl GoAnalyzer {
    pub fn new(limits: BlockLimits) -> Self {
        Self { limits }
    }

    fn extract_imports(content: &str) -> Vec<String> {
        let mut found = captures_with_offsets(&SINGLE_IMPORT, content);
        for block in IMPORT_BLOCK.captures_iter(content) {
            let Some(body) = block.get(1) else {
                continue;
            };
            for (offset, spec) in captures_with_offsets(&QUOTED, body.as_str()) {
                found.push((body.start() + offset, spec));
            }
        }
        ordered_unique(found)
    }
}

impl LanguageAnalyzer for GoAnalyzer {
    fn analyze(&self, path: &str, content: &str) -> Result<FileAnalysis> {
        ensure_text(path, content)?;
        let lines: Vec<&str> = content.lines().collect();
        let mut table = FunctionTable::new(&[]);

        for (index, line) in lines.iter().enumerate() {
            let Some(caps) = FUNC.captures(line) else {
                continue;
            };
            let name = &caps[1];
            if table.wants(name) {
                let count = brace_block_length(&lines, index, self.limits, QUOTES);
                table.record(name, index, count);
            }
        }

        Ok(FileAnalysis {
            functions: table.into_map(),
            imports: Self::extract_imports(content),
        })
    }

    fn language_name(&self) -> &str {
        "go"
    }
}
