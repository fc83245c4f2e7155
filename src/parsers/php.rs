use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{
    brace_block_length, captures_with_offsets, ensure_text, ordered_unique, BlockLimits,
    FunctionTable,
};
use super::{FileAnalysis, LanguageAnalyzer};
use crate::error::Result;

const QUOTES: &[char] = &['"', '\''];

static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|static|final|abstract)\s+)*function\s+&?([A-Za-z_]\w*)\s*\(",
    )
    .expect("php function regex")
});

static INCLUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:require|require_once|include|include_once)\s*\(?\s*(?:__DIR__\s*\.\s*)?['"]([^'"]+)['"]"#)
        .expect("php include regex")
});

static USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*use\s+(?:function\s+|const\s+)?\\?([\w\\]+)(?:\s+as\s+\w+)?\s*;")
        .expect("php use regex")
});

pub struct PhpAnalyzer {
    limits: BlockLimits,
}

impl PhpAnalyzer {
    pub fn new(limits: BlockLimits) -> Self {
        Self { limits }
    }
}

impl LanguageAnalyzer for PhpAnalyzer {
    fn analyze(&self, path: &str, content: &str) -> Result<FileAnalysis> {
        ensure_text(path, content)?;
        let lines: Vec<&str> = content.lines().collect();
        let mut table = FunctionTable::new(&[]);

        for (index, line) in lines.iter().enumerate() {
            let Some(caps) = FUNCTION.captures(line) else {
                continue;
            };
            let name = &caps[1];
            if table.wants(name) {
                let count = brace_block_length(&lines, index, self.limits, QUOTES);
                table.record(name, index, count);
            }
        }

        let mut found = captures_with_offsets(&INCLUDE, content);
        found.extend(
            captures_with_offsets(&USE, content)
                .into_iter()
                .map(|(offset, name)| (offset, name.replace('\\', "/"))),
        );

        Ok(FileAnalysis {
            functions: table.into_map(),
            imports: ordered_unique(found),
        })
    }

    fn language_name(&self) -> &str {
        "php"
    }
}
