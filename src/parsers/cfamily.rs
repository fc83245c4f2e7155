use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{
    brace_block_length, captures_with_offsets, ensure_text, ordered_unique, BlockLimits,
    FunctionTable,
};
use super::{FileAnalysis, LanguageAnalyzer};
use crate::core::Language;
use crate::error::Result;

const QUOTES: &[char] = &['"', '\''];
const EXTRA_RESERVED: &[&str] = &["return", "else", "sizeof", "do", "defined"];

/// Leading words that look like a return type but start a statement
const STATEMENT_WORDS: &[&str] = &["return", "else", "new", "delete", "case", "goto", "throw", "using", "typedef"];

// return type (with qualifiers/pointers), then a possibly qualified name,
// then an argument list that is not closed by `;` on the same line
static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:static|inline|extern|virtual|constexpr|explicit|friend|const|unsigned|signed|struct|enum|template\s*<[^>]*>)\s+)*([A-Za-z_][\w:]*(?:\s*<[^;{}()]*>)?)(?:\s*[*&]+\s*|\s+)((?:[A-Za-z_]\w*::)*~?[A-Za-z_]\w*)\s*\([^;]*$",
    )
    .expect("c function regex")
});

static INCLUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*#\s*include\s*[<"]([^>"]+)[>"]"#).expect("include regex")
});

/// Extractor for C and C++ sources
pub struct CFamilyAnalyzer {
    language: Language,
    limits: BlockLimits,
}

impl CFamilyAnalyzer {
    pub fn new(language: Language, limits: BlockLimits) -> Self {
        Self { language, limits }
    }

    fn signature_name(line: &str) -> Option<&str> {
        let caps = FUNCTION.captures(line)?;
        let return_type = caps.get(1)?.as_str();
        if STATEMENT_WORDS.contains(&return_type) {
            return None;
        }
        caps.get(2).map(|m| m.as_str())
    }
}

impl LanguageAnalyzer for CFamilyAnalyzer {
    fn analyze(&self, path: &str, content: &str) -> Result<FileAnalysis> {
        ensure_text(path, content)?;
        let lines: Vec<&str> = content.lines().collect();
        let mut table = FunctionTable::new(EXTRA_RESERVED);

        for (index, line) in lines.iter().enumerate() {
            let Some(name) = Self::signature_name(line) else {
                continue;
            };
            if table.wants(name) {
                let count = brace_block_length(&lines, index, self.limits, QUOTES);
                table.record(name, index, count);
            }
        }

        Ok(FileAnalysis {
            functions: table.into_map(),
            imports: ordered_unique(captures_with_offsets(&INCLUDE, content)),
        })
    }

    fn language_name(&self) -> &str {
        self.language.as_str()
    }
}
