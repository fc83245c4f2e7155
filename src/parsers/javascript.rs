use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{
    brace_block_length, captures_with_offsets, ensure_text, ordered_unique, BlockLimits,
    FunctionTable,
};
use super::{FileAnalysis, LanguageAnalyzer};
use crate::core::Language;
use crate::error::Result;

const QUOTES: &[char] = &['"', '\'', '`'];
const EXTRA_RESERVED: &[&str] = &["function", "return", "else", "do", "typeof", "new", "constructor"];

static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*[<(]")
        .expect("function declaration regex")
});

static ARROW_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::\s*[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::\s*[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("arrow assignment regex")
});

static PROPERTY_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[A-Za-z_$][\w$]*\.)*([A-Za-z_$][\w$]*)\s*[:=]\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>)")
        .expect("property function regex")
});

static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|static|readonly|async|override|abstract|get|set)\s+)*\*?([A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\([^)]*\)\s*(?::\s*[^{;]+)?\{\s*$",
    )
    .expect("method regex")
});

static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s+(?:type\s+)?(?:[^'";]*?\s+from\s+)?['"]([^'"]+)['"]"#)
        .expect("import regex")
});

static EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bexport\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s+from\s+['"]([^'"]+)['"]"#)
        .expect("re-export regex")
});

static REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("require regex")
});

static DYNAMIC_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("dynamic import regex")
});

/// Heuristic extractor shared by JavaScript and TypeScript
pub struct JavaScriptAnalyzer {
    language: Language,
    limits: BlockLimits,
}

impl JavaScriptAnalyzer {
    pub fn new(language: Language, limits: BlockLimits) -> Self {
        Self { language, limits }
    }

    fn signature_name(line: &str) -> Option<&str> {
        [&*FUNCTION_DECL, &*ARROW_ASSIGNMENT, &*PROPERTY_FUNCTION, &*METHOD]
            .iter()
            .find_map(|regex| regex.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    fn extract_imports(content: &str) -> Vec<String> {
        let mut found = captures_with_offsets(&IMPORT_FROM, content);
        found.extend(captures_with_offsets(&EXPORT_FROM, content));
        found.extend(captures_with_offsets(&REQUIRE, content));
        found.extend(captures_with_offsets(&DYNAMIC_IMPORT, content));
        ordered_unique(found)
    }
}

impl LanguageAnalyzer for JavaScriptAnalyzer {
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
            imports: Self::extract_imports(content),
        })
    }

    fn language_name(&self) -> &str {
        self.language.as_str()
    }
}
