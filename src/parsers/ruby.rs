use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{captures_with_offsets, ensure_text, ordered_unique, BlockLimits, FunctionTable};
use super::{FileAnalysis, LanguageAnalyzer};
use crate::error::Result;

const OPENERS: &[&str] = &[
    "def", "class", "module", "if", "unless", "while", "until", "case", "begin", "for",
];

static DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*def\s+(?:self\.)?([A-Za-z_]\w*[?!=]?)").expect("ruby def regex")
});

static ENDLESS_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*def\s+(?:self\.)?[A-Za-z_]\w*[?!]?\s*(?:\([^)]*\))?\s*=[^=~>(]").expect("endless def regex")
});

static DO_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bdo\s*(?:\|[^|]*\|)?\s*$").expect("do block regex")
});

static END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bend\b").expect("end regex"));

static REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*(?:require|require_relative|load)\s*\(?\s*['"]([^'"]+)['"]"#)
        .expect("ruby require regex")
});

/// Extractor for Ruby, where blocks close with `end`
pub struct RubyAnalyzer {
    limits: BlockLimits,
}

impl RubyAnalyzer {
    pub fn new(limits: BlockLimits) -> Self {
        Self { limits }
    }

    fn strip_comment(line: &str) -> &str {
        match line.find('#') {
            Some(pos) if !line[..pos].contains(&['"', '\''][..]) => &line[..pos],
            _ => line,
        }
    }

    fn opens_block(line: &str) -> bool {
        let first = line.split_whitespace().next().unwrap_or("");
        OPENERS.contains(&first) || DO_BLOCK.is_match(line)
    }

    /// Lines from the `def` at `start` through its matching `end`
    fn keyword_block_length(&self, lines: &[&str], start: usize) -> usize {
        if ENDLESS_DEF.is_match(lines[start]) {
            return 1;
        }
        let mut depth = 0usize;
        for (offset, raw) in lines.iter().skip(start).take(self.limits.window).enumerate() {
            let line = Self::strip_comment(raw);
            if Self::opens_block(line) {
                depth += 1;
            }
            let closes = END.find_iter(line).count();
            depth = depth.saturating_sub(closes);
            if depth == 0 {
                return offset + 1;
            }
        }
        1
    }
}

impl LanguageAnalyzer for RubyAnalyzer {
    fn analyze(&self, path: &str, content: &str) -> Result<FileAnalysis> {
        ensure_text(path, content)?;
        let lines: Vec<&str> = content.lines().collect();
        let mut table = FunctionTable::new(&[]);

        for (index, line) in lines.iter().enumerate() {
            let Some(caps) = DEF.captures(line) else {
                continue;
            };
            let name = &caps[1];
            if table.wants(name) {
                let count = self.keyword_block_length(&lines, index);
                table.record(name, index, count);
            }
        }

        Ok(FileAnalysis {
            functions: table.into_map(),
            imports: ordered_unique(captures_with_offsets(&REQUIRE, content)),
        })
    }

    fn language_name(&self) -> &str {
        "ruby"
    }
}
