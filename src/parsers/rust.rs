use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{
    brace_block_length, captures_with_offsets, ensure_text, ordered_unique, BlockLimits,
    FunctionTable,
};
use super::{FileAnalysis, LanguageAnalyzer};
use crate::error::Result;

// Lifetimes make `'` useless as a string delimiter here.
const QUOTES: &[char] = &['"'];

static FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*(?:pub(?:\s*\([^)]*\))?\s+)?(?:default\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+(?:"[^"]*"\s+)?)?fn\s+([A-Za-z_]\w*)"#,
    )
    .expect("rust fn regex")
});

static USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:pub(?:\s*\([^)]*\))?\s+)?use\s+((?:[A-Za-z_]\w*::)*[A-Za-z_]\w*)")
        .expect("rust use regex")
});

static MOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:pub(?:\s*\([^)]*\))?\s+)?mod\s+([A-Za-z_]\w*)\s*;").expect("rust mod regex")
});

pub struct RustAnalyzer {
    limits: BlockLimits,
}

impl RustAnalyzer {
    pub fn new(limits: BlockLimits) -> Self {
        Self { limits }
    }
}

impl LanguageAnalyzer for RustAnalyzer {
    fn analyze(&self, path: &str, content: &str) -> Result<FileAnalysis> {
        ensure_text(path, content)?;
        let lines: Vec<&str> = content.lines().collect();
        let mut table = FunctionTable::new(&[]);

        for (index, line) in lines.iter().enumerate() {
            let Some(caps) = FN.captures(line) else {
                continue;
            };
            let name = &caps[1];
            if table.wants(name) {
                let count = brace_block_length(&lines, index, self.limits, QUOTES);
                table.record(name, index, count);
            }
        }

        let mut found: Vec<(usize, String)> = captures_with_offsets(&USE, content)
            .into_iter()
            .map(|(offset, path)| (offset, path.replace("::", "/")))
            .collect();
        found.extend(captures_with_offsets(&MOD, content));

        Ok(FileAnalysis {
            functions: table.into_map(),
            imports: ordered_unique(found),
        })
    }

    fn language_name(&self) -> &str {
        "rust"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FunctionSpan;

    #[test]
    fn extracts_fns_uses_and_mods() {
        let src = r#"mod graph;
pub mod resolver;

use crate::graph::{Edge, Graph};
use std::fmt;

pub(crate) async fn build<'a>(input: &'a str) -> Graph {
    let open = "{";
    Graph::new()
}

impl Graph {
    pub const fn empty() -> Self { Self {} }

    fn helper(&self)
        -> usize
    {
        0
    }
}
"#;
        let result = RustAnalyzer::new(BlockLimits::default()).analyze("lib.rs", src).unwrap();
        assert_eq!(result.imports, vec!["graph", "resolver", "crate/graph", "std/fmt"]);
        assert_eq!(result.functions["build"], FunctionSpan { line_start: 7, line_count: 4 });
        assert_eq!(result.functions["empty"], FunctionSpan { line_start: 13, line_count: 1 });
        assert_eq!(result.functions["helper"], FunctionSpan { line_start: 15, line_count: 5 });
    }

    #[test]
    fn brace_char_literals_do_not_shift_extents() {
        let src = r#"fn balance(line: &str) -> i32 {
    let mut depth = 0;
    for c in line.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

fn after() {}
"#;
        let result = RustAnalyzer::new(BlockLimits::default()).analyze("balance.rs", src).unwrap();
        assert_eq!(result.functions["balance"], FunctionSpan { line_start: 1, line_count: 11 });
        assert_eq!(result.functions["after"], FunctionSpan { line_start: 13, line_count: 1 });
    }
}
