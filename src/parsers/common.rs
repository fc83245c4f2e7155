use regex::Regex;
use std::collections::BTreeMap;

use crate::config::AnalyzerConfig;
use crate::core::FunctionSpan;
use crate::error::{GraphError, Result};

/// Names that signature patterns pick up from control flow, never functions
const RESERVED_NAMES: &[&str] = &["if", "for", "while", "switch", "catch"];

/// Bounds for locating the end of a brace-delimited block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLimits {
    pub lookahead: usize,
    pub window: usize,
}

impl BlockLimits {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            lookahead: config.brace_lookahead,
            window: config.scan_window.max(1),
        }
    }
}

impl Default for BlockLimits {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

/// Function inventory that keeps the first signature seen for each name
pub struct FunctionTable<'a> {
    functions: BTreeMap<String, FunctionSpan>,
    extra_reserved: &'a [&'a str],
}

impl<'a> FunctionTable<'a> {
    pub fn new(extra_reserved: &'a [&'a str]) -> Self {
        Self {
            functions: BTreeMap::new(),
            extra_reserved,
        }
    }

    /// Whether a signature named `name` should still be recorded
    pub fn wants(&self, name: &str) -> bool {
        !name.is_empty()
            && !RESERVED_NAMES.contains(&name)
            && !self.extra_reserved.contains(&name)
            && !self.functions.contains_key(name)
    }

    /// Record `name` at the 0-based `line_index`
    pub fn record(&mut self, name: &str, line_index: usize, line_count: usize) {
        if self.wants(name) {
            self.functions.insert(
                name.to_string(),
                FunctionSpan {
                    line_start: line_index + 1,
                    line_count: line_count.max(1),
                },
            );
        }
    }

    pub fn into_map(self) -> BTreeMap<String, FunctionSpan> {
        self.functions
    }
}

/// Refuse content that is clearly not text
pub fn ensure_text(path_hint: &str, content: &str) -> Result<()> {
    if content.contains('\0') {
        return Err(GraphError::analysis(path_hint, "binary content"));
    }
    Ok(())
}

/// Characters of `line` that sit outside string literals, `//` comments and
/// (when `'` is not a string delimiter) single-character literals like `'{'`
fn code_chars<'l>(line: &'l str, quotes: &'l [char]) -> impl Iterator<Item = char> + 'l {
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.chars().peekable();
    std::iter::from_fn(move || loop {
        let ch = chars.next()?;
        if let Some(quote) = in_quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_quote = None;
            }
            continue;
        }
        if quotes.contains(&ch) {
            in_quote = Some(ch);
            continue;
        }
        if ch == '\'' {
            let mut ahead = chars.clone();
            let literal_len = match (ahead.next(), ahead.next(), ahead.next()) {
                (Some('\\'), Some(_), Some('\'')) => 3,
                (Some(c), Some('\''), _) if c != '\\' => 2,
                _ => 0,
            };
            if literal_len > 0 {
                for _ in 0..literal_len {
                    chars.next();
                }
                continue;
            }
        }
        if ch == '/' && chars.peek() == Some(&'/') {
            return None;
        }
        return Some(ch);
    })
}

/// Number of lines spanned by the brace block opened at or just after `start`.
///
/// Falls back to 1 when no opening brace shows up within the lookahead, when a
/// statement terminator precedes it, or when the block does not close inside
/// the scan window.
pub fn brace_block_length(
    lines: &[&str],
    start: usize,
    limits: BlockLimits,
    quotes: &[char],
) -> usize {
    let mut depth = 0usize;
    let mut opened = false;

    for (offset, line) in lines.iter().skip(start).take(limits.window).enumerate() {
        for ch in code_chars(line, quotes) {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' if opened => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return offset + 1;
                    }
                }
                ';' if !opened => return 1,
                _ => {}
            }
        }
        if !opened && offset >= limits.lookahead {
            return 1;
        }
    }
    1
}

fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Number of lines in the indentation block headed by `lines[start]`: the
/// header plus every following line indented deeper than it, blank lines
/// included, up to the first non-blank line at the same or lower indentation.
pub fn indentation_block_length(lines: &[&str], start: usize) -> usize {
    let Some(header) = lines.get(start) else {
        return 1;
    };
    let base = indentation(header);
    1 + lines
        .iter()
        .skip(start + 1)
        .take_while(|line| line.trim().is_empty() || indentation(line) > base)
        .count()
}

/// Capture group 1 of every match, tagged with its byte offset
pub fn captures_with_offsets(regex: &Regex, content: &str) -> Vec<(usize, String)> {
    regex
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str().trim().to_string())))
        .filter(|(_, spec)| !spec.is_empty())
        .collect()
}

/// Order specifiers by position in the file and drop repeats
pub fn ordered_unique(mut found: Vec<(usize, String)>) -> Vec<String> {
    found.sort_by_key(|(offset, _)| *offset);
    let mut imports: Vec<String> = Vec::with_capacity(found.len());
    for (_, spec) in found {
        if !imports.contains(&spec) {
            imports.push(spec);
        }
    }
    imports
}

/// Rewrite a dotted module path as a relative-path style specifier
/// (`pkg.mod` -> `pkg/mod`, `.mod` -> `./mod`, `..mod` -> `../mod`).
pub fn dotted_to_path(module: &str) -> String {
    let leading = module.chars().take_while(|c| *c == '.').count();
    let rest = module[leading..].replace('.', "/");
    let prefix = match leading {
        0 => String::new(),
        1 => "./".to_string(),
        n => "../".repeat(n - 1),
    };
    format!("{}{}", prefix, rest)
}
