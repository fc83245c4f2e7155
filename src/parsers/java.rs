use once_cell::sync::Lazy;
use regex::Regex;

use super::common::{
    brace_block_length, captures_with_offsets, dotted_to_path, ensure_text, ordered_unique,
    BlockLimits, FunctionTable,
};
use super::{FileAnalysis, LanguageAnalyzer};
use crate::error::Result;

const QUOTES: &[char] = &['"', '\''];
const EXTRA_RESERVED: &[&str] = &["new", "return", "else", "synchronized"];

// access modifier, optional modifiers and generics, return type, name
static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:@\w+(?:\([^)]*\))?\s+)*(?:public|private|protected)\s+(?:(?:static|final|abstract|synchronized|native|default|strictfp)\s+)*(?:<[^>]+>\s+)?(?:[\w.<>\[\]?,]+(?:\s*<[^>]*>)?(?:\[\])*\s+)?([A-Za-z_]\w*)\s*\(",
    )
    .expect("java method regex")
});

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([\w.]+(?:\.\*)?)\s*;").expect("java import regex")
});

pub struct JavaAnalyzer {
    limits: BlockLimits,
}

impl JavaAnalyzer {
    pub fn new(limits: BlockLimits) -> Self {
        Self { limits }
    }
}

impl LanguageAnalyzer for JavaAnalyzer {
    fn analyze(&self, path: &str, content: &str) -> Result<FileAnalysis> {
        ensure_text(path, content)?;
        let lines: Vec<&str> = content.lines().collect();
        let mut table = FunctionTable::new(EXTRA_RESERVED);

        for (index, line) in lines.iter().enumerate() {
            let Some(caps) = METHOD.captures(line) else {
                continue;
            };
            let name = &caps[1];
            if table.wants(name) {
                let count = brace_block_length(&lines, index, self.limits, QUOTES);
                table.record(name, index, count);
            }
        }

        let imports = captures_with_offsets(&IMPORT, content)
            .into_iter()
            .map(|(offset, spec)| (offset, dotted_to_path(&spec)))
            .collect();

        Ok(FileAnalysis {
            functions: table.into_map(),
            imports: ordered_unique(imports),
        })
    }

    fn language_name(&self) -> &str {
        "java"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FunctionSpan;

    const SOURCE: &str = r#"package com.example.app;

import java.util.List;
import com.example.app.model.User;
import static org.junit.Assert.*;

public class UserService {
    private final List<User> users;

    public UserService(List<User> users) {
        this.users = users;
    }

    @Override
    public static <T> List<T> copy(List<T> input)
    {
        return input;
    }

    protected abstract void hook();

    public String[] names() {
        if (users.isEmpty()) {
            return new String[0];
        }
        return null;
    }
}
"#;

    #[test]
    fn extracts_methods_with_access_modifiers() {
        let result = JavaAnalyzer::new(BlockLimits::default())
            .analyze("UserService.java", SOURCE)
            .unwrap();

        assert_eq!(result.functions["UserService"], FunctionSpan { line_start: 10, line_count: 3 });
        assert_eq!(result.functions["copy"], FunctionSpan { line_start: 15, line_count: 4 });
        assert_eq!(result.functions["hook"], FunctionSpan { line_start: 20, line_count: 1 });
        assert_eq!(result.functions["names"], FunctionSpan { line_start: 22, line_count: 6 });
        assert!(!result.functions.contains_key("users"));
    }

    #[test]
    fn imports_become_paths() {
        let result = JavaAnalyzer::new(BlockLimits::default())
            .analyze("UserService.java", SOURCE)
            .unwrap();
        assert_eq!(
            result.imports,
            vec!["java/util/List", "com/example/app/model/User", "org/junit/Assert/*"]
        );
    }
}
