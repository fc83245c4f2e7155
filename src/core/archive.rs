use log::{debug, info};
use std::collections::HashSet;
use std::io::{Cursor, Read};

use crate::config::AnalyzerConfig;
use crate::error::{GraphError, Result};

/// Archive member admitted for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative path with the common root removed
    pub path: String,
    pub content: String,
}

/// Unpacks zip archives into a flat, ordered list of source files
pub struct ArchiveLoader {
    config: AnalyzerConfig,
}

const MAX_PREALLOC: usize = 1 << 20;

struct RawEntry {
    name: String,
    bytes: Vec<u8>,
}

impl ArchiveLoader {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Load admissible entries in archive order, stripping `root` (or the
    /// discovered common root when `root` is `None`) from every path.
    pub fn load(&self, bytes: &[u8], root: Option<&str>) -> Result<Vec<ArchiveEntry>> {
        let raw_entries = read_file_entries(bytes)?;

        let root = match root {
            Some(root) => normalize_root(root),
            None => discover_root(raw_entries.iter().map(|e| e.name.as_str())),
        };
        if let Some(root) = &root {
            debug!("Stripping archive root '{}'", root);
        }

        let mut seen = HashSet::with_capacity(raw_entries.len());
        let mut entries = Vec::with_capacity(raw_entries.len());
        let mut skipped = 0usize;

        for raw in raw_entries {
            let path = strip_root(&raw.name, root.as_deref());
            if path.is_empty() || !self.is_admissible(path) {
                skipped += 1;
                continue;
            }
            if !seen.insert(path.to_string()) {
                debug!("Skipping duplicate archive path {}", path);
                skipped += 1;
                continue;
            }
            entries.push(ArchiveEntry {
                path: path.to_string(),
                content: String::from_utf8_lossy(&raw.bytes).into_owned(),
            });
        }

        info!(
            "Archive yielded {} code files ({} entries skipped)",
            entries.len(),
            skipped
        );

        if entries.is_empty() {
            return Err(GraphError::EmptyArchive);
        }
        Ok(entries)
    }

    fn is_admissible(&self, path: &str) -> bool {
        let basename = path.rsplit('/').next().unwrap_or(path);
        if basename.is_empty() || basename.starts_with('.') || self.config.is_lockfile(basename) {
            return false;
        }

        match basename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self.config.allows_extension(ext),
            _ => false,
        }
    }
}

fn read_file_entries(bytes: &[u8]) -> Result<Vec<RawEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().replace('\\', "/");
        if name.starts_with("__MACOSX/") {
            continue;
        }
        let mut data = Vec::with_capacity(prealloc_capacity(file.size()));
        file.read_to_end(&mut data).map_err(|err| {
            GraphError::invalid_archive(format!("failed to read entry {}: {}", name, err))
        })?;
        entries.push(RawEntry { name, bytes: data });
    }

    Ok(entries)
}

/// The declared size comes from the entry header and is untrusted
fn prealloc_capacity(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOC, |size| size.min(MAX_PREALLOC))
}

fn normalize_root(root: &str) -> Option<String> {
    let trimmed = root.trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn strip_root<'a>(name: &'a str, root: Option<&str>) -> &'a str {
    let name = name.trim_start_matches("./").trim_start_matches('/');
    match root {
        Some(root) => name
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(name),
        None => name,
    }
}

/// Find the single top-level folder shared by every file, if there is one
pub fn discover_root<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut root: Option<&str> = None;
    let mut any = false;

    for name in names {
        let name = name.trim_start_matches("./").trim_start_matches('/');
        let (first, rest) = name.split_once('/')?;
        if first.is_empty() || rest.is_empty() {
            return None;
        }
        match root {
            Some(existing) if existing != first => return None,
            Some(_) => {}
            None => root = Some(first),
        }
        any = true;
    }

    if any {
        root.map(str::to_string)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_single_top_level_folder() {
        let names = ["repo/src/a.ts", "repo/README.md", "repo/lib/b.py"];
        assert_eq!(discover_root(names), Some("repo".to_string()));
    }

    #[test]
    fn no_root_when_files_at_top_level() {
        assert_eq!(discover_root(["repo/src/a.ts", "b.ts"]), None);
        assert_eq!(discover_root(["a/x.ts", "b/y.ts"]), None);
        assert_eq!(discover_root(Vec::<&str>::new()), None);
    }

    #[test]
    fn strip_root_only_removes_whole_segment() {
        assert_eq!(strip_root("repo/src/a.ts", Some("repo")), "src/a.ts");
        assert_eq!(strip_root("repository/a.ts", Some("repo")), "repository/a.ts");
        assert_eq!(strip_root("./a.ts", None), "a.ts");
    }

    #[test]
    fn declared_size_does_not_drive_allocation() {
        assert_eq!(prealloc_capacity(512), 512);
        assert_eq!(prealloc_capacity(0xFFFF_FFF0), MAX_PREALLOC);
        assert_eq!(prealloc_capacity(u64::MAX), MAX_PREALLOC);
    }

    #[test]
    fn admissibility_rules() {
        let loader = ArchiveLoader::new(&AnalyzerConfig::default());
        assert!(loader.is_admissible("src/main.rs"));
        assert!(loader.is_admissible("web/App.TSX"));
        assert!(!loader.is_admissible("src/.eslintrc.js"));
        assert!(loader.is_admissible(".github/workflows/ci.yml"));
        assert!(loader.is_admissible(".storybook/main.js"));
        assert!(!loader.is_admissible(".env.js"));
        assert!(!loader.is_admissible("package-lock.json"));
        assert!(!loader.is_admissible("docs/guide.md"));
        assert!(!loader.is_admissible("assets/logo.png"));
        assert!(!loader.is_admissible("Makefile"));
    }
}
