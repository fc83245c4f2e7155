use log::debug;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

use crate::config::AnalyzerConfig;
use crate::core::Edge;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex"));

/// What the resolver needs to know about one node
#[derive(Debug, Clone, Copy)]
pub struct ResolverInput<'a> {
    pub filepath: &'a str,
    pub content: &'a str,
    pub imports: &'a [String],
}

/// Edges plus, per node, the filepaths it depends on (in target order)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub edges: Vec<Edge>,
    pub dependencies: Vec<Vec<String>>,
}

/// Infers weighted file-to-file dependencies from imports and name references.
///
/// Import matching goes through a stem index, so it costs one lookup per
/// import. Reference counting still touches every (source, target) pair in
/// the worst case; it is bounded by scanning at most `max_scan_bytes` of each
/// source file, which can under-count references in very large files.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    direct_import_score: u32,
    max_scan_bytes: Option<usize>,
}

impl DependencyResolver {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            direct_import_score: config.direct_import_score,
            max_scan_bytes: config.max_scan_bytes,
        }
    }

    pub fn resolve(&self, inputs: &[ResolverInput<'_>]) -> Resolution {
        let stems: Vec<String> = inputs.iter().map(|input| file_stem(input.filepath)).collect();

        let mut index: HashMap<&str, Vec<usize>> = HashMap::with_capacity(stems.len());
        for (position, stem) in stems.iter().enumerate() {
            if !stem.is_empty() {
                index.entry(stem.as_str()).or_default().push(position);
            }
        }

        // Stems with non-word characters cannot be found by tokenizing
        let irregular: Vec<(&str, Regex)> = index
            .keys()
            .filter(|stem| !is_word(stem))
            .filter_map(|stem| {
                Regex::new(&format!(r"\b{}\b", regex::escape(stem)))
                    .ok()
                    .map(|regex| (*stem, regex))
            })
            .collect();

        let rows: Vec<BTreeMap<usize, u32>> = inputs
            .par_iter()
            .enumerate()
            .map(|(source, input)| self.score_row(source, input, &index, &irregular))
            .collect();

        let mut resolution = Resolution {
            edges: Vec::new(),
            dependencies: Vec::with_capacity(inputs.len()),
        };
        for (source, row) in rows.into_iter().enumerate() {
            let mut dependencies = Vec::with_capacity(row.len());
            for (target, raw) in row {
                resolution.edges.push(Edge::new(source, target, edge_weight(raw)));
                dependencies.push(inputs[target].filepath.to_string());
            }
            resolution.dependencies.push(dependencies);
        }

        debug!(
            "Resolved {} dependency edges across {} files",
            resolution.edges.len(),
            inputs.len()
        );
        resolution
    }

    fn score_row(
        &self,
        source: usize,
        input: &ResolverInput<'_>,
        index: &HashMap<&str, Vec<usize>>,
        irregular: &[(&str, Regex)],
    ) -> BTreeMap<usize, u32> {
        let mut scores: BTreeMap<usize, u32> = BTreeMap::new();
        let mut add = |stem: &str, amount: u32| {
            if amount == 0 {
                return;
            }
            if let Some(targets) = index.get(stem) {
                for &target in targets.iter().filter(|&&target| target != source) {
                    *scores.entry(target).or_insert(0) += amount;
                }
            }
        };

        for spec in input.imports {
            add(&normalize_specifier(spec), self.direct_import_score);
        }

        let text = self.scan_window(input);
        let mut word_counts: HashMap<&str, u32> = HashMap::new();
        for word in WORD.find_iter(text) {
            *word_counts.entry(word.as_str()).or_insert(0) += 1;
        }
        for (word, count) in word_counts {
            add(word, count);
        }
        for (stem, regex) in irregular {
            add(stem, regex.find_iter(text).count() as u32);
        }

        scores
    }

    fn scan_window<'a>(&self, input: &ResolverInput<'a>) -> &'a str {
        let content = input.content;
        match self.max_scan_bytes {
            Some(limit) if content.len() > limit => {
                let mut end = limit;
                while !content.is_char_boundary(end) {
                    end -= 1;
                }
                debug!(
                    "Reference scan of {} truncated to {} of {} bytes",
                    input.filepath,
                    end,
                    content.len()
                );
                &content[..end]
            }
            _ => content,
        }
    }
}

/// Edge weight for an accumulated raw score: `ln(raw + 1)` to two decimals
pub fn edge_weight(raw: u32) -> f64 {
    ((f64::from(raw) + 1.0).ln() * 100.0).round() / 100.0
}

/// Last path segment of an import specifier, without its extension
pub fn normalize_specifier(specifier: &str) -> String {
    let trimmed = specifier.trim().trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    strip_extension(last).to_string()
}

/// Filename of an archive path without its extension
pub fn file_stem(filepath: &str) -> String {
    let basename = filepath.rsplit('/').next().unwrap_or(filepath);
    strip_extension(basename).to_string()
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

fn is_word(stem: &str) -> bool {
    stem.chars().all(|c| c.is_alphanumeric() || c == '_')
}
