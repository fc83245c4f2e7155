use log::{info, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::archive::{ArchiveEntry, ArchiveLoader};
use super::graph::{FileNode, Graph, GraphBuilder};
use super::resolver::{DependencyResolver, ResolverInput};
use super::Language;
use crate::config::AnalyzerConfig;
use crate::error::{GraphError, Result};
use crate::parsers::{cache::AnalysisCache, AnalyzerFactory, FileAnalysis};

/// Archive in, graph out: load, analyze each file, resolve, assemble
pub struct CodebaseAnalyzer {
    config: AnalyzerConfig,
    archive_loader: ArchiveLoader,
    analyzer_factory: AnalyzerFactory,
    dependency_resolver: DependencyResolver,
    analysis_cache: AnalysisCache,
}

impl CodebaseAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            archive_loader: ArchiveLoader::new(&config),
            analyzer_factory: AnalyzerFactory::new(&config),
            dependency_resolver: DependencyResolver::new(&config),
            analysis_cache: AnalysisCache::in_memory_only(),
            config,
        }
    }

    pub fn with_cache(mut self, cache: AnalysisCache) -> Self {
        self.analysis_cache = cache;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Build the dependency graph for a zip archive. `root` names the folder
    /// to strip from entry paths; when absent a shared top folder is stripped.
    pub fn analyze(&self, archive: &[u8], root: Option<&str>) -> Result<Graph> {
        let entries = self.archive_loader.load(archive, root)?;
        info!("Analyzing {} files", entries.len());

        let analyses = self.analyze_entries(&entries)?;

        let resolution = {
            let inputs: Vec<ResolverInput<'_>> = entries
                .iter()
                .zip(&analyses)
                .map(|(entry, analysis)| ResolverInput {
                    filepath: &entry.path,
                    content: &entry.content,
                    imports: &analysis.imports,
                })
                .collect();
            self.dependency_resolver.resolve(&inputs)
        };

        let mut graph_builder = GraphBuilder::with_capacity(entries.len());
        for ((entry, analysis), dependencies) in entries
            .iter()
            .zip(analyses)
            .zip(resolution.dependencies)
        {
            let node = FileNode::new(entry.path.clone(), &entry.content)
                .with_functions(analysis.functions)
                .with_dependencies(dependencies);
            graph_builder.add_node(node);
        }

        let mut dropped = 0usize;
        for edge in resolution.edges {
            if graph_builder.add_edge(edge).is_none() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!("Dropped {} edges with invalid endpoints", dropped);
        }

        let graph = graph_builder.build();
        info!(
            "Built graph {} with {} nodes and {} edges",
            graph.epoch(),
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(graph)
    }

    fn analyze_entries(&self, entries: &[ArchiveEntry]) -> Result<Vec<FileAnalysis>> {
        let cache_hits = AtomicUsize::new(0);
        let run = || -> Vec<FileAnalysis> {
            entries
                .par_iter()
                .map(|entry| {
                    let language = Language::from_path(&entry.path);
                    let key = AnalysisCache::key(language, &entry.content);
                    if let Some(cached) = self.analysis_cache.get(&key) {
                        cache_hits.fetch_add(1, Ordering::Relaxed);
                        return cached;
                    }
                    let analysis =
                        self.analyzer_factory
                            .analyze_file(&entry.path, language, &entry.content);
                    if let Err(err) = self.analysis_cache.store(&key, &analysis) {
                        warn!("Failed to cache analysis of {}: {}", entry.path, err);
                    }
                    analysis
                })
                .collect()
        };

        let analyses = match self.config.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|err| GraphError::config(format!("cannot build thread pool: {}", err)))?
                .install(run),
            None => run(),
        };

        info!(
            "Per-file analysis done (cache hits: {}, analyzed: {})",
            cache_hits.load(Ordering::Relaxed),
            entries.len() - cache_hits.load(Ordering::Relaxed)
        );
        Ok(analyses)
    }
}

impl Default for CodebaseAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}
