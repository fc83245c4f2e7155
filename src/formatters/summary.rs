use anyhow::{Context, Result};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::core::{Graph, Language};

/// Markdown overview of a graph for people skimming a repository
pub struct SummaryFormatter {
    /// How many of the most depended-upon files to list
    top: usize,
}

impl SummaryFormatter {
    pub fn new() -> Self {
        Self { top: 10 }
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    pub fn format_to_file(&self, graph: &Graph, output_path: &Path) -> Result<()> {
        let content = self.format_graph(graph)?;
        fs::write(output_path, content)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        Ok(())
    }

    pub fn format_graph(&self, graph: &Graph) -> Result<String> {
        let mut output = String::new();
        let function_count: usize = graph.nodes.iter().map(|node| node.functions.len()).sum();
        let line_count: usize = graph.nodes.iter().map(|node| node.num_lines).sum();

        writeln!(output, "# Repository graph")?;
        writeln!(output)?;
        writeln!(output, "- Files: {}", graph.nodes.len())?;
        writeln!(output, "- Lines: {}", line_count)?;
        writeln!(output, "- Functions: {}", function_count)?;
        writeln!(output, "- Dependencies: {}", graph.edges.len())?;

        let digraph = graph.to_petgraph();
        let cyclic = is_cyclic_directed(&digraph);
        writeln!(
            output,
            "- Cycles: {}",
            if cyclic { "yes" } else { "none" }
        )?;

        self.format_counts(&mut output, "Languages", self.language_counts(graph))?;
        self.format_counts(&mut output, "Categories", self.category_counts(graph))?;

        let mut ranked: Vec<(usize, f64, usize)> = (0..graph.nodes.len())
            .map(|index| {
                let incoming = digraph.edges_directed(NodeIndex::new(index), Direction::Incoming);
                let (weight, count) = incoming.fold((0.0, 0usize), |(weight, count), edge| {
                    (weight + *edge.weight(), count + 1)
                });
                (index, weight, count)
            })
            .filter(|(_, _, count)| *count > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        if !ranked.is_empty() {
            writeln!(output)?;
            writeln!(output, "## Most depended-upon files")?;
            writeln!(output)?;
            writeln!(output, "| File | Dependents | Weight |")?;
            writeln!(output, "|---|---|---|")?;
            for (index, weight, count) in ranked.into_iter().take(self.top) {
                writeln!(
                    output,
                    "| {} | {} | {:.2} |",
                    graph.nodes[index].filepath, count, weight
                )?;
            }
        }

        Ok(output)
    }

    fn language_counts(&self, graph: &Graph) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in &graph.nodes {
            let language = Language::from_path(&node.filepath);
            *counts.entry(language.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    fn category_counts(&self, graph: &Graph) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in &graph.nodes {
            *counts.entry(graph.category_name(node).to_string()).or_insert(0) += 1;
        }
        counts
    }

    fn format_counts(
        &self,
        output: &mut String,
        title: &str,
        counts: BTreeMap<String, usize>,
    ) -> Result<()> {
        if counts.is_empty() {
            return Ok(());
        }
        writeln!(output)?;
        writeln!(output, "## {}", title)?;
        writeln!(output)?;
        for (name, count) in counts {
            writeln!(output, "- {}: {}", name, count)?;
        }
        Ok(())
    }
}

impl Default for SummaryFormatter {
    fn default() -> Self {
        Self::new()
    }
}
