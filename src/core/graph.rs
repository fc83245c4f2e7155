use log::debug;
use petgraph::{graph::NodeIndex, Directed, Graph as PetGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{GraphError, Result};

/// Label of the placeholder category every node starts in
pub const DEFAULT_CATEGORY: &str = "General";

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Identifies one graph construction run; later runs get larger values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl Epoch {
    pub fn next() -> Self {
        Epoch(NEXT_EPOCH.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a function or method inside its file (1-based lines)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpan {
    pub line_start: usize,
    pub line_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub filepath: String,
    pub num_lines: usize,
    pub num_characters: usize,
    #[serde(default)]
    pub category: usize,
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionSpan>,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "fileDependencies")]
    pub file_dependencies: Vec<String>,
}

impl FileNode {
    /// Create a node whose metrics are derived from `content`
    pub fn new(filepath: impl Into<String>, content: &str) -> Self {
        Self {
            filepath: filepath.into(),
            num_lines: content.split('\n').count(),
            num_characters: content.chars().count(),
            category: 0,
            functions: BTreeMap::new(),
            description: String::new(),
            file_dependencies: Vec::new(),
        }
    }

    pub fn with_functions(mut self, functions: BTreeMap<String, FunctionSpan>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.file_dependencies = dependencies;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

impl Edge {
    pub fn new(source: usize, target: usize, weight: f64) -> Self {
        Self {
            source,
            target,
            weight,
        }
    }
}

/// Snapshot handed to callers: categories, file nodes and weighted edges.
/// Node indices are positions in `nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub categories: Vec<String>,
    pub nodes: Vec<FileNode>,
    pub edges: Vec<Edge>,
    #[serde(skip)]
    epoch: Epoch,
}

impl Graph {
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn node_index(&self, filepath: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.filepath == filepath)
    }

    pub fn filepaths(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.filepath.clone()).collect()
    }

    pub fn category_name(&self, node: &FileNode) -> &str {
        self.categories
            .get(node.category)
            .map(String::as_str)
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// Parse a graph from JSON and reject it unless every invariant holds
    pub fn from_json(json: &str) -> Result<Self> {
        let mut graph: Graph = serde_json::from_str(json)?;
        graph.validate()?;
        graph.epoch = Epoch::next();
        Ok(graph)
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(GraphError::InvalidGraph("category list is empty".into()));
        }

        let mut paths = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !paths.insert(node.filepath.as_str()) {
                return Err(GraphError::InvalidGraph(format!(
                    "duplicate filepath {}",
                    node.filepath
                )));
            }
            if node.category >= self.categories.len() {
                return Err(GraphError::InvalidGraph(format!(
                    "{} has category {} but only {} categories exist",
                    node.filepath,
                    node.category,
                    self.categories.len()
                )));
            }
        }

        for edge in &self.edges {
            if edge.source >= self.nodes.len() || edge.target >= self.nodes.len() {
                return Err(GraphError::InvalidGraph(format!(
                    "edge {} -> {} references a missing node",
                    edge.source, edge.target
                )));
            }
            if !(edge.weight > 0.0) {
                return Err(GraphError::InvalidGraph(format!(
                    "edge {} -> {} has non-positive weight {}",
                    edge.source, edge.target, edge.weight
                )));
            }
        }
        Ok(())
    }

    /// View the graph as a petgraph digraph; node indices are preserved
    pub fn to_petgraph(&self) -> PetGraph<&str, f64, Directed> {
        let mut graph = PetGraph::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            graph.add_node(node.filepath.as_str());
        }
        for edge in &self.edges {
            graph.add_edge(
                NodeIndex::new(edge.source),
                NodeIndex::new(edge.target),
                edge.weight,
            );
        }
        graph
    }
}

/// Assembles nodes and edges into a `Graph`, keeping indices in insertion order
pub struct GraphBuilder {
    nodes: Vec<FileNode>,
    edges: Vec<Edge>,
    node_map: HashMap<String, usize>,
    edge_pairs: HashSet<(usize, usize)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_map: HashMap::new(),
            edge_pairs: HashSet::new(),
        }
    }

    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::new(),
            node_map: HashMap::with_capacity(nodes),
            edge_pairs: HashSet::new(),
        }
    }

    /// Add a node and return its index; a repeated filepath keeps the first node
    pub fn add_node(&mut self, mut node: FileNode) -> usize {
        if let Some(&index) = self.node_map.get(&node.filepath) {
            debug!("Ignoring duplicate node {}", node.filepath);
            return index;
        }
        node.category = 0;
        let index = self.nodes.len();
        self.node_map.insert(node.filepath.clone(), index);
        self.nodes.push(node);
        index
    }

    pub fn add_edge(&mut self, edge: Edge) -> Option<usize> {
        if edge.source >= self.nodes.len() || edge.target >= self.nodes.len() {
            return None;
        }
        if edge.source == edge.target || !(edge.weight > 0.0) {
            return None;
        }
        if !self.edge_pairs.insert((edge.source, edge.target)) {
            return None;
        }
        self.edges.push(edge);
        Some(self.edges.len() - 1)
    }

    pub fn get_node_index(&self, filepath: &str) -> Option<usize> {
        self.node_map.get(filepath).copied()
    }

    pub fn build(self) -> Graph {
        Graph {
            categories: vec![DEFAULT_CATEGORY.to_string()],
            nodes: self.nodes,
            edges: self.edges,
            epoch: Epoch::next(),
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_node_metrics_follow_content() {
        let node = FileNode::new("a.ts", "line one\nline two\n");
        assert_eq!(node.num_lines, 3);
        assert_eq!(node.num_characters, 18);

        let empty = FileNode::new("empty.py", "");
        assert_eq!(empty.num_lines, 1);
        assert_eq!(empty.num_characters, 0);
    }

    #[test]
    fn epochs_increase() {
        let first = GraphBuilder::new().build();
        let second = GraphBuilder::new().build();
        assert!(second.epoch() > first.epoch());
    }

    #[test]
    fn serializes_with_camel_case_dependencies() {
        let mut builder = GraphBuilder::new();
        builder.add_node(FileNode::new("a.ts", "x").with_dependencies(vec!["b.ts".into()]));
        builder.add_node(FileNode::new("b.ts", "y"));
        builder.add_edge(Edge::new(0, 1, 1.1));
        let json = serde_json::to_value(builder.build()).unwrap();

        assert_eq!(json["categories"][0], "General");
        assert_eq!(json["nodes"][0]["fileDependencies"][0], "b.ts");
        assert_eq!(json["edges"][0]["weight"], 1.1);
        assert!(json.get("epoch").is_none());
    }

    #[test]
    fn from_json_rejects_out_of_range_edges() {
        let json = r#"{
            "categories": ["General"],
            "nodes": [{"filepath": "a.ts", "num_lines": 1, "num_characters": 1}],
            "edges": [{"source": 0, "target": 3, "weight": 1.0}]
        }"#;
        let err = Graph::from_json(json).unwrap_err();
        assert!(matches!(err, GraphError::InvalidGraph(_)));
    }

    #[test]
    fn petgraph_view_keeps_indices() {
        let mut builder = GraphBuilder::new();
        builder.add_node(FileNode::new("a.ts", ""));
        builder.add_node(FileNode::new("b.ts", ""));
        builder.add_edge(Edge::new(1, 0, 0.69));
        let graph = builder.build();
        let pg = graph.to_petgraph();
        assert_eq!(pg[NodeIndex::new(1)], "b.ts");
        assert!(pg.contains_edge(NodeIndex::new(1), NodeIndex::new(0)));
    }
}
