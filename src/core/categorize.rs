//! Category assignment supplied by an external adapter, merged into an
//! already assembled graph by filepath.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use super::graph::{Graph, DEFAULT_CATEGORY};
use crate::error::CategorizeError;

/// Adapter response: category names and a filepath -> category name map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    pub categories: Vec<String>,
    #[serde(default)]
    pub assignments: HashMap<String, String>,
}

impl Categorization {
    /// Parse an adapter response, rejecting shapes the merge cannot use
    pub fn from_json(json: &str) -> Result<Self, CategorizeError> {
        let categorization: Categorization = serde_json::from_str(json)
            .map_err(|err| CategorizeError::Malformed(err.to_string()))?;
        categorization.validate()?;
        Ok(categorization)
    }

    pub fn validate(&self) -> Result<(), CategorizeError> {
        if self.categories.is_empty() {
            return Err(CategorizeError::Malformed("category list is empty".into()));
        }
        if self.categories.iter().any(|name| name.trim().is_empty()) {
            return Err(CategorizeError::Malformed("category names must not be blank".into()));
        }
        Ok(())
    }
}

impl Graph {
    /// Replace the category list and re-point every node by filepath.
    ///
    /// Nodes without an assignment, or assigned to a name missing from
    /// `categories`, land on index 0. An invalid response leaves the graph
    /// untouched and is returned as an error.
    pub fn apply_categorization(
        &mut self,
        categorization: &Categorization,
    ) -> Result<usize, CategorizeError> {
        categorization.validate()?;

        let positions: HashMap<&str, usize> = categorization
            .categories
            .iter()
            .enumerate()
            .rev()
            .map(|(index, name)| (name.as_str(), index))
            .collect();

        let mut assigned = 0usize;
        for node in &mut self.nodes {
            node.category = categorization
                .assignments
                .get(&node.filepath)
                .and_then(|name| positions.get(name.as_str()).copied())
                .unwrap_or(0);
            if node.category != 0 {
                assigned += 1;
            }
        }
        self.categories = categorization.categories.clone();

        debug!(
            "Applied {} categories to {} nodes ({} outside the first category)",
            self.categories.len(),
            self.nodes.len(),
            assigned
        );
        Ok(assigned)
    }
}

/// Something that can sort filepaths into named categories, possibly slowly
#[async_trait]
pub trait Categorizer: Send + Sync {
    async fn categorize(&self, filepaths: &[String]) -> Result<Categorization, CategorizeError>;

    fn name(&self) -> &str;
}

/// Returns a pre-computed response, e.g. one saved from an earlier run
pub struct StaticCategorizer {
    response: Categorization,
}

impl StaticCategorizer {
    pub fn new(response: Categorization) -> Self {
        Self { response }
    }

    pub fn from_file(path: &Path) -> Result<Self, CategorizeError> {
        let json = std::fs::read_to_string(path)
            .map_err(|err| CategorizeError::Failed(format!("{}: {}", path.display(), err)))?;
        Ok(Self::new(Categorization::from_json(&json)?))
    }
}

#[async_trait]
impl Categorizer for StaticCategorizer {
    async fn categorize(&self, _filepaths: &[String]) -> Result<Categorization, CategorizeError> {
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Groups files by their top-level directory; root-level files stay "General"
#[derive(Debug, Default)]
pub struct DirectoryCategorizer;

impl DirectoryCategorizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Categorizer for DirectoryCategorizer {
    async fn categorize(&self, filepaths: &[String]) -> Result<Categorization, CategorizeError> {
        let mut groups = BTreeSet::new();
        let mut assignments = HashMap::with_capacity(filepaths.len());

        for path in filepaths {
            let group = match path.split_once('/') {
                Some((dir, _)) if !dir.is_empty() => dir.to_string(),
                _ => DEFAULT_CATEGORY.to_string(),
            };
            groups.insert(group.clone());
            assignments.insert(path.clone(), group);
        }

        let mut categories = vec![DEFAULT_CATEGORY.to_string()];
        categories.extend(groups.into_iter().filter(|group| group != DEFAULT_CATEGORY));
        Ok(Categorization {
            categories,
            assignments,
        })
    }

    fn name(&self) -> &str {
        "directory"
    }
}
