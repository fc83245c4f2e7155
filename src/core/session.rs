use log::{info, warn};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::categorize::{Categorization, Categorizer};
use super::graph::{Epoch, Graph};
use crate::error::CategorizeError;

/// What happened to a categorization result when it came back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied { assigned: usize },
    /// The result belongs to a graph that has since been replaced
    Stale { result: Epoch, current: Option<Epoch> },
    /// The adapter failed; the graph keeps its default categories
    Failed(String),
}

impl MergeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MergeOutcome::Applied { .. })
    }
}

/// Holds the caller's current graph and guards late categorization results
/// with the epoch of the graph they were requested for.
#[derive(Debug, Default)]
pub struct GraphSession {
    current: RwLock<Option<Graph>>,
}

impl GraphSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `graph` the current one and return its epoch
    pub fn install(&self, graph: Graph) -> Epoch {
        let epoch = graph.epoch();
        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Some(graph);
        epoch
    }

    pub fn current_epoch(&self) -> Option<Epoch> {
        self.read(|graph| graph.map(Graph::epoch))
    }

    pub fn snapshot(&self) -> Option<Graph> {
        self.read(|graph| graph.cloned())
    }

    fn read<T>(&self, f: impl FnOnce(Option<&Graph>) -> T) -> T {
        let current = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(current.as_ref())
    }

    /// Apply a categorization result if it still belongs to the current graph
    pub fn merge(
        &self,
        epoch: Epoch,
        result: Result<Categorization, CategorizeError>,
    ) -> MergeOutcome {
        let categorization = match result {
            Ok(categorization) => categorization,
            Err(err) => {
                warn!("Categorization for graph {} failed: {}", epoch, err);
                return MergeOutcome::Failed(err.to_string());
            }
        };

        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let current_epoch = current.as_ref().map(Graph::epoch);
        let graph = match current.as_mut() {
            Some(graph) if graph.epoch() == epoch => graph,
            _ => {
                info!(
                    "Discarding categorization for graph {}; current graph is {:?}",
                    epoch, current_epoch
                );
                return MergeOutcome::Stale {
                    result: epoch,
                    current: current_epoch,
                };
            }
        };

        match graph.apply_categorization(&categorization) {
            Ok(assigned) => MergeOutcome::Applied { assigned },
            Err(err) => {
                warn!("Categorization for graph {} rejected: {}", epoch, err);
                MergeOutcome::Failed(err.to_string())
            }
        }
    }
}

/// Run `categorizer` for the session's current graph in the background and
/// merge the result when it arrives. Construction never waits on this.
pub fn spawn_categorization(
    session: Arc<GraphSession>,
    categorizer: Arc<dyn Categorizer>,
    timeout: Duration,
) -> Option<JoinHandle<MergeOutcome>> {
    let (epoch, filepaths) = session.read(|graph| graph.map(|g| (g.epoch(), g.filepaths())))?;

    Some(tokio::spawn(async move {
        let result = match tokio::time::timeout(timeout, categorizer.categorize(&filepaths)).await {
            Ok(result) => result,
            Err(_) => Err(CategorizeError::TimedOut(timeout.as_secs())),
        };
        session.merge(epoch, result)
    }))
}
