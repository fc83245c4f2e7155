mod common;

use async_trait::async_trait;
use common::zip_archive;
use repograph::core::{
    spawn_categorization, Categorization, Categorizer, CodebaseAnalyzer, DirectoryCategorizer,
    GraphSession, MergeOutcome, StaticCategorizer,
};
use repograph::CategorizeError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn build_graph() -> repograph::Graph {
    CodebaseAnalyzer::default()
        .analyze(
            &zip_archive(&[
                ("repo/ui/app.ts", "import { api } from '../api/server';"),
                ("repo/api/server.ts", "export const api = 1;"),
                ("repo/README.md", "# docs"),
            ]),
            None,
        )
        .unwrap()
}

fn frontend_backend() -> Categorization {
    Categorization {
        categories: vec!["Frontend".into(), "Backend".into()],
        assignments: HashMap::from([
            ("ui/app.ts".to_string(), "Frontend".to_string()),
            ("api/server.ts".to_string(), "Backend".to_string()),
        ]),
    }
}

/// Waits until released, then answers with a fixed response
struct GatedCategorizer {
    gate: Arc<Notify>,
    response: Categorization,
}

#[async_trait]
impl Categorizer for GatedCategorizer {
    async fn categorize(&self, _filepaths: &[String]) -> Result<Categorization, CategorizeError> {
        self.gate.notified().await;
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "gated"
    }
}

struct FailingCategorizer;

#[async_trait]
impl Categorizer for FailingCategorizer {
    async fn categorize(&self, _filepaths: &[String]) -> Result<Categorization, CategorizeError> {
        Err(CategorizeError::Failed("service unavailable".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[tokio::test]
async fn categories_are_merged_by_filepath() {
    let session = Arc::new(GraphSession::new());
    session.install(build_graph());

    let categorizer = Arc::new(StaticCategorizer::new(frontend_backend()));
    let outcome = spawn_categorization(Arc::clone(&session), categorizer, Duration::from_secs(5))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(outcome, MergeOutcome::Applied { assigned: 1 });

    let graph = session.snapshot().unwrap();
    assert_eq!(graph.categories, vec!["Frontend", "Backend"]);
    let app = graph.node_index("ui/app.ts").unwrap();
    let server = graph.node_index("api/server.ts").unwrap();
    assert_eq!(graph.nodes[app].category, 0);
    assert_eq!(graph.nodes[server].category, 1);
    assert!(graph.validate().is_ok());
}

#[tokio::test]
async fn late_result_for_replaced_graph_is_discarded() {
    let session = Arc::new(GraphSession::new());
    let first = session.install(build_graph());

    let gate = Arc::new(Notify::new());
    let categorizer = Arc::new(GatedCategorizer {
        gate: Arc::clone(&gate),
        response: frontend_backend(),
    });
    let handle =
        spawn_categorization(Arc::clone(&session), categorizer, Duration::from_secs(5)).unwrap();

    // A new graph replaces the one the adapter is working on
    let second = session.install(build_graph());
    assert!(second > first);
    gate.notify_one();

    let outcome = handle.await.unwrap();
    assert_eq!(
        outcome,
        MergeOutcome::Stale {
            result: first,
            current: Some(second)
        }
    );
    let graph = session.snapshot().unwrap();
    assert_eq!(graph.epoch(), second);
    assert_eq!(graph.categories, vec!["General"]);
    assert!(graph.nodes.iter().all(|node| node.category == 0));
}

#[tokio::test]
async fn timeout_keeps_default_categories() {
    let session = Arc::new(GraphSession::new());
    session.install(build_graph());

    let categorizer = Arc::new(GatedCategorizer {
        gate: Arc::new(Notify::new()),
        response: frontend_backend(),
    });
    let outcome =
        spawn_categorization(Arc::clone(&session), categorizer, Duration::from_millis(20))
            .unwrap()
            .await
            .unwrap();
    assert!(matches!(outcome, MergeOutcome::Failed(_)));
    assert_eq!(session.snapshot().unwrap().categories, vec!["General"]);
}

#[tokio::test]
async fn adapter_failure_is_soft() {
    let session = Arc::new(GraphSession::new());
    session.install(build_graph());

    let outcome = spawn_categorization(
        Arc::clone(&session),
        Arc::new(FailingCategorizer),
        Duration::from_secs(5),
    )
    .unwrap()
    .await
    .unwrap();
    assert_eq!(
        outcome,
        MergeOutcome::Failed("categorization failed: service unavailable".to_string())
    );
    assert_eq!(session.snapshot().unwrap().nodes.len(), 2);
}

#[tokio::test]
async fn directory_grouping_over_real_graph() {
    let session = Arc::new(GraphSession::new());
    session.install(build_graph());

    let outcome = spawn_categorization(
        Arc::clone(&session),
        Arc::new(DirectoryCategorizer::new()),
        Duration::from_secs(5),
    )
    .unwrap()
    .await
    .unwrap();
    assert!(outcome.is_applied());

    let graph = session.snapshot().unwrap();
    assert_eq!(graph.categories, vec!["General", "api", "ui"]);
    let server = graph.node_index("api/server.ts").unwrap();
    assert_eq!(graph.category_name(&graph.nodes[server]), "api");
}

#[tokio::test]
async fn nothing_to_categorize_without_a_graph() {
    let session = Arc::new(GraphSession::new());
    assert!(session.current_epoch().is_none());
    let handle = spawn_categorization(
        session,
        Arc::new(DirectoryCategorizer::new()),
        Duration::from_secs(1),
    );
    assert!(handle.is_none());
}
