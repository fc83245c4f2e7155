mod common;

use common::zip_archive;
use repograph::config::AnalyzerConfig;
use repograph::core::{edge_weight, CodebaseAnalyzer, FunctionSpan, Graph};
use repograph::formatters::JsonFormatter;
use repograph::GraphError;

fn analyze(files: &[(&str, &str)]) -> Graph {
    CodebaseAnalyzer::default()
        .analyze(&zip_archive(files), None)
        .unwrap()
}

#[test]
fn typescript_import_produces_weighted_edge() {
    let graph = analyze(&[
        ("repo/src/a.ts", "export function foo() { return 1; }"),
        ("repo/src/b.ts", "import { foo } from './a'"),
    ]);

    assert_eq!(graph.categories, vec!["General"]);
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.nodes[0].filepath, "src/a.ts");
    assert_eq!(graph.nodes[1].filepath, "src/b.ts");
    assert_eq!(
        graph.nodes[0].functions.get("foo"),
        Some(&FunctionSpan {
            line_start: 1,
            line_count: 1
        })
    );
    assert_eq!(graph.nodes[1].file_dependencies, vec!["src/a.ts"]);
    assert!(graph.nodes[0].file_dependencies.is_empty());

    assert_eq!(graph.edges.len(), 1);
    let edge = graph.edges[0];
    assert_eq!((edge.source, edge.target), (1, 0));
    assert!(edge.weight >= edge_weight(5));
    assert!(graph.validate().is_ok());
}

#[test]
fn single_file_has_no_edges() {
    let graph = analyze(&[("solo.py", "def solo():\n    return solo()")]);
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edges.is_empty());
    assert_eq!(graph.nodes[0].num_lines, 2);
}

#[test]
fn archive_with_only_docs_and_images_fails() {
    let err = CodebaseAnalyzer::default()
        .analyze(&zip_archive(&[("README.md", "# hi"), ("logo.png", "png")]), None)
        .unwrap_err();
    assert!(matches!(err, GraphError::EmptyArchive));
    assert!(err.to_string().contains("no valid files"));
}

#[test]
fn corrupt_archive_is_rejected() {
    let err = CodebaseAnalyzer::default()
        .analyze(b"PK\x03\x04 truncated", None)
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidArchive(_)));
}

#[test]
fn nested_python_functions_have_their_own_extent() {
    let source = "def outer():\n    def inner():\n        return 1\n    return inner()";
    let graph = analyze(&[("pkg/mod.py", source)]);
    let functions = &graph.nodes[0].functions;
    assert_eq!(
        functions["outer"],
        FunctionSpan {
            line_start: 1,
            line_count: 4
        }
    );
    assert_eq!(
        functions["inner"],
        FunctionSpan {
            line_start: 2,
            line_count: 2
        }
    );
}

#[test]
fn non_code_files_become_plain_nodes() {
    let graph = analyze(&[
        ("app/config.json", "{\"name\": \"app\"}"),
        ("app/style.css", "body { margin: 0; }"),
        ("app/main.js", "const config = require('./config.json');"),
    ]);
    assert_eq!(graph.nodes.len(), 3);
    assert!(graph.nodes[0].functions.is_empty());
    assert!(graph.nodes[1].functions.is_empty());
    let main = graph.node_index("main.js").unwrap();
    let config = graph.node_index("config.json").unwrap();
    assert!(graph
        .edges
        .iter()
        .any(|edge| edge.source == main && edge.target == config));
}

#[test]
fn repeated_analysis_is_identical_apart_from_epoch() {
    let files = [
        ("repo/lib/util.py", "def helper():\n    return 1"),
        ("repo/lib/main.py", "from lib.util import helper\n\nhelper()"),
        ("repo/web/index.js", "import util from '../lib/util';\nutil.run();"),
    ];
    let archive = zip_archive(&files);
    let analyzer = CodebaseAnalyzer::default();

    let first = analyzer.analyze(&archive, None).unwrap();
    let second = analyzer.analyze(&archive, None).unwrap();

    assert!(second.epoch() > first.epoch());
    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.edges, second.edges);

    let formatter = JsonFormatter::new();
    assert_eq!(
        formatter.format_graph(&first).unwrap(),
        formatter.format_graph(&second).unwrap()
    );
}

#[test]
fn bounded_thread_pool_gives_same_graph() {
    let files = [
        ("a.go", "package main\n\nfunc A() {\n}\n"),
        ("b.go", "package main\n\nfunc B() {\n\tA()\n}\n"),
    ];
    let archive = zip_archive(&files);
    let pooled = CodebaseAnalyzer::new(AnalyzerConfig {
        threads: Some(1),
        ..AnalyzerConfig::default()
    })
    .analyze(&archive, None)
    .unwrap();
    let global = CodebaseAnalyzer::default().analyze(&archive, None).unwrap();
    assert_eq!(pooled.nodes, global.nodes);
    assert_eq!(pooled.edges, global.edges);
}

#[test]
fn edges_satisfy_graph_invariants() {
    let graph = analyze(&[
        ("src/models/user.rs", "pub struct User;\nimpl User {\n    pub fn new() -> Self {\n        User\n    }\n}"),
        ("src/handlers.rs", "use crate::models::user::User;\n\nfn handle() {\n    let _ = User::new();\n}"),
        ("src/main.rs", "mod handlers;\nfn main() {\n    handlers::handle();\n}"),
    ]);

    assert!(graph.validate().is_ok());
    let mut pairs = std::collections::HashSet::new();
    for edge in &graph.edges {
        assert_ne!(edge.source, edge.target);
        assert!(edge.weight > 0.0);
        assert!(pairs.insert((edge.source, edge.target)));
    }
    // every file shares the `src/` folder, so it is stripped as the root
    let main = graph.node_index("main.rs").unwrap();
    let handlers = graph.node_index("handlers.rs").unwrap();
    let user = graph.node_index("models/user.rs").unwrap();
    assert!(pairs.contains(&(main, handlers)));
    assert!(pairs.contains(&(handlers, user)));
    assert_eq!(graph.nodes[main].functions["main"].line_count, 3);
}

#[test]
fn unreadable_file_does_not_disturb_its_neighbours() {
    let graph = analyze(&[
        ("web/util.js", "export function format(v) {\n  return String(v);\n}"),
        ("web/blob.js", "function hidden() {}\0\0\u{1}util"),
        ("web/app.js", "import { format } from './util';\nfunction main() {\n  format(1);\n}"),
    ]);

    assert_eq!(graph.nodes.len(), 3);
    let util = graph.node_index("util.js").unwrap();
    let blob = graph.node_index("blob.js").unwrap();
    let app = graph.node_index("app.js").unwrap();

    assert!(graph.nodes[blob].functions.is_empty());
    assert_eq!(graph.nodes[util].functions["format"].line_count, 3);
    assert_eq!(graph.nodes[app].functions["main"].line_count, 3);
    assert!(graph
        .edges
        .iter()
        .any(|edge| edge.source == app && edge.target == util && edge.weight >= edge_weight(5)));
    assert_eq!(graph.nodes[app].file_dependencies, vec!["util.js"]);
    assert!(graph.validate().is_ok());
}
