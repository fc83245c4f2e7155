pub mod analyzer;
pub mod archive;
pub mod categorize;
pub mod graph;
pub mod language;
pub mod resolver;
pub mod session;

pub use analyzer::CodebaseAnalyzer;
pub use archive::{discover_root, ArchiveEntry, ArchiveLoader};
pub use categorize::{Categorization, Categorizer, DirectoryCategorizer, StaticCategorizer};
pub use graph::{Edge, Epoch, FileNode, FunctionSpan, Graph, GraphBuilder, DEFAULT_CATEGORY};
pub use language::Language;
pub use resolver::{edge_weight, normalize_specifier, DependencyResolver, Resolution, ResolverInput};
pub use session::{spawn_categorization, GraphSession, MergeOutcome};
