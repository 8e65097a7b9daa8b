//! # Context Graph
//!
//! In-memory graph of code declarations and the queries served over it.
//!
//! ## Features
//!
//! - **Declaration model** - files, functions, classes, imports as one tagged union
//! - **Graph store** - insert-only, O(1) lookup by id and by owning file
//! - **Query engine** - function context lookup, related-file discovery
//!
//! ## Architecture
//!
//! ```text
//! ExtractionResult[] (one per file)
//!     │
//!     ├──> Graph Store (petgraph)
//!     │      ├─ Nodes: file, function, class, import
//!     │      ├─ Edges: Contains (file -> declaration, class -> method)
//!     │      └─ Indices: id -> node, file -> declarations
//!     │
//!     └──> Graph Query
//!            ├─ get_function_context(name)
//!            └─ find_related_files(file, import | call | inheritance)
//! ```
//!
//! Relationships between declarations (`calls`, `base_names`,
//! `imported_from`) are names, not resolved references.

mod error;
mod query;
mod store;
mod types;

pub use error::{GraphError, Result};
pub use query::{FunctionContext, FunctionLookup, GraphQuery, RelatedFile, RelationshipKind};
pub use store::{GraphStore, NodeCounts};
pub use types::{
    ClassNode, CodeNode, Declaration, Diagnostic, FileNode, FunctionNode, ImportNode, NodeId,
    NodeKind, Relationship, Severity,
};
