use crate::error::{GraphError, Result};
use crate::types::{
    ClassNode, CodeNode, FileNode, FunctionNode, ImportNode, NodeId, NodeKind, Relationship,
};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Insert-only node collection for one analysis session.
///
/// Nodes live in a directed graph whose only edges are `Contains`
/// (file -> declaration, class -> method). Node indices grow with insertion,
/// so iterating the graph yields nodes in insertion order.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: DiGraph<CodeNode, Relationship>,

    /// Node id -> NodeIndex mapping for O(1) lookup
    id_index: HashMap<NodeId, NodeIndex>,

    /// File id -> declarations owned by that file, in insertion order
    file_index: HashMap<NodeId, Vec<NodeIndex>>,
}

/// Per-kind node tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    pub files: usize,
    pub functions: usize,
    pub classes: usize,
    pub imports: usize,
}

impl NodeCounts {
    pub fn total(&self) -> usize {
        self.files + self.functions + self.classes + self.imports
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Rejects duplicate ids and declarations whose file node is
    /// not in the store yet.
    pub fn insert(&mut self, node: impl Into<CodeNode>) -> Result<NodeIndex> {
        let node = node.into();
        let id = node.id().clone();

        if self.id_index.contains_key(&id) {
            return Err(GraphError::DuplicateIdentifier(id.into_string()));
        }

        let owner = match &node {
            CodeNode::File(_) => None,
            other => {
                let file_id = other.file_id();
                let file_idx = self
                    .id_index
                    .get(file_id)
                    .copied()
                    .filter(|idx| matches!(self.graph[*idx], CodeNode::File(_)))
                    .ok_or_else(|| GraphError::OrphanNode {
                        id: id.to_string(),
                        file_id: file_id.to_string(),
                    })?;
                Some((file_id.clone(), file_idx))
            }
        };

        let parent_class = match &node {
            CodeNode::Function(f) => f
                .parent_class
                .as_ref()
                .and_then(|class_id| self.id_index.get(class_id).copied()),
            _ => None,
        };

        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);

        match owner {
            None => {
                self.file_index.entry(self.graph[idx].id().clone()).or_default();
            }
            Some((file_id, file_idx)) => {
                self.graph.add_edge(file_idx, idx, Relationship::Contains);
                self.file_index.entry(file_id).or_default().push(idx);
            }
        }

        if let Some(class_idx) = parent_class {
            self.graph.add_edge(class_idx, idx, Relationship::Contains);
        }

        Ok(idx)
    }

    pub fn get(&self, id: &str) -> Option<&CodeNode> {
        self.id_index
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// Declarations owned by a file, in insertion (source) order. The file
    /// node itself is not included.
    pub fn nodes_for_file(&self, file_id: &str) -> Vec<&CodeNode> {
        self.file_index
            .get(file_id)
            .map(|indices| indices.iter().map(|idx| &self.graph[*idx]).collect())
            .unwrap_or_default()
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &CodeNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn all_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &CodeNode> {
        self.nodes().filter(move |node| node.kind() == kind)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes().filter_map(CodeNode::as_file)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionNode> {
        self.nodes().filter_map(CodeNode::as_function)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassNode> {
        self.nodes().filter_map(CodeNode::as_class)
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportNode> {
        self.nodes().filter_map(CodeNode::as_import)
    }

    /// Nodes directly contained by `id` (declarations of a file, methods of a class)
    pub fn members(&self, id: &str) -> Vec<&CodeNode> {
        let Some(&idx) = self.id_index.get(id) else {
            return Vec::new();
        };

        // petgraph walks adjacency lists newest-first
        let mut children: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| matches!(e.weight(), Relationship::Contains))
            .map(|e| e.target())
            .collect();
        children.sort();
        children.into_iter().map(|child| &self.graph[child]).collect()
    }

    pub fn counts(&self) -> NodeCounts {
        NodeCounts {
            files: self.all_of_kind(NodeKind::File).count(),
            functions: self.all_of_kind(NodeKind::Function).count(),
            classes: self.all_of_kind(NodeKind::Class).count(),
            imports: self.all_of_kind(NodeKind::Import).count(),
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Declaration;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn function(file: &str, name: &str, line: usize) -> FunctionNode {
        FunctionNode {
            id: NodeId::for_declaration(NodeKind::Function, file, name, line, 0),
            name: name.to_string(),
            file_id: NodeId::for_file(file),
            is_exported: FunctionNode::is_exported_name(name),
            is_async: false,
            start_line: line,
            end_line: line + 1,
            calls: BTreeSet::new(),
            language: "python".to_string(),
            parent_class: None,
        }
    }

    #[test]
    fn insert_and_lookup() {
        let mut store = GraphStore::new();
        store.insert(FileNode::new("a.py", "python", 4)).unwrap();
        let f = function("a.py", "run", 1);
        let id = f.id.clone();
        store.insert(CodeNode::Function(f)).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(id.as_str()).map(CodeNode::name), Some("run"));
        assert!(store.get("function:a.py:missing:1:0").is_none());
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut store = GraphStore::new();
        store.insert(FileNode::new("a.py", "python", 4)).unwrap();
        store.insert(CodeNode::Function(function("a.py", "run", 1))).unwrap();

        let err = store
            .insert(CodeNode::Function(function("a.py", "run", 1)))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateIdentifier("function:a.py:run:1:0".to_string())
        );

        let err = store.insert(FileNode::new("a.py", "python", 4)).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateIdentifier(_)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn rejects_orphans() {
        let mut store = GraphStore::new();
        let err = store
            .insert(CodeNode::Function(function("b.py", "run", 1)))
            .unwrap_err();
        assert!(matches!(err, GraphError::OrphanNode { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn nodes_for_file_keep_insertion_order() {
        let mut store = GraphStore::new();
        store.insert(FileNode::new("a.py", "python", 10)).unwrap();
        store.insert(FileNode::new("b.py", "python", 10)).unwrap();
        for (file, name, line) in [("a.py", "first", 1), ("b.py", "other", 1), ("a.py", "second", 5)] {
            store
                .insert(Declaration::Function(function(file, name, line)))
                .unwrap();
        }

        let names: Vec<_> = store.nodes_for_file("a.py").iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(store.nodes_for_file("missing.py").is_empty());

        let counts = store.counts();
        assert_eq!(counts.files, 2);
        assert_eq!(counts.functions, 3);
        assert_eq!(counts.total(), store.len());
    }

    #[test]
    fn class_members_follow_parent_links() {
        let mut store = GraphStore::new();
        store.insert(FileNode::new("dog.py", "python", 3)).unwrap();
        let class = ClassNode {
            id: NodeId::for_declaration(NodeKind::Class, "dog.py", "Dog", 1, 0),
            name: "Dog".to_string(),
            file_id: NodeId::for_file("dog.py"),
            start_line: 1,
            end_line: 3,
            methods: vec!["bark".to_string()],
            base_names: vec!["Animal".to_string()],
            language: "python".to_string(),
        };
        let class_id = class.id.clone();
        store.insert(CodeNode::Class(class)).unwrap();

        let mut method = function("dog.py", "bark", 2);
        method.parent_class = Some(class_id.clone());
        store.insert(CodeNode::Function(method)).unwrap();

        let members: Vec<_> = store.members(class_id.as_str()).iter().map(|n| n.name()).collect();
        assert_eq!(members, vec!["bark"]);

        let file_members: Vec<_> = store.members("dog.py").iter().map(|n| n.kind()).collect();
        assert_eq!(file_members, vec![NodeKind::Class, NodeKind::Function]);
    }
}
