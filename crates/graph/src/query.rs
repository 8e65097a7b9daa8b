use crate::store::GraphStore;
use crate::types::{CodeNode, FunctionNode, ImportNode, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Read-only navigation queries over a populated store
#[derive(Debug, Clone, Copy)]
pub struct GraphQuery<'a> {
    store: &'a GraphStore,
}

/// Outcome of a function lookup. Absence is an ordinary answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FunctionLookup {
    Found(FunctionContext),
    NotFound { name: String },
}

impl FunctionLookup {
    pub fn found(&self) -> Option<&FunctionContext> {
        match self {
            FunctionLookup::Found(ctx) => Some(ctx),
            FunctionLookup::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FunctionLookup::Found(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionContext {
    pub function: FunctionNode,
    pub file_id: NodeId,
    pub calls: BTreeSet<String>,
    pub is_exported: bool,

    /// Functions whose call sets mention this name, in store order
    pub called_by: Vec<NodeId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<NodeId>,
}

/// How two files are considered related
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Both files import overlapping module/name strings
    Import,

    /// A function in one file calls a function declared in the other
    Call,

    /// A class in one file derives from a class declared in the other
    Inheritance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedFile {
    pub file: NodeId,
    pub relationship_kind: RelationshipKind,

    /// Node in `file` that established the relationship
    pub evidence_node: NodeId,
}

impl<'a> GraphQuery<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Context for the first function named `name`, in store insertion order.
    /// Same-named functions elsewhere are not disambiguated.
    pub fn get_function_context(&self, name: &str) -> FunctionLookup {
        let Some(function) = self.store.functions().find(|f| f.name == name) else {
            return FunctionLookup::NotFound {
                name: name.to_string(),
            };
        };

        let called_by = self
            .store
            .functions()
            .filter(|caller| caller.calls.contains(name))
            .map(|caller| caller.id.clone())
            .collect();

        FunctionLookup::Found(FunctionContext {
            function: function.clone(),
            file_id: function.file_id.clone(),
            calls: function.calls.clone(),
            is_exported: function.is_exported,
            called_by,
            parent_class: function.parent_class.clone(),
        })
    }

    /// Files related to `file_id`, one entry per related file, in store order.
    /// Unknown files have no relations.
    pub fn find_related_files(&self, file_id: &str, kind: RelationshipKind) -> Vec<RelatedFile> {
        if !self.store.contains(file_id) {
            return Vec::new();
        }

        let own = self.store.nodes_for_file(file_id);
        let mut related = Vec::new();

        for file in self.store.files() {
            if file.id.as_str() == file_id {
                continue;
            }
            let theirs = self.store.nodes_for_file(file.id.as_str());
            let evidence = match kind {
                RelationshipKind::Import => import_evidence(&own, &theirs),
                RelationshipKind::Call => call_evidence(&own, &theirs),
                RelationshipKind::Inheritance => inheritance_evidence(&own, &theirs),
            };
            if let Some(evidence_node) = evidence {
                related.push(RelatedFile {
                    file: file.id.clone(),
                    relationship_kind: kind,
                    evidence_node,
                });
            }
        }

        log::debug!(
            "{} files related to {file_id} by {kind:?}",
            related.len()
        );
        related
    }
}

fn import_evidence(own: &[&CodeNode], theirs: &[&CodeNode]) -> Option<NodeId> {
    let own_imports: Vec<&ImportNode> = own.iter().filter_map(|n| n.as_import()).collect();
    if own_imports.is_empty() {
        return None;
    }

    theirs
        .iter()
        .filter_map(|n| n.as_import())
        .find(|candidate| own_imports.iter().any(|mine| imports_overlap(mine, candidate)))
        .map(|candidate| candidate.id.clone())
}

fn imports_overlap(a: &ImportNode, b: &ImportNode) -> bool {
    let left = [a.imported_from.as_str(), a.name.as_str()];
    let right = [b.imported_from.as_str(), b.name.as_str()];
    left.iter()
        .any(|x| right.iter().any(|y| text_overlaps(x, y)))
}

/// Substring containment either way. Empty strings and wildcards never match.
fn text_overlaps(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() || a == "*" || b == "*" {
        return false;
    }
    a.contains(b) || b.contains(a)
}

fn call_evidence(own: &[&CodeNode], theirs: &[&CodeNode]) -> Option<NodeId> {
    let own_functions: Vec<&FunctionNode> = own.iter().filter_map(|n| n.as_function()).collect();
    let own_names: HashSet<&str> = own_functions.iter().map(|f| f.name.as_str()).collect();
    let own_calls: HashSet<&str> = own_functions
        .iter()
        .flat_map(|f| f.calls.iter().map(String::as_str))
        .collect();

    theirs
        .iter()
        .filter_map(|n| n.as_function())
        .find(|f| {
            own_calls.contains(f.name.as_str())
                || f.calls.iter().any(|callee| own_names.contains(callee.as_str()))
        })
        .map(|f| f.id.clone())
}

fn inheritance_evidence(own: &[&CodeNode], theirs: &[&CodeNode]) -> Option<NodeId> {
    let own_classes: Vec<_> = own.iter().filter_map(|n| n.as_class()).collect();
    if own_classes.is_empty() {
        return None;
    }
    let own_names: HashSet<&str> = own_classes.iter().map(|c| c.name.as_str()).collect();
    let own_bases: HashSet<&str> = own_classes
        .iter()
        .flat_map(|c| c.base_names.iter().map(String::as_str))
        .collect();

    theirs
        .iter()
        .filter_map(|n| n.as_class())
        .find(|c| {
            own_bases.contains(c.name.as_str())
                || c.base_names.iter().any(|base| own_names.contains(base.as_str()))
        })
        .map(|c| c.id.clone())
}
