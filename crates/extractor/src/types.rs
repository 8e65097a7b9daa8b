use context_graph::{CodeNode, Declaration, Diagnostic, FileNode, NodeKind};
use serde::{Deserialize, Serialize};

/// Everything one file contributes to the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub file_node: FileNode,

    /// Declarations in source order. Empty when the file failed to parse.
    pub declarations: Vec<Declaration>,

    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn count_of(&self, kind: NodeKind) -> usize {
        match kind {
            NodeKind::File => 1,
            _ => self.declarations.iter().filter(|d| d.kind() == kind).count(),
        }
    }

    /// File node first, then declarations, ready for insertion.
    pub fn into_nodes(self) -> impl Iterator<Item = CodeNode> {
        std::iter::once(CodeNode::File(self.file_node))
            .chain(self.declarations.into_iter().map(CodeNode::from))
    }
}
