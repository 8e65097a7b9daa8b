use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// Kind discriminant shared by every node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Function,
    Class,
    Import,
}

impl NodeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Function => "function",
            NodeKind::Class => "class",
            NodeKind::Import => "import",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session-scoped node identifier.
///
/// File nodes are keyed by their root-relative path, so a declaration's
/// `file_id` is both the owning path and the owning node's id. Declarations
/// are keyed by `{kind}:{file}:{name}:{line}:{column}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn for_file(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn for_declaration(
        kind: NodeKind,
        file_path: &str,
        name: &str,
        line: usize,
        column: usize,
    ) -> Self {
        Self(format!("{kind}:{file_path}:{name}:{line}:{column}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One analyzed source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: NodeId,

    /// Base file name (e.g., "models.py")
    pub name: String,

    /// Always equal to `id`
    pub file_id: NodeId,

    /// Root-relative, `/`-separated path
    pub path: String,

    /// Language tag of the extractor that handled the file ("unknown" if none)
    pub language: String,

    pub line_count: usize,
}

impl FileNode {
    pub fn new(path: impl Into<String>, language: impl Into<String>, line_count: usize) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(path.as_str()).to_string();
        let id = NodeId::for_file(path.clone());
        Self {
            file_id: id.clone(),
            id,
            name,
            path,
            language: language.into(),
            line_count,
        }
    }
}

/// Function or method declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionNode {
    pub id: NodeId,
    pub name: String,
    pub file_id: NodeId,

    /// False iff the name starts with an underscore
    pub is_exported: bool,

    pub is_async: bool,

    /// Line range (1-indexed, inclusive)
    pub start_line: usize,
    pub end_line: usize,

    /// Callee names seen textually in the body. Evidence of a call, not a
    /// resolved reference.
    pub calls: BTreeSet<String>,

    /// Tag of the extractor that produced this node
    pub language: String,

    /// Class whose body declares this function directly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<NodeId>,
}

impl FunctionNode {
    pub fn is_exported_name(name: &str) -> bool {
        !name.starts_with('_')
    }
}

/// Class declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    pub id: NodeId,
    pub name: String,
    pub file_id: NodeId,
    pub start_line: usize,
    pub end_line: usize,

    /// Methods declared directly in the class body, in source order
    pub methods: Vec<String>,

    /// Base-class names as written (dotted bases keep the trailing name)
    pub base_names: Vec<String>,

    pub language: String,
}

/// One imported name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportNode {
    pub id: NodeId,
    pub name: String,
    pub file_id: NodeId,
    pub line: usize,

    /// Module the name comes from; equals `name` for a bare `import x`
    pub imported_from: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Anything a file declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Function(FunctionNode),
    Class(ClassNode),
    Import(ImportNode),
}

impl Declaration {
    pub fn id(&self) -> &NodeId {
        match self {
            Declaration::Function(f) => &f.id,
            Declaration::Class(c) => &c.id,
            Declaration::Import(i) => &i.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Declaration::Function(f) => &f.name,
            Declaration::Class(c) => &c.name,
            Declaration::Import(i) => &i.name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Declaration::Function(_) => NodeKind::Function,
            Declaration::Class(_) => NodeKind::Class,
            Declaration::Import(_) => NodeKind::Import,
        }
    }
}

/// Node in the code graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodeNode {
    File(FileNode),
    Function(FunctionNode),
    Class(ClassNode),
    Import(ImportNode),
}

impl CodeNode {
    pub fn id(&self) -> &NodeId {
        match self {
            CodeNode::File(n) => &n.id,
            CodeNode::Function(n) => &n.id,
            CodeNode::Class(n) => &n.id,
            CodeNode::Import(n) => &n.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CodeNode::File(n) => &n.name,
            CodeNode::Function(n) => &n.name,
            CodeNode::Class(n) => &n.name,
            CodeNode::Import(n) => &n.name,
        }
    }

    pub fn file_id(&self) -> &NodeId {
        match self {
            CodeNode::File(n) => &n.file_id,
            CodeNode::Function(n) => &n.file_id,
            CodeNode::Class(n) => &n.file_id,
            CodeNode::Import(n) => &n.file_id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            CodeNode::File(_) => NodeKind::File,
            CodeNode::Function(_) => NodeKind::Function,
            CodeNode::Class(_) => NodeKind::Class,
            CodeNode::Import(_) => NodeKind::Import,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            CodeNode::File(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionNode> {
        match self {
            CodeNode::Function(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassNode> {
        match self {
            CodeNode::Class(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_import(&self) -> Option<&ImportNode> {
        match self {
            CodeNode::Import(n) => Some(n),
            _ => None,
        }
    }
}

impl From<FileNode> for CodeNode {
    fn from(node: FileNode) -> Self {
        CodeNode::File(node)
    }
}

impl From<Declaration> for CodeNode {
    fn from(decl: Declaration) -> Self {
        match decl {
            Declaration::Function(n) => CodeNode::Function(n),
            Declaration::Class(n) => CodeNode::Class(n),
            Declaration::Import(n) => CodeNode::Import(n),
        }
    }
}

/// Edge label in the store graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    /// A contains B (file contains declaration, class contains method)
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Non-fatal problem met while analyzing a file or directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub message: String,
}

impl Diagnostic {
    pub fn error(path: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn warning(path: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: {}", self.message)
    }
}
