use crate::error::{ExtractorError, Result};
use crate::javascript::JavaScriptExtractor;
use crate::language::Language;
use crate::python::PythonExtractor;
use crate::types::ExtractionResult;
use context_graph::{
    ClassNode, Declaration, Diagnostic, FileNode, FunctionNode, ImportNode, NodeId, NodeKind,
};
use std::collections::BTreeSet;
use tree_sitter::{Node, Parser};

/// Grammar-specific declaration extraction.
///
/// Implementations walk the tree once, depth-first, and report every
/// declaration to the sink in source order.
pub trait LanguageExtractor: Send + Sync {
    fn language(&self) -> Language;

    fn collect(&self, root: Node<'_>, sink: &mut DeclarationSink<'_>);
}

/// Extract one file.
///
/// Never fails: parse problems, unsupported languages and grammar errors
/// come back as diagnostics next to the file node. Calling it twice with the
/// same input yields the same result.
pub fn extract(file_path: &str, contents: &str) -> ExtractionResult {
    let language = Language::from_path(file_path);
    let file_node = FileNode::new(file_path, language.as_str(), contents.lines().count());

    let (declarations, diagnostics) = match extract_declarations(file_path, contents, language) {
        Ok(declarations) => (declarations, Vec::new()),
        Err(e @ ExtractorError::UnsupportedLanguage(_)) => {
            log::debug!("No extractor for {file_path}: {e}");
            (
                Vec::new(),
                vec![Diagnostic::warning(Some(file_path), format!("{file_path}: {e}"))],
            )
        }
        Err(e) => {
            log::warn!("Failed to extract {file_path}: {e}");
            (
                Vec::new(),
                vec![Diagnostic::error(Some(file_path), format!("{file_path}: {e}"))],
            )
        }
    };

    ExtractionResult {
        file_node,
        declarations,
        diagnostics,
    }
}

fn extract_declarations(
    file_path: &str,
    contents: &str,
    language: Language,
) -> Result<Vec<Declaration>> {
    let extractor = extractor_for(language)
        .ok_or_else(|| ExtractorError::unsupported_language(language.as_str()))?;

    let mut parser = Parser::new();
    parser
        .set_language(&language.tree_sitter_language()?)
        .map_err(|e| ExtractorError::tree_sitter(format!("Failed to set language: {e}")))?;

    let tree = parser
        .parse(contents, None)
        .ok_or_else(|| ExtractorError::parse("parser returned no tree"))?;
    let root = tree.root_node();

    if root.has_error() {
        let (line, column) = first_error_position(root);
        return Err(ExtractorError::Syntax { line, column });
    }

    let mut sink = DeclarationSink::new(file_path, contents, extractor.language());
    extractor.collect(root, &mut sink);
    let declarations = sink.finish();

    log::debug!(
        "Extracted {} declarations from {file_path}",
        declarations.len()
    );
    Ok(declarations)
}

fn extractor_for(language: Language) -> Option<&'static dyn LanguageExtractor> {
    match language {
        Language::Python => Some(&PythonExtractor),
        Language::JavaScript => Some(&JavaScriptExtractor::JAVASCRIPT),
        Language::TypeScript => Some(&JavaScriptExtractor::TYPESCRIPT),
        Language::Tsx => Some(&JavaScriptExtractor::TSX),
        Language::Unknown => None,
    }
}

/// 1-based line and column of the first ERROR or MISSING node
fn first_error_position(root: Node<'_>) -> (usize, usize) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            return (pos.row + 1, pos.column + 1);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let mut children: Vec<_> = node.children(&mut cursor).collect();
        // Pop in source order
        children.reverse();
        stack.extend(children);
    }
    let pos = root.start_position();
    (pos.row + 1, pos.column + 1)
}

/// Collects declarations for one file and assigns their identifiers
pub struct DeclarationSink<'a> {
    file_path: &'a str,
    file_id: NodeId,
    source: &'a str,
    language: Language,
    declarations: Vec<Declaration>,
}

impl<'a> DeclarationSink<'a> {
    pub fn new(file_path: &'a str, source: &'a str, language: Language) -> Self {
        Self {
            file_path,
            file_id: NodeId::for_file(file_path),
            source,
            language,
            declarations: Vec::new(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn text(&self, node: Node<'_>) -> &'a str {
        node_text(node, self.source)
    }

    fn id_at(&self, kind: NodeKind, name: &str, node: Node<'_>) -> NodeId {
        let pos = node.start_position();
        NodeId::for_declaration(kind, self.file_path, name, pos.row + 1, pos.column)
    }

    pub fn push_function(
        &mut self,
        decl: Node<'_>,
        name: &str,
        calls: BTreeSet<String>,
        is_async: bool,
        parent_class: Option<NodeId>,
    ) -> NodeId {
        let id = self.id_at(NodeKind::Function, name, decl);
        self.declarations.push(Declaration::Function(FunctionNode {
            id: id.clone(),
            name: name.to_string(),
            file_id: self.file_id.clone(),
            is_exported: FunctionNode::is_exported_name(name),
            is_async,
            start_line: decl.start_position().row + 1,
            end_line: decl.end_position().row + 1,
            calls,
            language: self.language.as_str().to_string(),
            parent_class,
        }));
        id
    }

    pub fn push_class(
        &mut self,
        decl: Node<'_>,
        name: &str,
        methods: Vec<String>,
        base_names: Vec<String>,
    ) -> NodeId {
        let id = self.id_at(NodeKind::Class, name, decl);
        self.declarations.push(Declaration::Class(ClassNode {
            id: id.clone(),
            name: name.to_string(),
            file_id: self.file_id.clone(),
            start_line: decl.start_position().row + 1,
            end_line: decl.end_position().row + 1,
            methods,
            base_names,
            language: self.language.as_str().to_string(),
        }));
        id
    }

    /// `at` is the node of the imported name, so several names imported by
    /// one statement get distinct identifiers.
    pub fn push_import(
        &mut self,
        at: Node<'_>,
        name: &str,
        imported_from: &str,
        alias: Option<&str>,
    ) -> NodeId {
        let qualified = if imported_from.is_empty() || imported_from == name {
            name.to_string()
        } else {
            format!("{imported_from}.{name}")
        };
        let id = self.id_at(NodeKind::Import, &qualified, at);
        self.declarations.push(Declaration::Import(ImportNode {
            id: id.clone(),
            name: name.to_string(),
            file_id: self.file_id.clone(),
            line: at.start_position().row + 1,
            imported_from: imported_from.to_string(),
            alias: alias.map(str::to_string),
        }));
        id
    }

    pub fn finish(self) -> Vec<Declaration> {
        self.declarations
    }
}

pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

pub(crate) fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == token);
    found
}

/// Callee names of every matching call node under `body`
pub(crate) fn collect_callees<'t>(
    body: Node<'t>,
    source: &str,
    callee_of: impl Fn(Node<'t>, &str) -> Option<String>,
) -> BTreeSet<String> {
    let mut calls = BTreeSet::new();
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if let Some(callee) = callee_of(node, source) {
            calls.insert(callee);
        }
        stack.extend(named_children(node));
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_graph::Severity;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_language_keeps_file_node() {
        let result = extract("notes/readme.txt", "hello\nworld\n");
        assert_eq!(result.file_node.id.as_str(), "notes/readme.txt");
        assert_eq!(result.file_node.language, "unknown");
        assert_eq!(result.file_node.line_count, 2);
        assert!(result.declarations.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn syntax_errors_report_position_and_path() {
        let result = extract("pkg/broken.py", "x = 1\ndef broken(:\n");
        assert!(result.declarations.is_empty());
        assert!(result.has_errors());
        let message = &result.diagnostics[0].message;
        assert!(message.contains("pkg/broken.py"), "{message}");
        assert!(message.contains("syntax error at line 2"), "{message}");
        assert_eq!(result.diagnostics[0].path.as_deref(), Some("pkg/broken.py"));
    }

    #[test]
    fn empty_file_has_no_declarations() {
        let result = extract("empty.py", "");
        assert!(result.declarations.is_empty());
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.file_node.line_count, 0);
    }
}
