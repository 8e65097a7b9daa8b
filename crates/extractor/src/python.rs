//! Python extractor (tree-sitter-python).

use crate::extractor::{
    collect_callees, has_token, named_children, node_text, DeclarationSink, LanguageExtractor,
};
use crate::language::Language;
use context_graph::NodeId;
use tree_sitter::Node;

pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn collect(&self, root: Node<'_>, sink: &mut DeclarationSink<'_>) {
        visit(root, sink, None);
    }
}

/// Pre-order walk. `class_id` is set only for direct children of a class body.
fn visit(node: Node<'_>, sink: &mut DeclarationSink<'_>, class_id: Option<&NodeId>) {
    match node.kind() {
        "function_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = sink.text(name_node);
                let calls = node
                    .child_by_field_name("body")
                    .map(|body| collect_callees(body, sink.source(), callee_name))
                    .unwrap_or_default();
                sink.push_function(node, name, calls, has_token(node, "async"), class_id.cloned());
            }
            visit_children(node, sink);
        }
        "class_definition" => {
            let Some(name_node) = node.child_by_field_name("name") else {
                visit_children(node, sink);
                return;
            };
            let name = sink.text(name_node);
            let body = node.child_by_field_name("body");
            let methods = body
                .map(|body| class_methods(body, sink.source()))
                .unwrap_or_default();
            let base_names = node
                .child_by_field_name("superclasses")
                .map(|args| base_names(args, sink.source()))
                .unwrap_or_default();

            let id = sink.push_class(node, name, methods, base_names);
            if let Some(body) = body {
                for child in named_children(body) {
                    visit(child, sink, Some(&id));
                }
            }
        }
        // Decorators do not change which body a definition belongs to
        "decorated_definition" => {
            for child in named_children(node) {
                visit(child, sink, class_id);
            }
        }
        "import_statement" => push_plain_imports(node, sink),
        "import_from_statement" => {
            let module = node
                .child_by_field_name("module_name")
                .map(|m| module_name(m, sink.source()))
                .unwrap_or_default();
            push_from_imports(node, module, sink);
        }
        "future_import_statement" => push_from_imports(node, "__future__", sink),
        _ => visit_children(node, sink),
    }
}

fn visit_children(node: Node<'_>, sink: &mut DeclarationSink<'_>) {
    for child in named_children(node) {
        visit(child, sink, None);
    }
}

/// `f()` gives `f`, `obj.method()` gives `method`; other callee shapes are skipped
fn callee_name(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "call" {
        return None;
    }
    let function = node.child_by_field_name("function")?;
    trailing_name(function, source)
}

fn trailing_name(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node_text(node, source).to_string()),
        "attribute" => node
            .child_by_field_name("attribute")
            .map(|attr| node_text(attr, source).to_string()),
        _ => None,
    }
}

fn class_methods(body: Node<'_>, source: &str) -> Vec<String> {
    named_children(body)
        .into_iter()
        .filter_map(|child| match child.kind() {
            "function_definition" => Some(child),
            "decorated_definition" => child
                .child_by_field_name("definition")
                .filter(|def| def.kind() == "function_definition"),
            _ => None,
        })
        .filter_map(|def| def.child_by_field_name("name"))
        .map(|name| node_text(name, source).to_string())
        .collect()
}

/// Positional bases only; `metaclass=...` and computed bases are ignored
fn base_names(superclasses: Node<'_>, source: &str) -> Vec<String> {
    named_children(superclasses)
        .into_iter()
        .filter_map(|arg| trailing_name(arg, source))
        .collect()
}

/// Module string without the leading dots of a relative import
fn module_name<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    match node.kind() {
        "relative_import" => named_children(node)
            .into_iter()
            .find(|child| child.kind() == "dotted_name")
            .map(|dotted| node_text(dotted, source))
            .unwrap_or_default(),
        _ => node_text(node, source),
    }
}

/// `import a.b, c as d`
fn push_plain_imports(node: Node<'_>, sink: &mut DeclarationSink<'_>) {
    for (at, name, alias) in imported_names(node, sink.source()) {
        sink.push_import(at, name, name, alias);
    }
}

/// `from m import a, b as c` / `from m import *`
fn push_from_imports(node: Node<'_>, module: &str, sink: &mut DeclarationSink<'_>) {
    for (at, name, alias) in imported_names(node, sink.source()) {
        sink.push_import(at, name, module, alias);
    }
    if let Some(wildcard) = named_children(node)
        .into_iter()
        .find(|child| child.kind() == "wildcard_import")
    {
        sink.push_import(wildcard, "*", module, None);
    }
}

fn imported_names<'t, 's>(
    node: Node<'t>,
    source: &'s str,
) -> Vec<(Node<'t>, &'s str, Option<&'s str>)> {
    let mut cursor = node.walk();
    let names: Vec<Node<'t>> = node.children_by_field_name("name", &mut cursor).collect();

    names
        .into_iter()
        .filter_map(|child| match child.kind() {
            "aliased_import" => {
                let name = child.child_by_field_name("name")?;
                let alias = child
                    .child_by_field_name("alias")
                    .map(|alias| node_text(alias, source));
                Some((child, node_text(name, source), alias))
            }
            _ => Some((child, node_text(child, source), None)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::extract;
    use context_graph::{ClassNode, Declaration, FunctionNode, ImportNode};
    use pretty_assertions::assert_eq;

    fn functions(code: &str) -> Vec<FunctionNode> {
        extract("mod.py", code)
            .declarations
            .into_iter()
            .filter_map(|d| match d {
                Declaration::Function(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    fn classes(code: &str) -> Vec<ClassNode> {
        extract("mod.py", code)
            .declarations
            .into_iter()
            .filter_map(|d| match d {
                Declaration::Class(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    fn imports(code: &str) -> Vec<ImportNode> {
        extract("mod.py", code)
            .declarations
            .into_iter()
            .filter_map(|d| match d {
                Declaration::Import(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn calls_collapse_to_a_set() {
        let code = r#"
def run(items):
    log("start")
    for item in items:
        log(item)
        self.store.save(item)
    return len(items)
"#;
        let f = &functions(code)[0];
        let calls: Vec<_> = f.calls.iter().map(String::as_str).collect();
        assert_eq!(calls, vec!["len", "log", "save"]);
        assert_eq!(f.start_line, 2);
        assert_eq!(f.end_line, 7);
        assert!(f.is_exported);
    }

    #[test]
    fn nested_bodies_count_toward_the_outer_function() {
        let code = r#"
def outer():
    def _inner():
        helper()
    return _inner
"#;
        let fns = functions(code);
        assert_eq!(fns.len(), 2);
        assert_eq!(fns[0].name, "outer");
        assert!(fns[0].calls.contains("helper"));
        assert_eq!(fns[1].name, "_inner");
        assert!(!fns[1].is_exported);
        assert!(fns[1].parent_class.is_none());
    }

    #[test]
    fn subscript_and_chained_callees_are_skipped() {
        let code = r#"
def dispatch(table):
    table["x"]()
    make()()
"#;
        let calls: Vec<_> = functions(code)[0].calls.iter().cloned().collect();
        assert_eq!(calls, vec!["make".to_string()]);
    }

    #[test]
    fn async_functions_are_functions() {
        let code = "async def fetch():\n    await get()\n";
        let fns = functions(code);
        assert_eq!(fns.len(), 1);
        assert!(fns[0].is_async);
        assert!(fns[0].calls.contains("get"));
    }

    #[test]
    fn class_methods_and_bases() {
        let code = r#"
class Dog(Animal, base.Mixin, metaclass=Meta):
    legs = 4

    def bark(self):
        self.emit("woof")

    @property
    def name(self):
        return "dog"

    if DEBUG:
        def debug(self):
            pass
"#;
        let class = &classes(code)[0];
        assert_eq!(class.name, "Dog");
        assert_eq!(class.methods, vec!["bark".to_string(), "name".to_string()]);
        assert_eq!(class.base_names, vec!["Animal".to_string(), "Mixin".to_string()]);

        let fns = functions(code);
        let names: Vec<_> = fns.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["bark", "name", "debug"]);
        assert_eq!(fns[0].parent_class.as_ref(), Some(&class.id));
        assert_eq!(fns[1].parent_class.as_ref(), Some(&class.id));
        assert!(fns[2].parent_class.is_none());
    }

    #[test]
    fn plain_imports() {
        let found = imports("import os, os.path as osp\n");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "os");
        assert_eq!(found[0].imported_from, "os");
        assert_eq!(found[0].alias, None);
        assert_eq!(found[1].name, "os.path");
        assert_eq!(found[1].imported_from, "os.path");
        assert_eq!(found[1].alias.as_deref(), Some("osp"));
        assert_eq!(found[1].id.as_str(), "import:mod.py:os.path:1:11");
    }

    #[test]
    fn from_imports() {
        let code = "from collections import OrderedDict as OD, deque\nfrom . import sibling\nfrom ..pkg.mod import thing\nfrom typing import *\nfrom __future__ import annotations\n";
        let found = imports(code);
        let rows: Vec<_> = found
            .iter()
            .map(|i| (i.name.as_str(), i.imported_from.as_str(), i.alias.as_deref()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("OrderedDict", "collections", Some("OD")),
                ("deque", "collections", None),
                ("sibling", "", None),
                ("thing", "pkg.mod", None),
                ("*", "typing", None),
                ("annotations", "__future__", None),
            ]
        );
        assert_eq!(found[0].id.as_str(), "import:mod.py:collections.OrderedDict:1:24");
        assert_eq!(found[2].id.as_str(), "import:mod.py:sibling:2:14");
    }
}
