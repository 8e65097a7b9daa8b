//! JavaScript and TypeScript extractor.
//!
//! Both grammars share node kinds for the constructs read here; TypeScript
//! adds `extends_clause`/`implements_clause` inside `class_heritage` and
//! abstract classes.

use crate::extractor::{
    collect_callees, has_token, named_children, node_text, DeclarationSink, LanguageExtractor,
};
use crate::language::Language;
use context_graph::NodeId;
use tree_sitter::Node;

pub struct JavaScriptExtractor {
    language: Language,
}

impl JavaScriptExtractor {
    pub const JAVASCRIPT: Self = Self {
        language: Language::JavaScript,
    };
    pub const TYPESCRIPT: Self = Self {
        language: Language::TypeScript,
    };
    pub const TSX: Self = Self {
        language: Language::Tsx,
    };
}

impl LanguageExtractor for JavaScriptExtractor {
    fn language(&self) -> Language {
        self.language
    }

    fn collect(&self, root: Node<'_>, sink: &mut DeclarationSink<'_>) {
        visit(root, sink, None);
    }
}

const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

fn visit(node: Node<'_>, sink: &mut DeclarationSink<'_>, class_id: Option<&NodeId>) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = sink.text(name_node);
                let calls = body_calls(node, sink.source());
                sink.push_function(node, name, calls, has_token(node, "async"), None);
            }
            visit_children(node, sink);
        }
        "method_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = sink.text(name_node);
                let calls = body_calls(node, sink.source());
                sink.push_function(node, name, calls, has_token(node, "async"), class_id.cloned());
            }
            visit_children(node, sink);
        }
        // const handler = async () => { ... }
        "variable_declarator" => {
            let name_node = node
                .child_by_field_name("name")
                .filter(|n| n.kind() == "identifier");
            let value = node
                .child_by_field_name("value")
                .filter(|v| FUNCTION_VALUES.contains(&v.kind()));
            if let (Some(name_node), Some(value)) = (name_node, value) {
                let name = sink.text(name_node);
                let calls = body_calls(value, sink.source());
                sink.push_function(node, name, calls, has_token(value, "async"), None);
            }
            visit_children(node, sink);
        }
        "class_declaration" | "abstract_class_declaration" | "class" if node.is_named() => {
            let Some(name_node) = node.child_by_field_name("name") else {
                visit_children(node, sink);
                return;
            };
            let name = sink.text(name_node);
            let body = node.child_by_field_name("body");
            let methods = body
                .map(|body| class_methods(body, sink.source()))
                .unwrap_or_default();
            let base_names = named_children(node)
                .into_iter()
                .find(|child| child.kind() == "class_heritage")
                .map(|heritage| heritage_names(heritage, sink.source()))
                .unwrap_or_default();

            let id = sink.push_class(node, name, methods, base_names);
            if let Some(body) = body {
                for child in named_children(body) {
                    visit(child, sink, Some(&id));
                }
            }
        }
        "import_statement" => push_imports(node, sink),
        _ => visit_children(node, sink),
    }
}

fn visit_children(node: Node<'_>, sink: &mut DeclarationSink<'_>) {
    for child in named_children(node) {
        visit(child, sink, None);
    }
}

fn body_calls(function: Node<'_>, source: &str) -> std::collections::BTreeSet<String> {
    function
        .child_by_field_name("body")
        .map(|body| collect_callees(body, source, callee_name))
        .unwrap_or_default()
}

/// `f()` gives `f`, `obj.method()` gives `method`, `new Foo()` gives `Foo`
fn callee_name(node: Node<'_>, source: &str) -> Option<String> {
    let target = match node.kind() {
        "call_expression" => node.child_by_field_name("function")?,
        "new_expression" => node.child_by_field_name("constructor")?,
        _ => return None,
    };
    match target.kind() {
        "identifier" => Some(node_text(target, source).to_string()),
        "member_expression" => target
            .child_by_field_name("property")
            .map(|prop| node_text(prop, source).to_string()),
        _ => None,
    }
}

fn class_methods(body: Node<'_>, source: &str) -> Vec<String> {
    named_children(body)
        .into_iter()
        .filter(|member| member.kind() == "method_definition")
        .filter_map(|member| member.child_by_field_name("name"))
        .map(|name| node_text(name, source).to_string())
        .collect()
}

fn heritage_names(heritage: Node<'_>, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    for child in named_children(heritage) {
        match child.kind() {
            "extends_clause" => {
                let mut cursor = child.walk();
                let values: Vec<_> = child.children_by_field_name("value", &mut cursor).collect();
                names.extend(values.into_iter().filter_map(|v| type_name(v, source)));
            }
            "implements_clause" => {
                names.extend(
                    named_children(child)
                        .into_iter()
                        .filter_map(|t| type_name(t, source)),
                );
            }
            _ => names.extend(type_name(child, source)),
        }
    }
    names
}

/// Trailing name of a base expression or type
fn type_name(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" | "type_identifier" => Some(node_text(node, source).to_string()),
        "member_expression" => node
            .child_by_field_name("property")
            .map(|prop| node_text(prop, source).to_string()),
        "generic_type" | "nested_type_identifier" => node
            .child_by_field_name("name")
            .and_then(|name| type_name(name, source)),
        _ => None,
    }
}

fn push_imports(node: Node<'_>, sink: &mut DeclarationSink<'_>) {
    let source = sink.source();
    let module = node
        .child_by_field_name("source")
        .map(|s| unquote(s, source))
        .unwrap_or_default();

    let clause = named_children(node)
        .into_iter()
        .find(|child| matches!(child.kind(), "import_clause" | "import_require_clause"));

    let Some(clause) = clause else {
        // import './side-effect.js'
        if let Some(at) = node.child_by_field_name("source") {
            sink.push_import(at, module, module, None);
        }
        return;
    };

    if clause.kind() == "import_require_clause" {
        // import fs = require("fs")
        let from = clause
            .child_by_field_name("source")
            .map(|s| unquote(s, source))
            .unwrap_or_default();
        if let Some(local) = named_children(clause)
            .into_iter()
            .find(|child| child.kind() == "identifier")
        {
            sink.push_import(local, node_text(local, source), from, None);
        }
        return;
    }

    for part in named_children(clause) {
        match part.kind() {
            "identifier" => {
                sink.push_import(part, node_text(part, source), module, None);
            }
            "namespace_import" => {
                let alias = named_children(part)
                    .into_iter()
                    .find(|child| child.kind() == "identifier")
                    .map(|ident| node_text(ident, source));
                sink.push_import(part, "*", module, alias);
            }
            "named_imports" => {
                for spec in named_children(part)
                    .into_iter()
                    .filter(|child| child.kind() == "import_specifier")
                {
                    let Some(name) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let alias = spec
                        .child_by_field_name("alias")
                        .map(|alias| node_text(alias, source));
                    sink.push_import(spec, unquote(name, source), module, alias);
                }
            }
            _ => {}
        }
    }
}

fn unquote<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node_text(node, source).trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

#[cfg(test)]
mod tests {
    use crate::extract;
    use context_graph::Declaration;
    use pretty_assertions::assert_eq;

    #[test]
    fn functions_methods_and_arrows() {
        let code = r#"
import { readFile as rf, join } from "node:fs";
import React from 'react';
import * as path from 'path';
import './polyfill.js';

export function load(p) {
  const data = rf(path.join(p));
  return new Parser(data).parse();
}

const _cache = async (key) => store.get(key);

class Loader extends Base {
  constructor() { super(); }
  async fetch(url) { return load(url); }
}
"#;
        let result = extract("src/loader.js", code);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

        let mut functions = Vec::new();
        let mut classes = Vec::new();
        let mut imports = Vec::new();
        for decl in result.declarations {
            match decl {
                Declaration::Function(f) => functions.push(f),
                Declaration::Class(c) => classes.push(c),
                Declaration::Import(i) => imports.push(i),
            }
        }

        let import_rows: Vec<_> = imports
            .iter()
            .map(|i| (i.name.as_str(), i.imported_from.as_str(), i.alias.as_deref()))
            .collect();
        assert_eq!(
            import_rows,
            vec![
                ("readFile", "node:fs", Some("rf")),
                ("join", "node:fs", None),
                ("React", "react", None),
                ("*", "path", Some("path")),
                ("./polyfill.js", "./polyfill.js", None),
            ]
        );

        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["load", "_cache", "constructor", "fetch"]);

        let load_calls: Vec<_> = functions[0].calls.iter().map(String::as_str).collect();
        assert_eq!(load_calls, vec!["Parser", "join", "parse", "rf"]);
        assert!(!functions[1].is_exported);
        assert!(functions[1].is_async);
        assert!(functions[1].calls.contains("get"));
        assert_eq!(functions[3].parent_class.as_ref(), Some(&classes[0].id));
        assert_eq!(functions[3].language, "javascript");

        assert_eq!(classes[0].name, "Loader");
        assert_eq!(classes[0].methods, vec!["constructor".to_string(), "fetch".to_string()]);
        assert_eq!(classes[0].base_names, vec!["Base".to_string()]);
    }

    #[test]
    fn typescript_heritage() {
        let code = r#"
abstract class Repo<T> extends models.Store<T> implements Reader, Writer<T> {
  find(id: string): T { return this.lookup(id); }
}
"#;
        let result = extract("repo.ts", code);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let class = result
            .declarations
            .iter()
            .find_map(|d| match d {
                Declaration::Class(c) => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(class.name, "Repo");
        assert_eq!(
            class.base_names,
            vec!["Store".to_string(), "Reader".to_string(), "Writer".to_string()]
        );
        assert_eq!(class.methods, vec!["find".to_string()]);
    }

    #[test]
    fn broken_script_reports_error() {
        let result = extract("bad.ts", "function (");
        assert!(result.declarations.is_empty());
        assert!(result.has_errors());
    }
}
