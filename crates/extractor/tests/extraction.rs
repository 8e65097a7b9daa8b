use context_extractor::{extract, ExtractionResult, Language};
use context_graph::{CodeNode, Declaration, NodeKind, Severity};
use pretty_assertions::assert_eq;

const MODELS: &str = r#"
import logging
from .base import Animal

log = logging.getLogger(__name__)


class Dog(Animal):
    def bark(self):
        log.info("woof")
        return self.sound()


def _adopt(name):
    return Dog()
"#;

fn class_of(result: &ExtractionResult) -> &context_graph::ClassNode {
    result
        .declarations
        .iter()
        .find_map(|d| match d {
            Declaration::Class(c) => Some(c),
            _ => None,
        })
        .expect("class declaration")
}

#[test]
fn class_records_methods_and_bases() {
    let result = extract("zoo/models.py", "class Dog(Animal):\n    def bark(self):\n        ...\n");
    let class = class_of(&result);
    assert_eq!(class.methods, vec!["bark".to_string()]);
    assert_eq!(class.base_names, vec!["Animal".to_string()]);
    assert_eq!(class.file_id.as_str(), "zoo/models.py");
}

#[test]
fn declarations_come_in_source_order() {
    let result = extract("zoo/models.py", MODELS);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    let rows: Vec<_> = result
        .declarations
        .iter()
        .map(|d| (d.kind(), d.name()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (NodeKind::Import, "logging"),
            (NodeKind::Import, "Animal"),
            (NodeKind::Class, "Dog"),
            (NodeKind::Function, "bark"),
            (NodeKind::Function, "_adopt"),
        ]
    );
    assert_eq!(result.count_of(NodeKind::Function), 2);
    assert_eq!(result.count_of(NodeKind::File), 1);

    let class_id = class_of(&result).id.clone();
    let bark = result
        .declarations
        .iter()
        .find_map(|d| match d {
            Declaration::Function(f) if f.name == "bark" => Some(f),
            _ => None,
        })
        .unwrap();
    assert_eq!(bark.parent_class.as_ref(), Some(&class_id));
    let calls: Vec<_> = bark.calls.iter().map(String::as_str).collect();
    assert_eq!(calls, vec!["info", "sound"]);
}

#[test]
fn every_declaration_points_at_its_file() {
    let result = extract("zoo/models.py", MODELS);
    let file_id = result.file_node.id.clone();
    assert_eq!(result.file_node.language, Language::Python.as_str());
    for decl in &result.declarations {
        let node = CodeNode::from(decl.clone());
        assert_eq!(node.file_id(), &file_id, "{}", node.id());
    }
}

#[test]
fn extraction_is_deterministic() {
    let first = extract("zoo/models.py", MODELS);
    let second = extract("zoo/models.py", MODELS);
    assert_eq!(first, second);
}

#[test]
fn broken_file_yields_only_a_diagnostic() {
    let result = extract("zoo/broken.py", "def broken(:\n");
    assert!(result.declarations.is_empty());
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].severity, Severity::Error);
    assert!(result.diagnostics[0].message.contains("zoo/broken.py"));

    let nodes: Vec<_> = result.into_nodes().collect();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].kind(), NodeKind::File);
}

#[test]
fn result_serializes_with_kind_tags() {
    let result = extract("zoo/models.py", "def feed():\n    pass\n");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["file_node"]["id"], "zoo/models.py");
    assert_eq!(json["declarations"][0]["kind"], "function");
    assert_eq!(json["declarations"][0]["name"], "feed");

    let back: ExtractionResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}
