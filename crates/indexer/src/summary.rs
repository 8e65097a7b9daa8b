use context_graph::{Diagnostic, GraphStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one `analyze_repository` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Root as given by the caller
    pub root: String,

    pub files_indexed: usize,
    pub functions_indexed: usize,
    pub classes_indexed: usize,
    pub imports_indexed: usize,
    pub total_nodes: usize,

    /// Files per language tag
    pub languages: BTreeMap<String, usize>,

    /// Walker and per-file diagnostics, in walk order
    pub diagnostics: Vec<Diagnostic>,

    pub elapsed_ms: u64,
}

impl AnalysisSummary {
    /// Tally a finished store
    pub fn from_store(
        root: impl Into<String>,
        store: &GraphStore,
        diagnostics: Vec<Diagnostic>,
        elapsed_ms: u64,
    ) -> Self {
        let counts = store.counts();
        let mut languages = BTreeMap::new();
        for file in store.files() {
            *languages.entry(file.language.clone()).or_insert(0) += 1;
        }

        Self {
            root: root.into(),
            files_indexed: counts.files,
            functions_indexed: counts.functions,
            classes_indexed: counts.classes,
            imports_indexed: counts.imports,
            total_nodes: counts.total(),
            languages,
            diagnostics,
            elapsed_ms,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}
