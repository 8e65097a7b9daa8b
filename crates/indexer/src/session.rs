use crate::cancel::CancellationListener;
use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};
use crate::pool::{ExtractionJob, ExtractionPool, InlinePool};
use crate::scanner::{relative_path, SourceWalker};
use crate::summary::AnalysisSummary;
use context_extractor::ExtractionResult;
use context_graph::{
    Diagnostic, FunctionLookup, GraphQuery, GraphStore, RelatedFile, RelationshipKind,
};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Entry point tying walker, extractor and store together.
///
/// A session holds the store of its last successful run. Each run builds a
/// fresh store and swaps it in only when the run completes.
pub struct AnalysisSession {
    config: IndexerConfig,
    pool: Arc<dyn ExtractionPool>,
    root: Option<PathBuf>,
    store: GraphStore,
}

enum FileOutcome {
    Extracted(ExtractionResult),
    Unreadable(Diagnostic),
}

impl AnalysisSession {
    pub fn new(config: IndexerConfig) -> Self {
        Self::with_pool(config, Arc::new(InlinePool))
    }

    /// Extraction runs on `pool`; the pool's lifecycle stays with the caller
    pub fn with_pool(config: IndexerConfig, pool: Arc<dyn ExtractionPool>) -> Self {
        Self {
            config,
            pool,
            root: None,
            store: GraphStore::new(),
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Root of the last successful run
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn query(&self) -> GraphQuery<'_> {
        GraphQuery::new(&self.store)
    }

    pub async fn analyze_repository(&mut self, root: impl AsRef<Path>) -> Result<AnalysisSummary> {
        self.analyze_repository_with_cancel(root, &CancellationListener::never())
            .await
    }

    /// Analyze `root`, replacing the current store.
    ///
    /// A cancelled run returns [`IndexerError::Cancelled`] and leaves the
    /// previous store in place.
    pub async fn analyze_repository_with_cancel(
        &mut self,
        root: impl AsRef<Path>,
        cancel: &CancellationListener,
    ) -> Result<AnalysisSummary> {
        self.config.validate()?;
        let start = Instant::now();
        let root = root.as_ref().to_path_buf();
        let root_display = root.display().to_string();

        let is_dir = tokio::fs::metadata(&root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            log::warn!("Repository root {root_display} is missing or not a directory");
            self.store = GraphStore::new();
            self.root = None;
            let diagnostic = Diagnostic::error(
                Some(&root_display),
                format!("{root_display}: repository root does not exist or is not a directory"),
            );
            return Ok(AnalysisSummary::from_store(
                root_display,
                &self.store,
                vec![diagnostic],
                elapsed_ms(start),
            ));
        }

        log::info!("Analyzing repository {root_display}");
        let (store, diagnostics) = self.build_store(&root, cancel).await?;

        self.store = store;
        self.root = Some(root);
        let summary =
            AnalysisSummary::from_store(root_display, &self.store, diagnostics, elapsed_ms(start));

        log::info!(
            "Indexed {} files ({} functions, {} classes, {} imports) in {} ms",
            summary.files_indexed,
            summary.functions_indexed,
            summary.classes_indexed,
            summary.imports_indexed,
            summary.elapsed_ms
        );
        if !summary.diagnostics.is_empty() {
            log::warn!("{} diagnostics during analysis", summary.diagnostics.len());
        }
        Ok(summary)
    }

    async fn build_store(
        &self,
        root: &Path,
        cancel: &CancellationListener,
    ) -> Result<(GraphStore, Vec<Diagnostic>)> {
        let batch_size = self.config.concurrency;
        let mut files = SourceWalker::new(root, self.config.walker.clone()).walk();
        let mut store = GraphStore::new();
        let mut diagnostics = Vec::new();

        loop {
            // Walker diagnostics raised before a file travel with that file
            let mut batch = Vec::with_capacity(batch_size);
            while batch.len() < batch_size {
                let Some(path) = files.next() else {
                    break;
                };
                batch.push((files.take_diagnostics(), path));
            }
            if batch.is_empty() {
                diagnostics.extend(files.take_diagnostics());
                break;
            }

            let mut tasks = Vec::with_capacity(batch.len());
            for (preceding, path) in batch {
                if cancel.is_cancelled() {
                    abort_all(tasks.into_iter().map(|(_, task)| task));
                    return Err(IndexerError::Cancelled);
                }
                let relative = relative_path(root, &path);
                let pool = Arc::clone(&self.pool);
                tasks.push((preceding, tokio::spawn(process_file(pool, path, relative))));
            }

            let mut pending = tasks.into_iter();
            while let Some((preceding, task)) = pending.next() {
                if cancel.is_cancelled() {
                    task.abort();
                    abort_all(pending.map(|(_, task)| task));
                    return Err(IndexerError::Cancelled);
                }
                diagnostics.extend(preceding);
                match task.await?? {
                    FileOutcome::Extracted(result) => {
                        diagnostics.extend(result.diagnostics.iter().cloned());
                        for node in result.into_nodes() {
                            store.insert(node)?;
                        }
                    }
                    FileOutcome::Unreadable(diagnostic) => diagnostics.push(diagnostic),
                }
            }
        }

        Ok((store, diagnostics))
    }

    /// First function named `name` in walk order
    pub fn get_function_context(&self, name: &str) -> FunctionLookup {
        self.query().get_function_context(name)
    }

    /// `file` may be relative to the analyzed root or an absolute path under it
    pub fn find_related_files(
        &self,
        file: impl AsRef<Path>,
        kind: RelationshipKind,
    ) -> Vec<RelatedFile> {
        let file_id = self.file_id_for(file.as_ref());
        self.query().find_related_files(&file_id, kind)
    }

    fn file_id_for(&self, file: &Path) -> String {
        let file = without_cur_dir(file);
        let file = file.as_path();
        let Some(root) = self.root.as_deref() else {
            return relative_path(Path::new(""), file);
        };
        let root = without_cur_dir(root);
        let root = root.as_path();
        if file.is_absolute() && !file.starts_with(root) {
            if let (Ok(file), Ok(root)) = (file.canonicalize(), root.canonicalize()) {
                return relative_path(&root, &file);
            }
        }
        relative_path(root, file)
    }
}

async fn process_file(
    pool: Arc<dyn ExtractionPool>,
    path: PathBuf,
    relative: String,
) -> Result<FileOutcome> {
    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("Failed to read {relative}: {e}");
            return Ok(FileOutcome::Unreadable(Diagnostic::error(
                Some(&relative),
                format!("{relative}: failed to read: {e}"),
            )));
        }
    };

    let result = pool.submit(ExtractionJob::new(relative, contents)).await?;
    log::debug!(
        "Extracted {} declarations from {}",
        result.declarations.len(),
        result.file_node.path
    );
    Ok(FileOutcome::Extracted(result))
}

fn abort_all<T>(tasks: impl IntoIterator<Item = JoinHandle<T>>) {
    for task in tasks {
        task.abort();
    }
}

/// `./pkg/a.py` and `pkg/a.py` name the same file
fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
