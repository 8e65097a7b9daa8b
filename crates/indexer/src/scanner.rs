use crate::config::WalkerConfig;
use context_graph::Diagnostic;
use ignore::{DirEntry, Walk, WalkBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Enumerates eligible source files under a repository root
pub struct SourceWalker {
    root: PathBuf,
    config: Arc<WalkerConfig>,
}

impl SourceWalker {
    pub fn new(root: impl AsRef<Path>, config: WalkerConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config: Arc::new(config),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a walk. Entries are sorted by file name at every level, so two
    /// walks over an unchanged tree yield the same sequence.
    pub fn walk(&self) -> SourceFiles {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .hidden(self.config.skip_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .git_global(false)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        let config = Arc::clone(&self.config);
        builder.filter_entry(move |entry| !is_denied_dir(entry, &config));

        SourceFiles {
            inner: builder.build(),
            root: self.root.clone(),
            config: Arc::clone(&self.config),
            diagnostics: Vec::new(),
        }
    }
}

/// Lazy, finite walk over eligible files. Yields absolute paths when the
/// walker root is absolute.
pub struct SourceFiles {
    inner: Walk,
    root: PathBuf,
    config: Arc<WalkerConfig>,
    diagnostics: Vec<Diagnostic>,
}

impl SourceFiles {
    /// Warnings collected so far (unreadable entries, oversized files)
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn accept(&mut self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            return false;
        }

        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if self.config.is_denied_filename(file_name) {
            log::debug!("Skipping denylisted file {}", path.display());
            return false;
        }

        let known_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.accepts_extension(ext));
        if !known_extension {
            return false;
        }

        if let (Some(limit), Ok(meta)) = (self.config.max_file_size_bytes, entry.metadata()) {
            if meta.len() > limit {
                let relative = relative_path(&self.root, path);
                log::warn!(
                    "Skipping large file {relative} ({} bytes > {limit})",
                    meta.len()
                );
                self.diagnostics.push(Diagnostic::warning(
                    Some(&relative),
                    format!("{relative}: skipped, {} bytes exceeds limit of {limit}", meta.len()),
                ));
                return false;
            }
        }

        true
    }
}

impl Iterator for SourceFiles {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    if self.accept(&entry) {
                        return Some(entry.into_path());
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read entry: {e}");
                    let diagnostic = match error_path(&e) {
                        Some(path) => {
                            let relative = relative_path(&self.root, path);
                            Diagnostic::warning(
                                Some(&relative),
                                format!("{relative}: failed to read entry: {e}"),
                            )
                        }
                        None => Diagnostic::warning(None, format!("failed to read entry: {e}")),
                    };
                    self.diagnostics.push(diagnostic);
                }
            }
        }
    }
}

/// Path an ignore error is about, looking through depth and line wrappers
fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        _ => None,
    }
}

fn is_denied_dir(entry: &DirEntry, config: &WalkerConfig) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| config.is_denied_dir(name))
}

/// Root-relative, `/`-separated form of `path`
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut normalized = relative.to_string_lossy().to_string();
    if normalized.contains('\\') {
        normalized = normalized.replace('\\', "/");
    }
    normalized
}
