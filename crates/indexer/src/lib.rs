//! # Context Indexer
//!
//! Repository analysis into a queryable code graph.
//!
//! ## Pipeline
//!
//! ```text
//! Repository root
//!     │
//!     ├──> Source Walker (denylists, extensions, stable order)
//!     │      └─> Source files
//!     │
//!     ├──> Extraction Pool (inline or blocking threads)
//!     │      └─> ExtractionResult per file
//!     │
//!     └──> Graph Store (single writer, walk order)
//!            └─> AnalysisSummary + queries
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_indexer::{AnalysisSession, IndexerConfig};
//!
//! #[tokio::main]
//! async fn main() -> context_indexer::Result<()> {
//!     let mut session = AnalysisSession::new(IndexerConfig::default());
//!     let summary = session.analyze_repository("/path/to/project").await?;
//!
//!     println!(
//!         "Indexed {} files, {} functions",
//!         summary.files_indexed, summary.functions_indexed
//!     );
//!     if let Some(ctx) = session.get_function_context("main").found() {
//!         println!("main calls {:?}", ctx.calls);
//!     }
//!     Ok(())
//! }
//! ```

mod cancel;
mod config;
mod error;
mod pool;
mod scanner;
mod session;
mod summary;

pub use cancel::{CancellationHandle, CancellationListener, CancellationToken};
pub use config::{IndexerConfig, WalkerConfig, CONCURRENCY_ENV, DEFAULT_MAX_FILE_SIZE_BYTES};
pub use error::{IndexerError, Result};
pub use pool::{BlockingPool, ExtractionJob, ExtractionPool, InlinePool, PoolError};
pub use scanner::{relative_path, SourceFiles, SourceWalker};
pub use session::AnalysisSession;
pub use summary::AnalysisSummary;
