//! # Context Extractor
//!
//! Per-file declaration extraction for Python, JavaScript and TypeScript.
//!
//! ## Architecture
//!
//! ```text
//! (path, contents)
//!     │
//!     ├──> Language Detection (from extension)
//!     │
//!     ├──> Tree-sitter Parsing → AST
//!     │    └─> any ERROR/MISSING node → error diagnostic, no declarations
//!     │
//!     └──> LanguageExtractor::collect
//!          ├─> functions (with call sets and parent class)
//!          ├─> classes (methods, base names)
//!          └─> imports (one node per imported name)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_extractor::extract;
//!
//! let result = extract("pkg/models.py", "class User:\n    def save(self):\n        pass\n");
//! assert_eq!(result.file_node.id.as_str(), "pkg/models.py");
//! assert_eq!(result.declarations.len(), 2);
//! assert!(result.diagnostics.is_empty());
//! ```

mod error;
mod extractor;
mod javascript;
mod language;
mod python;
mod types;

pub use error::{ExtractorError, Result};
pub use extractor::{extract, DeclarationSink, LanguageExtractor};
pub use javascript::JavaScriptExtractor;
pub use language::Language;
pub use python::PythonExtractor;
pub use types::ExtractionResult;
