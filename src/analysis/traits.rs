//! Core traits for language analysis.

use std::path::Path;

use thiserror::Error;

use crate::model::{FileMetrics, Language};

/// Why a single file could not be analyzed.
///
/// These never abort a run: the pipeline turns them into warnings.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error near line {line}")]
    Syntax { line: usize },

    #[error("parser setup failed: {0}")]
    Setup(String),

    #[error("parser produced no tree")]
    NoTree,
}

/// Language-specific analyzer.
///
/// Analyzers are shared across worker threads, so any per-parse state
/// (such as a tree-sitter parser) must be created inside `parse`.
pub trait LanguageAnalyzer: Send + Sync {
    /// The language reported on every [`FileMetrics`] this analyzer produces.
    fn language(&self) -> Language;

    /// Human-readable analyzer name, used in logs.
    fn name(&self) -> &'static str;

    /// File extensions handled (without dot, lowercase).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Whether this analyzer handles `path`, by case-insensitive extension.
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.file_extensions().contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// Analyze one file. `path` is copied verbatim into the result.
    fn parse(&self, path: &Path, source: &[u8]) -> Result<FileMetrics, ParseError>;
}
