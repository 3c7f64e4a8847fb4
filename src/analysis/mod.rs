//! Per-file source analysis.
//!
//! Each analyzer turns the bytes of one file into a
//! [`FileMetrics`](crate::model::FileMetrics):
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────────┐     ┌────────────────────┐
//! │ Source bytes │────▶│ LanguageAnalyzer    │────▶│ FileMetricsBuilder │
//! └──────────────┘     │ (Go / C / C++ / C#) │     │ (text metrics,     │
//!                      └─────────────────────┘     │  smells, summary)  │
//!                                                  └────────────────────┘
//! ```
//!
//! Go uses a tree-sitter parse tree to find functions. The C family uses a
//! line scanner. Both measure lines through [`text`], so their numbers are
//! comparable.
//!
//! # Adding a New Language
//!
//! 1. Implement `LanguageAnalyzer` in `src/analysis/languages/`
//!    (or add a [`Dialect`] if the heuristic scanner is good enough)
//! 2. Register it in `AnalyzerRegistry::with_thresholds`

pub mod assemble;
mod languages;
pub mod text;
mod traits;

pub use assemble::{FileMetricsBuilder, FunctionDraft, SmellThresholds};
#[cfg(feature = "tree-sitter")]
pub use languages::GoAnalyzer;
pub use languages::{AnalyzerRegistry, Dialect, HeuristicAnalyzer, Visibility};
pub use traits::{LanguageAnalyzer, ParseError};
