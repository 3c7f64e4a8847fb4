//! Codepulse - source quality analyzer.
//!
//! Codepulse measures per-function complexity, size, coupling and comment
//! density, merges in git churn, and ranks complexity × churn hotspots.
//!
//! # Architecture
//!
//! - `analysis`: language analyzers (Go through tree-sitter, C/C++/C# through
//!   a line scanner) and the shared text metrics they build on
//! - `pipeline`: concurrent scan → parse → aggregate orchestration
//! - `aggregate`: fan-in, hotspots and project statistics
//! - `scan`, `git`, `storage`: filesystem, version-control and report-store
//!   implementations of the traits in `ports`
//! - `report`: text, JSON and SARIF renderers
//! - `config`, `cli`: YAML configuration and the command-line surface
//!
//! # Adding a New Language
//!
//! Implement `LanguageAnalyzer` (see `src/analysis/languages/`) and register
//! it in `AnalyzerRegistry::with_thresholds`.

pub mod aggregate;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod git;
pub mod model;
pub mod pipeline;
pub mod ports;
pub mod report;
pub mod scan;
pub mod storage;

pub use analysis::{AnalyzerRegistry, LanguageAnalyzer, ParseError, SmellThresholds};
pub use config::Config;
pub use git::GitCli;
pub use model::{FileMetrics, FunctionMetrics, Language, ProjectReport};
pub use pipeline::{AnalysisError, AnalysisRequest, CancelToken, Orchestrator};
pub use report::{Renderer, RendererRegistry};
pub use scan::FsScanner;
pub use storage::JsonFileStore;
