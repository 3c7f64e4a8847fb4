//! Report data model.
//!
//! Every type here is part of the persisted report, so field names are
//! serialized in camelCase and must stay stable across versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source language of an analyzed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    C,
    Cpp,
    CSharp,
    #[default]
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metrics for a single function, method or function literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetrics {
    pub name: String,
    pub signature: String,
    pub file_path: String,
    pub language: Language,
    /// First line (1-indexed, inclusive).
    pub start_line: usize,
    /// Last line (1-indexed, inclusive).
    pub end_line: usize,
    pub nloc: usize,
    pub parameters: usize,
    pub local_variables: usize,
    pub ccn: usize,
    pub cognitive_complexity: usize,
    pub max_nesting: usize,
    /// Set by the aggregator once every file is known.
    pub fan_in: usize,
    pub fan_out: usize,
    pub comment_density: f64,
    /// Set by the aggregator once churn is known.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub hotspot_score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callees: Vec<String>,
    pub is_public: bool,
    pub is_documented: bool,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

/// File-level comment coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentMetrics {
    pub total_lines: usize,
    pub comment_lines: usize,
    pub comment_density: f64,
    /// Ratio (0..1) of documented public functions.
    pub public_api_doc_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSmellKind {
    ManyParameters,
    ManyLocals,
    DeepNesting,
    GodFunction,
    GlobalState,
}

impl CodeSmellKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeSmellKind::ManyParameters => "many_parameters",
            CodeSmellKind::ManyLocals => "many_locals",
            CodeSmellKind::DeepNesting => "deep_nesting",
            CodeSmellKind::GodFunction => "god_function",
            CodeSmellKind::GlobalState => "global_state",
        }
    }
}

impl std::fmt::Display for CodeSmellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A simple structural smell found in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSmell {
    pub kind: CodeSmellKind,
    pub description: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

/// Version-control history for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitFileMetrics {
    pub file_path: String,
    pub lines_added: usize,
    pub lines_deleted: usize,
    pub commits: usize,
    pub bugfix_commits: usize,
    pub authors: usize,
}

impl GitFileMetrics {
    /// Lines added plus lines deleted.
    pub fn churn(&self) -> usize {
        self.lines_added + self.lines_deleted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileSummaryMetrics {
    pub nloc: usize,
    pub ccn_total: usize,
    pub ccn_avg_per_function: f64,
    pub ccn_max_function: usize,
    /// Always equal to the length of `FileMetrics::functions`.
    pub functions_count: usize,
    pub functions_ccn_gt10: usize,
    pub functions_ccn_gt20: usize,
}

/// Everything known about one successfully parsed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileMetrics {
    pub path: String,
    pub language: Language,
    pub summary: FileSummaryMetrics,
    pub functions: Vec<FunctionMetrics>,
    pub comments: CommentMetrics,
    #[serde(default)]
    pub smells: Vec<CodeSmell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitFileMetrics>,
}

impl FileMetrics {
    /// Churn of this file, or 0 when no history is attached.
    pub fn churn(&self) -> usize {
        self.git.as_ref().map(GitFileMetrics::churn).unwrap_or(0)
    }
}

/// A file ranked high by complexity × churn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub file_path: String,
    pub reason: String,
    pub score: f64,
    pub ccn: usize,
    pub churn: usize,
}

/// Project-wide statistics, recomputed from scratch on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
    pub total_files: usize,
    pub total_functions: usize,
    pub avg_ccn_per_function: f64,
    pub max_ccn_per_function: usize,
    pub functions_ccn_gt10_pct: f64,
    pub functions_ccn_gt20_pct: f64,

    pub median_function_size: f64,
    pub p95_function_size: f64,
    pub functions_gt50_lines: usize,
    pub functions_gt80_lines: usize,
    pub functions_gt100_lines: usize,

    pub avg_params_per_function: f64,
    pub functions_params_ge5: usize,

    pub comment_density_avg: f64,

    pub git_total_lines_added: usize,
    pub git_total_lines_deleted: usize,
    pub git_total_commits: usize,
}

/// Catalog entry describing one metric kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub group: String,
}

/// The unit of persistence and the only input to rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    pub root_path: String,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<FileMetrics>,
    pub project: ProjectMetrics,
    pub hotspots: Vec<Hotspot>,
    pub metric_metadata: Vec<MetricSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Metric identifiers, grouped by prefix.
pub mod metric_ids {
    pub const CYCLOMATIC_CCN: &str = "complexity.ccn";
    pub const COGNITIVE_COMPLEXITY: &str = "complexity.cognitive";
    pub const MAX_NESTING: &str = "complexity.max_nesting";
    pub const NLOC: &str = "size.nloc";
    pub const FUNCTION_NLOC: &str = "size.function_nloc";
    pub const PARAMS_COUNT: &str = "params.count";
    pub const LOCALS_COUNT: &str = "locals.count";
    pub const FAN_IN: &str = "coupling.fan_in";
    pub const FAN_OUT: &str = "coupling.fan_out";
    pub const AFFERENT_COUPLING: &str = "coupling.afferent";
    pub const EFFERENT_COUPLING: &str = "coupling.efferent";
    pub const INSTABILITY: &str = "coupling.instability";
    pub const COMMENT_DENSITY: &str = "comments.density";
    pub const PUBLIC_API_DOC: &str = "comments.public_api_doc";
    pub const CLONE_DENSITY: &str = "clones.density";
    pub const SMELLS_COUNT: &str = "smells.count";
    pub const GIT_LINES_ADDED: &str = "git.churn.lines_added";
    pub const GIT_LINES_DELETED: &str = "git.churn.lines_deleted";
    pub const GIT_COMMITS: &str = "git.commits";
    pub const GIT_BUGFIX_COMMITS: &str = "git.commits.bugfix";
    pub const GIT_AUTHORS: &str = "git.authors";
    pub const HOTSPOT_SCORE: &str = "hotspot.score_complexity_churn";
}

/// (id, name, description, group)
static CATALOG: &[(&str, &str, &str, &str)] = &[
    (metric_ids::CYCLOMATIC_CCN, "Cyclomatic Complexity (CCN)", "Branching-based complexity per function/file/module.", "complexity"),
    (metric_ids::COGNITIVE_COMPLEXITY, "Cognitive Complexity", "Nesting and boolean-logic aware complexity per function.", "complexity"),
    (metric_ids::MAX_NESTING, "Max Nesting Depth", "Maximum depth of nested blocks.", "complexity"),
    (metric_ids::NLOC, "NLOC", "Non-empty, non-comment lines of code per file.", "size"),
    (metric_ids::FUNCTION_NLOC, "Function NLOC", "Lines of code per function for distribution analysis.", "size"),
    (metric_ids::PARAMS_COUNT, "Parameter Count", "Number of parameters per function.", "size"),
    (metric_ids::LOCALS_COUNT, "Local Variables Count", "Number of local variables per function.", "size"),
    (metric_ids::FAN_IN, "Fan-in", "How many functions call a given function (by name).", "coupling"),
    (metric_ids::FAN_OUT, "Fan-out", "How many distinct functions a given function calls.", "coupling"),
    (metric_ids::AFFERENT_COUPLING, "Afferent Coupling (Ca)", "Number of modules that depend on this module.", "coupling"),
    (metric_ids::EFFERENT_COUPLING, "Efferent Coupling (Ce)", "Number of modules this module depends on.", "coupling"),
    (metric_ids::INSTABILITY, "Instability", "Ce / (Ca + Ce), 0 = stable, 1 = unstable.", "coupling"),
    (metric_ids::COMMENT_DENSITY, "Comment Density", "Ratio of comment lines to total lines.", "comments"),
    (metric_ids::PUBLIC_API_DOC, "Public API Doc Coverage", "Share of public functions with documentation.", "comments"),
    (metric_ids::CLONE_DENSITY, "Clone Density", "Estimated amount of duplicated code.", "clones"),
    (metric_ids::SMELLS_COUNT, "Code Smells", "Count of simple structural smells (many params, deep nesting, etc.).", "smells"),
    (metric_ids::GIT_LINES_ADDED, "Git Lines Added", "Lines added in history for a file.", "git"),
    (metric_ids::GIT_LINES_DELETED, "Git Lines Deleted", "Lines deleted in history for a file.", "git"),
    (metric_ids::GIT_COMMITS, "Git Commits", "Number of commits touching a file.", "git"),
    (metric_ids::GIT_BUGFIX_COMMITS, "Bugfix Commits", "Number of commits that look like bug fixes.", "git"),
    (metric_ids::GIT_AUTHORS, "Authors", "Number of distinct authors touching a file (bus factor proxy).", "git"),
    (metric_ids::HOTSPOT_SCORE, "Hotspot Score", "Complexity multiplied by the logarithm of churn.", "hotspots"),
];

/// Static catalog of every metric kind the tool knows about.
///
/// Informational only: some entries (clones, afferent coupling) are listed
/// for report consumers but not computed.
pub fn metric_catalog() -> Vec<MetricSummary> {
    CATALOG
        .iter()
        .map(|(id, name, description, group)| MetricSummary {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            group: group.to_string(),
        })
        .collect()
}
