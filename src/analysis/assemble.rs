//! Shared assembly of [`FileMetrics`] from recovered function boundaries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{
    CodeSmell, CodeSmellKind, CommentMetrics, FileMetrics, FileSummaryMetrics, FunctionMetrics,
    Language,
};

use super::text::{compute_range_metrics, LineRange, SourceText};

/// Limits at which a function is reported as a smell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmellThresholds {
    pub many_parameters: usize,
    pub many_locals: usize,
    pub deep_nesting: usize,
    pub god_function_nloc: usize,
    pub god_function_ccn: usize,
}

impl Default for SmellThresholds {
    fn default() -> Self {
        Self {
            many_parameters: 5,
            many_locals: 15,
            deep_nesting: 4,
            god_function_nloc: 80,
            god_function_ccn: 20,
        }
    }
}

/// A function boundary plus the facts an analyzer recovered for it.
#[derive(Debug, Clone, Default)]
pub struct FunctionDraft {
    pub name: String,
    pub signature: String,
    pub start_line: usize,
    pub end_line: usize,
    pub parameters: usize,
    /// Overrides the text-based local count when the analyzer knows better.
    pub locals: Option<usize>,
    pub callees: BTreeSet<String>,
    pub is_public: bool,
    pub is_documented: bool,
    /// Nested bodies that belong to another function.
    pub excluded: Vec<LineRange>,
}

/// Accumulates functions and smells for one file.
pub struct FileMetricsBuilder<'a> {
    path: String,
    language: Language,
    text: &'a SourceText,
    thresholds: SmellThresholds,
    functions: Vec<FunctionMetrics>,
    smells: Vec<CodeSmell>,
}

impl<'a> FileMetricsBuilder<'a> {
    pub fn new(
        path: impl Into<String>,
        language: Language,
        text: &'a SourceText,
        thresholds: SmellThresholds,
    ) -> Self {
        Self {
            path: path.into(),
            language,
            text,
            thresholds,
            functions: Vec::new(),
            smells: Vec::new(),
        }
    }

    /// Compute text metrics for `draft` and record the function.
    pub fn function(&mut self, draft: FunctionDraft) -> &mut Self {
        let range = compute_range_metrics(self.text, draft.start_line, draft.end_line, &draft.excluded);
        let callees: Vec<String> = draft.callees.into_iter().collect();

        let func = FunctionMetrics {
            name: draft.name,
            signature: draft.signature,
            file_path: self.path.clone(),
            language: self.language,
            start_line: draft.start_line,
            end_line: draft.end_line,
            nloc: range.nloc,
            parameters: draft.parameters,
            local_variables: draft.locals.unwrap_or(range.locals),
            ccn: range.ccn,
            cognitive_complexity: range.cognitive,
            max_nesting: range.max_nesting,
            fan_in: 0,
            fan_out: callees.len(),
            comment_density: range.comment_density(),
            hotspot_score: 0.0,
            callees,
            is_public: draft.is_public,
            is_documented: draft.is_documented,
        };

        self.check_smells(&func);
        self.functions.push(func);
        self
    }

    /// Record a smell that is not tied to one function's metrics.
    pub fn smell(&mut self, kind: CodeSmellKind, description: String, line: Option<usize>) -> &mut Self {
        self.smells.push(CodeSmell {
            kind,
            description,
            file_path: self.path.clone(),
            function: None,
            line,
        });
        self
    }

    fn check_smells(&mut self, f: &FunctionMetrics) {
        let t = self.thresholds;
        let mut found = Vec::new();

        if f.parameters >= t.many_parameters {
            found.push((CodeSmellKind::ManyParameters, format!("{} parameters", f.parameters)));
        }
        if f.local_variables >= t.many_locals {
            found.push((CodeSmellKind::ManyLocals, format!("{} local variables", f.local_variables)));
        }
        if f.max_nesting >= t.deep_nesting {
            found.push((CodeSmellKind::DeepNesting, format!("nesting depth {}", f.max_nesting)));
        }
        if f.nloc >= t.god_function_nloc && f.ccn >= t.god_function_ccn {
            found.push((
                CodeSmellKind::GodFunction,
                format!("{} lines with CCN {}", f.nloc, f.ccn),
            ));
        }

        for (kind, description) in found {
            self.smells.push(CodeSmell {
                kind,
                description,
                file_path: self.path.clone(),
                function: Some(f.name.clone()),
                line: Some(f.start_line),
            });
        }
    }

    pub fn build(self) -> FileMetrics {
        let total_lines = self.text.len();
        let comment_lines = self.text.comment_lines();
        let comment_density = if total_lines > 0 {
            comment_lines as f64 / total_lines as f64
        } else {
            0.0
        };

        let public: Vec<_> = self.functions.iter().filter(|f| f.is_public).collect();
        let public_api_doc_pct = if public.is_empty() {
            0.0
        } else {
            public.iter().filter(|f| f.is_documented).count() as f64 / public.len() as f64
        };

        FileMetrics {
            summary: summarize(&self.functions),
            path: self.path,
            language: self.language,
            functions: self.functions,
            comments: CommentMetrics {
                total_lines,
                comment_lines,
                comment_density,
                public_api_doc_pct,
            },
            smells: self.smells,
            git: None,
        }
    }
}

fn summarize(functions: &[FunctionMetrics]) -> FileSummaryMetrics {
    let ccn_total: usize = functions.iter().map(|f| f.ccn).sum();
    let count = functions.len();

    FileSummaryMetrics {
        nloc: functions.iter().map(|f| f.nloc).sum(),
        ccn_total,
        ccn_avg_per_function: if count > 0 {
            ccn_total as f64 / count as f64
        } else {
            0.0
        },
        ccn_max_function: functions.iter().map(|f| f.ccn).max().unwrap_or(0),
        functions_count: count,
        functions_ccn_gt10: functions.iter().filter(|f| f.ccn > 10).count(),
        functions_ccn_gt20: functions.iter().filter(|f| f.ccn > 20).count(),
    }
}
