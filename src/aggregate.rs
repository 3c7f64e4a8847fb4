//! Cross-file passes run once every file has been analyzed.
//!
//! Coupling is resolved by bare function name through an explicit
//! [`CallIndex`]: a call to `parse` counts toward every function named
//! `parse`, in any file. That over-counts on name collisions, which is
//! accepted for a dependency-free heuristic.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;

use crate::model::{metric_catalog, FileMetrics, Hotspot, ProjectMetrics, ProjectReport};

/// Maximum number of file hotspots in a report.
pub const HOTSPOT_LIMIT: usize = 10;

pub const HOTSPOT_REASON: &str = "complexity × churn";

/// Position of a function inside the file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionLocation {
    pub file: usize,
    pub function: usize,
}

/// Function name to every function carrying that name.
#[derive(Debug, Default)]
pub struct CallIndex {
    by_name: HashMap<String, Vec<FunctionLocation>>,
}

impl CallIndex {
    pub fn build(files: &[FileMetrics]) -> Self {
        let mut by_name: HashMap<String, Vec<FunctionLocation>> = HashMap::new();
        for (fi, file) in files.iter().enumerate() {
            for (fj, func) in file.functions.iter().enumerate() {
                by_name.entry(func.name.clone()).or_default().push(FunctionLocation {
                    file: fi,
                    function: fj,
                });
            }
        }
        Self { by_name }
    }

    pub fn resolve(&self, name: &str) -> &[FunctionLocation] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Set `fan_in` on every function: each calling function contributes 1 per
/// distinct callee name to every function with that name.
pub fn annotate_coupling(files: &mut [FileMetrics]) {
    let index = CallIndex::build(files);
    let mut fan_in: HashMap<(usize, usize), usize> = HashMap::new();

    for file in files.iter() {
        for func in &file.functions {
            let distinct: BTreeSet<&str> = func.callees.iter().map(String::as_str).collect();
            for callee in distinct {
                for loc in index.resolve(callee) {
                    *fan_in.entry((loc.file, loc.function)).or_default() += 1;
                }
            }
        }
    }

    for (fi, file) in files.iter_mut().enumerate() {
        for (fj, func) in file.functions.iter_mut().enumerate() {
            func.fan_in = fan_in.get(&(fi, fj)).copied().unwrap_or(0);
        }
    }
}

/// `ccn × ln(1 + churn)`; zero churn gives zero.
pub fn hotspot_score(ccn: usize, churn: usize) -> f64 {
    ccn as f64 * (churn as f64).ln_1p()
}

/// Score every function of every file that has history.
pub fn annotate_function_hotspots(files: &mut [FileMetrics]) {
    for file in files.iter_mut() {
        let churn = file.churn();
        if file.git.is_none() || churn == 0 {
            continue;
        }
        for func in &mut file.functions {
            func.hotspot_score = hotspot_score(func.ccn, churn);
        }
    }
}

/// Files ranked by `ccn_total × ln(1 + churn)`, highest first, at most `limit`.
pub fn rank_hotspots(files: &[FileMetrics], limit: usize) -> Vec<Hotspot> {
    let mut hotspots: Vec<Hotspot> = files
        .iter()
        .filter(|f| f.git.is_some() && f.summary.ccn_total > 0 && f.churn() > 0)
        .map(|f| Hotspot {
            file_path: f.path.clone(),
            reason: HOTSPOT_REASON.to_string(),
            score: hotspot_score(f.summary.ccn_total, f.churn()),
            ccn: f.summary.ccn_total,
            churn: f.churn(),
        })
        .collect();

    hotspots.sort_by(|a, b| b.score.total_cmp(&a.score));
    hotspots.truncate(limit);
    hotspots
}

/// Project-wide statistics. Independent of file order.
pub fn project_metrics(files: &[FileMetrics]) -> ProjectMetrics {
    let mut p = ProjectMetrics {
        total_files: files.len(),
        ..Default::default()
    };

    let functions: Vec<_> = files.iter().flat_map(|f| f.functions.iter()).collect();
    let n = functions.len();
    p.total_functions = n;

    if n > 0 {
        let nf = n as f64;
        let ccn_total: usize = functions.iter().map(|f| f.ccn).sum();
        let params_total: usize = functions.iter().map(|f| f.parameters).sum();
        p.avg_ccn_per_function = ccn_total as f64 / nf;
        p.functions_ccn_gt10_pct = functions.iter().filter(|f| f.ccn > 10).count() as f64 / nf;
        p.functions_ccn_gt20_pct = functions.iter().filter(|f| f.ccn > 20).count() as f64 / nf;
        p.avg_params_per_function = params_total as f64 / nf;
    }
    p.max_ccn_per_function = functions.iter().map(|f| f.ccn).max().unwrap_or(0);
    p.functions_gt50_lines = functions.iter().filter(|f| f.nloc > 50).count();
    p.functions_gt80_lines = functions.iter().filter(|f| f.nloc > 80).count();
    p.functions_gt100_lines = functions.iter().filter(|f| f.nloc > 100).count();
    p.functions_params_ge5 = functions.iter().filter(|f| f.parameters >= 5).count();

    let mut sizes: Vec<usize> = functions.iter().map(|f| f.nloc).collect();
    sizes.sort_unstable();
    p.median_function_size = median(&sizes);
    p.p95_function_size = percentile_95(&sizes);

    let with_lines: Vec<_> = files.iter().filter(|f| f.comments.total_lines > 0).collect();
    if !with_lines.is_empty() {
        p.comment_density_avg = with_lines.iter().map(|f| f.comments.comment_density).sum::<f64>()
            / with_lines.len() as f64;
    }

    for git in files.iter().filter_map(|f| f.git.as_ref()) {
        p.git_total_lines_added += git.lines_added;
        p.git_total_lines_deleted += git.lines_deleted;
        p.git_total_commits += git.commits;
    }

    p
}

/// Median of sorted values; mean of the two middle values for even counts.
fn median(sorted: &[usize]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2] as f64,
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
    }
}

/// Value at index `floor(0.95 × (n − 1))` of sorted values.
fn percentile_95(sorted: &[usize]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((0.95 * (sorted.len() - 1) as f64).floor() as usize).min(sorted.len() - 1);
    sorted[idx] as f64
}

/// Run coupling, hotspot and statistics passes and assemble the report.
pub fn build_report(root: &str, mut files: Vec<FileMetrics>, warnings: Vec<String>) -> ProjectReport {
    annotate_coupling(&mut files);
    annotate_function_hotspots(&mut files);
    let hotspots = rank_hotspots(&files, HOTSPOT_LIMIT);
    let project = project_metrics(&files);

    ProjectReport {
        root_path: root.to_string(),
        generated_at: Utc::now(),
        files,
        project,
        hotspots,
        metric_metadata: metric_catalog(),
        warnings,
    }
}
