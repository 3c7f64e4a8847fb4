//! Concurrent scan, parse and aggregate pipeline.
//!
//! ```text
//!  producer ──jobs──▶ worker × N ──outcomes──▶ collector (caller thread)
//!                          └──────warnings──────────▲
//! ```
//!
//! The producer feeds paths into an unbounded channel and drops its sender.
//! Each worker reads, selects an analyzer and parses, sending exactly one
//! outcome per file. The collector drains outcomes until every worker has
//! hung up, then drains warnings, then joins. Git collection, aggregation
//! and storage run afterwards on the caller thread.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aggregate::build_report;
use crate::analysis::AnalyzerRegistry;
use crate::model::{FileMetrics, GitFileMetrics, ProjectReport};
use crate::ports::{FileReader, ReportStore, ScanError, SourceScanner, StorageError, VersionControl};

/// Fatal pipeline failures. Per-file problems become warnings instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("root path is empty")]
    EmptyRoot,

    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("no source files found under {0}")]
    NoSourceFiles(PathBuf),

    #[error("analysis cancelled")]
    Cancelled,

    #[error("save report: {0}")]
    Storage(#[from] StorageError),
}

/// Shared cancellation flag, checked by workers before each file.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of one `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Dispatching,
    Collecting,
    Aggregating,
    Done,
    Failed,
}

/// What to analyze.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub root: PathBuf,
    /// Extensions to scan for; empty means every file.
    pub extensions: Vec<String>,
    /// Worker count; defaults to available parallelism.
    pub workers: Option<usize>,
}

impl AnalysisRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}

/// Progress callback: `(files done, files total)`.
pub type Progress<'a> = &'a dyn Fn(usize, usize);

/// Runs the whole analysis against pluggable collaborators.
pub struct Orchestrator {
    scanner: Box<dyn SourceScanner>,
    reader: Box<dyn FileReader>,
    analyzers: AnalyzerRegistry,
    git: Box<dyn VersionControl>,
    store: Box<dyn ReportStore>,
    cancel: CancelToken,
}

impl Orchestrator {
    pub fn new(
        scanner: Box<dyn SourceScanner>,
        reader: Box<dyn FileReader>,
        analyzers: AnalyzerRegistry,
        git: Box<dyn VersionControl>,
        store: Box<dyn ReportStore>,
    ) -> Self {
        Self {
            scanner,
            reader,
            analyzers,
            git,
            store,
            cancel: CancelToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn execute(&self, request: &AnalysisRequest) -> Result<ProjectReport, AnalysisError> {
        self.execute_with_progress(request, None)
    }

    pub fn execute_with_progress(
        &self,
        request: &AnalysisRequest,
        progress: Option<Progress<'_>>,
    ) -> Result<ProjectReport, AnalysisError> {
        let mut state = RunState::Idle;
        let result = self.run(request, progress, &mut state);
        transition(
            &mut state,
            if result.is_ok() {
                RunState::Done
            } else {
                RunState::Failed
            },
        );
        result
    }

    fn run(
        &self,
        request: &AnalysisRequest,
        progress: Option<Progress<'_>>,
        state: &mut RunState,
    ) -> Result<ProjectReport, AnalysisError> {
        let root = request.root.as_path();
        if root.as_os_str().is_empty() {
            return Err(AnalysisError::EmptyRoot);
        }

        let files = self.scanner.scan(root, &request.extensions)?;
        if files.is_empty() {
            return Err(AnalysisError::NoSourceFiles(root.to_path_buf()));
        }

        let workers = worker_count(request.workers, files.len());
        info!(root = %root.display(), files = files.len(), workers, "starting analysis");

        transition(state, RunState::Dispatching);
        let (mut metrics, mut warnings) = self.dispatch(files, workers, progress, state);

        if self.cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        transition(state, RunState::Aggregating);
        let history = match self.git.collect_file_metrics(root) {
            Ok(history) => history,
            Err(e) => {
                debug!(error = %e, "git history unavailable");
                warnings.push(format!("git metrics disabled: {}", e));
                HashMap::new()
            }
        };
        attach_git(&mut metrics, root, &history);
        metrics.sort_by(|a, b| a.path.cmp(&b.path));

        let report = build_report(&root.to_string_lossy(), metrics, warnings);
        self.store.save(root, &report)?;

        info!(
            files = report.project.total_files,
            functions = report.project.total_functions,
            warnings = report.warnings.len(),
            "analysis complete"
        );
        Ok(report)
    }

    /// Fan files out to `workers` threads and collect their outcomes.
    fn dispatch(
        &self,
        files: Vec<PathBuf>,
        workers: usize,
        progress: Option<Progress<'_>>,
        state: &mut RunState,
    ) -> (Vec<FileMetrics>, Vec<String>) {
        let total = files.len();
        let (job_tx, job_rx) = unbounded::<PathBuf>();
        let (outcome_tx, outcome_rx) = unbounded::<Option<FileMetrics>>();
        let (warn_tx, warn_rx) = unbounded::<String>();

        thread::scope(|scope| {
            let producer = scope.spawn(move || {
                for file in files {
                    if job_tx.send(file).is_err() {
                        break;
                    }
                }
            });

            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                let rx = job_rx.clone();
                let tx = outcome_tx.clone();
                let warn = warn_tx.clone();
                handles.push(scope.spawn(move || {
                    for path in rx {
                        if self.cancel.is_cancelled() {
                            break;
                        }
                        let outcome = self.analyze_file(&path, &warn);
                        if tx.send(outcome).is_err() {
                            break;
                        }
                    }
                }));
            }

            // Drop our copies so the collector sees disconnection
            drop(job_rx);
            drop(outcome_tx);
            drop(warn_tx);

            transition(state, RunState::Collecting);
            let mut metrics = Vec::with_capacity(total);
            let mut done = 0;
            for outcome in &outcome_rx {
                done += 1;
                if let Some(cb) = progress {
                    cb(done, total);
                }
                metrics.extend(outcome);
            }
            let mut warnings: Vec<String> = warn_rx.iter().collect();

            if producer.join().is_err() {
                warn!("file producer panicked");
                warnings.push("file producer panicked; some files were not analyzed".to_string());
            }
            for (i, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    warn!(worker = i, "worker panicked");
                    warnings.push(format!(
                        "worker {} panicked; its remaining files were not analyzed",
                        i
                    ));
                }
            }

            (metrics, warnings)
        })
    }

    /// Read, select and parse one file. `None` when the file yields nothing.
    fn analyze_file(&self, path: &Path, warn: &crossbeam_channel::Sender<String>) -> Option<FileMetrics> {
        let bytes = match self.reader.read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = warn.send(format!("read {}: {}", path.display(), e));
                return None;
            }
        };

        let analyzer = self.analyzers.select(path)?;

        match analyzer.parse(path, &bytes) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                debug!(path = %path.display(), analyzer = analyzer.name(), error = %e, "parse failed");
                let _ = warn.send(format!("parse {}: {}", path.display(), e));
                None
            }
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    debug!(from = ?*state, to = ?next, "pipeline state");
    *state = next;
}

/// Configured count or available parallelism, at least 1 and at most `files`.
fn worker_count(configured: Option<usize>, files: usize) -> usize {
    let wanted = configured.filter(|n| *n > 0).unwrap_or_else(|| {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    wanted.max(1).min(files.max(1))
}

/// Match history by exact path first, then by root-relative path.
fn attach_git(files: &mut [FileMetrics], root: &Path, history: &HashMap<String, GitFileMetrics>) {
    if history.is_empty() {
        return;
    }
    for file in files.iter_mut() {
        if let Some(git) = history.get(&file.path) {
            file.git = Some(git.clone());
            continue;
        }
        let rel = Path::new(&file.path)
            .strip_prefix(root)
            .ok()
            .map(|p| p.to_string_lossy().replace('\\', "/"));
        if let Some(git) = rel.and_then(|r| history.get(&r)) {
            file.git = Some(git.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::GitError;
    use std::io;
    use std::sync::Mutex;

    struct StaticScanner(Vec<&'static str>);

    impl SourceScanner for StaticScanner {
        fn scan(&self, _root: &Path, _ext: &[String]) -> Result<Vec<PathBuf>, ScanError> {
            Ok(self.0.iter().map(PathBuf::from).collect())
        }
    }

    struct MemoryReader(HashMap<&'static str, &'static str>);

    impl FileReader for MemoryReader {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.0
                .get(path.to_str().unwrap_or_default())
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }
    }

    struct FixedGit(Result<HashMap<String, GitFileMetrics>, ()>);

    impl VersionControl for FixedGit {
        fn collect_file_metrics(&self, _root: &Path) -> Result<HashMap<String, GitFileMetrics>, GitError> {
            self.0.clone().map_err(|_| GitError::Failed {
                status: 128,
                stderr: "not a git repository".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Option<ProjectReport>>,
        fail: bool,
    }

    impl ReportStore for MemoryStore {
        fn save(&self, _root: &Path, report: &ProjectReport) -> Result<(), StorageError> {
            if self.fail {
                return Err(StorageError::Io {
                    path: PathBuf::from("/ro"),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            *self.saved.lock().unwrap() = Some(report.clone());
            Ok(())
        }

        fn load(&self, _root: &Path) -> Result<ProjectReport, StorageError> {
            Err(StorageError::Io {
                path: PathBuf::from("/none"),
                source: io::Error::new(io::ErrorKind::NotFound, "none"),
            })
        }
    }

    const ADD_C: &str = "int add(int a, int b) { if (a > 0 && b > 0) return a + b; return 0; }\n";
    const MAIN_C: &str = "int main(void) {\n    return add(1, 2);\n}\n";

    fn orchestrator(
        paths: Vec<&'static str>,
        contents: Vec<(&'static str, &'static str)>,
        git: Result<HashMap<String, GitFileMetrics>, ()>,
        store: MemoryStore,
    ) -> Orchestrator {
        Orchestrator::new(
            Box::new(StaticScanner(paths)),
            Box::new(MemoryReader(contents.into_iter().collect())),
            AnalyzerRegistry::default(),
            Box::new(FixedGit(git)),
            Box::new(store),
        )
    }

    #[test]
    fn test_happy_path_with_git() {
        let mut history = HashMap::new();
        history.insert(
            "src/add.c".to_string(),
            GitFileMetrics {
                file_path: "src/add.c".to_string(),
                lines_added: 20,
                lines_deleted: 5,
                commits: 3,
                ..Default::default()
            },
        );
        let o = orchestrator(
            vec!["/p/src/main.c", "/p/src/add.c", "/p/README.md"],
            vec![("/p/src/add.c", ADD_C), ("/p/src/main.c", MAIN_C), ("/p/README.md", "# hi")],
            Ok(history),
            MemoryStore::default(),
        );

        let report = o
            .execute(&AnalysisRequest {
                root: PathBuf::from("/p"),
                workers: Some(2),
                ..Default::default()
            })
            .unwrap();

        assert!(report.warnings.is_empty());
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].path, "/p/src/add.c");
        let add = &report.files[0];
        assert_eq!(add.functions[0].ccn, 3);
        assert_eq!(add.functions[0].fan_in, 1);
        assert_eq!(add.git.as_ref().map(|g| g.churn()), Some(25));
        assert!(add.functions[0].hotspot_score > 0.0);
        assert_eq!(report.hotspots.len(), 1);
        assert_eq!(report.hotspots[0].file_path, "/p/src/add.c");
        assert_eq!(report.project.git_total_commits, 3);
    }

    #[test]
    fn test_git_failure_is_a_warning() {
        let o = orchestrator(
            vec!["/p/a.c"],
            vec![("/p/a.c", ADD_C)],
            Err(()),
            MemoryStore::default(),
        );
        let report = o.execute(&AnalysisRequest::new("/p")).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("git metrics disabled: "));
        assert!(report.hotspots.is_empty());
        assert!(report.files[0].git.is_none());
    }

    #[test]
    fn test_read_and_parse_failures_are_warnings() {
        let o = orchestrator(
            vec!["/p/ok.c", "/p/gone.c"],
            vec![("/p/ok.c", ADD_C)],
            Ok(HashMap::new()),
            MemoryStore::default(),
        );
        let report = o.execute(&AnalysisRequest::new("/p")).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("read /p/gone.c: "));
    }

    #[cfg(feature = "tree-sitter")]
    #[test]
    fn test_go_syntax_error_is_a_warning() {
        let o = orchestrator(
            vec!["/p/bad.go", "/p/ok.c"],
            vec![("/p/bad.go", "package main\nfunc broken( {\n"), ("/p/ok.c", ADD_C)],
            Ok(HashMap::new()),
            MemoryStore::default(),
        );
        let report = o.execute(&AnalysisRequest::new("/p")).unwrap();
        assert_eq!(report.files.len(), 1);
        assert!(report.warnings[0].starts_with("parse /p/bad.go: "));
    }

    #[test]
    fn test_fatal_errors() {
        let o = orchestrator(vec![], vec![], Ok(HashMap::new()), MemoryStore::default());
        assert!(matches!(
            o.execute(&AnalysisRequest::new("")),
            Err(AnalysisError::EmptyRoot)
        ));
        assert!(matches!(
            o.execute(&AnalysisRequest::new("/p")),
            Err(AnalysisError::NoSourceFiles(_))
        ));

        let failing = orchestrator(
            vec!["/p/a.c"],
            vec![("/p/a.c", ADD_C)],
            Ok(HashMap::new()),
            MemoryStore {
                fail: true,
                ..Default::default()
            },
        );
        assert!(matches!(
            failing.execute(&AnalysisRequest::new("/p")),
            Err(AnalysisError::Storage(_))
        ));
    }

    #[test]
    fn test_cancelled_run() {
        let token = CancelToken::new();
        token.cancel();
        let o = orchestrator(
            vec!["/p/a.c"],
            vec![("/p/a.c", ADD_C)],
            Ok(HashMap::new()),
            MemoryStore::default(),
        )
        .cancel_token(token);
        assert!(matches!(
            o.execute(&AnalysisRequest::new("/p")),
            Err(AnalysisError::Cancelled)
        ));
    }

    #[test]
    fn test_progress_reaches_total() {
        let o = orchestrator(
            vec!["/p/a.c", "/p/b.c", "/p/c.txt"],
            vec![("/p/a.c", ADD_C), ("/p/b.c", MAIN_C), ("/p/c.txt", "")],
            Ok(HashMap::new()),
            MemoryStore::default(),
        );
        let seen = Mutex::new(Vec::new());
        let cb = |done: usize, total: usize| seen.lock().unwrap().push((done, total));
        o.execute_with_progress(&AnalysisRequest::new("/p"), Some(&cb))
            .unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last(), Some(&(3, 3)));
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(Some(8), 3), 3);
        assert_eq!(worker_count(Some(0), 3), worker_count(None, 3));
        assert_eq!(worker_count(Some(2), 10), 2);
        assert!(worker_count(None, 1) == 1);
    }

    struct PanickingReader;

    impl FileReader for PanickingReader {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            if path.ends_with("a.c") {
                panic!("reader blew up");
            }
            Ok(ADD_C.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_worker_panic_becomes_warning() {
        let o = Orchestrator::new(
            Box::new(StaticScanner(vec!["/p/a.c", "/p/b.c"])),
            Box::new(PanickingReader),
            AnalyzerRegistry::default(),
            Box::new(FixedGit(Ok(HashMap::new()))),
            Box::new(MemoryStore::default()),
        );

        let report = o
            .execute(&AnalysisRequest {
                root: PathBuf::from("/p"),
                workers: Some(1),
                ..Default::default()
            })
            .unwrap();

        // The only worker died on a.c, so b.c was never analyzed.
        assert!(report.files.is_empty());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.starts_with("worker 0 panicked")));
    }
}
