//! Seams between the analysis pipeline and the outside world.
//!
//! The pipeline only talks to these traits. Filesystem, git and storage
//! implementations live in `scan`, `git` and `storage`.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{GitFileMetrics, ProjectReport};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("root {path} is not a readable directory: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid exclusion pattern: {0}")]
    Pattern(#[from] globset::Error),
}

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] io::Error),

    #[error("git exited with {status}: {stderr}")]
    Failed { status: i32, stderr: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("report encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Finds candidate source files under a root.
pub trait SourceScanner: Send + Sync {
    /// Files under `root` whose extension is in `extensions`.
    /// An empty extension list means no filtering.
    fn scan(&self, root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, ScanError>;
}

/// Reads file contents. Shared by all workers.
pub trait FileReader: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Per-path history from a version-control system.
pub trait VersionControl: Send + Sync {
    /// Keys are paths relative to `root`.
    fn collect_file_metrics(&self, root: &Path) -> Result<HashMap<String, GitFileMetrics>, GitError>;
}

/// Persists the latest report of a project.
pub trait ReportStore: Send + Sync {
    fn save(&self, root: &Path, report: &ProjectReport) -> Result<(), StorageError>;

    fn load(&self, root: &Path) -> Result<ProjectReport, StorageError>;
}
