//! Report persistence as pretty JSON under the project root.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::ProjectReport;
use crate::ports::{ReportStore, StorageError};

/// Directory created under the analyzed root.
pub const REPORT_DIR: &str = ".codepulse";
pub const REPORT_FILE: &str = "report.json";

/// Stores the report at `<root>/.codepulse/report.json`.
#[derive(Debug, Clone, Default)]
pub struct JsonFileStore;

impl JsonFileStore {
    pub fn new() -> Self {
        Self
    }

    pub fn report_path(root: &Path) -> PathBuf {
        root.join(REPORT_DIR).join(REPORT_FILE)
    }
}

impl ReportStore for JsonFileStore {
    fn save(&self, root: &Path, report: &ProjectReport) -> Result<(), StorageError> {
        let dir = root.join(REPORT_DIR);
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = Self::report_path(root);
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "report saved");
        Ok(())
    }

    fn load(&self, root: &Path) -> Result<ProjectReport, StorageError> {
        let path = Self::report_path(root);
        let content = fs::read_to_string(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
