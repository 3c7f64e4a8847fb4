//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use codepulse::model::GitFileMetrics;
use codepulse::ports::{GitError, VersionControl};
use tempfile::TempDir;
use walkdir::WalkDir;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("project")
}

/// Copy the fixture project into a temp dir so reports never land in testdata.
pub fn fixture_copy() -> TempDir {
    let src = fixture_path();
    let dir = TempDir::new().expect("create temp dir");
    for entry in WalkDir::new(&src) {
        let entry = entry.expect("walk fixture");
        let rel = entry.path().strip_prefix(&src).expect("relative path");
        let dest = dir.path().join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).expect("create dir");
        } else {
            fs::copy(entry.path(), &dest).expect("copy file");
        }
    }
    dir
}

/// Canned history keyed by root-relative path.
pub struct FakeGit(pub HashMap<String, GitFileMetrics>);

impl FakeGit {
    pub fn with_churn(entries: &[(&str, usize, usize)]) -> Self {
        let map = entries
            .iter()
            .map(|(path, added, deleted)| {
                (
                    path.to_string(),
                    GitFileMetrics {
                        file_path: path.to_string(),
                        lines_added: *added,
                        lines_deleted: *deleted,
                        commits: 3,
                        bugfix_commits: 1,
                        authors: 2,
                    },
                )
            })
            .collect();
        Self(map)
    }
}

impl VersionControl for FakeGit {
    fn collect_file_metrics(&self, _root: &Path) -> Result<HashMap<String, GitFileMetrics>, GitError> {
        Ok(self.0.clone())
    }
}
