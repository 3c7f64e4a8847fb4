//! Filesystem scanner and reader.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::ports::{FileReader, ScanError, SourceScanner};

/// Directories never worth descending into.
const SKIPPED_DIRS: &[&str] = &[".git", "vendor", "node_modules", ".codepulse"];

/// Walks a directory tree with `walkdir`.
#[derive(Debug, Clone)]
pub struct FsScanner {
    excluded: GlobSet,
}

impl FsScanner {
    /// Scanner honouring `excluded_paths` globs, matched against
    /// root-relative paths (e.g. `"**/generated/**"`).
    pub fn new<S: AsRef<str>>(excluded_paths: &[S]) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in excluded_paths {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(Self {
            excluded: builder.build()?,
        })
    }

    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let rel = path.strip_prefix(root).unwrap_or(path);
        self.excluded.is_match(rel)
    }
}

impl Default for FsScanner {
    fn default() -> Self {
        Self {
            excluded: GlobSet::empty(),
        }
    }
}

/// Lowercase, dot-less form of a configured extension.
fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

impl SourceScanner for FsScanner {
    fn scan(&self, root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, ScanError> {
        let meta = fs::metadata(root).map_err(|source| ScanError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(ScanError::Root {
                path: root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let wanted: Vec<String> = extensions.iter().map(|e| normalize_extension(e)).collect();
        let mut files = Vec::new();

        for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            if e.file_type().is_dir() {
                let name = e.file_name().to_string_lossy();
                if SKIPPED_DIRS.contains(&name.as_ref()) {
                    return false;
                }
            }
            !self.is_excluded(root, e.path())
        }) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !wanted.is_empty() {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(normalize_extension)
                    .unwrap_or_default();
                if !wanted.contains(&ext) {
                    continue;
                }
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }
}

impl FileReader for FsScanner {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_extension_filter() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "main.go");
        touch(tmp.path(), "lib/util.C");
        touch(tmp.path(), "README.md");

        let scanner = FsScanner::default();
        let files = scanner
            .scan(tmp.path(), &["go".to_string(), ".c".to_string()])
            .unwrap();
        assert_eq!(names(tmp.path(), &files), vec!["lib/util.C", "main.go"]);
    }

    #[test]
    fn test_empty_extensions_means_everything() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.go");
        touch(tmp.path(), "b.txt");
        let files = FsScanner::default().scan(tmp.path(), &[]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_skipped_and_excluded_directories() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/a.go");
        touch(tmp.path(), "vendor/dep/b.go");
        touch(tmp.path(), "node_modules/c.go");
        touch(tmp.path(), ".git/d.go");
        touch(tmp.path(), ".codepulse/e.go");
        touch(tmp.path(), "gen/f.go");

        let scanner = FsScanner::new(&["gen"]).unwrap();
        let files = scanner.scan(tmp.path(), &["go".to_string()]).unwrap();
        assert_eq!(names(tmp.path(), &files), vec!["src/a.go"]);
    }

    #[test]
    fn test_missing_root() {
        let tmp = TempDir::new().unwrap();
        let err = FsScanner::default()
            .scan(&tmp.path().join("nope"), &[])
            .unwrap_err();
        assert!(matches!(err, ScanError::Root { .. }));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            FsScanner::new(&["a[b"]),
            Err(ScanError::Pattern(_))
        ));
    }
}
