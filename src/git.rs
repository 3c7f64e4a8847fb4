//! Churn collection through the `git` command line.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::model::GitFileMetrics;
use crate::ports::{GitError, VersionControl};

/// Header line prefix; the format is `commit:<hash>:<author>:<subject>`.
const COMMIT_PREFIX: &str = "commit:";

/// Subject words that mark a commit as a bug fix.
const BUGFIX_WORDS: &[&str] = &["fix", "bug", "issue"];

/// Runs `git log --numstat` in the project root.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionControl for GitCli {
    fn collect_file_metrics(&self, root: &Path) -> Result<HashMap<String, GitFileMetrics>, GitError> {
        debug!(root = %root.display(), program = %self.program, "collecting git history");

        let output = Command::new(&self.program)
            .arg("-C")
            .arg(root)
            .args(["log", "--numstat", "--format=commit:%H:%an:%s"])
            .output()?;

        if !output.status.success() {
            return Err(GitError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let metrics = parse_numstat(&String::from_utf8_lossy(&output.stdout));
        debug!(paths = metrics.len(), "git history collected");
        Ok(metrics)
    }
}

#[derive(Default)]
struct Tally {
    added: usize,
    deleted: usize,
    commits: usize,
    bugfix_commits: usize,
    authors: HashSet<String>,
}

/// Aggregate `git log --numstat --format=commit:%H:%an:%s` output per path.
///
/// Binary rows (`-` counts) and rename rows (`a => b`) are ignored.
pub fn parse_numstat(log: &str) -> HashMap<String, GitFileMetrics> {
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    let mut author = String::new();
    let mut bugfix = false;

    for line in log.lines() {
        if let Some(header) = line.strip_prefix(COMMIT_PREFIX) {
            let mut parts = header.splitn(3, ':');
            let _hash = parts.next();
            author = parts.next().unwrap_or_default().to_string();
            let subject = parts.next().unwrap_or_default().to_lowercase();
            bugfix = BUGFIX_WORDS.iter().any(|w| subject.contains(w));
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let [added, deleted, path] = fields[..] else {
            continue;
        };
        if path.contains("=>") {
            continue;
        }
        let (Ok(added), Ok(deleted)) = (added.parse::<usize>(), deleted.parse::<usize>()) else {
            continue;
        };

        let tally = tallies.entry(path.to_string()).or_default();
        tally.added += added;
        tally.deleted += deleted;
        tally.commits += 1;
        if bugfix {
            tally.bugfix_commits += 1;
        }
        if !author.is_empty() {
            tally.authors.insert(author.clone());
        }
    }

    tallies
        .into_iter()
        .map(|(path, t)| {
            let metrics = GitFileMetrics {
                file_path: path.clone(),
                lines_added: t.added,
                lines_deleted: t.deleted,
                commits: t.commits,
                bugfix_commits: t.bugfix_commits,
                authors: t.authors.len(),
            };
            (path, metrics)
        })
        .collect()
}
