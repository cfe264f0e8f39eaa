use serde::Deserialize;
use std::collections::HashMap;

/// One entry of the `GET /repos/{repo}/pulls/{pr}/files` response.
/// Only the fields we classify on are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    pub status: String,
}

/// How a file touched by a pull request ends up in the output buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Changed,
    Deleted,
}

impl FileStatus {
    /// Normalize the upstream `status` field.
    /// `added` and `modified` both count as changed; statuses such as
    /// `renamed`, `copied` or `unchanged` are not classified.
    pub fn classify(status: &str) -> Option<FileStatus> {
        match status {
            "added" | "modified" => Some(FileStatus::Changed),
            "deleted" => Some(FileStatus::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Changed => write!(f, "changed"),
            FileStatus::Deleted => write!(f, "deleted"),
        }
    }
}

/// Path → status mapping that remembers first-seen order.
///
/// Re-inserting a path overwrites its status but keeps its original
/// position, so output files are stable across runs.
#[derive(Debug, Clone, Default)]
pub struct FileStatusMap {
    entries: Vec<(String, FileStatus)>,
    index: HashMap<String, usize>,
}

impl FileStatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous status when the path was already present.
    pub fn insert(&mut self, path: String, status: FileStatus) -> Option<FileStatus> {
        match self.index.get(&path) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, status)),
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, status));
                None
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, path: &str) -> Option<FileStatus> {
        self.index.get(path).map(|&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FileStatus)> {
        self.entries.iter().map(|(path, status)| (path.as_str(), *status))
    }
}
