use crate::github::{FileStatus, FileStatusMap};

/// Which list an output file holds. The suffix ends up in the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKind {
    All,
    Changed,
    Deleted,
}

impl BucketKind {
    pub const ALL: [BucketKind; 3] = [BucketKind::All, BucketKind::Changed, BucketKind::Deleted];

    pub fn suffix(&self) -> &'static str {
        match self {
            BucketKind::All => "all",
            BucketKind::Changed => "chg",
            BucketKind::Deleted => "del",
        }
    }
}

impl std::fmt::Display for BucketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Files touched by one pull request, split by classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBucket {
    /// Every classified path, first-seen order
    pub all: Vec<String>,
    /// Added or modified paths
    pub changed: Vec<String>,
    /// Removed paths
    pub deleted: Vec<String>,
}

impl FileBucket {
    pub fn from_map(files: &FileStatusMap) -> Self {
        let mut bucket = FileBucket::default();
        for (path, status) in files.iter() {
            match status {
                FileStatus::Changed => bucket.changed.push(path.to_string()),
                FileStatus::Deleted => bucket.deleted.push(path.to_string()),
            }
            bucket.all.push(path.to_string());
        }
        bucket
    }

    /// Lists that get written for this bucket: `all` always, the others
    /// only when non-empty.
    pub fn outputs(&self) -> Vec<(BucketKind, &[String])> {
        let mut outputs = vec![(BucketKind::All, self.all.as_slice())];
        if !self.changed.is_empty() {
            outputs.push((BucketKind::Changed, self.changed.as_slice()));
        }
        if !self.deleted.is_empty() {
            outputs.push((BucketKind::Deleted, self.deleted.as_slice()));
        }
        outputs
    }
}

/// Run-wide concatenation of every reported [`FileBucket`], in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateBucket {
    pub all: Vec<String>,
    pub changed: Vec<String>,
    pub deleted: Vec<String>,
    /// Pull requests that reported a bucket
    pub processed: usize,
}

impl AggregateBucket {
    pub fn merge(&mut self, bucket: FileBucket) {
        self.all.extend(bucket.all);
        self.changed.extend(bucket.changed);
        self.deleted.extend(bucket.deleted);
        self.processed += 1;
    }

    pub fn list(&self, kind: BucketKind) -> &[String] {
        match kind {
            BucketKind::All => &self.all,
            BucketKind::Changed => &self.changed,
            BucketKind::Deleted => &self.deleted,
        }
    }
}
