pub mod types;

pub use types::{AggregateBucket, BucketKind, FileBucket};

use colored::Colorize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, instrument};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `{pr}_{suffix}.txt` under `dir`.
pub fn pull_request_file(dir: &Path, pr: u64, kind: BucketKind) -> PathBuf {
    dir.join(format!("{}_{}.txt", pr, kind.suffix()))
}

/// `all_{suffix}.txt` under `dir`.
pub fn aggregate_file(dir: &Path, kind: BucketKind) -> PathBuf {
    dir.join(format!("all_{}.txt", kind.suffix()))
}

/// Write one path per line. No trailing newline; an empty list gives an empty file.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<(), OutputError> {
    std::fs::write(path, lines.join("\n")).map_err(|source| OutputError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the per-PR files for `bucket`.
///
/// Each file is written independently: a failure is logged and the
/// remaining files are still attempted. Returns how many were written.
#[instrument(skip_all, fields(dir = %dir.display(), pr = pr))]
pub fn write_pull_request(dir: &Path, pr: u64, bucket: &FileBucket) -> usize {
    let mut written = 0;
    for (kind, lines) in bucket.outputs() {
        let path = pull_request_file(dir, pr, kind);
        match write_lines(&path, lines) {
            Ok(()) => {
                debug!(path = %path.display(), lines = lines.len(), "wrote output file");
                written += 1;
            }
            Err(e) => error!(error = %e, "failed to write output file"),
        }
    }
    written
}

/// Write `all_all.txt`, `all_chg.txt` and `all_del.txt`, empty or not.
/// Stops at the first failure.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn write_aggregate(dir: &Path, aggregate: &AggregateBucket) -> Result<(), OutputError> {
    for kind in BucketKind::ALL {
        let path = aggregate_file(dir, kind);
        write_lines(&path, aggregate.list(kind))?;
        debug!(path = %path.display(), lines = aggregate.list(kind).len(), "wrote aggregate file");
    }
    Ok(())
}

/// Print a short end-of-run summary to stdout.
pub fn print_summary(aggregate: &AggregateBucket, requested: usize, dir: &Path) {
    let processed = format!("{}/{}", aggregate.processed, requested);
    let processed = if aggregate.processed == requested {
        processed.green().bold()
    } else {
        processed.yellow().bold()
    };

    println!();
    println!("Pull requests processed: {}", processed);
    println!(
        "Files: {} | Changed: {} | Deleted: {}",
        aggregate.all.len(),
        aggregate.changed.len().to_string().green(),
        aggregate.deleted.len().to_string().red()
    );
    println!("Output directory: {}", dir.display());
    println!();
}
