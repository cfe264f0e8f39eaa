use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::github::{self, GitHubApi};
use crate::output::{self, AggregateBucket, FileBucket};

/// Settings shared by every per-PR task.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Repository in `owner/name` form
    pub repo: String,
    /// Directory the per-PR files are written to
    pub output_dir: PathBuf,
    /// PRs reporting more changed files than this are skipped
    pub max_changed_files: u64,
    /// Upper bound on PRs processed at once; `None` runs them all together
    pub max_concurrency: Option<NonZeroUsize>,
}

/// Fetch, classify and write the files of one pull request.
///
/// Returns `None` when the PR was skipped: metadata or file listing
/// failed, or the PR is over the changed-files ceiling. Skipped PRs leave
/// nothing on disk. Write failures are logged but still yield a bucket.
#[instrument(skip_all, fields(repo = %options.repo, pr = pr))]
pub async fn process_pull_request(
    api: &dyn GitHubApi,
    options: &ProcessOptions,
    pr: u64,
) -> Option<FileBucket> {
    info!("processing pull request");

    let count = match github::changed_files_count(api, &options.repo, pr).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "failed to read pull request metadata");
            return None;
        }
    };
    if count > options.max_changed_files {
        error!(
            changed_files = count,
            limit = options.max_changed_files,
            "pull request changes too many files, skipping"
        );
        return None;
    }
    debug!(changed_files = count, "change count within limit");

    let files = match github::list_pull_request_files(api, &options.repo, pr).await {
        Ok(files) => files,
        Err(e) => {
            error!(error = %e, "failed to list pull request files");
            return None;
        }
    };

    debug!(classified = files.len(), "listed pull request files");
    let bucket = FileBucket::from_map(&files);
    let written = output::write_pull_request(&options.output_dir, pr, &bucket);
    info!(
        files = bucket.all.len(),
        changed = bucket.changed.len(),
        deleted = bucket.deleted.len(),
        written,
        dir = %options.output_dir.display(),
        "pull request files saved"
    );

    Some(bucket)
}

/// Process every pull request concurrently and merge what they report.
///
/// One task is spawned per PR. Each sends exactly one result on a channel
/// sized to the PR count. A supervisor task joins them all and then drops
/// the last sender, which ends the receive loop. Buckets are merged in the
/// order they arrive.
pub async fn run_all(
    api: Arc<dyn GitHubApi>,
    options: Arc<ProcessOptions>,
    pulls: &[u64],
) -> AggregateBucket {
    let (tx, mut rx) = mpsc::channel::<Option<FileBucket>>(pulls.len().max(1));
    let limiter = options
        .max_concurrency
        .map(|limit| Arc::new(Semaphore::new(limit.get())));

    let mut handles = Vec::with_capacity(pulls.len());
    for &pr in pulls {
        let api = Arc::clone(&api);
        let options = Arc::clone(&options);
        let limiter = limiter.clone();
        let tx = tx.clone();

        handles.push(tokio::spawn(async move {
            let _permit = match limiter {
                Some(limiter) => limiter.acquire_owned().await.ok(),
                None => None,
            };
            let result = process_pull_request(api.as_ref(), &options, pr).await;
            if tx.send(result).await.is_err() {
                warn!(pr, "result channel closed before pull request reported");
            }
        }));
    }

    tokio::spawn(
        async move {
            for handle in handles {
                if let Err(e) = handle.await {
                    error!(error = %e, "pull request task did not complete");
                }
            }
            debug!("all pull request tasks finished");
            drop(tx);
        }
        .instrument(tracing::debug_span!("supervisor")),
    );

    let mut aggregate = AggregateBucket::default();
    while let Some(result) = rx.recv().await {
        if let Some(bucket) = result {
            aggregate.merge(bucket);
        }
    }
    aggregate
}
