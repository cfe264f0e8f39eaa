pub mod types;

pub use types::{FileStatus, FileStatusMap, PullRequestFile};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github+json";
pub const CLIENT_USER_AGENT: &str = concat!("pr-files/", env!("CARGO_PKG_VERSION"));
pub const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
pub const API_VERSION: &str = "2022-11-28";
pub const PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected response status {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("Failed to decode GitHub API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single authenticated GET against the GitHub REST API.
///
/// Lister, guard and processor only talk to GitHub through this trait so
/// they can be driven by an in-memory fake in tests.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Base URL every endpoint path is appended to (no trailing slash).
    fn base_url(&self) -> &str;

    /// Fetch `url` and return the raw body. Anything but `200 OK` is an error.
    async fn get(&self, url: &str) -> Result<Vec<u8>, GitHubError>;
}

/// reqwest-backed [`GitHubApi`]. No timeout and no retries are configured.
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn build_request(&self, url: &str) -> Result<reqwest::Request, reqwest::Error> {
        self.client
            .get(url)
            .header(ACCEPT, ACCEPT_MEDIA_TYPE)
            .bearer_auth(&self.token)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(API_VERSION_HEADER, API_VERSION)
            .build()
    }
}

#[async_trait]
impl GitHubApi for HttpClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, GitHubError> {
        let request = self.build_request(url)?;
        let response = self.client.execute(request).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GitHubError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

pub fn pull_request_url(base_url: &str, repo: &str, pr: u64) -> String {
    format!("{}/repos/{}/pulls/{}", base_url, repo, pr)
}

pub fn pull_request_files_url(base_url: &str, repo: &str, pr: u64, page: u32) -> String {
    format!(
        "{}/files?page={}&per_page={}",
        pull_request_url(base_url, repo, pr),
        page,
        PER_PAGE
    )
}

/// Collect every classified file touched by a pull request.
///
/// Pages are requested until one comes back empty. A failure on any page
/// discards everything gathered so far.
#[instrument(skip_all, fields(repo = %repo, pr = pr))]
pub async fn list_pull_request_files(
    api: &dyn GitHubApi,
    repo: &str,
    pr: u64,
) -> Result<FileStatusMap, GitHubError> {
    let mut files = FileStatusMap::new();
    let mut page = 1;

    loop {
        let url = pull_request_files_url(api.base_url(), repo, pr, page);
        let body = api.get(&url).await?;
        let entries: Vec<PullRequestFile> = serde_json::from_slice(&body)?;
        debug!(page, entries = entries.len(), "received files page");

        if entries.is_empty() {
            break;
        }

        for entry in entries {
            debug!(file = %entry.filename, status = %entry.status, "file in pull request");
            if let Some(status) = FileStatus::classify(&entry.status) {
                if let Some(previous) = files.insert(entry.filename.clone(), status) {
                    if previous != status {
                        warn!(file = %entry.filename, %previous, %status, "file reported twice with different statuses");
                    }
                }
            }
        }
        page += 1;
    }

    Ok(files)
}

/// Read `changed_files` from the pull request metadata.
///
/// A missing or non-numeric field is not an error: it is logged and
/// reported as zero.
#[instrument(skip_all, fields(repo = %repo, pr = pr))]
pub async fn changed_files_count(
    api: &dyn GitHubApi,
    repo: &str,
    pr: u64,
) -> Result<u64, GitHubError> {
    let url = pull_request_url(api.base_url(), repo, pr);
    let body = api.get(&url).await?;
    let metadata: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&body)?;

    match metadata.get("changed_files").and_then(|v| v.as_f64()) {
        Some(count) if count >= 0.0 => Ok(count as u64),
        _ => {
            warn!("no changed_files count in pull request metadata");
            Ok(0)
        }
    }
}
