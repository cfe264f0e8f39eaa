mod config;
mod github;
mod output;
mod processor;

use clap::{CommandFactory, Parser};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, info_span};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::github::{GitHubApi, HttpClient};
use crate::processor::ProcessOptions;

/// PR Files: list the files changed and deleted by GitHub Pull Requests
/// and write them to plain text files, one path per line.
#[derive(Parser, Debug)]
#[command(name = "pr-files", version, about)]
struct Cli {
    /// Full name of the repository in the format 'owner/name'
    #[arg(long)]
    repo: Option<String>,

    /// Comma-separated list of pull request numbers
    #[arg(long)]
    pulls: Option<String>,

    /// GitHub API token. Falls back to the config file, then GITHUB_TOKEN.
    #[arg(long)]
    token: Option<String>,

    /// Directory to save output files (default is current directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// GitHub REST API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Config file to load instead of ./.pr-files.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip pull requests that change more files than this
    #[arg(long)]
    max_changed_files: Option<u64>,

    /// Process at most this many pull requests at the same time
    #[arg(long)]
    max_concurrency: Option<NonZeroUsize>,
}

/// Values the run cannot start without.
#[derive(Debug, PartialEq, Eq)]
struct RequiredArgs {
    repo: String,
    pulls: String,
    token: String,
}

/// Check that repo, pulls and token are all present and non-empty.
///
/// `config` is `None` when the config file failed to load; the token can
/// then only come from `--token` or `env_token`.
fn required_args(cli: &Cli, config: Option<&Config>, env_token: Option<&str>) -> Option<RequiredArgs> {
    let repo = cli.repo.clone().filter(|r| !r.is_empty())?;
    let pulls = cli.pulls.clone().filter(|p| !p.is_empty())?;
    let token = match config {
        Some(config) => config.github_token(cli.token.as_deref(), env_token),
        None => Config::default().github_token(cli.token.as_deref(), env_token),
    }?;
    Some(RequiredArgs { repo, pulls, token })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let loaded = Config::load(cli.config.as_deref());
    let env_token = std::env::var("GITHUB_TOKEN").ok();
    let Some(RequiredArgs { repo, pulls, token }) =
        required_args(&cli, loaded.as_ref().ok(), env_token.as_deref())
    else {
        error!("missing required flags: --repo, --pulls and --token are all needed");
        eprintln!("{}", Cli::command().render_help());
        std::process::exit(1);
    };
    let config = loaded.inspect_err(|e| {
        error!(error = %e, "failed to load configuration");
    })?;

    let _main_span = info_span!("pr_files", repo = %repo).entered();

    let output_dir = config.output_dir(cli.output_dir.as_deref());
    std::fs::create_dir_all(&output_dir).inspect_err(|e| {
        error!(error = %e, dir = %output_dir.display(), "failed to create output directory");
    })?;

    let pull_numbers = config::parse_pull_numbers(&pulls).inspect_err(|e| {
        error!(error = %e, "invalid --pulls value");
    })?;
    debug!(pulls = ?pull_numbers, "parsed pull request list");

    let api_url = config.api_url(cli.api_url.as_deref());
    let api: Arc<dyn GitHubApi> = Arc::new(HttpClient::new(&api_url, &token));
    let options = Arc::new(ProcessOptions {
        repo,
        output_dir: output_dir.clone(),
        max_changed_files: config.max_changed_files(cli.max_changed_files),
        max_concurrency: cli.max_concurrency,
    });

    info!(count = pull_numbers.len(), api_url = %api_url, "processing pull requests");
    let aggregate = processor::run_all(api, options, &pull_numbers).await;

    output::write_aggregate(&output_dir, &aggregate).inspect_err(|e| {
        error!(error = %e, "failed to write aggregate files");
    })?;
    info!(
        processed = aggregate.processed,
        requested = pull_numbers.len(),
        "all files saved to all_all.txt, all_chg.txt and all_del.txt"
    );

    output::print_summary(&aggregate, pull_numbers.len(), &output_dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pr-files").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_required_args_from_flags() {
        let cli = parse(&["--repo", "acme/widgets", "--pulls", "1,2", "--token", "t0k3n"]);
        assert_eq!(
            required_args(&cli, Some(&Config::default()), None),
            Some(RequiredArgs {
                repo: "acme/widgets".to_string(),
                pulls: "1,2".to_string(),
                token: "t0k3n".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_repo_is_missing() {
        let cli = parse(&["--repo", "", "--pulls", "1", "--token", "t0k3n"]);
        assert_eq!(required_args(&cli, Some(&Config::default()), None), None);
    }

    #[test]
    fn test_missing_pulls() {
        let cli = parse(&["--repo", "acme/widgets", "--token", "t0k3n"]);
        assert_eq!(required_args(&cli, Some(&Config::default()), None), None);
    }

    #[test]
    fn test_token_absent_everywhere() {
        let cli = parse(&["--repo", "acme/widgets", "--pulls", "1"]);
        assert_eq!(required_args(&cli, Some(&Config::default()), None), None);
        assert_eq!(required_args(&cli, None, None), None);
    }

    #[test]
    fn test_token_from_config_or_environment() {
        let cli = parse(&["--repo", "acme/widgets", "--pulls", "1"]);
        let config: Config = toml::from_str("[github]\ntoken = \"from-file\"\n").unwrap();

        let args = required_args(&cli, Some(&config), Some("from-env")).unwrap();
        assert_eq!(args.token, "from-file");
        let args = required_args(&cli, None, Some("from-env")).unwrap();
        assert_eq!(args.token, "from-env");
    }

    #[test]
    fn test_missing_flags_reported_before_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[github\ntoken = ").unwrap();
        let loaded = Config::load(Some(&path));
        assert!(loaded.is_err());

        let cli = parse(&["--pulls", "1", "--token", "t0k3n"]);
        assert_eq!(required_args(&cli, loaded.as_ref().ok(), None), None);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Cli::try_parse_from(["pr-files", "--max-concurrency", "0"]);
        assert!(result.is_err());

        let cli = parse(&["--max-concurrency", "4"]);
        assert_eq!(cli.max_concurrency, NonZeroUsize::new(4));
    }
}
