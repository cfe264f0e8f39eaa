use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::github::DEFAULT_API_URL;

pub const DEFAULT_CONFIG_FILE: &str = ".pr-files.toml";
pub const DEFAULT_MAX_CHANGED_FILES: u64 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid pull request number: {0:?}")]
    InvalidPullRequest(String),
}

/// Configuration loaded from .pr-files.toml.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// API token. Falls back to GITHUB_TOKEN when unset.
    pub token: Option<String>,
    /// REST API base URL, for GitHub Enterprise servers
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitsConfig {
    /// PRs reporting more changed files than this are skipped
    pub max_changed_files: Option<u64>,
}

impl Config {
    /// Load `path` if given, otherwise .pr-files.toml in the current
    /// directory. Only the implicit file may be missing.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the API token: flag, then config file, then `env` (the
    /// GITHUB_TOKEN value). Empty values count as unset.
    pub fn github_token(&self, flag: Option<&str>, env: Option<&str>) -> Option<String> {
        non_empty(flag)
            .or_else(|| non_empty(self.github.token.as_deref()))
            .or_else(|| non_empty(env))
    }

    pub fn api_url(&self, flag: Option<&str>) -> String {
        non_empty(flag)
            .or_else(|| non_empty(self.github.api_url.as_deref()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn output_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.output.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn max_changed_files(&self, flag: Option<u64>) -> u64 {
        flag.or(self.limits.max_changed_files)
            .unwrap_or(DEFAULT_MAX_CHANGED_FILES)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Parse a comma-separated list of pull request numbers.
/// Any entry that is not a bare integer, including one padded with
/// whitespace, rejects the whole list.
pub fn parse_pull_numbers(list: &str) -> Result<Vec<u64>, ConfigError> {
    list.split(',')
        .map(|item| {
            item.parse::<u64>()
                .map_err(|_| ConfigError::InvalidPullRequest(item.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.api_url(None), DEFAULT_API_URL);
        assert_eq!(config.output_dir(None), PathBuf::from("."));
        assert_eq!(config.max_changed_files(None), 3000);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
token = "from-file"
api_url = "https://ghe.example.com/api/v3"

[output]
dir = "changed-files"

[limits]
max_changed_files = 500
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github_token(None, None).as_deref(), Some("from-file"));
        assert_eq!(config.api_url(None), "https://ghe.example.com/api/v3");
        assert_eq!(config.output_dir(None), PathBuf::from("changed-files"));
        assert_eq!(config.max_changed_files(None), 500);
    }

    #[test]
    fn test_flags_override_config() {
        let config: Config = toml::from_str(
            r#"
[github]
token = "from-file"

[output]
dir = "changed-files"
"#,
        )
        .unwrap();
        assert_eq!(config.github_token(Some("from-flag"), None).as_deref(), Some("from-flag"));
        assert_eq!(config.github_token(Some(""), None).as_deref(), Some("from-file"));
        assert_eq!(config.output_dir(Some(Path::new("out"))), PathBuf::from("out"));
        assert_eq!(config.max_changed_files(Some(10)), 10);
    }

    #[test]
    fn test_token_falls_back_to_environment() {
        let config = Config::default();
        assert_eq!(config.github_token(None, Some("from-env")).as_deref(), Some("from-env"));
        assert_eq!(config.github_token(Some(""), Some("")), None);
        assert_eq!(config.github_token(None, None), None);

        let config: Config = toml::from_str("[github]\ntoken = \"from-file\"\n").unwrap();
        assert_eq!(config.github_token(None, Some("from-env")).as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pr-files.toml");
        fs::write(&path, "[limits]\nmax_changed_files = 42\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.max_changed_files(None), 42);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[limits\nmax_changed_files = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_pull_numbers() {
        assert_eq!(parse_pull_numbers("42").unwrap(), vec![42]);
        assert_eq!(parse_pull_numbers("1,2,30").unwrap(), vec![1, 2, 30]);
    }

    #[test]
    fn test_parse_pull_numbers_rejects_garbage() {
        assert!(matches!(
            parse_pull_numbers("1,abc,3"),
            Err(ConfigError::InvalidPullRequest(item)) if item == "abc"
        ));
        assert!(parse_pull_numbers("1,,2").is_err());
        assert!(parse_pull_numbers("-4").is_err());
        assert!(parse_pull_numbers("1, 2").is_err());
        assert!(parse_pull_numbers("7 ").is_err());
    }
}
