use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection and output settings, usually read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    pub timeout: Duration,
    /// Raw default branch id, validated when a download uses it.
    pub branch_id: Option<String>,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            branch_id: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Reads `API_URL`, `API_TIMEOUT_SECS`, `BRANCH_ID` and `OUTPUT_DIR`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(url) = lookup("API_URL") {
            config = config.with_api_url(&url);
        }

        if let Some(secs) = lookup("API_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("API_TIMEOUT_SECS is not a number of seconds: {secs}"))?;
            config.timeout = Duration::from_secs(secs);
        }

        config.branch_id = lookup("BRANCH_ID").filter(|b| !b.trim().is_empty());

        if let Some(dir) = lookup("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    /// An explicit branch wins over the configured `BRANCH_ID`.
    pub fn branch_or_default(&self, explicit: Option<String>) -> Option<String> {
        explicit.or_else(|| self.branch_id.clone())
    }

    /// Absolute URL for an endpoint path such as `/upload-text`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}
