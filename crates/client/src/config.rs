//! Client configuration, read from the environment.

use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every API path is appended to, without a trailing slash.
    pub api_url: String,
    pub request_timeout: Duration,
    pub auth_token: Option<String>,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            auth_token: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// `WAREOPS_API_URL` (required), `WAREOPS_REQUEST_TIMEOUT_SECS`,
    /// `WAREOPS_AUTH_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("WAREOPS_API_URL").context("WAREOPS_API_URL environment variable not set")?;
        if api_url.trim().is_empty() {
            bail!("WAREOPS_API_URL is empty");
        }
        let mut config = Self::new(api_url.trim());

        if let Some(raw) = lookup("WAREOPS_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("WAREOPS_REQUEST_TIMEOUT_SECS is not a number: {raw:?}"))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(token) = lookup("WAREOPS_AUTH_TOKEN").filter(|t| !t.trim().is_empty()) {
            config = config.with_token(token);
        }
        Ok(config)
    }
}
