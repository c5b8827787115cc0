use std::time::Duration;

use bioinfer_core::poll::{PollConfig, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
use secrecy::SecretString;

use crate::error::ClientError;

pub const ENV_API_KEY: &str = "BIOINFER_API_KEY";
pub const ENV_API_HOST: &str = "BIOINFER_API_HOST";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "BIOINFER_REQUEST_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL_SECS: &str = "BIOINFER_POLL_INTERVAL_SECS";
pub const ENV_POLL_TIMEOUT_SECS: &str = "BIOINFER_POLL_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "BIOINFER_MAX_RETRIES";

pub const DEFAULT_API_HOST: &str = "https://api.bionemo.ngc.nvidia.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection and polling settings for one inference service.
///
/// Passed explicitly to [`InferenceApi::new`](crate::InferenceApi::new);
/// nothing in this crate reads global state.
#[derive(Debug)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to, without a trailing `/`.
    pub api_host: String,
    /// Bearer token. Never logged.
    pub api_key: SecretString,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    pub poll: PollConfig,
}

impl ClientConfig {
    pub fn new(api_host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_host: normalize_host(api_host.into()),
            api_key: SecretString::from(api_key.into()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll: PollConfig::default(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                                 |
    /// |---------------------------------|-----------------------------------------|
    /// | `BIOINFER_API_KEY`              | -- (required)                           |
    /// | `BIOINFER_API_HOST`             | `https://api.bionemo.ngc.nvidia.com/v1` |
    /// | `BIOINFER_REQUEST_TIMEOUT_SECS` | `60`                                    |
    /// | `BIOINFER_POLL_INTERVAL_SECS`   | `10`                                    |
    /// | `BIOINFER_POLL_TIMEOUT_SECS`    | `3600` (`0` disables the deadline)      |
    /// | `BIOINFER_MAX_RETRIES`          | `5`                                     |
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable
    /// source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ClientError::Config(format!("{ENV_API_KEY} must be set")))?;

        let api_host = lookup(ENV_API_HOST).unwrap_or_else(|| DEFAULT_API_HOST.to_string());

        let request_timeout = parse_secs(
            &lookup,
            ENV_REQUEST_TIMEOUT_SECS,
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?;
        let interval = parse_secs(&lookup, ENV_POLL_INTERVAL_SECS, DEFAULT_POLL_INTERVAL.as_secs())?;
        let timeout = parse_secs(&lookup, ENV_POLL_TIMEOUT_SECS, DEFAULT_POLL_TIMEOUT.as_secs())?;
        let max_retries = match lookup(ENV_MAX_RETRIES) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                ClientError::Config(format!("{ENV_MAX_RETRIES} must be a valid u32, got '{raw}'"))
            })?,
            None => DEFAULT_MAX_RETRIES,
        };

        if request_timeout == 0 {
            return Err(ClientError::Config(format!(
                "{ENV_REQUEST_TIMEOUT_SECS} must be greater than zero"
            )));
        }
        if interval == 0 {
            return Err(ClientError::Config(format!(
                "{ENV_POLL_INTERVAL_SECS} must be greater than zero"
            )));
        }

        let mut poll = PollConfig::default()
            .with_interval(Duration::from_secs(interval))
            .with_timeout((timeout > 0).then(|| Duration::from_secs(timeout)));
        poll.retry.max_retries = max_retries;

        Ok(Self::new(api_host, api_key)
            .with_request_timeout(Duration::from_secs(request_timeout))
            .with_poll(poll))
    }
}

fn parse_secs<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ClientError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ClientError::Config(format!("{name} must be a valid u64, got '{raw}'"))),
        None => Ok(default),
    }
}

fn normalize_host(host: String) -> String {
    host.trim().trim_end_matches('/').to_string()
}
