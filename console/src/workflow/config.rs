use anyhow::{ensure, Context};
use rulcore::client::http::normalize_base_url;
use rulcore::client::DEFAULT_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl ConsoleConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading console config {}", path_ref.display()))?;
        let config: ConsoleConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing console config {}", path_ref.display()))?;
        config.validated()
    }

    /// Config file (or defaults) with command-line values layered on top.
    pub fn resolve(
        path: Option<&Path>,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
    ) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(base_url) = base_url {
            config.base_url = base_url;
        }
        if let Some(timeout_secs) = timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        config.validated()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validated(mut self) -> anyhow::Result<Self> {
        ensure!(self.timeout_secs > 0, "timeout_secs must be at least 1");
        self.base_url = normalize_base_url(&self.base_url).context("validating base_url")?;
        Ok(self)
    }
}
