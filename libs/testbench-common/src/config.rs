// Harness configuration: config/harness.json, then environment overrides
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::piston::DEFAULT_BASE_URL;

pub const DEFAULT_CONFIG_PATH: &str = "config/harness.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the execution service
    pub piston_url: String,
    /// Minimum spacing between two single-case runs
    pub cooldown_seconds: u64,
    /// Pause between consecutive cases of a batch run
    pub batch_delay_ms: u64,
    pub access_endpoint: Option<String>,
    pub solved_endpoint: Option<String>,
    pub reports_endpoint: Option<String>,
    /// API listen address
    pub bind_addr: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            piston_url: DEFAULT_BASE_URL.to_string(),
            cooldown_seconds: 7,
            batch_delay_ms: 500,
            access_endpoint: None,
            solved_endpoint: None,
            reports_endpoint: None,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Harness config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: HarnessConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load config/harness.json if present, otherwise defaults; env overrides apply either way
    pub fn load_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        let config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Apply PISTON_URL, COOLDOWN_SECONDS, BATCH_DELAY_MS, ACCESS_ENDPOINT,
    /// SOLVED_ENDPOINT, REPORTS_ENDPOINT and BIND_ADDR
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PISTON_URL") {
            self.piston_url = url;
        }
        if let Some(value) = lookup("COOLDOWN_SECONDS") {
            self.cooldown_seconds = parse_var("COOLDOWN_SECONDS", &value)?;
        }
        if let Some(value) = lookup("BATCH_DELAY_MS") {
            self.batch_delay_ms = parse_var("BATCH_DELAY_MS", &value)?;
        }
        if let Some(endpoint) = lookup("ACCESS_ENDPOINT") {
            self.access_endpoint = Some(endpoint);
        }
        if let Some(endpoint) = lookup("SOLVED_ENDPOINT") {
            self.solved_endpoint = Some(endpoint);
        }
        if let Some(endpoint) = lookup("REPORTS_ENDPOINT") {
            self.reports_endpoint = Some(endpoint);
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.piston_url.trim().is_empty() {
            bail!("piston_url cannot be empty");
        }
        if self.cooldown_seconds == 0 {
            bail!("cooldown_seconds must be greater than zero");
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: {:?}", key, value))
}
