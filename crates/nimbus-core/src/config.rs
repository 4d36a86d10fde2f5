use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const BACKEND_URL_ENV: &str = "NIMBUS_BACKEND_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub dark_mode: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            backend_url: Some(DEFAULT_BACKEND_URL.to_string()),
            request_timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            dark_mode: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_dark_mode(path: &Path, dark_mode: bool) -> Result<()> {
        let mut config = Self::load_from(path).unwrap_or_else(|_| Self::new());
        config.dark_mode = Some(dark_mode);
        config.save_to(path)
    }

    /// Backend URL: explicit override, then `NIMBUS_BACKEND_URL`, then the file.
    pub fn resolve_backend_url(&self, flag: Option<&str>) -> String {
        let env = std::env::var(BACKEND_URL_ENV).ok();
        self.resolve_backend_url_with(flag, env.as_deref())
    }

    fn resolve_backend_url_with(&self, flag: Option<&str>, env: Option<&str>) -> String {
        flag.or(env)
            .or(self.backend_url.as_deref())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_BACKEND_URL)
            .to_string()
    }

    /// Request timeout; zero seconds disables it.
    pub fn resolve_timeout(&self, flag: Option<u64>) -> Option<Duration> {
        let secs = flag
            .or(self.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        (secs > 0).then(|| Duration::from_secs(secs))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("nimbus").join("config.json"))
    }
}
