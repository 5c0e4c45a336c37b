use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use gphoto_client::ClientConfig;
use serde::Deserialize;

const CONFIG_ROOT_ENV: &str = "GPHOTO_CONFIG_ROOT";

/// The CLI's config file: the client settings plus where credentials live.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Cookie export used when `--cookies` is not given.
    pub cookies: Option<PathBuf>,
    #[serde(flatten)]
    pub client: ClientConfig,
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ROOT_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let base = dirs::config_dir().ok_or_else(|| anyhow!("failed to resolve config directory"))?;
    Ok(base.join("gphoto"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join("config.toml"))
}

/// Loads `explicit`, or the default file when it exists, or defaults.
pub fn load(explicit: Option<&Path>) -> Result<CliConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(CliConfig::default());
            }
            path
        }
    };
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid config {}", path.display()))
}

pub fn parse(contents: &str) -> Result<CliConfig> {
    let config: CliConfig = toml::from_str(contents).context("failed to parse config toml")?;
    config.client.validate()?;
    Ok(config)
}
