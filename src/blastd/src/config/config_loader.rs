use anyhow::{ensure, Context, Result};
use config::{Config as RConfig, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::exporters::event_forward::BackoffPolicy;
use crate::constants::{APP_DIR, CONFIG_FILE, ENV_PREFIX};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Config {
    pub server_url: String,
    /// Bearer credential for the remote endpoint. Empty disables forwarding.
    pub api_token: String,
    pub sync_interval_minutes: u64,
    pub sync_batch_size: usize,
    pub sync_min_backoff_secs: u64,
    pub sync_max_backoff_secs: u64,
    pub metrics_only: bool,
    pub machine: String,

    pub socket_path: PathBuf,
    pub db_path: PathBuf,
    pub log_file: PathBuf,
}

impl Config {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_minutes * 60)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            min: Duration::from_secs(self.sync_min_backoff_secs),
            max: Duration::from_secs(self.sync_max_backoff_secs),
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.sync_batch_size > 0, "sync_batch_size must be positive");
        ensure!(
            self.sync_interval_minutes > 0,
            "sync_interval_minutes must be positive"
        );
        ensure!(
            self.sync_min_backoff_secs <= self.sync_max_backoff_secs,
            "sync_min_backoff_secs ({}) exceeds sync_max_backoff_secs ({})",
            self.sync_min_backoff_secs,
            self.sync_max_backoff_secs
        );
        Ok(())
    }

    fn create_data_dirs(&self) -> Result<()> {
        for path in [&self.socket_path, &self.db_path, &self.log_file] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        Ok(())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads defaults, then the config file, then `BLASTD_*` environment
    /// overrides.
    ///
    /// An explicit `path` must exist. Without one, the first of
    /// `$XDG_CONFIG_HOME/blastd/config.toml` and `~/.config/blastd/config.toml`
    /// that exists is used, if any.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    pub(crate) fn load_with_env(path: Option<&Path>, environment: Environment) -> Result<Config> {
        let file = match path {
            Some(path) => {
                ensure!(path.exists(), "config file {} not found", path.display());
                Some(path.to_path_buf())
            }
            None => Self::default_config_paths()
                .into_iter()
                .find(|candidate| candidate.exists()),
        };

        let defaults = Config::default();
        let mut builder = RConfig::builder()
            .set_default("server_url", defaults.server_url)?
            .set_default("api_token", defaults.api_token)?
            .set_default("sync_interval_minutes", defaults.sync_interval_minutes)?
            .set_default("sync_batch_size", defaults.sync_batch_size as u64)?
            .set_default("sync_min_backoff_secs", defaults.sync_min_backoff_secs)?
            .set_default("sync_max_backoff_secs", defaults.sync_max_backoff_secs)?
            .set_default("metrics_only", defaults.metrics_only)?
            .set_default("machine", defaults.machine)?
            .set_default("socket_path", path_value(&defaults.socket_path))?
            .set_default("db_path", path_value(&defaults.db_path))?
            .set_default("log_file", path_value(&defaults.log_file))?;

        if let Some(file) = &file {
            builder = builder.add_source(File::from(file.as_path()).format(FileFormat::Toml));
        }

        let config: Config = builder
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
            .context("failed to parse config file")?;

        config.validate()?;
        config.create_data_dirs()?;

        Ok(config)
    }

    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            paths.push(PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join(APP_DIR).join(CONFIG_FILE));
        }
        paths
    }
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
