// Configuration source loading.
//
// Priority order:
// 1. Environment variables (LOGMASK_* prefix)
// 2. Config file path from LOGMASK_CONFIG
// 3. Default config file (./cdk.json)
//
// A missing or unreadable file is an error; there is no built-in default for
// the user passwords.

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::*;
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load configuration from the default sources.
pub fn load_config() -> Result<AppConfig> {
    let path = env::var(format!("{}CONFIG", ENV_PREFIX))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    load_from_file_path(path)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<AppConfig> {
    load_from_file_path_with_env(path, &StdEnvSource)
}

/// Load a config file, taking overrides from `env` instead of the process environment.
pub fn load_from_file_path_with_env<E: EnvSource>(
    path: impl AsRef<Path>,
    env: &E,
) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = AppConfig::from_json_str(&content, &path.display().to_string())?;
    info!(path = %path.display(), "Loaded configuration file");

    env_overrides::apply_env_overrides(&mut config, env);
    config.validate()?;
    Ok(config)
}

/// Reads overrides from the process environment
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}
