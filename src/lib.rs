// logmask - synthesize the CloudWatch Logs data protection demo stack
//
// Thin CLI layer: configuration comes from logmask-config, the resource
// graph and its template from logmask-core. Only this crate touches the
// terminal and the output directory.

use anyhow::{Context, Result};
use logmask_config::AppConfig;
use std::path::Path;

mod init;

pub mod check;
pub mod synth;

pub use init::{init_tracing, LogFormat};

/// Load configuration from an explicit path or the default sources
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => AppConfig::load().context("Failed to load configuration"),
    }
}
