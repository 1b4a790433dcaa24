// logmask-config - Stack configuration loading
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority, LOGMASK_* prefix)
// 2. Config file path passed explicitly or via LOGMASK_CONFIG
// 3. Default config file (./cdk.json)
//
// The file is a cdk.json style document; only its `context.app_properties`
// object is read.

use logmask_core::{CodeLocation, Credential, StackConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use sources::StdEnvSource;

pub const DEFAULT_CONFIG_FILE: &str = "cdk.json";
pub const DEFAULT_STACK_NAME: &str = "CloudwatchPolicesStack";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read; propagated unchanged from the OS
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config from {origin} has no 'context' object")]
    MissingContext { origin: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level config document. Other cdk.json keys (`app`, `watch`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    context: Option<Context>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub app_properties: AppProperties,
}

/// Values under `context.app_properties`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged_user_password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_user_password: Option<String>,

    /// Takes precedence over `privileged_user_password`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged_user_secret: Option<SecretConfig>,

    /// Takes precedence over `standard_user_password`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_user_secret: Option<SecretConfig>,

    /// `s3://bucket/key` of the emitter deployment package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emitter_code_uri: Option<String>,
}

/// Secrets Manager reference resolved at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    pub secret_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_key: Option<String>,
}

/// Resolved application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub properties: AppProperties,
}

impl AppConfig {
    /// Load from LOGMASK_CONFIG or ./cdk.json, then apply environment overrides
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load from an explicit file path (CLI --config flag)
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Like [`AppConfig::load_from_path`], with overrides read from `env`
    pub fn load_from_path_with_env<E: EnvSource>(path: impl AsRef<Path>, env: &E) -> Result<Self> {
        sources::load_from_file_path_with_env(path, env)
    }

    /// Parse a config document. `origin` names the source in error messages.
    pub fn from_json_str(content: &str, origin: &str) -> Result<Self> {
        let document: ConfigDocument =
            serde_json::from_str(content).map_err(|source| ConfigError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        let context = document.context.ok_or_else(|| ConfigError::MissingContext {
            origin: origin.to_string(),
        })?;
        Ok(Self {
            properties: context.app_properties,
        })
    }

    pub fn stack_name(&self) -> &str {
        self.properties
            .stack_name
            .as_deref()
            .unwrap_or(DEFAULT_STACK_NAME)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Builder input for this configuration.
    ///
    /// Missing passwords are passed through as `None`; the builder rejects them.
    pub fn stack_config(&self) -> Result<StackConfig> {
        let props = &self.properties;

        let emitter_code = match props.emitter_code_uri.as_deref() {
            Some(uri) => {
                let (bucket, key) = validation::parse_s3_uri(uri)?;
                Some(CodeLocation::S3 { bucket, key })
            }
            None => None,
        };

        Ok(StackConfig {
            privileged_user_secret: credential(
                "privileged",
                &props.privileged_user_secret,
                &props.privileged_user_password,
            ),
            standard_user_secret: credential(
                "standard",
                &props.standard_user_secret,
                &props.standard_user_password,
            ),
            emitter_code,
        })
    }
}

fn credential(
    who: &str,
    secret: &Option<SecretConfig>,
    password: &Option<String>,
) -> Option<Credential> {
    if let Some(secret) = secret {
        return Some(Credential::SecretRef {
            secret_id: secret.secret_id.clone(),
            json_key: secret.json_key.clone(),
        });
    }
    password.as_ref().map(|password| {
        warn!(
            user = who,
            "Using a plaintext password; it will be embedded in the rendered template"
        );
        Credential::PlainText(password.clone())
    })
}
