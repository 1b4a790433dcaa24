use crate::{AppConfig, SecretConfig};

pub const ENV_PREFIX: &str = "LOGMASK_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    /// Get an environment variable WITH the LOGMASK_ prefix applied
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the config.
///
/// Empty values are ignored so an exported-but-blank variable cannot clear a
/// value set in the file.
pub fn apply_env_overrides<E: EnvSource>(config: &mut AppConfig, env: &E) {
    let props = &mut config.properties;

    if let Some(name) = get_env_string(env, "STACK_NAME") {
        props.stack_name = Some(name);
    }

    if let Some(password) = get_env_string(env, "PRIVILEGED_USER_PASSWORD") {
        props.privileged_user_password = Some(password);
    }
    if let Some(password) = get_env_string(env, "STANDARD_USER_PASSWORD") {
        props.standard_user_password = Some(password);
    }

    if let Some(secret_id) = get_env_string(env, "PRIVILEGED_USER_SECRET_ID") {
        props.privileged_user_secret = Some(SecretConfig {
            secret_id,
            json_key: get_env_string(env, "PRIVILEGED_USER_SECRET_KEY"),
        });
    }
    if let Some(secret_id) = get_env_string(env, "STANDARD_USER_SECRET_ID") {
        props.standard_user_secret = Some(SecretConfig {
            secret_id,
            json_key: get_env_string(env, "STANDARD_USER_SECRET_KEY"),
        });
    }

    if let Some(uri) = get_env_string(env, "EMITTER_CODE_URI") {
        props.emitter_code_uri = Some(uri);
    }
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key).filter(|value| !value.trim().is_empty())
}
