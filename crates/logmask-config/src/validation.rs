// Configuration validation
//
// Checks value shapes only. Whether both user secrets are present is decided
// by the graph builder, which fails before constructing anything.

use crate::*;

pub fn validate_config(config: &AppConfig) -> Result<()> {
    validate_stack_name(config.stack_name())?;

    let props = &config.properties;
    if let Some(uri) = props.emitter_code_uri.as_deref() {
        parse_s3_uri(uri)?;
    }

    for (field, secret) in [
        ("privileged_user_secret", &props.privileged_user_secret),
        ("standard_user_secret", &props.standard_user_secret),
    ] {
        if let Some(secret) = secret {
            validate_secret(field, secret)?;
        }
    }

    Ok(())
}

/// CloudFormation stack names: a letter, then letters, digits and hyphens.
fn validate_stack_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 128 {
        return Err(ConfigError::Invalid(
            "stack_name must be 1-128 characters".to_string(),
        ));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(ConfigError::Invalid(format!(
            "stack_name '{}' must start with a letter",
            name
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ConfigError::Invalid(format!(
            "stack_name '{}' must contain only letters, numbers, and hyphens",
            name
        )));
    }
    Ok(())
}

fn validate_secret(field: &str, secret: &SecretConfig) -> Result<()> {
    if secret.secret_id.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "{}.secret_id must not be empty",
            field
        )));
    }
    if matches!(secret.json_key.as_deref(), Some(key) if key.trim().is_empty()) {
        return Err(ConfigError::Invalid(format!(
            "{}.json_key must not be empty when set",
            field
        )));
    }
    Ok(())
}

/// Split `s3://bucket/key` into bucket and key
pub(crate) fn parse_s3_uri(uri: &str) -> Result<(String, String)> {
    let path = uri.strip_prefix("s3://").ok_or_else(|| {
        ConfigError::Invalid(format!("emitter_code_uri '{}' must start with 's3://'", uri))
    })?;
    match path.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
            Ok((bucket.to_string(), key.to_string()))
        }
        _ => Err(ConfigError::Invalid(format!(
            "emitter_code_uri '{}' must include both bucket and key (e.g., s3://bucket/key.zip)",
            uri
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_stack_name() {
        assert!(validate_stack_name("CloudwatchPolicesStack").is_ok());
        assert!(validate_stack_name("masking-demo-2").is_ok());
        assert!(validate_stack_name("").is_err());
        assert!(validate_stack_name("2fast").is_err());
        assert!(validate_stack_name("under_score").is_err());
    }

    #[test]
    fn test_parse_s3_uri() {
        assert_eq!(
            parse_s3_uri("s3://bucket/path/to/bootstrap.zip").unwrap(),
            ("bucket".to_string(), "path/to/bootstrap.zip".to_string())
        );
        assert!(parse_s3_uri("https://bucket/key").is_err());
        assert!(parse_s3_uri("s3://bucket").is_err());
        assert!(parse_s3_uri("s3://bucket/").is_err());
    }

    #[test]
    fn test_validate_secret() {
        let config = AppConfig {
            properties: AppProperties {
                privileged_user_secret: Some(SecretConfig {
                    secret_id: " ".to_string(),
                    json_key: None,
                }),
                ..AppProperties::default()
            },
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }
}
