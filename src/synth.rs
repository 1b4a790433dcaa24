//! Template synthesis and export listing

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{Confirm, Password};
use logmask_config::AppConfig;
use logmask_core::template::{CODE_BUCKET_PARAMETER, CODE_KEY_PARAMETER};
use logmask_core::{build, render, Graph, Template};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args)]
pub struct SynthArgs {
    /// Directory the template is written to
    #[arg(short, long, value_name = "DIR", default_value = "cdk.out")]
    pub output: PathBuf,

    /// Print the template to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Prompt for user passwords missing from the configuration
    #[arg(long)]
    pub prompt: bool,

    /// Overwrite existing file without asking
    #[arg(long)]
    pub force: bool,
}

pub fn run(mut config: AppConfig, args: SynthArgs) -> Result<()> {
    if args.prompt {
        prompt_missing_passwords(&mut config)?;
    }

    let (graph, template) = synthesize(&config)?;
    let content = template
        .to_string_pretty()
        .context("Failed to serialize template")?;

    if args.stdout {
        println!("{}", content);
        return Ok(());
    }

    let stack_name = config.stack_name();
    let output_path = args.output.join(format!("{}.template.json", stack_name));

    // Check if file exists
    if output_path.exists() && !args.force {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "{} already exists. Overwrite?",
                output_path.display()
            ))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    write_template(&output_path, &content)?;

    println!();
    println!("Created {}", output_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Deploy:");
    println!("     aws cloudformation deploy \\");
    println!("       --template-file {} \\", output_path.display());
    println!("       --stack-name {} \\", stack_name);
    if template.as_value().get("Parameters").is_some() {
        println!("       --capabilities CAPABILITY_NAMED_IAM \\");
        println!(
            "       --parameter-overrides {}=<bucket> {}=<key>",
            CODE_BUCKET_PARAMETER, CODE_KEY_PARAMETER
        );
    } else {
        println!("       --capabilities CAPABILITY_NAMED_IAM");
    }
    println!();
    println!(
        "The stack creates {} users; sign in as each to compare masked and unmasked log views.",
        graph.users().len()
    );
    println!();

    Ok(())
}

/// Print every export as `name<TAB>value`
pub fn exports(config: &AppConfig) -> Result<()> {
    let (graph, template) = synthesize(config)?;

    for export in &graph.exports {
        let value = template
            .output(&export.name)
            .map(|output| display_value(&output["Value"]))
            .unwrap_or_default();
        println!("{}\t{}", export.name, value);
    }
    Ok(())
}

/// Build and render the stack for `config`
pub fn synthesize(config: &AppConfig) -> Result<(Graph, Template)> {
    let stack_config = config.stack_config()?;
    let graph = build(&stack_config).context("Failed to build resource graph")?;
    let template = render(&graph).context("Failed to render template")?;

    let counts = graph.counts();
    info!(
        stack = config.stack_name(),
        policies = counts.policies,
        users = counts.users,
        exports = graph.exports.len(),
        "Synthesized stack"
    );
    Ok((graph, template))
}

fn write_template(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn prompt_missing_passwords(config: &mut AppConfig) -> Result<()> {
    let props = &mut config.properties;

    if props.privileged_user_secret.is_none() && props.privileged_user_password.is_none() {
        let password = Password::new()
            .with_prompt("Password for the privileged user")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?;
        props.privileged_user_password = Some(password);
    }

    if props.standard_user_secret.is_none() && props.standard_user_password.is_none() {
        let password = Password::new()
            .with_prompt("Password for the standard user")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?;
        props.standard_user_password = Some(password);
    }

    Ok(())
}

/// Literal values print bare, intrinsic functions as compact JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(literal) => literal.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn demo_config() -> AppConfig {
        AppConfig::from_json_str(
            r#"{"context": {"app_properties": {
                "privileged_user_password": "p@ss1",
                "standard_user_password": "p@ss2"
            }}}"#,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_synthesize_demo_config() {
        let (graph, template) = synthesize(&demo_config()).unwrap();
        assert_eq!(graph.exports.len(), 6);
        assert_eq!(template.resource_count("AWS::IAM::User"), 2);
    }

    #[test]
    fn test_synthesize_without_passwords_fails() {
        let config = AppConfig::from_json_str(r#"{"context": {}}"#, "test").unwrap();
        let err = synthesize(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("secret is required"));
    }

    #[test]
    fn test_write_template_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("Stack.template.json");
        write_template(&path, "{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("DemoLogAdmin")), "DemoLogAdmin");
        assert_eq!(
            display_value(&json!({ "Ref": "LoggerLambda" })),
            r#"{"Ref":"LoggerLambda"}"#
        );
    }
}
