use anyhow::Result;
use clap::{Parser, Subcommand};
use logmask::{check, synth, LogFormat};
use std::path::PathBuf;

/// Synthesize the CloudWatch Logs data protection demo stack
#[derive(Parser)]
#[command(name = "logmask")]
#[command(version)]
#[command(about = "Synthesize the CloudWatch Logs data protection demo stack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults to LOGMASK_CONFIG, then ./cdk.json)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the stack template to the output directory
    Synth(synth::SynthArgs),
    /// List the values the stack exports
    Exports,
    /// Run synthetic events through the data protection policy locally
    Check(check::CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logmask::init_tracing(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Synth(args) => {
            let config = logmask::load_config(cli.config.as_deref())?;
            synth::run(config, args)
        }
        Commands::Exports => {
            let config = logmask::load_config(cli.config.as_deref())?;
            synth::exports(&config)
        }
        // Needs no credentials, so no config is loaded
        Commands::Check(args) => check::run(args),
    }
}
