//! Local dry run of the data protection policy
//!
//! Generates emitter output and masks it with the same identifiers the log
//! group is configured with, so the effect can be seen without deploying.

use anyhow::{bail, Context, Result};
use clap::Args;
use logmask_core::{data_protection_policy, MaskingMatcher};
use logmask_emitter::{generate, SyntheticEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

#[derive(Args)]
pub struct CheckArgs {
    /// Seed for reproducible output (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of invocations to simulate
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u32,

    /// Also print the unmasked lines
    #[arg(long)]
    pub unmasked: bool,
}

/// One emitted line as seen by each user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedLine {
    pub original: String,
    pub masked: String,
    pub sensitive: bool,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let policy = data_protection_policy().context("Failed to build data protection policy")?;
    let matcher = MaskingMatcher::from_policy(&policy)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for invocation in 0..args.count {
        let event = generate(&mut rng);
        let lines = check_event(&matcher, &event)?;
        debug!(invocation, user_id = %event.user_id, "Checked synthetic event");

        for line in &lines {
            let marker = if line.sensitive { "masked" } else { "clear " };
            println!("[{}] {}", marker, line.masked);
            if args.unmasked && line.sensitive {
                println!("         {}", line.original);
            }
        }
    }

    Ok(())
}

/// Mask every message of `event`.
///
/// Fails when a message carrying a sensitive value is left unflagged.
pub fn check_event(matcher: &MaskingMatcher, event: &SyntheticEvent) -> Result<Vec<CheckedLine>> {
    let mut lines = Vec::with_capacity(event.messages.len());

    for (index, message) in event.messages.iter().enumerate() {
        let sensitive = matcher.is_sensitive(message);
        // The first message carries only the user id, which is not masked
        if index > 0 && !sensitive {
            bail!("message {} was not flagged by any data identifier: {}", index, message);
        }
        lines.push(CheckedLine {
            original: message.clone(),
            masked: matcher.mask(message),
            sensitive,
        });
    }

    Ok(lines)
}
