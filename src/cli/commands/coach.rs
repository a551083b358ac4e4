use anyhow::{bail, Context, Result};

use crate::api::CoachBackend;
use crate::cli::context::CommandContext;
use crate::cli::CoachArgs;

pub async fn execute_coach(ctx: &CommandContext, args: CoachArgs) -> Result<()> {
    let message = args.message.trim();
    if message.is_empty() {
        bail!("Message is empty");
    }

    let reply = ctx
        .client
        .ask(message)
        .await
        .context("Failed to reach the coach")?;

    if reply.is_error.unwrap_or(false) {
        let reason = reply
            .error_message
            .unwrap_or_else(|| "Unknown error".to_string());
        bail!("Coach returned an error: {}", reason);
    }

    match reply.player_name {
        Some(name) => println!("[{}] {}", name, reply.response),
        None => println!("{}", reply.response),
    }
    if let Some(report) = reply.player_report {
        println!();
        println!("{}", report);
    }
    Ok(())
}
