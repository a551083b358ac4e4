use anyhow::{bail, Result};
use std::sync::Arc;

use crate::aggregator::{Aggregator, SubmissionResult};
use crate::cli::context::CommandContext;
use crate::cli::SyncArgs;
use crate::metric::MetricKind;
use crate::provider::SampleExport;
use crate::reader::ReaderSet;

pub async fn execute_sync(ctx: &CommandContext, args: SyncArgs) -> Result<()> {
    let Some(samples_path) = args.samples.or_else(|| ctx.config.samples_path.clone()) else {
        bail!("No samples export given. Pass --samples <file> or set samples_path in the config.");
    };

    let export = SampleExport::load(&samples_path)?;
    let readers = ReaderSet::from_provider(Arc::new(export));
    let aggregator = Aggregator::new(ctx.gate.clone(), readers, ctx.client.clone());

    match aggregator.run().await {
        SubmissionResult::Success { status, snapshot } => {
            println!("==> Snapshot for player {}", snapshot.player_id());
            for (kind, value) in snapshot.iter() {
                let marker = if value.is_observed() { "" } else { " (no data)" };
                println!(
                    "    {}: {}{}",
                    kind.label(),
                    format_value(kind, value.value()),
                    marker
                );
            }
            println!("Snapshot submitted (HTTP {})", status);
            Ok(())
        }
        SubmissionResult::AuthRequired => {
            bail!("Not logged in. Run 'vitals2coach login <email>' first.")
        }
        SubmissionResult::SubmitFailed(reason) => {
            bail!("Snapshot submission failed: {}", reason)
        }
    }
}

/// Values as they go on the wire: whole numbers for integer fields
fn format_value(kind: MetricKind, value: f64) -> String {
    match kind {
        MetricKind::StepCount
        | MetricKind::HeartRate
        | MetricKind::BloodOxygen
        | MetricKind::ElevationGain => format!("{}", value as i64),
        MetricKind::Hrv => format!("{:.0}", value),
        MetricKind::Vo2Max | MetricKind::StepLength => format!("{:.2}", value),
    }
}
