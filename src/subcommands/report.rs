
use anyhow::{bail, Result};
use log::{error, info, warn};
use nu_ansi_term::Color::{Green, Red, Yellow};

use unsetup::batch::BatchOutcome;

/// Prints the outcome of a batch, fails when any item failed.
pub fn report(operation: &str, outcome: &BatchOutcome) -> Result<()> {
    if outcome.success() {
        info!("{}", Green.bold().paint(format!("{operation} done: {outcome}")));
        Ok(())
    } else if outcome.processed > 0 {
        warn!("{}", Yellow.bold().paint(format!("{operation} partially done: {outcome}")));
        bail!("{operation}: {} item(s) failed", outcome.failed_items.len())
    } else {
        error!("{}", Red.bold().paint(format!("{operation} failed: {outcome}")));
        bail!("{operation} failed")
    }
}

pub fn report_success(message: &str) {
    info!("{}", Green.bold().paint(message));
}
