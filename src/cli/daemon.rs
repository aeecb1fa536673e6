use std::thread;
use std::time::Duration;

use chrono::Utc;

use passrot::api::{PassrotClient, TickOutcome};
use passrot::error::{PassrotError, Result};

use crate::cli::client;

const MIN_SLEEP: Duration = Duration::from_secs(1);

/// Foreground scheduler loop: tick, then sleep until the job is next due
/// (capped at `poll` so schedule edits from other processes are noticed).
pub fn run(poll: Duration) -> Result<()> {
    let client = client()?;
    if client.arm_schedule()? {
        eprintln!("Rotation job armed.");
    }
    eprintln!(
        "passrot daemon running (poll {}). Ctrl-C to stop.",
        humantime::format_duration(poll)
    );

    loop {
        match client.tick() {
            Ok(TickOutcome::Ran {
                next_run_at,
                report,
            }) => tracing::info!(
                selected = report.selected,
                rotated = report.rotated.len(),
                failed = report.failed.len(),
                next_run_at = %next_run_at,
                "rotation job ran"
            ),
            Ok(TickOutcome::Idle { next_run_at }) => {
                tracing::debug!(next_run_at = %next_run_at, "rotation job idle")
            }
            Ok(TickOutcome::Busy) => {
                tracing::debug!("another process is rotating; waiting for next poll")
            }
            Ok(TickOutcome::NotArmed) => {
                tracing::warn!("rotation job was disarmed; re-arming");
                client.arm_schedule()?;
            }
            Err(e) if is_fatal(&e) => return Err(e),
            Err(e) => tracing::warn!(error = %e, "tick failed; retrying next poll"),
        }

        thread::sleep(sleep_for(&client, poll));
    }
}

/// Errors that will not clear up on their own between polls.
fn is_fatal(e: &PassrotError) -> bool {
    matches!(
        e,
        PassrotError::NotInitialized
            | PassrotError::AuthFailed(_)
            | PassrotError::Decryption(_)
            | PassrotError::InvalidKeyfile(_)
            | PassrotError::InvalidConfig(_)
    )
}

fn sleep_for(client: &PassrotClient, poll: Duration) -> Duration {
    let until_due = client
        .schedule()
        .ok()
        .and_then(|registry| registry.next_wake())
        .and_then(|at| (at - Utc::now()).to_std().ok());

    match until_due {
        Some(wait) => wait.clamp(MIN_SLEEP, poll.max(MIN_SLEEP)),
        None => poll.max(MIN_SLEEP),
    }
}
