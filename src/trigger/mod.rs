//! The two ways a rotation batch starts.

use serde::Serialize;

use crate::clock::Clock;
use crate::error::Result;
use crate::rotation::{RotationEngine, RotationReport, RotationSettings};
use crate::schedule::{Cadence, Scheduler};
use crate::selector::TriggerMode;
use crate::store::ContentStore;

/// Name of the recurring rotation job in the scheduler.
pub const ROTATION_JOB: &str = "passrot_rotate_passwords";

/// Cadence the rotation job is armed with.
pub const ROTATION_CADENCE: Cadence = Cadence::Hourly;

/// The one message a manual run reports back.
pub const MANUAL_SUCCESS_MESSAGE: &str = "Passwords have been reset";

/// Arm the recurring rotation job unless it already is, first run at `clock.now()`.
/// Returns whether it was newly armed.
pub fn arm_rotation_job<T, C>(scheduler: &mut T, clock: &C) -> Result<bool>
where
    T: Scheduler + ?Sized,
    C: Clock + ?Sized,
{
    if scheduler.is_armed(ROTATION_JOB) {
        return Ok(false);
    }
    scheduler.arm(ROTATION_JOB, ROTATION_CADENCE, clock.now())?;
    tracing::info!(job = ROTATION_JOB, cadence = %ROTATION_CADENCE, "rotation job armed");
    Ok(true)
}

/// Scheduled entry point: due items only.
pub fn run_scheduled<S, C>(
    store: &mut S,
    clock: &C,
    settings: &RotationSettings,
) -> Result<RotationReport>
where
    S: ContentStore + ?Sized,
    C: Clock + ?Sized,
{
    RotationEngine::new(store, clock, settings).rotate_due(TriggerMode::Unattended)
}

/// What the operator gets back from a manual run.
#[derive(Debug, Serialize)]
pub struct ManualOutcome {
    pub message: &'static str,
    #[serde(flatten)]
    pub report: RotationReport,
}

/// Operator entry point: every protected item, regardless of due time.
///
/// Authorization happens before this is called.
pub fn run_manual<S, C>(
    store: &mut S,
    clock: &C,
    settings: &RotationSettings,
) -> Result<ManualOutcome>
where
    S: ContentStore + ?Sized,
    C: Clock + ?Sized,
{
    let report = RotationEngine::new(store, clock, settings).rotate_due(TriggerMode::Manual)?;
    Ok(ManualOutcome {
        message: MANUAL_SUCCESS_MESSAGE,
        report,
    })
}
