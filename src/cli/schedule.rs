use passrot::api::TickOutcome;
use passrot::error::Result;
use passrot::trigger::ROTATION_JOB;

use crate::cli::json_output::{ScheduleArmResponse, ScheduleStatusResponse};
use crate::cli::{client, print_json, ScheduleCommands};

pub fn run(cmd: &ScheduleCommands, json: bool) -> Result<()> {
    match cmd {
        ScheduleCommands::Arm => arm(json),
        ScheduleCommands::Status => status(json),
        ScheduleCommands::Tick => tick(json),
    }
}

fn arm(json: bool) -> Result<()> {
    let newly_armed = client()?.arm_schedule()?;

    if json {
        return print_json(&ScheduleArmResponse {
            job: ROTATION_JOB.to_string(),
            newly_armed,
        });
    }
    if newly_armed {
        eprintln!("Rotation job armed.");
    } else {
        eprintln!("Rotation job already armed.");
    }
    Ok(())
}

fn status(json: bool) -> Result<()> {
    let registry = client()?.schedule()?;
    let job = registry.job(ROTATION_JOB);

    let response = ScheduleStatusResponse {
        job: ROTATION_JOB.to_string(),
        armed: job.is_some(),
        cadence: job.map(|j| j.cadence),
        next_run_at: job.map(|j| j.next_run_at.to_rfc3339()),
        last_run_at: job.and_then(|j| j.last_run_at).map(|at| at.to_rfc3339()),
    };

    if json {
        return print_json(&response);
    }
    match job {
        None => println!("{}: not armed", ROTATION_JOB),
        Some(job) => {
            println!("{}: {}", ROTATION_JOB, job.cadence);
            println!("  next run: {}", job.next_run_at.to_rfc3339());
            println!(
                "  last run: {}",
                job.last_run_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "never".into())
            );
        }
    }
    Ok(())
}

fn tick(json: bool) -> Result<()> {
    let outcome = client()?.tick()?;

    if json {
        return print_json(&outcome);
    }
    match outcome {
        TickOutcome::NotArmed => eprintln!("Rotation job is not armed. Run `passrot schedule arm`."),
        TickOutcome::Busy => eprintln!("Another passrot process is rotating. Tick skipped."),
        TickOutcome::Idle { next_run_at } => {
            eprintln!("Nothing due. Next run at {}.", next_run_at.to_rfc3339())
        }
        TickOutcome::Ran {
            next_run_at,
            report,
        } => eprintln!(
            "Rotated {} of {} due items ({} failed). Next run at {}.",
            report.rotated.len(),
            report.selected,
            report.failed.len(),
            next_run_at.to_rfc3339()
        ),
    }
    Ok(())
}
