//! Recurring job registry.
//!
//! Jobs are armed once and then fire from `tick`, which runs whatever is due
//! and pushes each job's next run past "now" by whole cadence periods.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::Duration;

use crate::error::{PassrotError, Result};
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Hourly,
    TwiceDaily,
    Daily,
}

impl Cadence {
    pub fn period(self) -> Duration {
        match self {
            Cadence::Hourly => Duration::hours(1),
            Cadence::TwiceDaily => Duration::hours(12),
            Cadence::Daily => Duration::days(1),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cadence::Hourly => "hourly",
            Cadence::TwiceDaily => "twicedaily",
            Cadence::Daily => "daily",
        })
    }
}

impl FromStr for Cadence {
    type Err = PassrotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hourly" => Ok(Cadence::Hourly),
            "twicedaily" => Ok(Cadence::TwiceDaily),
            "daily" => Ok(Cadence::Daily),
            other => Err(PassrotError::Schedule(format!(
                "Unknown cadence '{}' (expected hourly, twicedaily or daily)",
                other
            ))),
        }
    }
}

/// The host scheduler as seen by the trigger surface.
pub trait Scheduler {
    fn is_armed(&self, job: &str) -> bool;

    /// Register `job` with its first run at `now`.
    fn arm(&mut self, job: &str, cadence: Cadence, now: DateTime<Utc>) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub cadence: Cadence,
    pub armed_at: DateTime<Utc>,
    pub next_run_at: DateTime<Utc>,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
}

/// On-disk registry of armed jobs (~/.passrot/schedule.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleRegistry {
    #[serde(default)]
    pub jobs: BTreeMap<String, ScheduledJob>,
}

impl ScheduleRegistry {
    /// Load the registry. A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| PassrotError::Schedule(format!("Invalid schedule file: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PassrotError::Serialization(e.to_string()))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn job(&self, name: &str) -> Option<&ScheduledJob> {
        self.jobs.get(name)
    }

    /// Arm `name` with its first run at `now`. A job that is already armed is left as is.
    /// Returns whether anything changed.
    pub fn arm_at(&mut self, name: &str, cadence: Cadence, now: DateTime<Utc>) -> bool {
        if self.jobs.contains_key(name) {
            return false;
        }
        self.jobs.insert(
            name.to_string(),
            ScheduledJob {
                cadence,
                armed_at: now,
                next_run_at: now,
                last_run_at: None,
            },
        );
        true
    }

    pub fn is_due(&self, name: &str, now: DateTime<Utc>) -> bool {
        self.jobs
            .get(name)
            .map(|job| job.next_run_at <= now)
            .unwrap_or(false)
    }

    /// Record a run of `name` and move its next run to the first slot after `now`.
    pub fn complete(&mut self, name: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let job = self
            .jobs
            .get_mut(name)
            .ok_or_else(|| PassrotError::Schedule(format!("Job '{}' is not armed", name)))?;

        let period = job.cadence.period();
        let mut next = job.next_run_at;
        if next <= now {
            let behind = (now - next).num_seconds() / period.num_seconds() + 1;
            next += period * behind as i32;
        }
        job.next_run_at = next;
        job.last_run_at = Some(now);
        Ok(next)
    }

    /// Earliest upcoming run across all jobs.
    pub fn next_wake(&self) -> Option<DateTime<Utc>> {
        self.jobs.values().map(|job| job.next_run_at).min()
    }
}

impl Scheduler for ScheduleRegistry {
    fn is_armed(&self, job: &str) -> bool {
        self.jobs.contains_key(job)
    }

    fn arm(&mut self, job: &str, cadence: Cadence, now: DateTime<Utc>) -> Result<()> {
        self.arm_at(job, cadence, now);
        Ok(())
    }
}
