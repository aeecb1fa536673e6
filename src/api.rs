//! High-level programmatic API.
//!
//! [`PassrotClient`] wraps the encrypted catalog on disk: each call takes the
//! rotation lock when it mutates, loads the catalog, runs the core operation,
//! saves, then writes audit entries and dispatches rotation notices.

use serde::Serialize;

use crate::audit::{self, AuditLog};
use crate::auth;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{PassrotError, Result};
use crate::interval::update::{self, ConfigSave, UpdateOutcome};
use crate::interval::{IntervalStore, META_NEXT_DUE_AT};
use crate::notify;
use crate::rotation::{FailureStage, RotationReport, RotationSettings};
use crate::schedule::ScheduleRegistry;
use crate::selector::TriggerMode;
use crate::store::lock::JobLock;
use crate::store::{self, Catalog, CatalogKey, ContentStore, ItemId};
use crate::trigger::{self, ManualOutcome, ROTATION_JOB};
use crate::types::*;

/// Actor recorded for unattended runs.
const SCHEDULER_ACTOR: &str = "scheduler";

/// Listing row for an item. Never carries the secret.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub title: String,
    pub protected: bool,
    pub interval_days: Option<i64>,
    /// Stored site-local due date, verbatim.
    pub next_due_at: Option<String>,
    pub modified: DateTime<Utc>,
}

/// What `tick` did.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickOutcome {
    /// The rotation job has never been armed.
    NotArmed,
    /// Another process holds the rotation lock; this tick was skipped.
    Busy,
    /// Armed but not due yet.
    Idle { next_run_at: DateTime<Utc> },
    /// Ran the unattended batch.
    Ran {
        next_run_at: DateTime<Utc>,
        report: RotationReport,
    },
}

/// Per-call environment read from disk.
struct Env {
    config: Config,
    clock: SystemClock,
    audit: AuditLog,
}

/// High-level client for programmatic catalog access.
pub struct PassrotClient {
    key: CatalogKey,
    actor: String,
}

impl PassrotClient {
    pub fn new(key: CatalogKey, actor: impl Into<String>) -> Self {
        Self {
            key,
            actor: actor.into(),
        }
    }

    /// Authenticate with a passphrase.
    pub fn with_passphrase(passphrase: &str) -> Result<Self> {
        Ok(Self::new(
            CatalogKey::Passphrase(passphrase.to_string()),
            "api(passphrase)",
        ))
    }

    /// Authenticate with an age keyfile on disk.
    pub fn with_keyfile(keyfile_path: &str) -> Result<Self> {
        let (identity, pubkey) = auth::read_keyfile(keyfile_path)?;
        Ok(Self::new(
            CatalogKey::Keyfile { identity, pubkey },
            "api(keyfile)",
        ))
    }

    /// Authenticate from `PASSROT_KEYFILE` or `PASSROT_PASSPHRASE`. Never prompts.
    pub fn from_env() -> Result<Self> {
        if let Ok(keyfile_path) = std::env::var(auth::PASSROT_KEYFILE_ENV) {
            return Self::with_keyfile(&keyfile_path);
        }
        if let Ok(passphrase) = std::env::var(auth::PASSROT_PASSPHRASE_ENV) {
            return Self::with_passphrase(&passphrase);
        }
        Err(PassrotError::AuthFailed(
            "No credentials found. Set PASSROT_KEYFILE or PASSROT_PASSPHRASE.".into(),
        ))
    }

    /// Override the actor label used in audit entries.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn is_initialized() -> bool {
        store::is_initialized()
    }

    /// Create an empty catalog, write default config if none exists, arm the rotation job.
    pub fn init(&self) -> Result<()> {
        if store::is_initialized() {
            return Err(PassrotError::AlreadyInitialized(
                store::catalog_path()?.display().to_string(),
            ));
        }
        store::save_catalog(&Catalog::new(), &self.key)?;

        let config_path = store::config_path()?;
        if !config_path.exists() {
            Config::default().save(&config_path)?;
        }

        let env = self.env()?;
        env.audit.record_quietly("init", None, &self.actor, "success", None);
        self.arm_schedule_with(&env)?;
        Ok(())
    }

    /// Add an item and apply its initial interval (if any) like a configuration save.
    pub fn add_item(&self, title: &str, secret: &str, interval: Option<&str>) -> Result<ItemId> {
        let env = self.env()?;
        let _lock = self.lock()?;
        let mut catalog = store::load_catalog(&self.key)?;

        let id = catalog.add_item(title, secret);
        let outcome = update::handle_save(
            &mut catalog,
            &env.clock,
            &ConfigSave::new(id, interval.map(String::from)),
        )?;
        store::save_catalog(&catalog, &self.key)?;

        env.audit
            .record_quietly("item.add", Some(id), &self.actor, "success", None);
        self.audit_update(&env, id, &outcome);
        Ok(id)
    }

    /// Save an item's configuration.
    ///
    /// A new secret (when given) is stored first, then the interval field goes
    /// through the update handler. `interval: None` means the field was not submitted.
    pub fn save_item(
        &self,
        id: ItemId,
        interval: Option<&str>,
        secret: Option<&str>,
    ) -> Result<UpdateOutcome> {
        let env = self.env()?;
        let _lock = self.lock()?;
        let mut catalog = store::load_catalog(&self.key)?;
        catalog.item(id)?;

        if let Some(secret) = secret {
            catalog.update_secret(id, secret)?;
        }
        let outcome = update::handle_save(
            &mut catalog,
            &env.clock,
            &ConfigSave::new(id, interval.map(String::from)),
        )?;
        store::save_catalog(&catalog, &self.key)?;

        if secret.is_some() {
            env.audit
                .record_quietly("item.secret", Some(id), &self.actor, "success", None);
        }
        self.audit_update(&env, id, &outcome);
        Ok(outcome)
    }

    pub fn remove_item(&self, id: ItemId) -> Result<()> {
        let env = self.env()?;
        let _lock = self.lock()?;
        let mut catalog = store::load_catalog(&self.key)?;
        catalog.remove_item(id)?;
        store::save_catalog(&catalog, &self.key)?;

        env.audit
            .record_quietly("item.remove", Some(id), &self.actor, "success", None);
        Ok(())
    }

    pub fn items(&self) -> Result<Vec<ItemSummary>> {
        let env = self.env()?;
        let mut catalog = store::load_catalog(&self.key)?;
        let ids: Vec<ItemId> = catalog.items.keys().copied().collect();
        ids.into_iter()
            .map(|id| summarize(&mut catalog, &env.clock, id))
            .collect()
    }

    pub fn item(&self, id: ItemId) -> Result<ItemSummary> {
        let env = self.env()?;
        let mut catalog = store::load_catalog(&self.key)?;
        summarize(&mut catalog, &env.clock, id)
    }

    /// Current password of an item.
    pub fn secret(&self, id: ItemId) -> Result<String> {
        let catalog = store::load_catalog(&self.key)?;
        Ok(catalog.item(id)?.secret.clone())
    }

    /// Manual trigger: rotate every protected item now.
    pub fn rotate_all(&self) -> Result<ManualOutcome> {
        let env = self.env()?;
        let _lock = self.lock()?;
        let settings = RotationSettings::from_config(&env.config);

        let mut catalog = store::load_catalog(&self.key)?;
        let outcome = trigger::run_manual(&mut catalog, &env.clock, &settings)
            .map_err(|e| audit_batch_failure(&env, TriggerMode::Manual, &self.actor, e))?;
        let report = self.commit(&env, &catalog, outcome.report, &self.actor)?;

        Ok(ManualOutcome {
            message: outcome.message,
            report,
        })
    }

    /// Scheduled trigger: rotate due items now, whether or not the job is due.
    pub fn run_scheduled(&self) -> Result<RotationReport> {
        let env = self.env()?;
        let _lock = self.lock()?;
        self.run_scheduled_locked(&env)
    }

    /// Run the rotation job if it is armed and its next run time has passed.
    ///
    /// Never waits on the rotation lock: a tick that finds it held returns
    /// [`TickOutcome::Busy`] and leaves the job to the holder or the next tick.
    pub fn tick(&self) -> Result<TickOutcome> {
        let env = self.env()?;
        let Some(_lock) = self.try_lock()? else {
            tracing::debug!("rotation lock held elsewhere, skipping tick");
            return Ok(TickOutcome::Busy);
        };
        let path = store::schedule_path()?;
        let now = env.clock.now();

        let registry = ScheduleRegistry::load(&path)?;
        let Some(job) = registry.job(ROTATION_JOB) else {
            return Ok(TickOutcome::NotArmed);
        };
        if !registry.is_due(ROTATION_JOB, now) {
            return Ok(TickOutcome::Idle {
                next_run_at: job.next_run_at,
            });
        }

        let report = self.run_scheduled_locked(&env)?;

        let mut registry = registry;
        let next_run_at = registry.complete(ROTATION_JOB, now)?;
        registry.save(&path)?;
        Ok(TickOutcome::Ran {
            next_run_at,
            report,
        })
    }

    /// Arm the hourly rotation job. Returns false when it was already armed.
    pub fn arm_schedule(&self) -> Result<bool> {
        let env = self.env()?;
        self.arm_schedule_with(&env)
    }

    pub fn schedule(&self) -> Result<ScheduleRegistry> {
        ScheduleRegistry::load(&store::schedule_path()?)
    }

    /// Read all audit entries from the log.
    pub fn audit_entries(&self) -> Result<Vec<audit::AuditEntry>> {
        audit::read_entries(&store::audit_path()?)
    }

    /// Verify the integrity of the audit chain. Returns `(entry_count, valid)`.
    pub fn verify_audit_chain(&self) -> Result<(usize, bool)> {
        AuditLog::for_key(store::audit_path()?, &self.key).verify()
    }

    // ── internal helpers ─────────────────────────────────────────

    fn env(&self) -> Result<Env> {
        let config = Config::load(&store::config_path()?)?;
        let clock = SystemClock::new(config.site.offset()?);
        let audit =
            AuditLog::for_key(store::audit_path()?, &self.key).enabled(config.audit.enabled);
        Ok(Env {
            config,
            clock,
            audit,
        })
    }

    fn lock(&self) -> Result<JobLock> {
        if !store::is_initialized() {
            return Err(PassrotError::NotInitialized);
        }
        JobLock::acquire(&store::lock_path()?)
    }

    fn try_lock(&self) -> Result<Option<JobLock>> {
        if !store::is_initialized() {
            return Err(PassrotError::NotInitialized);
        }
        JobLock::try_acquire(&store::lock_path()?)
    }

    fn arm_schedule_with(&self, env: &Env) -> Result<bool> {
        let path = store::schedule_path()?;
        let mut registry = ScheduleRegistry::load(&path)?;
        let armed = trigger::arm_rotation_job(&mut registry, &env.clock)?;
        if armed {
            registry.save(&path)?;
            env.audit.record_quietly(
                "schedule.arm",
                None,
                &self.actor,
                "success",
                Some(&format!("job={}", ROTATION_JOB)),
            );
        }
        Ok(armed)
    }

    /// Caller holds the rotation lock.
    fn run_scheduled_locked(&self, env: &Env) -> Result<RotationReport> {
        let settings = RotationSettings::from_config(&env.config);
        let mut catalog = store::load_catalog(&self.key)?;
        let report = trigger::run_scheduled(&mut catalog, &env.clock, &settings)
            .map_err(|e| audit_batch_failure(env, TriggerMode::Unattended, SCHEDULER_ACTOR, e))?;
        self.commit(env, &catalog, report, SCHEDULER_ACTOR)
    }

    /// Persist a finished batch, then audit it and send its notices.
    /// Notices only go out once the new secrets are on disk.
    fn commit(
        &self,
        env: &Env,
        catalog: &Catalog,
        mut report: RotationReport,
        actor: &str,
    ) -> Result<RotationReport> {
        if report.changed() {
            store::save_catalog(catalog, &self.key)?;
        }

        for item in &report.rotated {
            let detail = item
                .next_due_at
                .map(|due| format!("next_due_at={}", env.clock.format(due)));
            env.audit.record_quietly(
                "rotate",
                Some(item.id),
                actor,
                "success",
                detail.as_deref(),
            );
        }
        for item in &report.failed {
            let outcome = match item.stage {
                FailureStage::Secret => "failed",
                FailureStage::Metadata => "partial",
            };
            env.audit
                .record_quietly("rotate", Some(item.id), actor, outcome, Some(&item.reason));
        }
        env.audit.record_quietly(
            "rotate.batch",
            None,
            actor,
            "success",
            Some(&format!(
                "mode={} selected={} rotated={} failed={}",
                report.mode.as_str(),
                report.selected,
                report.rotated.len(),
                report.failed.len()
            )),
        );

        let notifier = notify::from_config(&env.config.notify, store::outbox_path()?);
        let sent = report.outbox.dispatch(notifier.as_ref());
        tracing::debug!(sent, "rotation notices dispatched");
        Ok(report)
    }

    fn audit_update(&self, env: &Env, id: ItemId, outcome: &UpdateOutcome) {
        match outcome {
            UpdateOutcome::Cleared => {
                env.audit
                    .record_quietly("interval.clear", Some(id), &self.actor, "success", None)
            }
            UpdateOutcome::Rearmed {
                interval_days,
                next_due_at,
            } => env.audit.record_quietly(
                "interval.set",
                Some(id),
                &self.actor,
                "success",
                Some(&format!(
                    "interval_days={} next_due_at={}",
                    interval_days,
                    env.clock.format(*next_due_at)
                )),
            ),
            UpdateOutcome::Unchanged { interval_days } => env.audit.record_quietly(
                "interval.set",
                Some(id),
                &self.actor,
                "unchanged",
                Some(&format!("interval_days={}", interval_days)),
            ),
            UpdateOutcome::Unprotected | UpdateOutcome::NoField | UpdateOutcome::Ignored => {}
        }
    }
}

fn audit_batch_failure(env: &Env, mode: TriggerMode, actor: &str, e: PassrotError) -> PassrotError {
    env.audit.record_quietly(
        "rotate.batch",
        None,
        actor,
        "failed",
        Some(&format!("mode={} error={}", mode.as_str(), e)),
    );
    e
}

fn summarize(catalog: &mut Catalog, clock: &SystemClock, id: ItemId) -> Result<ItemSummary> {
    let (title, protected, modified) = {
        let item = catalog.item(id)?;
        (item.title.clone(), item.is_protected(), item.modified_at)
    };
    let next_due_at = catalog.get_meta(id, META_NEXT_DUE_AT);
    let interval_days = IntervalStore::new(catalog, clock).stored_interval(id);
    Ok(ItemSummary {
        id,
        title,
        protected,
        interval_days,
        next_due_at,
        modified,
    })
}
