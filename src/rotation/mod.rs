//! The rotation engine: new secret, new due date, one notice per item.

pub mod password;

use std::collections::BTreeSet;

use serde::Serialize;
use zeroize::Zeroizing;

use crate::clock::Clock;
use crate::error::Result;
use crate::interval::IntervalStore;
use crate::notify::{Notification, Outbox};
use crate::selector::{self, TriggerMode};
use crate::store::{ContentStore, ItemId};
use crate::types::*;
use password::PasswordGenerator;

/// Knobs for a rotation run that come from configuration.
#[derive(Debug, Clone)]
pub struct RotationSettings {
    pub recipient: String,
    pub generator: PasswordGenerator,
    /// Manual runs give unconfigured items a due date from the default interval.
    pub arm_unconfigured_on_manual: bool,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            recipient: "admin@localhost".to_string(),
            generator: PasswordGenerator::default(),
            arm_unconfigured_on_manual: true,
        }
    }
}

impl RotationSettings {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            recipient: config.notify.recipient.clone(),
            generator: PasswordGenerator::new(
                config.rotation.password_length,
                config.rotation.special_chars,
            ),
            arm_unconfigured_on_manual: config.rotation.arm_unconfigured_on_manual,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RotatedItem {
    pub id: ItemId,
    pub title: String,
    /// `None` when a manual run left an unconfigured item unarmed.
    pub next_due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// New secret was not stored; nothing changed for this item.
    Secret,
    /// New secret stored, due date could not be written. No notice is queued.
    Metadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub id: ItemId,
    pub title: String,
    pub stage: FailureStage,
    pub reason: String,
}

/// Result of one `rotate_due` batch.
#[derive(Debug, Serialize)]
pub struct RotationReport {
    pub mode: TriggerMode,
    pub started_at: DateTime<Utc>,
    pub selected: usize,
    pub rotated: Vec<RotatedItem>,
    pub failed: Vec<FailedItem>,
    /// Notices for the caller to dispatch after persisting the store.
    #[serde(skip)]
    pub outbox: Outbox,
}

impl RotationReport {
    /// True when any item's stored state changed.
    pub fn changed(&self) -> bool {
        !self.rotated.is_empty() || self.failed.iter().any(|f| f.stage == FailureStage::Metadata)
    }
}

pub struct RotationEngine<'a, S: ContentStore + ?Sized, C: Clock + ?Sized> {
    store: &'a mut S,
    clock: &'a C,
    settings: &'a RotationSettings,
}

impl<'a, S: ContentStore + ?Sized, C: Clock + ?Sized> RotationEngine<'a, S, C> {
    pub fn new(store: &'a mut S, clock: &'a C, settings: &'a RotationSettings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    /// Rotate every selected item once.
    ///
    /// Only a failing selector aborts the batch. Per-item write failures are
    /// recorded in the report and the loop moves on.
    pub fn rotate_due(&mut self, mode: TriggerMode) -> Result<RotationReport> {
        let started_at = self.clock.now();
        let candidates = selector::select_due(&*self.store, self.clock, mode)?;

        let mut report = RotationReport {
            mode,
            started_at,
            selected: candidates.len(),
            rotated: Vec::new(),
            failed: Vec::new(),
            outbox: Outbox::new(),
        };
        let mut seen = BTreeSet::new();

        for item in &candidates {
            if !seen.insert(item.id) {
                continue;
            }

            let secret = Zeroizing::new(self.settings.generator.generate_distinct(&item.secret));
            if let Err(e) = self.store.update_secret(item.id, &secret) {
                tracing::warn!(item_id = item.id, error = %e, "secret not persisted, skipping");
                report.failed.push(FailedItem {
                    id: item.id,
                    title: item.title.clone(),
                    stage: FailureStage::Secret,
                    reason: e.to_string(),
                });
                continue;
            }

            let mut intervals = IntervalStore::new(&mut *self.store, self.clock);
            let arm = mode.is_unattended()
                || self.settings.arm_unconfigured_on_manual
                || intervals.stored_interval(item.id).is_some();

            let rearmed = if arm {
                intervals.rearm(item.id).map(Some)
            } else {
                Ok(None)
            };

            match rearmed {
                Ok(next_due_at) => {
                    report.outbox.push(Notification::password_changed(
                        &self.settings.recipient,
                        item.id,
                        &item.title,
                        &secret,
                        started_at,
                    ));
                    tracing::info!(item_id = item.id, mode = mode.as_str(), "password rotated");
                    report.rotated.push(RotatedItem {
                        id: item.id,
                        title: item.title.clone(),
                        next_due_at,
                    });
                }
                Err(e) => {
                    tracing::warn!(item_id = item.id, error = %e, "due date not stored, no notice sent");
                    report.failed.push(FailedItem {
                        id: item.id,
                        title: item.title.clone(),
                        stage: FailureStage::Metadata,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            mode = mode.as_str(),
            selected = report.selected,
            rotated = report.rotated.len(),
            failed = report.failed.len(),
            "rotation batch finished"
        );
        Ok(report)
    }
}
