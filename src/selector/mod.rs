//! Which protected items does a rotation run touch?

use serde::Serialize;

use crate::clock::Clock;
use crate::error::{PassrotError, Result};
use crate::interval::META_NEXT_DUE_AT;
use crate::store::{ContentStore, Item, ItemFilter, MetaBefore};

/// How a rotation run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Recurring job: only items whose due date has passed.
    Unattended,
    /// Operator request: every protected item, due or not.
    Manual,
}

impl TriggerMode {
    pub fn is_unattended(self) -> bool {
        matches!(self, TriggerMode::Unattended)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerMode::Unattended => "unattended",
            TriggerMode::Manual => "manual",
        }
    }
}

/// Build the store query for a run.
pub fn due_filter<C: Clock + ?Sized>(clock: &C, mode: TriggerMode) -> ItemFilter {
    let meta_before = mode.is_unattended().then(|| MetaBefore {
        key: META_NEXT_DUE_AT.to_string(),
        value: clock.now().with_timezone(&clock.offset()).naive_local(),
    });
    ItemFilter {
        protected_only: true,
        meta_before,
    }
}

/// Every protected item, plus `next_due_at < now` when unattended. Never paged.
pub fn select_due<S, C>(store: &S, clock: &C, mode: TriggerMode) -> Result<Vec<Item>>
where
    S: ContentStore + ?Sized,
    C: Clock + ?Sized,
{
    let filter = due_filter(clock, mode);
    let items = store.query(&filter).map_err(|e| match e {
        PassrotError::Query(_) => e,
        other => PassrotError::Query(other.to_string()),
    })?;
    tracing::debug!(mode = mode.as_str(), selected = items.len(), "selected rotation candidates");
    Ok(items)
}
