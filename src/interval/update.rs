use serde::Serialize;

use super::{coerce_int, IntervalStore};
use crate::clock::Clock;
use crate::error::{PassrotError, Result};
use crate::store::{ContentStore, ItemId};
use crate::types::*;

/// Fields submitted when an item's configuration form is saved.
#[derive(Debug, Clone, Default)]
pub struct ConfigSave {
    pub item_id: ItemId,
    /// `None` when the form had no interval field at all; `Some("")` clears it.
    pub interval: Option<String>,
}

impl ConfigSave {
    pub fn new(item_id: ItemId, interval: Option<String>) -> Self {
        Self { item_id, interval }
    }
}

/// What a save did to the item's rotation metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// Item has no secret, rotation does not apply.
    Unprotected,
    /// Form carried no interval field.
    NoField,
    /// Interval submitted empty: both fields removed.
    Cleared,
    /// Non-positive or non-numeric interval, nothing written.
    Ignored,
    /// Interval stored, due date left alone.
    Unchanged { interval_days: i64 },
    /// Interval stored and due date recomputed from now.
    Rearmed {
        interval_days: i64,
        next_due_at: DateTime<Utc>,
    },
}

/// React to a configuration save.
///
/// The previous interval (defaulted) is read before the new one is written; the
/// due date only moves when the interval actually changed, so unrelated saves
/// never reset the rotation clock. An interval whose due date cannot be stored
/// is rejected before anything is written.
pub fn handle_save<S, C>(store: &mut S, clock: &C, save: &ConfigSave) -> Result<UpdateOutcome>
where
    S: ContentStore + ?Sized,
    C: Clock + ?Sized,
{
    let id = save.item_id;
    let item = store.get(id).ok_or(PassrotError::ItemNotFound(id))?;
    if !item.is_protected() {
        return Ok(UpdateOutcome::Unprotected);
    }

    let Some(raw) = save.interval.as_deref() else {
        return Ok(UpdateOutcome::NoField);
    };

    let mut intervals = IntervalStore::new(store, clock);

    // Only the literal empty string and "0" disable rotation.
    if raw.is_empty() || raw == "0" {
        intervals.clear(id)?;
        tracing::info!(item_id = id, "rotation disabled");
        return Ok(UpdateOutcome::Cleared);
    }

    let days = coerce_int(raw);
    if days <= 0 {
        tracing::debug!(item_id = id, raw, "ignoring non-positive interval");
        return Ok(UpdateOutcome::Ignored);
    }

    let previous = intervals.get_interval(id);
    if previous == days {
        intervals.set_interval(id, days)?;
        return Ok(UpdateOutcome::Unchanged {
            interval_days: days,
        });
    }

    let next_due_at = intervals.due_after(days)?;
    intervals.set_interval(id, days)?;
    intervals.set_next_due(id, next_due_at)?;
    tracing::info!(item_id = id, previous, days, %next_due_at, "rotation interval changed");
    Ok(UpdateOutcome::Rearmed {
        interval_days: days,
        next_due_at,
    })
}
