//! Per-item rotation metadata: `interval_days` and `next_due_at`.

pub mod update;

use crate::clock::{self, Clock};
use crate::error::{PassrotError, Result};
use crate::store::{ContentStore, ItemId};
use crate::types::*;

pub const META_INTERVAL_DAYS: &str = "interval_days";
pub const META_NEXT_DUE_AT: &str = "next_due_at";

/// Interval assumed when an item has none stored. Read paths and the due-date
/// recompute use it; only an explicit empty save disables rotation.
pub const DEFAULT_INTERVAL_DAYS: i64 = 1;

/// Loose integer coercion: optional sign and leading digits, everything else is 0.
/// `"7"` → 7, `" 12 days"` → 12, `"-3"` → -3, `"abc"` → 0. Digit runs past the
/// `i64` range saturate.
pub fn coerce_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return 0;
    }
    match digits.parse::<i64>() {
        Ok(n) => sign * n,
        Err(_) if sign < 0 => i64::MIN,
        Err(_) => i64::MAX,
    }
}

/// Typed view over the two metadata fields of a [`ContentStore`].
pub struct IntervalStore<'a, S: ContentStore + ?Sized, C: Clock + ?Sized> {
    store: &'a mut S,
    clock: &'a C,
}

impl<'a, S: ContentStore + ?Sized, C: Clock + ?Sized> IntervalStore<'a, S, C> {
    pub fn new(store: &'a mut S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    /// Stored interval, or [`DEFAULT_INTERVAL_DAYS`] when unset.
    pub fn get_interval(&self, id: ItemId) -> i64 {
        self.stored_interval(id).unwrap_or(DEFAULT_INTERVAL_DAYS)
    }

    /// Raw stored interval with no default applied.
    pub fn stored_interval(&self, id: ItemId) -> Option<i64> {
        self.store
            .get_meta(id, META_INTERVAL_DAYS)
            .map(|raw| coerce_int(&raw))
    }

    pub fn next_due(&self, id: ItemId) -> Option<DateTime<Utc>> {
        self.store
            .get_meta(id, META_NEXT_DUE_AT)
            .and_then(|raw| self.clock.parse(&raw))
    }

    pub fn set_interval(&mut self, id: ItemId, days: i64) -> Result<()> {
        self.store
            .set_meta(id, META_INTERVAL_DAYS, &days.to_string())
    }

    pub fn set_next_due(&mut self, id: ItemId, at: DateTime<Utc>) -> Result<()> {
        let rendered = self.clock.format(at);
        self.store.set_meta(id, META_NEXT_DUE_AT, &rendered)
    }

    /// Drop both fields, disabling rotation for the item.
    pub fn clear(&mut self, id: ItemId) -> Result<()> {
        self.store.delete_meta(id, META_NEXT_DUE_AT)?;
        self.store.delete_meta(id, META_INTERVAL_DAYS)
    }

    /// `now + days`, failing when that instant cannot be stored.
    pub fn due_after(&self, days: i64) -> Result<DateTime<Utc>> {
        clock::days_after(self.clock.now(), days).ok_or_else(|| {
            PassrotError::InvalidConfig(format!("interval of {} days is out of range", days))
        })
    }

    /// `next_due_at = now + get_interval(id) days`. Returns the new due instant.
    pub fn rearm(&mut self, id: ItemId) -> Result<DateTime<Utc>> {
        let due = self.due_after(self.get_interval(id))?;
        self.set_next_due(id, due)?;
        Ok(due)
    }
}
