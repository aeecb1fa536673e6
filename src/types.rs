//! Common imports shared across modules.

pub use chrono::{DateTime, FixedOffset, Utc};
pub use serde::{Deserialize, Serialize};
pub use std::collections::BTreeMap;
pub use std::path::PathBuf;
