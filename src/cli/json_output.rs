use serde::Serialize;

use passrot::api::ItemSummary;
use passrot::interval::update::UpdateOutcome;
use passrot::schedule::Cadence;

/// JSON response for `passrot item add --json`.
#[derive(Serialize)]
pub struct ItemAddResponse {
    pub id: u64,
    pub title: String,
    pub protected: bool,
}

/// JSON response for `passrot item list --json`.
#[derive(Serialize)]
pub struct ItemListResponse {
    pub items: Vec<ItemSummary>,
}

/// JSON response for `passrot item show --json`.
#[derive(Serialize)]
pub struct ItemShowResponse {
    #[serde(flatten)]
    pub item: ItemSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// JSON response for `passrot item save --json`.
#[derive(Serialize)]
pub struct ItemSaveResponse {
    pub id: u64,
    #[serde(flatten)]
    pub outcome: UpdateOutcome,
}

/// JSON response for `passrot schedule arm --json`.
#[derive(Serialize)]
pub struct ScheduleArmResponse {
    pub job: String,
    pub newly_armed: bool,
}

/// JSON response for `passrot schedule status --json`.
#[derive(Serialize)]
pub struct ScheduleStatusResponse {
    pub job: String,
    pub armed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Cadence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<String>,
}

/// JSON response for `passrot audit show --json`.
#[derive(Serialize)]
pub struct AuditShowResponse {
    pub entries: Vec<AuditEntryItem>,
    pub shown: usize,
    pub total: usize,
}

#[derive(Serialize)]
pub struct AuditEntryItem {
    pub timestamp: String,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<u64>,
    pub actor: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
