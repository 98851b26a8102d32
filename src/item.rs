//! Item metadata as handed over by the storage layer.
//!
//! [`ItemRecord`] mirrors the stored JSON shape; converting it into a
//! [`WorkItemTimingContext`] parses every instant up front so malformed
//! metadata is reported as [`TimingError::InvalidInput`]. Chronology rows stay
//! raw and are parsed lazily by the stage clock.

use serde::{Deserialize, Serialize};

use crate::error::TimingError;
use crate::instant::parse_optional_instant;
use crate::sla::WorkItemTimingContext;
use crate::stage::ChronologyEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    #[serde(default)]
    pub created_at: Option<String>,
    pub current_status: String,
    #[serde(default)]
    pub due_date: Option<String>,
    /// Any non-empty value marks the item as having left the workflow.
    #[serde(default)]
    pub completion_status: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub is_benched: Option<bool>,
    /// Selects per-workflow stage thresholds from configuration.
    #[serde(default)]
    pub workflow_type: Option<String>,
    #[serde(default)]
    pub chronology: Vec<ChronologyEntry>,
}

impl ItemRecord {
    pub fn is_completed(&self) -> bool {
        self.completion_status
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

impl TryFrom<ItemRecord> for WorkItemTimingContext {
    type Error = TimingError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        let created_at = parse_optional_instant(record.created_at.as_deref())?;
        let due_date = parse_optional_instant(record.due_date.as_deref())?;
        let last_updated_at = parse_optional_instant(record.updated_at.as_deref())?;

        // A completed item without its own completion instant is judged as of
        // its last update, then its creation.
        let completion_instant = if record.is_completed() {
            parse_optional_instant(record.completed_at.as_deref())?
                .or(last_updated_at)
                .or(created_at)
        } else {
            None
        };
        if record.is_completed() && completion_instant.is_none() {
            return Err(TimingError::invalid(
                "completed item carries no completion, update or creation instant",
            ));
        }

        Ok(WorkItemTimingContext {
            created_at,
            current_stage: record.current_status,
            chronology: record.chronology,
            due_date,
            is_suspended: record.is_benched.unwrap_or(false),
            completion_instant,
            last_updated_at,
        })
    }
}
