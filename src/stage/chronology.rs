use serde::{Deserialize, Serialize};

use crate::error::TimingError;
use crate::instant::{Instant, parse_instant};

/// One recorded transition of a work item between workflow stages.
///
/// The log is append-only and owned by the workflow engine. `timestamp` is
/// kept as the raw feed value and parsed on read so a malformed row surfaces
/// as [`TimingError::InvalidInput`] at the point it is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChronologyEntry {
    #[serde(rename = "fromStatus", alias = "fromStage", default)]
    pub from_stage: Option<String>,

    #[serde(rename = "toStatus", alias = "toStage", default)]
    pub to_stage: Option<String>,

    pub timestamp: String,

    /// Business time spent in `from_stage`, in whole minutes. Recorded once,
    /// when the item left that stage.
    #[serde(rename = "businessHoursInPreviousStage", default)]
    pub minutes_in_previous_stage: Option<i64>,
}

impl ChronologyEntry {
    /// Entry recording a move from `from` (if any) into `to` at `at`.
    pub fn transition(from: Option<&str>, to: &str, at: Instant) -> Self {
        Self {
            from_stage: from.map(str::to_string),
            to_stage: Some(to.to_string()),
            timestamp: at.to_rfc3339(),
            minutes_in_previous_stage: None,
        }
    }

    pub fn with_minutes_in_previous_stage(mut self, minutes: i64) -> Self {
        self.minutes_in_previous_stage = Some(minutes);
        self
    }

    pub fn instant(&self) -> Result<Instant, TimingError> {
        parse_instant(&self.timestamp)
    }

    pub fn enters(&self, stage: &str) -> bool {
        self.to_stage.as_deref() == Some(stage)
    }

    pub fn leaves(&self, stage: &str) -> bool {
        self.from_stage.as_deref() == Some(stage)
    }

    /// Whether the entry records an actual stage change rather than a bare
    /// annotation of the log.
    pub fn is_stage_change(&self) -> bool {
        self.to_stage.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// Recorded duration of the closed visit to `from_stage`, in hours.
    pub fn closed_visit_hours(&self) -> Result<Option<f64>, TimingError> {
        match self.minutes_in_previous_stage {
            None => Ok(None),
            Some(m) if m < 0 => Err(TimingError::invalid(format!(
                "negative stage duration of {m} minutes at {}",
                self.timestamp
            ))),
            Some(m) => Ok(Some(m as f64 / 60.0)),
        }
    }
}

/// Parse every timestamp and order the log most-recent first.
///
/// Callers may hand over the log in any order. A single unparseable
/// timestamp fails the whole read. Entries with equal timestamps keep their
/// relative order, reversed along with the rest.
pub fn sorted_newest_first(
    chronology: &[ChronologyEntry],
) -> Result<Vec<(Instant, &ChronologyEntry)>, TimingError> {
    let mut entries = chronology
        .iter()
        .map(|entry| entry.instant().map(|at| (at, entry)))
        .collect::<Result<Vec<_>, _>>()?;
    entries.reverse();
    entries.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(entries)
}
