use serde::Serialize;
use tracing::warn;

use crate::clock::Clock;
use crate::duration::round_hours;
use crate::error::TimingError;
use crate::instant::Instant;

use super::chronology::ChronologyEntry;
use super::instance::StageClock;

/// Time spent in one stage, for display next to a card or list row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTimeReport {
    pub stage: String,
    /// Hours in the open visit; `Some(0.0)` when the item is elsewhere.
    pub instance_hours: Option<f64>,
    /// Hours across every visit, closed and open.
    pub cumulative_hours: Option<f64>,
    pub visits: usize,
    pub in_stage: bool,
}

impl<C: Clock> StageClock<C> {
    /// Business hours spent in `target_stage` across every visit.
    ///
    /// Closed visits contribute the duration recorded when the item left the
    /// stage; they are never re-derived from timestamps. The open visit is
    /// added only when `current_stage` is `target_stage`.
    pub fn try_total_stage_hours(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
        current_stage: &str,
    ) -> Result<f64, TimingError> {
        self.try_total_stage_hours_at(
            chronology,
            target_stage,
            fallback_created_at,
            current_stage,
            self.now(),
        )
    }

    /// [`try_total_stage_hours`](Self::try_total_stage_hours) with the open
    /// visit measured up to `now`.
    pub fn try_total_stage_hours_at(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
        current_stage: &str,
        now: Instant,
    ) -> Result<f64, TimingError> {
        let mut total = if current_stage == target_stage {
            match self.try_current_instance_hours_at(
                chronology,
                target_stage,
                fallback_created_at,
                now,
            ) {
                Ok(hours) => hours,
                Err(TimingError::MissingReferencePoint) => 0.0,
                Err(e) => return Err(e),
            }
        } else {
            0.0
        };

        for entry in chronology.iter().filter(|e| e.leaves(target_stage)) {
            if let Some(hours) = entry.closed_visit_hours()? {
                total += hours;
            }
        }

        Ok(round_hours(total))
    }

    /// Cumulative stage time, with bad data reported as `None`.
    pub fn total_stage_hours(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
        current_stage: &str,
    ) -> Option<f64> {
        self.total_stage_hours_at(
            chronology,
            target_stage,
            fallback_created_at,
            current_stage,
            self.now(),
        )
    }

    pub fn total_stage_hours_at(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
        current_stage: &str,
        now: Instant,
    ) -> Option<f64> {
        self.try_total_stage_hours_at(
            chronology,
            target_stage,
            fallback_created_at,
            current_stage,
            now,
        )
        .inspect_err(|e| warn!(stage = target_stage, "cumulative time unavailable: {e}"))
        .ok()
    }

    /// Instance and cumulative time for `target_stage` in one read.
    pub fn stage_report(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
        current_stage: &str,
    ) -> StageTimeReport {
        let now = self.now();
        let in_stage = current_stage == target_stage;
        let instance_hours = if in_stage {
            self.current_instance_hours_at(chronology, target_stage, fallback_created_at, now)
        } else {
            Some(0.0)
        };
        let closed = chronology.iter().filter(|e| e.leaves(target_stage)).count();

        StageTimeReport {
            stage: target_stage.to_string(),
            instance_hours,
            cumulative_hours: self.total_stage_hours_at(
                chronology,
                target_stage,
                fallback_created_at,
                current_stage,
                now,
            ),
            visits: closed + usize::from(in_stage),
            in_stage,
        }
    }
}
