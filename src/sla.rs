use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::duration::round_hours;
use crate::instant::Instant;
use crate::stage::{ChronologyEntry, StageClock, sorted_newest_first};

/// Business-hour budgets configured for one stage.
///
/// A missing, non-positive or non-finite budget means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageThresholds {
    #[serde(default, alias = "max_instance_time")]
    pub max_instance_time: Option<f64>,
    #[serde(default, alias = "max_total_time")]
    pub max_total_time: Option<f64>,
}

impl StageThresholds {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn instance_budget(&self) -> Option<f64> {
        self.max_instance_time.filter(|h| h.is_finite() && *h > 0.0)
    }

    pub fn total_budget(&self) -> Option<f64> {
        self.max_total_time.filter(|h| h.is_finite() && *h > 0.0)
    }
}

/// Whether `elapsed` hours have used up `budget`.
///
/// Reaching the limit exactly counts as having used it up. Every threshold
/// comparison goes through here.
pub fn exceeds_budget(elapsed: f64, budget: f64) -> bool {
    elapsed >= budget
}

/// Everything the classifier needs to know about one work item.
#[derive(Debug, Clone, Default)]
pub struct WorkItemTimingContext {
    pub created_at: Option<Instant>,
    pub current_stage: String,
    pub chronology: Vec<ChronologyEntry>,
    pub due_date: Option<Instant>,
    /// Benched items are exempt from classification.
    pub is_suspended: bool,
    /// Set once the item has left the workflow entirely.
    pub completion_instant: Option<Instant>,
    pub last_updated_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlaState {
    OnTrack,
    BehindSchedule,
    Overdue,
    Suspended,
}

impl fmt::Display for SlaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlaState::OnTrack => write!(f, "ON_TRACK"),
            SlaState::BehindSchedule => write!(f, "BEHIND_SCHEDULE"),
            SlaState::Overdue => write!(f, "OVERDUE"),
            SlaState::Suspended => write!(f, "SUSPENDED"),
        }
    }
}

/// Classification of a work item's timing. Computed fresh on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaStatus {
    pub state: SlaState,
    /// Positive: hours left. Negative: hours past the limit.
    pub remaining_hours: Option<f64>,
    pub is_overdue: bool,
    pub instance_hours: Option<f64>,
    pub cumulative_hours: Option<f64>,
    pub total_remaining_hours: Option<f64>,
    pub total_budget_exceeded: bool,
}

impl SlaStatus {
    fn bare(state: SlaState) -> Self {
        Self {
            state,
            remaining_hours: None,
            is_overdue: state == SlaState::Overdue,
            instance_hours: None,
            cumulative_hours: None,
            total_remaining_hours: None,
            total_budget_exceeded: false,
        }
    }
}

/// Maps a work item's timing onto an [`SlaState`].
///
/// Rules, first match wins:
/// 1. suspended items are `Suspended`;
/// 2. completed items are judged once, at their last stage change, against
///    the due date;
/// 3. active items past their due date are `Overdue`;
/// 4. active items whose current visit has used up the stage budget are
///    `BehindSchedule`;
/// 5. everything else is `OnTrack`.
#[derive(Debug, Clone)]
pub struct SlaClassifier<C> {
    stage_clock: StageClock<C>,
}

impl<C: Clock> SlaClassifier<C> {
    pub fn new(stage_clock: StageClock<C>) -> Self {
        Self { stage_clock }
    }

    pub fn stage_clock(&self) -> &StageClock<C> {
        &self.stage_clock
    }

    pub fn classify(&self, ctx: &WorkItemTimingContext, thresholds: &StageThresholds) -> SlaStatus {
        if ctx.is_suspended {
            debug!(stage = %ctx.current_stage, "item suspended, skipping classification");
            return SlaStatus::bare(SlaState::Suspended);
        }

        if let Some(completed_at) = ctx.completion_instant {
            return self.classify_completed(ctx, completed_at);
        }

        let calendar = self.stage_clock.calendar();
        let now = self.stage_clock.now();

        let instance_hours = self.stage_clock.current_instance_hours_at(
            &ctx.chronology,
            &ctx.current_stage,
            ctx.created_at,
            now,
        );
        let cumulative_hours = self.stage_clock.total_stage_hours_at(
            &ctx.chronology,
            &ctx.current_stage,
            ctx.created_at,
            &ctx.current_stage,
            now,
        );

        let instance_remaining = thresholds
            .instance_budget()
            .zip(instance_hours)
            .map(|(budget, spent)| round_hours(budget - spent));
        let (total_remaining_hours, total_budget_exceeded) =
            match thresholds.total_budget().zip(cumulative_hours) {
                Some((budget, spent)) => {
                    (Some(round_hours(budget - spent)), exceeds_budget(spent, budget))
                }
                None => (None, false),
            };

        let mut status = SlaStatus {
            state: SlaState::OnTrack,
            remaining_hours: instance_remaining,
            is_overdue: false,
            instance_hours,
            cumulative_hours,
            total_remaining_hours,
            total_budget_exceeded,
        };

        if let Some(due) = ctx.due_date
            && now > due
        {
            status.state = SlaState::Overdue;
            status.is_overdue = true;
            status.remaining_hours = calendar.business_hours(due, now).ok().map(overrun);
            debug!(stage = %ctx.current_stage, %due, "item past due date");
            return status;
        }

        // Without an instance budget, remaining time counts down to the due date.
        if thresholds.instance_budget().is_none()
            && let Some(due) = ctx.due_date
        {
            status.remaining_hours = calendar.business_hours(now, due).ok();
        }

        if let Some((budget, spent)) = thresholds.instance_budget().zip(instance_hours)
            && exceeds_budget(spent, budget)
        {
            status.state = SlaState::BehindSchedule;
            status.is_overdue = true;
            debug!(stage = %ctx.current_stage, spent, budget, "stage budget used up");
        }

        status
    }

    /// Frozen verdict for an item that has left the workflow.
    fn classify_completed(&self, ctx: &WorkItemTimingContext, completed_at: Instant) -> SlaStatus {
        let effective = last_stage_change(&ctx.chronology)
            .or(ctx.last_updated_at)
            .unwrap_or(completed_at);

        match ctx.due_date {
            Some(due) if effective > due => {
                let mut status = SlaStatus::bare(SlaState::Overdue);
                status.remaining_hours = self
                    .stage_clock
                    .calendar()
                    .business_hours(due, effective)
                    .ok()
                    .map(overrun);
                status
            }
            _ => SlaStatus::bare(SlaState::OnTrack),
        }
    }
}

/// Hours past the due date as a negative remaining time, never `-0.0`.
fn overrun(hours: f64) -> f64 {
    0.0 - hours
}

/// Timestamp of the most recent entry that actually moved the item.
fn last_stage_change(chronology: &[ChronologyEntry]) -> Option<Instant> {
    match sorted_newest_first(chronology) {
        Ok(sorted) => sorted
            .into_iter()
            .find(|(_, entry)| entry.is_stage_change())
            .map(|(at, _)| at),
        Err(e) => {
            debug!("ignoring chronology for completion time: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::BusinessCalendar;
    use crate::clock::FixedClock;
    use chrono::{TimeDelta, TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Instant {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn classifier_at(now: Instant) -> SlaClassifier<FixedClock> {
        SlaClassifier::new(StageClock::new(BusinessCalendar::utc(), FixedClock::new(now)))
    }

    fn budget(instance: f64) -> StageThresholds {
        StageThresholds {
            max_instance_time: Some(instance),
            max_total_time: None,
        }
    }

    fn item_created(created: Instant, stage: &str) -> WorkItemTimingContext {
        WorkItemTimingContext {
            created_at: Some(created),
            current_stage: stage.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn suspended_wins_over_everything() {
        let sla = classifier_at(at(2024, 1, 10, 9, 0));
        let ctx = WorkItemTimingContext {
            is_suspended: true,
            due_date: Some(at(2024, 1, 2, 9, 0)),
            ..item_created(at(2024, 1, 1, 9, 0), "Review")
        };
        let status = sla.classify(&ctx, &budget(1.0));
        assert_eq!(status.state, SlaState::Suspended);
        assert_eq!(status.remaining_hours, None);
        assert_eq!(status.instance_hours, None);
        assert!(!status.is_overdue);
    }

    #[test]
    fn budget_used_up_is_behind_schedule() {
        // Mon 09:00 -> Wed 09:00 = 48h against a 40h budget.
        let sla = classifier_at(at(2024, 1, 3, 9, 0));
        let ctx = item_created(at(2024, 1, 1, 9, 0), "Preparation");
        let status = sla.classify(&ctx, &budget(40.0));
        assert_eq!(status.state, SlaState::BehindSchedule);
        assert_eq!(status.instance_hours, Some(48.0));
        assert_eq!(status.remaining_hours, Some(-8.0));
        assert!(status.is_overdue);
    }

    #[test]
    fn meeting_the_budget_exactly_is_behind_schedule() {
        let sla = classifier_at(at(2024, 1, 2, 9, 0));
        let ctx = item_created(at(2024, 1, 1, 9, 0), "Preparation");
        let status = sla.classify(&ctx, &budget(24.0));
        assert_eq!(status.state, SlaState::BehindSchedule);
        assert_eq!(status.remaining_hours, Some(0.0));
    }

    #[test]
    fn within_budget_is_on_track() {
        let sla = classifier_at(at(2024, 1, 1, 17, 0));
        let ctx = item_created(at(2024, 1, 1, 9, 0), "Preparation");
        let status = sla.classify(&ctx, &budget(40.0));
        assert_eq!(status.state, SlaState::OnTrack);
        assert_eq!(status.remaining_hours, Some(32.0));
        assert!(!status.is_overdue);
    }

    #[test]
    fn unlimited_stage_reports_time_to_due_date() {
        let sla = classifier_at(at(2024, 1, 5, 12, 0));
        let ctx = WorkItemTimingContext {
            due_date: Some(at(2024, 1, 8, 12, 0)),
            ..item_created(at(2024, 1, 1, 9, 0), "Preparation")
        };
        let status = sla.classify(&ctx, &StageThresholds::unlimited());
        assert_eq!(status.state, SlaState::OnTrack);
        assert_eq!(status.remaining_hours, Some(24.0));
    }

    #[test]
    fn due_date_beats_stage_budget() {
        let sla = classifier_at(at(2024, 1, 3, 9, 0));
        let ctx = WorkItemTimingContext {
            due_date: Some(at(2024, 1, 2, 21, 0)),
            ..item_created(at(2024, 1, 1, 9, 0), "Preparation")
        };
        let status = sla.classify(&ctx, &budget(40.0));
        assert_eq!(status.state, SlaState::Overdue);
        assert_eq!(status.remaining_hours, Some(-12.0));
        assert!(status.is_overdue);
    }

    #[test]
    fn non_positive_budget_is_unlimited() {
        let sla = classifier_at(at(2024, 1, 3, 9, 0));
        let ctx = item_created(at(2024, 1, 1, 9, 0), "Preparation");
        let status = sla.classify(&ctx, &budget(0.0));
        assert_eq!(status.state, SlaState::OnTrack);
        assert_eq!(status.remaining_hours, None);
    }

    #[test]
    fn total_budget_is_reported_without_changing_state() {
        let sla = classifier_at(at(2024, 1, 3, 11, 15));
        let ctx = WorkItemTimingContext {
            chronology: vec![
                ChronologyEntry::transition(Some("Review"), "Preparation", at(2024, 1, 1, 14, 0))
                    .with_minutes_in_previous_stage(600),
                ChronologyEntry::transition(Some("Preparation"), "Review", at(2024, 1, 3, 10, 0)),
            ],
            ..item_created(at(2024, 1, 1, 4, 0), "Review")
        };
        let thresholds = StageThresholds {
            max_instance_time: Some(8.0),
            max_total_time: Some(10.0),
        };
        let status = sla.classify(&ctx, &thresholds);
        assert_eq!(status.state, SlaState::OnTrack);
        assert_eq!(status.cumulative_hours, Some(11.25));
        assert_eq!(status.total_remaining_hours, Some(-1.25));
        assert!(status.total_budget_exceeded);
    }

    #[test]
    fn completed_late_is_frozen_overdue() {
        // Judged at the last stage change, not against "now".
        let sla = classifier_at(at(2023, 6, 1, 0, 0));
        let ctx = WorkItemTimingContext {
            due_date: Some(at(2024, 1, 2, 9, 0)),
            completion_instant: Some(at(2024, 1, 10, 9, 0)),
            chronology: vec![
                ChronologyEntry::transition(Some("Review"), "Done", at(2024, 1, 3, 9, 0)),
                ChronologyEntry::transition(None, "Review", at(2024, 1, 1, 9, 0)),
            ],
            ..item_created(at(2024, 1, 1, 9, 0), "Done")
        };
        let status = sla.classify(&ctx, &StageThresholds::unlimited());
        assert_eq!(status.state, SlaState::Overdue);
        assert_eq!(status.remaining_hours, Some(-24.0));
    }

    #[test]
    fn completed_on_time_is_on_track_even_if_now_is_late() {
        let sla = classifier_at(at(2024, 3, 1, 0, 0));
        let ctx = WorkItemTimingContext {
            due_date: Some(at(2024, 1, 5, 9, 0)),
            completion_instant: Some(at(2024, 1, 10, 9, 0)),
            chronology: vec![ChronologyEntry::transition(Some("Review"), "Done", at(2024, 1, 4, 9, 0))],
            ..item_created(at(2024, 1, 1, 9, 0), "Done")
        };
        assert_eq!(sla.classify(&ctx, &budget(1.0)).state, SlaState::OnTrack);
    }

    #[test]
    fn completed_without_stage_change_uses_last_update() {
        let sla = classifier_at(at(2024, 3, 1, 0, 0));
        let ctx = WorkItemTimingContext {
            due_date: Some(at(2024, 1, 5, 9, 0)),
            completion_instant: Some(at(2024, 1, 4, 9, 0)),
            last_updated_at: Some(at(2024, 1, 6, 9, 0)),
            ..item_created(at(2024, 1, 1, 9, 0), "Done")
        };
        assert_eq!(
            sla.classify(&ctx, &StageThresholds::unlimited()).state,
            SlaState::Overdue
        );
    }

    #[test]
    fn unknown_instance_time_stays_on_track() {
        let sla = classifier_at(at(2024, 1, 3, 9, 0));
        let mut entry = ChronologyEntry::transition(None, "Preparation", at(2024, 1, 1, 9, 0));
        entry.timestamp = "garbled".into();
        let ctx = WorkItemTimingContext {
            chronology: vec![entry],
            ..item_created(at(2024, 1, 1, 9, 0), "Preparation")
        };
        let status = sla.classify(&ctx, &budget(40.0));
        assert_eq!(status.state, SlaState::OnTrack);
        assert_eq!(status.instance_hours, None);
        assert_eq!(status.remaining_hours, None);
    }

    #[test]
    fn unknown_instance_time_under_a_budget_ignores_the_due_date() {
        let sla = classifier_at(at(2024, 1, 1, 9, 0));
        let mut entry = ChronologyEntry::transition(None, "Preparation", at(2024, 1, 1, 9, 0));
        entry.timestamp = "garbled".into();
        let ctx = WorkItemTimingContext {
            chronology: vec![entry],
            due_date: Some(at(2024, 1, 8, 9, 0)),
            ..item_created(at(2024, 1, 1, 9, 0), "Preparation")
        };
        let status = sla.classify(&ctx, &budget(8.0));
        assert_eq!(status.state, SlaState::OnTrack);
        assert_eq!(status.instance_hours, None);
        assert_eq!(status.remaining_hours, None);
    }

    #[test]
    fn overdue_within_one_weekend_reports_positive_zero() {
        // Due Sat 09:00, now Sun 12:00: late, but no business hours have passed.
        let sla = classifier_at(at(2024, 1, 7, 12, 0));
        let ctx = WorkItemTimingContext {
            due_date: Some(at(2024, 1, 6, 9, 0)),
            ..item_created(at(2024, 1, 1, 9, 0), "Review")
        };
        let status = sla.classify(&ctx, &StageThresholds::unlimited());
        assert_eq!(status.state, SlaState::Overdue);
        let remaining = status.remaining_hours.unwrap();
        assert_eq!(remaining, 0.0);
        assert!(remaining.is_sign_positive());
        assert!(serde_json::to_string(&status).unwrap().contains("\"remainingHours\":0.0"));
    }

    #[test]
    fn completed_late_within_one_weekend_reports_positive_zero() {
        let sla = classifier_at(at(2024, 3, 1, 0, 0));
        let ctx = WorkItemTimingContext {
            due_date: Some(at(2024, 1, 6, 9, 0)),
            completion_instant: Some(at(2024, 1, 7, 12, 0)),
            chronology: vec![ChronologyEntry::transition(
                Some("Review"),
                "Done",
                at(2024, 1, 7, 12, 0),
            )],
            ..item_created(at(2024, 1, 1, 9, 0), "Done")
        };
        let status = sla.classify(&ctx, &StageThresholds::unlimited());
        assert_eq!(status.state, SlaState::Overdue);
        assert!(status.remaining_hours.unwrap().is_sign_positive());
    }

    /// Clock that moves forward an hour on every read.
    struct TickingClock {
        start: Instant,
        reads: AtomicI64,
    }

    impl Clock for TickingClock {
        fn now(&self) -> Instant {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            self.start + TimeDelta::hours(n)
        }
    }

    #[test]
    fn classify_reads_the_clock_once() {
        let clock = TickingClock {
            start: at(2024, 1, 1, 17, 0),
            reads: AtomicI64::new(0),
        };
        let sla = SlaClassifier::new(StageClock::new(BusinessCalendar::utc(), &clock));
        let ctx = item_created(at(2024, 1, 1, 9, 0), "Review");
        let thresholds = StageThresholds {
            max_instance_time: Some(40.0),
            max_total_time: Some(40.0),
        };
        let status = sla.classify(&ctx, &thresholds);
        assert_eq!(clock.reads.load(Ordering::SeqCst), 1);
        assert_eq!(status.instance_hours, Some(8.0));
        assert_eq!(status.cumulative_hours, Some(8.0));
    }

    #[test]
    fn state_display() {
        assert_eq!(SlaState::OnTrack.to_string(), "ON_TRACK");
        assert_eq!(SlaState::BehindSchedule.to_string(), "BEHIND_SCHEDULE");
        assert_eq!(SlaState::Overdue.to_string(), "OVERDUE");
        assert_eq!(SlaState::Suspended.to_string(), "SUSPENDED");
    }
}
