use tracing::warn;

use crate::calendar::BusinessCalendar;
use crate::clock::Clock;
use crate::error::TimingError;
use crate::instant::Instant;

use super::chronology::{ChronologyEntry, sorted_newest_first};

/// Measures how long a work item has been sitting in a stage, in business
/// hours, against an injected clock.
#[derive(Debug, Clone)]
pub struct StageClock<C> {
    calendar: BusinessCalendar,
    clock: C,
}

impl<C: Clock> StageClock<C> {
    pub fn new(calendar: BusinessCalendar, clock: C) -> Self {
        Self { calendar, clock }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Instant the current visit to `target_stage` began.
    ///
    /// The most recent entry into the stage wins; with none, the item is
    /// assumed to have been there since `fallback_created_at`.
    pub fn instance_start(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
    ) -> Result<Instant, TimingError> {
        let sorted = sorted_newest_first(chronology)?;
        sorted
            .iter()
            .find(|(_, entry)| entry.enters(target_stage))
            .map(|(at, _)| *at)
            .or(fallback_created_at)
            .ok_or(TimingError::MissingReferencePoint)
    }

    /// Business hours since the current visit to `target_stage` began.
    ///
    /// Fails with [`TimingError::MissingReferencePoint`] when no anchor
    /// exists, or [`TimingError::InvalidInput`] on malformed timestamps.
    pub fn try_current_instance_hours(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
    ) -> Result<f64, TimingError> {
        self.try_current_instance_hours_at(chronology, target_stage, fallback_created_at, self.now())
    }

    /// [`try_current_instance_hours`](Self::try_current_instance_hours) measured
    /// up to `now` instead of a fresh clock read.
    pub fn try_current_instance_hours_at(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
        now: Instant,
    ) -> Result<f64, TimingError> {
        let start = self.instance_start(chronology, target_stage, fallback_created_at)?;
        self.calendar.business_hours(start, now)
    }

    /// Current instance time, never failing.
    ///
    /// An item with no anchor yet reads as `Some(0.0)`. Bad data reads as
    /// `None` so callers can tell "unknown" apart from "just entered".
    pub fn current_instance_hours(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
    ) -> Option<f64> {
        self.current_instance_hours_at(chronology, target_stage, fallback_created_at, self.now())
    }

    pub fn current_instance_hours_at(
        &self,
        chronology: &[ChronologyEntry],
        target_stage: &str,
        fallback_created_at: Option<Instant>,
        now: Instant,
    ) -> Option<f64> {
        let hours =
            self.try_current_instance_hours_at(chronology, target_stage, fallback_created_at, now);
        match hours {
            Ok(hours) => Some(hours),
            Err(TimingError::MissingReferencePoint) => Some(0.0),
            Err(e) => {
                warn!(stage = target_stage, "instance time unavailable: {e}");
                None
            }
        }
    }
}
