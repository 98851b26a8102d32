//! Elapsed business hours between two instants.
//!
//! This is the only implementation of the measurement; stage clocks, SLA
//! classification and the CLI all call [`BusinessCalendar::business_hours`].

use chrono::TimeDelta;

use crate::calendar::{BusinessCalendar, next_date};
use crate::error::TimingError;
use crate::instant::{Instant, parse_instant};

pub(crate) const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Round an hour quantity to two decimal places.
pub fn round_hours(hours: f64) -> f64 {
    // `+ 0.0` folds `-0.0` into `0.0`.
    (hours * 100.0).round() / 100.0 + 0.0
}

pub(crate) fn delta_to_hours(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / MILLIS_PER_HOUR
}

impl BusinessCalendar {
    /// Business hours elapsed from `start` to `end`, rounded to 2 decimals.
    ///
    /// Weekend days contribute nothing. Each weekday contributes its overlap
    /// with `[start, end]`, where a day spans local 00:00 up to the next local
    /// 00:00. Returns `0` when `start >= end`.
    pub fn business_hours(&self, start: Instant, end: Instant) -> Result<f64, TimingError> {
        if start >= end {
            return Ok(0.0);
        }

        let first_day = self.local_date(start);
        let last_day = self.local_date(end);

        if first_day == last_day {
            if Self::is_weekend_day(first_day) {
                return Ok(0.0);
            }
            return Ok(round_hours(delta_to_hours(end - start)));
        }

        let mut total = TimeDelta::zero();
        let mut day = first_day;
        let mut day_start = self.start_of_day(day)?;
        loop {
            // The last day is bounded by `end`, so no day after it is needed.
            let (next, day_end) = if day == last_day {
                (None, end)
            } else {
                let next_day = next_date(day)?;
                (Some(next_day), self.start_of_day(next_day)?)
            };

            if !Self::is_weekend_day(day) {
                let from = start.max(day_start);
                let to = end.min(day_end);
                if to > from {
                    total += to - from;
                }
            }

            match next {
                Some(next_day) => {
                    day = next_day;
                    day_start = day_end;
                }
                None => break,
            }
        }

        Ok(round_hours(delta_to_hours(total)))
    }

    /// [`business_hours`](Self::business_hours) over raw timestamp strings.
    pub fn business_hours_between(&self, start: &str, end: &str) -> Result<f64, TimingError> {
        let start = parse_instant(start)?;
        let end = parse_instant(end)?;
        self.business_hours(start, end)
    }
}
