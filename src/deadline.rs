use chrono::TimeDelta;

use crate::calendar::{BusinessCalendar, next_date};
use crate::duration::MILLIS_PER_HOUR;
use crate::error::TimingError;
use crate::instant::{Instant, parse_instant};

impl BusinessCalendar {
    /// Instant reached after consuming `hours` of business time from `start`.
    ///
    /// Weekend time is never consumed: a weekend start jumps straight to
    /// 00:00 of the next business day, and a budget that runs past a day's
    /// 24:00 boundary continues at the next business day's 00:00. A budget
    /// that ends exactly on a boundary stops there.
    pub fn add_business_hours(&self, start: Instant, hours: f64) -> Result<Instant, TimingError> {
        if !hours.is_finite() {
            return Err(TimingError::invalid(format!("hours must be finite, got {hours}")));
        }
        if hours <= 0.0 {
            return Ok(start);
        }

        let budget = hours * MILLIS_PER_HOUR;
        if budget >= i64::MAX as f64 {
            return Err(TimingError::invalid(format!("{hours} hours is out of range")));
        }
        let mut remaining = budget.round() as i64;

        let mut cursor = start;
        if self.is_weekend(cursor) {
            cursor = self.next_business_day(cursor)?;
        }

        loop {
            let day_end = self.start_of_day(next_date(self.local_date(cursor))?)?;
            let available = (day_end - cursor).num_milliseconds();

            if remaining <= available {
                return cursor
                    .checked_add_signed(TimeDelta::milliseconds(remaining))
                    .ok_or_else(|| TimingError::invalid("deadline is outside the supported range"));
            }

            remaining -= available;
            cursor = day_end;
            if self.is_weekend(cursor) {
                cursor = self.next_business_day(cursor)?;
            }
        }
    }

    /// [`add_business_hours`](Self::add_business_hours) from a raw timestamp string.
    pub fn add_business_hours_to(&self, start: &str, hours: f64) -> Result<Instant, TimingError> {
        self.add_business_hours(parse_instant(start)?, hours)
    }
}
