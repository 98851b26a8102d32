use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, Utc, Weekday};

use crate::error::TimingError;
use crate::instant::Instant;

const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Weekday/weekend rules evaluated in one reference timezone.
///
/// The reference timezone is a fixed UTC offset, so every calendar day is
/// exactly 24 hours long. Saturday and Sunday are the only non-business days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl BusinessCalendar {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build a calendar for an offset east of UTC, in minutes (negative = west).
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, TimingError> {
        if minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(TimingError::invalid(format!(
                "utc offset of {minutes} minutes is out of range"
            )));
        }
        FixedOffset::east_opt(minutes * 60)
            .map(Self::with_offset)
            .ok_or_else(|| TimingError::invalid(format!("invalid utc offset: {minutes} minutes")))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar day of `instant` in the reference timezone.
    pub fn local_date(&self, instant: Instant) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn is_weekend_day(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_weekend(&self, instant: Instant) -> bool {
        Self::is_weekend_day(self.local_date(instant))
    }

    /// 00:00 of `date` in the reference timezone, as an instant.
    pub fn start_of_day(&self, date: NaiveDate) -> Result<Instant, TimingError> {
        let shift = TimeDelta::seconds(i64::from(self.offset.local_minus_utc()));
        date.and_time(NaiveTime::MIN)
            .checked_sub_signed(shift)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| TimingError::invalid(format!("{date} is outside the supported range")))
    }

    /// Start of the first non-weekend day strictly after `instant`'s day.
    pub fn next_business_day(&self, instant: Instant) -> Result<Instant, TimingError> {
        let mut day = next_date(self.local_date(instant))?;
        while Self::is_weekend_day(day) {
            day = next_date(day)?;
        }
        self.start_of_day(day)
    }
}

pub(crate) fn next_date(date: NaiveDate) -> Result<NaiveDate, TimingError> {
    date.succ_opt()
        .ok_or_else(|| TimingError::invalid(format!("no calendar day after {date}")))
}
