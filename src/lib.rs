//! Business-calendar stage-time and SLA engine.
//!
//! Measures elapsed business hours (weekends excluded), derives how long a
//! work item has spent in its workflow stage, classifies that time against
//! configured thresholds and projects deadlines forward in business time.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use stagetime::{BusinessCalendar, FixedClock, SlaClassifier, SlaState, StageClock,
//!     StageThresholds, WorkItemTimingContext};
//!
//! let monday = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
//! let wednesday = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
//!
//! let sla = SlaClassifier::new(StageClock::new(BusinessCalendar::utc(), FixedClock::new(wednesday)));
//! let item = WorkItemTimingContext {
//!     created_at: Some(monday),
//!     current_stage: "Preparation".into(),
//!     ..Default::default()
//! };
//! let thresholds = StageThresholds { max_instance_time: Some(40.0), max_total_time: None };
//!
//! let status = sla.classify(&item, &thresholds);
//! assert_eq!(status.instance_hours, Some(48.0));
//! assert_eq!(status.state, SlaState::BehindSchedule);
//! ```

pub mod calendar;
pub mod clock;
pub mod config;
mod deadline;
pub mod duration;
pub mod error;
pub mod instant;
pub mod item;
pub mod sla;
pub mod stage;

pub use calendar::BusinessCalendar;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::StagetimeConfig;
pub use duration::round_hours;
pub use error::{StagetimeError, TimingError};
pub use instant::{Instant, parse_instant};
pub use item::ItemRecord;
pub use sla::{
    SlaClassifier, SlaState, SlaStatus, StageThresholds, WorkItemTimingContext, exceeds_budget,
};
pub use stage::{ChronologyEntry, StageClock, StageTimeReport};
