mod chronology;
mod cumulative;
mod instance;

pub use chronology::{ChronologyEntry, sorted_newest_first};
pub use cumulative::StageTimeReport;
pub use instance::StageClock;
