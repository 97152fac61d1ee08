use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One recorded day of progress, stored under `progressEntries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub date: NaiveDate, // serialized as "YYYY-MM-DD"
    pub progress: i64,
}

impl ProgressEntry {
    pub fn new(date: NaiveDate, progress: i64) -> Self {
        Self { date, progress }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayLabel {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayLabel {
    /// Monday-first week ordering.
    pub const ALL: [DayLabel; 7] = [
        DayLabel::Mon,
        DayLabel::Tue,
        DayLabel::Wed,
        DayLabel::Thu,
        DayLabel::Fri,
        DayLabel::Sat,
        DayLabel::Sun,
    ];

    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Mon => DayLabel::Mon,
            Weekday::Tue => DayLabel::Tue,
            Weekday::Wed => DayLabel::Wed,
            Weekday::Thu => DayLabel::Thu,
            Weekday::Fri => DayLabel::Fri,
            Weekday::Sat => DayLabel::Sat,
            Weekday::Sun => DayLabel::Sun,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayLabel::Mon => "Mon",
            DayLabel::Tue => "Tue",
            DayLabel::Wed => "Wed",
            DayLabel::Thu => "Thu",
            DayLabel::Fri => "Fri",
            DayLabel::Sat => "Sat",
            DayLabel::Sun => "Sun",
        }
    }
}

impl std::fmt::Display for DayLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One derived day of the weekly chart. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSlot {
    pub day: DayLabel,
    pub date: NaiveDate,
    pub progress: i64,
}
