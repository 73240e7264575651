use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// One concrete calendar entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Course code, name and kind of session, never empty
    pub summary: String,

    /// Local wall-clock start, always before `end`
    pub start: NaiveDateTime,

    pub end: NaiveDateTime,

    pub location: Option<String>,

    /// Free text, may hold several lines copied from the source
    pub description: Option<String>,
}

/// Fields two events must share to be the same entry
pub type EventKey<'a> = (&'a str, NaiveDateTime, NaiveDateTime, Option<&'a str>);

impl Event {
    /// Build an event, `None` when the summary is empty or the
    /// time window is empty or reversed
    pub fn new(
        summary: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        location: Option<String>,
        description: Option<String>,
    ) -> Option<Self> {
        let summary = summary.into();
        if summary.trim().is_empty() || start >= end {
            return None;
        }

        Some(Self {
            summary,
            start,
            end,
            location: location.filter(|l| !l.trim().is_empty()),
            description: description.filter(|d| !d.trim().is_empty()),
        })
    }

    /// Entry's key used for finding duplicates
    pub fn key(&self) -> EventKey<'_> {
        (
            &self.summary,
            self.start,
            self.end,
            self.location.as_deref(),
        )
    }
}

/// A class repeating every week on the same day over a date range
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecurrenceRecord {
    pub subject: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// First day of the range, included
    pub range_start: NaiveDate,
    /// Last day of the range, included
    pub range_end: NaiveDate,
}

/// Events shown in one week of the portal
#[derive(Clone, Debug)]
pub struct WeekSnapshot {
    /// Monday of the displayed week
    pub week_start: NaiveDate,
    pub events: Vec<Event>,
}
