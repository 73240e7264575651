use chrono::{FixedOffset, NaiveDateTime};

/// A timezone with a single UTC offset and no daylight saving
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedZone {
    /// TZID used in the calendar, i.e.: Asia/Singapore
    pub id: String,
    /// Short name, i.e.: SGT
    pub name: String,
    pub offset: FixedOffset,
}

impl Default for FixedZone {
    fn default() -> Self {
        Self {
            id: "Asia/Singapore".to_owned(),
            name: "SGT".to_owned(),
            offset: FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset"),
        }
    }
}

impl FixedZone {
    /// Offset as written in iCalendar, i.e.: +0800
    pub fn ical_offset(&self) -> String {
        let seconds = self.offset.local_minus_utc();
        let sign = if seconds < 0 { '-' } else { '+' };
        let minutes = seconds.abs() / 60;

        format!("{sign}{:02}{:02}", minutes / 60, minutes % 60)
    }

    /// Wall-clock time in this zone to UTC
    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        local - chrono::Duration::seconds(i64::from(self.offset.local_minus_utc()))
    }
}
