use chrono::Weekday;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    filter, timetable,
    timetable::models::{Event, RecurrenceRecord},
    utils::{map_weekday_abbreviation, parse_calendar_date, parse_time_of_day, preview},
};

pub mod source;

/// Cells of one table row
pub type Row = Vec<String>;

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}/\d{1,2}/\d{4}|\d{4}-\d{2}-\d{2})\b").unwrap());

static TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}").unwrap());

/// A cell holding nothing but a day
static DAY_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues?|wed|thu(rs?)?|fri|sat|sun|mo|tu|we|th|fr|sa|su|m|t|w|r|f|s)\.?$",
    )
    .unwrap()
});

/// A day somewhere in a longer text. Single letters are upper case and
/// stand alone between spaces, so the `M` of `A.M.` isn't a Monday.
static DAY_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?P<day>(?i:(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*)|Mo|Tu|We|Th|Fr|Sa|Su)\b|(?:^|\s)(?P<letter>[MTWRFS])(?:\s|$)",
    )
    .unwrap()
});

/// Room number like `1.501`
static ROOM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d\.\d{3}").unwrap());

/// Why a row wasn't turned into a weekly class
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("not a class row ({dates} date(s), {times} time(s))")]
    NotCandidate { dates: usize, times: usize },

    #[error("can't read date `{0}`")]
    BadDate(String),

    #[error("no cell with a time range")]
    NoTimeCell,

    #[error("can't read time range `{0}`")]
    BadTime(String),

    #[error("no day of the week")]
    NoWeekday,

    #[error("no subject")]
    NoSubject,
}

/// Read a weekly class out of a table row.
///
/// The row needs two dates (first is the start of the range, second the end)
/// and a time range like `10:00 AM - 11:30 AM`.
pub fn parse_row(row: &[String]) -> Result<RecurrenceRecord, RowError> {
    let text = row.join(" ");

    let dates: Vec<&str> = DATE.find_iter(&text).map(|m| m.as_str()).collect();
    let times = TIME.find_iter(&text).count();
    if dates.len() < 2 || times < 1 {
        return Err(RowError::NotCandidate {
            dates: dates.len(),
            times,
        });
    }

    let range_start =
        parse_calendar_date(dates[0]).ok_or_else(|| RowError::BadDate(dates[0].to_owned()))?;
    let range_end =
        parse_calendar_date(dates[1]).ok_or_else(|| RowError::BadDate(dates[1].to_owned()))?;

    let time_cell = row
        .iter()
        .find(|cell| TIME.is_match(cell) && cell.contains(is_dash))
        .ok_or(RowError::NoTimeCell)?;
    let (start, end) = time_cell
        .split_once(is_dash)
        .ok_or(RowError::NoTimeCell)?;
    let (Some(start_time), Some(end_time)) = (parse_time_of_day(start), parse_time_of_day(end))
    else {
        return Err(RowError::BadTime(time_cell.clone()));
    };

    let weekday = weekday_of(row, time_cell).ok_or(RowError::NoWeekday)?;

    let subject = row
        .iter()
        .take(2)
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if subject.is_empty() {
        return Err(RowError::NoSubject);
    }

    // course codes like `50.001` look like room numbers
    let location = row
        .iter()
        .skip(2)
        .find(|cell| cell.contains("Bldg") || ROOM.is_match(cell))
        .map(|cell| cell.trim().to_owned());

    let description = row
        .iter()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");

    Ok(RecurrenceRecord {
        subject,
        location,
        description: Some(description),
        weekday,
        start_time,
        end_time,
        range_start,
        range_end,
    })
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '–' | '—')
}

/// Day from its own cell, else from the time cell
fn weekday_of(row: &[String], time_cell: &str) -> Option<Weekday> {
    if let Some(day) = row
        .iter()
        .map(|cell| cell.trim())
        .find(|cell| DAY_CELL.is_match(cell))
    {
        return map_weekday_abbreviation(day);
    }

    DAY_WORD
        .captures(time_cell)
        .and_then(|caps| caps.name("day").or_else(|| caps.name("letter")))
        .and_then(|day| map_weekday_abbreviation(day.as_str()))
}

/// Read the weekly classes of every page, skipping the rows that don't fit
pub fn parse_table(pages: &[Vec<Row>]) -> Vec<RecurrenceRecord> {
    let mut records = Vec::new();

    for (page_idx, page) in pages.iter().enumerate() {
        for (row_idx, row) in page.iter().enumerate() {
            match parse_row(row) {
                Ok(record) => records.push(record),
                Err(err @ RowError::NotCandidate { .. }) => debug!(
                    "page {} row {}: {err}: {}",
                    page_idx + 1,
                    row_idx + 1,
                    preview(&row.join(" | "))
                ),
                Err(err) => warn!(
                    "page {} row {} skipped, {err}: {}",
                    page_idx + 1,
                    row_idx + 1,
                    preview(&row.join(" | "))
                ),
            }
        }
    }

    info!("{} weekly classes found", records.len());
    records
}

/// Every class occurrence of the document, without duplicates
pub fn events(pages: &[Vec<Row>]) -> Vec<Event> {
    let records = parse_table(pages);
    filter::dedupe(timetable::build(&records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|cell| (*cell).to_owned()).collect()
    }

    fn monday_row() -> Row {
        row(&[
            "50.001",
            "Information Systems",
            "LEC",
            "Mo",
            "10:00 AM - 11:30 AM",
            "Bldg 1 Lecture Theatre 1.501",
            "01/05/2026",
            "01/19/2026",
        ])
    }

    #[test]
    fn full_row() {
        let record = parse_row(&monday_row()).unwrap();

        assert_eq!(record.subject, "50.001 Information Systems");
        assert_eq!(record.weekday, Weekday::Mon);
        assert_eq!(record.start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(record.end_time, NaiveTime::from_hms_opt(11, 30, 0).unwrap());
        assert_eq!(record.range_start, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(record.range_end, NaiveDate::from_ymd_opt(2026, 1, 19).unwrap());
        assert_eq!(record.location.as_deref(), Some("Bldg 1 Lecture Theatre 1.501"));
        assert!(record.description.unwrap().starts_with("50.001 | Information Systems"));
    }

    #[test]
    fn weekday_from_time_cell() {
        let record = parse_row(&row(&[
            "10.021",
            "Intro to Design",
            "Thursday 14:00-16:00",
            "2.310",
            "2026-01-05",
            "2026-04-20",
        ]))
        .unwrap();

        assert_eq!(record.weekday, Weekday::Thu);
        assert_eq!(record.start_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(record.location.as_deref(), Some("2.310"));
    }

    #[test]
    fn compact_meridiem_range() {
        let mut cells = monday_row();
        cells[4] = "1:00PM-2:30PM".to_owned();
        let record = parse_row(&cells).unwrap();

        assert_eq!(record.start_time, NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(record.end_time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
    }

    #[test_case(&["Course", "Title", "Day", "Time", "Room", "Start", "End"] ; "header")]
    #[test_case(&["50.001", "IS", "Mo", "10:00 - 11:00", "1.501", "01/05/2026"] ; "one date")]
    #[test_case(&["50.001", "IS", "Mo", "1.501", "01/05/2026", "01/19/2026"] ; "no time")]
    fn not_candidates(cells: &[&str]) {
        assert!(matches!(
            parse_row(&row(cells)),
            Err(RowError::NotCandidate { .. })
        ));
    }

    #[test]
    fn unreadable_date() {
        let mut cells = monday_row();
        cells[6] = "13/13/2026".to_owned();
        assert_eq!(
            parse_row(&cells),
            Err(RowError::BadDate("13/13/2026".to_owned()))
        );
    }

    #[test]
    fn time_without_range() {
        let mut cells = monday_row();
        cells[4] = "10:00 AM".to_owned();
        assert_eq!(parse_row(&cells), Err(RowError::NoTimeCell));
    }

    #[test]
    fn missing_weekday() {
        let mut cells = monday_row();
        cells[3] = "Week 1-14".to_owned();
        assert_eq!(parse_row(&cells), Err(RowError::NoWeekday));
    }

    #[test]
    fn meridiem_dots_are_not_days() {
        let mut cells = monday_row();
        cells[3] = "Week 1-14".to_owned();
        cells[4] = "10:00 A.M. - 11:00 A.M.".to_owned();
        assert_eq!(parse_row(&cells), Err(RowError::NoWeekday));
    }

    #[test]
    fn lone_letter_in_time_cell() {
        let mut cells = monday_row();
        cells[3] = "Week 1-14".to_owned();
        cells[4] = "T 10:00 AM - 11:30 AM".to_owned();
        assert_eq!(parse_row(&cells).unwrap().weekday, Weekday::Tue);
    }

    #[test]
    fn single_letter_days_follow_the_table() {
        let mut cells = monday_row();
        cells[3] = "T".to_owned();
        assert_eq!(parse_row(&cells).unwrap().weekday, Weekday::Tue);
        cells[3] = "S".to_owned();
        assert_eq!(parse_row(&cells).unwrap().weekday, Weekday::Sat);
        cells[3] = "R".to_owned();
        assert_eq!(parse_row(&cells).unwrap().weekday, Weekday::Thu);
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let mut broken = monday_row();
        broken[7] = "99/99/2026".to_owned();
        let pages = vec![
            vec![row(&["Course", "Title", "Day"]), broken, monday_row()],
            vec![monday_row()],
        ];

        assert_eq!(parse_table(&pages).len(), 2);
        // the repeated row on page two collapses into the same three events
        assert_eq!(events(&pages).len(), 3);
    }
}
