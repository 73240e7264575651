use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;

pub mod models;

/// `10:00AM`, `2:30 pm`, `12 : 05 PM`
static MERIDIEM_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?P<h>\d{1,2})\s*:\s*(?P<m>\d{2})\s*(?P<ampm>AM|PM)\b").unwrap());

/// `14:05`
static BARE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?P<h>\d{1,2}):(?P<m>\d{2})\b").unwrap());

static UTC_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<sign>[+-])(?P<h>\d{2}):?(?P<m>\d{2})$").unwrap());

/// Formats tried in order, the first one that parses wins
const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// Find a time of day in free text.
///
/// A 12-hour time with its AM/PM marker is preferred over a bare `HH:MM`
/// anywhere in the text; the bare form is read as 24-hour.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    if let Some(captures) = MERIDIEM_TIME.captures(text) {
        let hour: u32 = captures["h"].parse().ok()?;
        let minute: u32 = captures["m"].parse().ok()?;
        return to_24h(hour, minute, &captures["ampm"]);
    }

    let captures = BARE_TIME.captures(text)?;
    NaiveTime::from_hms_opt(captures["h"].parse().ok()?, captures["m"].parse().ok()?, 0)
}

/// 12 AM is midnight, 12 PM stays noon, other PM hours shift by 12
pub fn to_24h(hour: u32, minute: u32, meridiem: &str) -> Option<NaiveTime> {
    if !(1..=12).contains(&hour) {
        return None;
    }

    let hour = match (meridiem.to_ascii_uppercase().as_str(), hour) {
        ("AM", 12) => 0,
        ("AM", h) | ("PM", h @ 12) => h,
        ("PM", h) => h + 12,
        _ => return None,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parse a calendar date, month-first slashes win over day-first ones
/// so `03/04/2026` is the 4th of March
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Map a weekday abbreviation to its day.
///
/// Two-letter prefixes are checked first, then single letters. The single
/// letter table only knows `T` as Tuesday and `S` as Saturday (Thursday is `R`,
/// Sunday has no single letter).
pub fn map_weekday_abbreviation(text: &str) -> Option<Weekday> {
    let lower = text.trim().to_lowercase();

    let two: String = lower.chars().take(2).collect();
    let by_two = match two.as_str() {
        "mo" => Some(Weekday::Mon),
        "tu" => Some(Weekday::Tue),
        "we" => Some(Weekday::Wed),
        "th" => Some(Weekday::Thu),
        "fr" => Some(Weekday::Fri),
        "sa" => Some(Weekday::Sat),
        "su" => Some(Weekday::Sun),
        _ => None,
    };
    if by_two.is_some() {
        return by_two;
    }

    match lower.chars().next()? {
        'm' => Some(Weekday::Mon),
        't' => Some(Weekday::Tue),
        'w' => Some(Weekday::Wed),
        'r' => Some(Weekday::Thu),
        'f' => Some(Weekday::Fri),
        's' => Some(Weekday::Sat),
        _ => None,
    }
}

/// Parse `+08:00`, `+0800` or `-0530` into an offset
pub fn parse_utc_offset(text: &str) -> Result<FixedOffset, String> {
    let captures = UTC_OFFSET
        .captures(text.trim())
        .ok_or_else(|| format!("`{text}` isn't an offset like +08:00"))?;

    let hours: i32 = captures["h"].parse().map_err(|_| text.to_owned())?;
    let minutes: i32 = captures["m"].parse().map_err(|_| text.to_owned())?;
    let seconds = (hours * 60 + minutes) * 60;
    let seconds = if &captures["sign"] == "-" { -seconds } else { seconds };

    FixedOffset::east_opt(seconds).ok_or_else(|| format!("`{text}` is out of range"))
}

/// First characters of a row or cell, for diagnostics
pub fn preview(text: &str) -> String {
    const LENGTH: usize = 60;
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > LENGTH {
        format!("{}…", flat.chars().take(LENGTH).collect::<String>())
    } else {
        flat
    }
}

/// How long and how often to wait for the page to settle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Policy used after a week navigation, derived from the configured delay
    pub fn for_delay(delay: Duration) -> Self {
        Self {
            interval: (delay / 6).max(Duration::from_millis(250)),
            max_attempts: 40,
        }
    }
}

/// Sleep then check `ready`, until it holds or the attempts run out.
/// Returns whether the condition was met.
pub async fn poll_until<F>(policy: PollPolicy, mut ready: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..policy.max_attempts {
        tokio::time::sleep(policy.interval).await;
        if ready() {
            return true;
        }
    }

    false
}

/// Get a captured schedule page
pub async fn get_webpage(url: &str, user_agent: &str) -> Result<String, Error> {
    let fetch_error = |source| Error::Fetch {
        url: url.to_owned(),
        source,
    };

    // Use custom User-Agent
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(fetch_error)?;

    client
        .get(url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(fetch_error)?
        .text()
        .await
        .map_err(fetch_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn hm(hour: u32, minute: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    #[test_case("12:00 AM", hm(0, 0) ; "midnight")]
    #[test_case("12:00 PM", hm(12, 0) ; "noon")]
    #[test_case("01:15 PM", hm(13, 15) ; "afternoon")]
    #[test_case("10:00AM", hm(10, 0) ; "no space")]
    #[test_case("2:30   pm", hm(14, 30) ; "lower case wide spacing")]
    #[test_case("14:05", hm(14, 5) ; "24 hour")]
    #[test_case("0:45", hm(0, 45) ; "24 hour midnight")]
    #[test_case("13:00 PM", None ; "pm hour out of range")]
    #[test_case("25:00", None ; "hour out of range")]
    #[test_case("noon", None ; "no time")]
    fn time_of_day(text: &str, expected: Option<NaiveTime>) {
        assert_eq!(parse_time_of_day(text), expected);
    }

    #[test]
    fn meridiem_time_wins_over_earlier_bare_time() {
        assert_eq!(parse_time_of_day("room 09:30 then 1:00 PM"), hm(13, 0));
    }

    #[test_case("01/19/2026", NaiveDate::from_ymd_opt(2026, 1, 19) ; "month first")]
    #[test_case("19/01/2026", NaiveDate::from_ymd_opt(2026, 1, 19) ; "day first fallback")]
    #[test_case("03/04/2026", NaiveDate::from_ymd_opt(2026, 3, 4) ; "ambiguous reads month first")]
    #[test_case("2026-01-05", NaiveDate::from_ymd_opt(2026, 1, 5) ; "iso")]
    #[test_case(" 1/5/2026 ", NaiveDate::from_ymd_opt(2026, 1, 5) ; "short and padded")]
    #[test_case("31/31/2026", None ; "impossible")]
    #[test_case("Jan 5", None ; "words")]
    fn calendar_date(text: &str, expected: Option<NaiveDate>) {
        assert_eq!(parse_calendar_date(text), expected);
    }

    #[test_case("Mo", Some(Weekday::Mon))]
    #[test_case("M", Some(Weekday::Mon))]
    #[test_case("tuesday", Some(Weekday::Tue))]
    #[test_case("T", Some(Weekday::Tue))]
    #[test_case("We", Some(Weekday::Wed))]
    #[test_case("THU", Some(Weekday::Thu))]
    #[test_case("R", Some(Weekday::Thu))]
    #[test_case("F", Some(Weekday::Fri))]
    #[test_case("Sa", Some(Weekday::Sat))]
    #[test_case("S", Some(Weekday::Sat))]
    #[test_case("Sunday", Some(Weekday::Sun))]
    #[test_case("X", None)]
    #[test_case("", None)]
    fn weekday_abbreviation(text: &str, expected: Option<Weekday>) {
        assert_eq!(map_weekday_abbreviation(text), expected);
    }

    #[test]
    fn utc_offsets() {
        assert_eq!(parse_utc_offset("+08:00").unwrap().local_minus_utc(), 8 * 3600);
        assert_eq!(parse_utc_offset("-0530").unwrap().local_minus_utc(), -(5 * 3600 + 1800));
        assert!(parse_utc_offset("8").is_err());
    }

    #[test]
    fn preview_is_flat_and_bounded() {
        assert_eq!(preview("a\n  b"), "a b");
        assert_eq!(preview(&"x".repeat(80)).chars().count(), 61);
    }

    #[test]
    fn poll_interval_has_a_floor() {
        assert_eq!(
            PollPolicy::for_delay(Duration::from_millis(600)).interval,
            Duration::from_millis(250)
        );
        assert_eq!(
            PollPolicy::for_delay(Duration::from_millis(3000)).interval,
            Duration::from_millis(500)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn poll_stops_when_ready() {
        let mut calls = 0;
        let policy = PollPolicy {
            interval: Duration::from_millis(10),
            max_attempts: 5,
        };
        let ready = poll_until(policy, || {
            calls += 1;
            calls == 3
        })
        .await;
        assert!(ready);
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_gives_up_after_budget() {
        let mut calls = 0;
        let policy = PollPolicy {
            interval: Duration::from_millis(10),
            max_attempts: 4,
        };
        let ready = poll_until(policy, || {
            calls += 1;
            false
        })
        .await;
        assert!(!ready);
        assert_eq!(calls, 4);
    }
}
