use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;

static WEEK_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Week of\s*(?P<day>[0-9]{1,2})/(?P<month>[0-9]{1,2})/(?P<year>[0-9]{4})")
        .unwrap()
});

static WEEK_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Week of\s*[0-9]{1,2}/[0-9]{1,2}/[0-9]{4}[^\n]*").unwrap());

/// Week label shown above the schedule, used to notice a week change
pub fn week_label(page_text: &str) -> Option<String> {
    WEEK_LABEL
        .find(page_text)
        .map(|label| label.as_str().chars().take(80).collect())
}

/// First day of the displayed week.
/// The portal writes the date day first: `Week of 1/9/2025` is the 1st of September.
pub fn week_start(page_text: &str) -> Result<NaiveDate, Error> {
    let missing = || Error::MissingAnchor("'Week of dd/mm/yyyy' on the page".to_owned());

    let captures = WEEK_OF.captures(page_text).ok_or_else(missing)?;
    let day = captures["day"].parse().map_err(|_| missing())?;
    let month = captures["month"].parse().map_err(|_| missing())?;
    let year = captures["year"].parse().map_err(|_| missing())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(missing)
}
