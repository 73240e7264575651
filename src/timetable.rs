use chrono::{Datelike, Duration};
use log::{debug, warn};

use self::models::{Event, RecurrenceRecord};

pub mod models;

/// Turn a weekly class into one event per day it happens.
///
/// Every day of the range is visited, so a range that doesn't start on the
/// class' weekday is handled too. Dates come out in ascending order.
pub fn expand(rule: &RecurrenceRecord) -> Vec<Event> {
    if rule.range_start > rule.range_end {
        warn!(
            "{}: range {} → {} is reversed, no occurrence",
            rule.subject, rule.range_start, rule.range_end
        );
        return vec![];
    }
    if rule.start_time >= rule.end_time {
        warn!(
            "{}: ends at {} before starting at {}, skipped",
            rule.subject, rule.end_time, rule.start_time
        );
        return vec![];
    }

    let mut events = Vec::new();
    let mut date = rule.range_start;
    while date <= rule.range_end {
        if date.weekday() == rule.weekday {
            if let Some(event) = Event::new(
                rule.subject.clone(),
                date.and_time(rule.start_time),
                date.and_time(rule.end_time),
                rule.location.clone(),
                rule.description.clone(),
            ) {
                events.push(event);
            }
        }
        date += Duration::days(1);
    }

    if events.is_empty() {
        debug!(
            "{}: no {} between {} and {}",
            rule.subject, rule.weekday, rule.range_start, rule.range_end
        );
    }

    events
}

/// Expand all the weekly classes, keeping their order
pub fn build(rules: &[RecurrenceRecord]) -> Vec<Event> {
    rules.iter().flat_map(expand).collect()
}
