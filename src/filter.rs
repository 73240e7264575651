use std::collections::HashSet;

use crate::timetable::models::{Event, WeekSnapshot};

/// Remove duplicated events, the first one seen is kept and the order
/// is left untouched otherwise
pub fn dedupe(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(events.len());

    for event in events {
        // Owned key, the event moves into `unique` right after
        let (summary, start, end, location) = event.key();
        if seen.insert((
            summary.to_owned(),
            start,
            end,
            location.map(ToOwned::to_owned),
        )) {
            unique.push(event);
        }
    }

    unique
}

/// Merge the scraped weeks into one calendar, sorted by start
pub fn merge_weeks(weeks: Vec<WeekSnapshot>) -> Vec<Event> {
    let mut events = dedupe(weeks.into_iter().flat_map(|week| week.events).collect());
    events.sort_by_key(|event| event.start);

    events
}
