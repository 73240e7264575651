use std::path::Path;

use chrono::{NaiveDateTime, Utc};
use ics::{
    components::Property,
    escape_text,
    parameters::TzIDParam,
    properties::{CalScale, Description, DtEnd, DtStart, Location, Method, Summary, TzName},
    Event as IcsEvent, ICalendar, Standard, TimeZone,
};

use crate::{error::Error, timetable::models::Event, utils::models::FixedZone};

const PRODID: &str = "-//SUTD//MyPortal Weekly Schedule Export//EN";
const UID_DOMAIN: &str = "sutd-myportal";
/// Octets per content line, CRLF excluded
const MAX_LINE: usize = 75;

/// Write the events in an iCalendar file
pub fn export(events: &[Event], path: &Path, zone: &FixedZone, with_tz: bool) -> Result<(), Error> {
    std::fs::write(path, render(events, zone, with_tz)).map_err(|e| Error::io(path, e))
}

/// Calendar as text, lines folded and ended by CRLF
pub fn render(events: &[Event], zone: &FixedZone, with_tz: bool) -> String {
    fold(&build(events, zone, with_tz).to_string())
}

/// Fold content lines at 75 octets, continuation lines included
/// (leading space counted), never inside a UTF-8 sequence
fn fold(text: &str) -> String {
    let unfolded = text.replace("\r\n ", "");
    let mut folded = String::with_capacity(unfolded.len() + unfolded.len() / 70 * 3);

    for line in unfolded.split_terminator("\r\n") {
        let mut len = 0;
        for c in line.chars() {
            if len + c.len_utf8() > MAX_LINE {
                folded.push_str("\r\n ");
                len = 1;
            }
            folded.push(c);
            len += c.len_utf8();
        }
        folded.push_str("\r\n");
    }

    folded
}

/// Build the calendar, with a fixed offset VTIMEZONE when `with_tz`
pub fn build<'a>(events: &'a [Event], zone: &'a FixedZone, with_tz: bool) -> ICalendar<'a> {
    let mut calendar = ICalendar::new("2.0", PRODID);
    calendar.push(CalScale::new("GREGORIAN"));
    calendar.push(Method::new("PUBLISH"));

    if with_tz {
        let offset = zone.ical_offset();
        let mut standard = Standard::new("19700101T000000", offset.clone(), offset);
        standard.push(TzName::new(zone.name.as_str()));

        let mut timezone = TimeZone::standard(zone.id.as_str(), standard);
        timezone.push(Property::new("X-LIC-LOCATION", zone.id.as_str()));
        calendar.add_timezone(timezone);
    }

    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

    for event in events {
        let mut entry = IcsEvent::new(uid(event, zone), dtstamp.clone());

        let mut start = DtStart::new(dt_ical(event.start));
        let mut end = DtEnd::new(dt_ical(event.end));
        if with_tz {
            start.add(TzIDParam::new(zone.id.as_str()));
            end.add(TzIDParam::new(zone.id.as_str()));
        }
        entry.push(start);
        entry.push(end);

        entry.push(Summary::new(escape_text(event.summary.as_str())));
        if let Some(location) = &event.location {
            entry.push(Location::new(escape_text(location.as_str())));
        }
        if let Some(description) = &event.description {
            entry.push(Description::new(escape_text(description.as_str())));
        }

        calendar.add_event(entry);
    }

    calendar
}

/// Local wall-clock time, without offset
fn dt_ical(dt: NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

/// Stable identifier computed from the event, so exporting twice
/// gives the same UIDs
pub fn uid(event: &Event, zone: &FixedZone) -> String {
    let utc = |dt| zone.to_utc(dt).format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
    let base = format!(
        "{}|{}|{}|{}",
        event.summary,
        utc(event.start),
        utc(event.end),
        event.location.as_deref().unwrap_or_default()
    );

    format!("{:x}@{UID_DOMAIN}", djb2(&base))
}

fn djb2(text: &str) -> u32 {
    text.chars().fold(5381_u32, |hash, c| {
        hash.wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(u32::from(c))
    })
}
