use std::{io::Write, path::Path};

use csv::WriterBuilder;

use crate::{error::Error, timetable::models::Event};

/// Columns understood by the usual calendar import tools
pub const HEADER: [&str; 9] = [
    "Subject",
    "Start Date",
    "Start Time",
    "End Date",
    "End Time",
    "All Day Event",
    "Description",
    "Location",
    "Private",
];

/// One row per event, dates as MM/DD/YYYY and times as hh:mm AM/PM
pub fn row(event: &Event) -> [String; 9] {
    let date = |dt: chrono::NaiveDateTime| dt.format("%m/%d/%Y").to_string();
    let time = |dt: chrono::NaiveDateTime| dt.format("%I:%M %p").to_string();

    [
        event.summary.clone(),
        date(event.start),
        time(event.start),
        date(event.end),
        time(event.end),
        "False".to_owned(),
        event.description.clone().unwrap_or_default(),
        event.location.clone().unwrap_or_default(),
        "False".to_owned(),
    ]
}

/// Write the header then the events
pub fn write<W: Write>(events: &[Event], writer: W) -> Result<(), Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(HEADER)?;
    for event in events {
        writer.write_record(row(event))?;
    }
    writer.flush().map_err(csv::Error::from)?;

    Ok(())
}

/// Write the events in a CSV file
pub fn export(events: &[Event], path: &Path) -> Result<(), Error> {
    let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
    write(events, file)
}
