use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::Error,
    filter, ics, info,
    timetable::models::{Event, WeekSnapshot},
    utils::{self, poll_until, preview, PollPolicy},
};

use self::models::{Cell, Direction, ExportOptions, Rect, RenderedSchedule};

pub mod models;
pub mod replay;

/// h1:m1 ampm1 - h2:m2 ampm2
static TIME_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?P<h1>\d{1,2}):(?P<m1>\d{2})\s*(?P<ampm1>AM|PM)\s*-\s*(?P<h2>\d{1,2}):(?P<m2>\d{2})\s*(?P<ampm2>AM|PM)\b",
    )
    .unwrap()
});

/// `10.021 - LEC01`, first line of every event
static COURSE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*\d{1,2}\s*\.\s*\d{3}\s*-\s*[A-Z0-9]{2,}\b").unwrap());

static DAY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)\b").unwrap()
});

static INSTRUCTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Instructors?:?").unwrap());

static DOT_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\.\s*").unwrap());

/// The page showing the weekly schedule, driven by the exporter.
///
/// Browsers are out of this crate, see [`replay::ReplayView`] for
/// a view over pages captured beforehand.
pub trait ScheduleView {
    /// Visible text of the whole page
    fn page_text(&self) -> String;

    /// Content of the schedule container, `None` if it isn't on the page
    fn schedule(&self) -> Option<RenderedSchedule>;

    /// Press the week navigation control.
    /// The page may update later, the exporter waits for it.
    fn navigate(&mut self, direction: Direction) -> Result<(), Error>;
}

/// Horizontal centers of the Monday to Sunday headers, left to right
pub fn day_centers(headers: &[Cell]) -> Result<Vec<f64>, Error> {
    let mut centers: Vec<f64> = headers
        .iter()
        .filter(|header| DAY_NAME.is_match(&header.text))
        .map(|header| header.rect.center_x())
        .collect();
    centers.sort_by(f64::total_cmp);
    centers.truncate(7);

    if centers.len() < 7 {
        return Err(Error::MissingAnchor(format!(
            "Monday to Sunday headers (only {} found)",
            centers.len()
        )));
    }

    Ok(centers)
}

/// Index of the day column (0 is Monday) closest to the cell
pub fn day_index(cell: &Rect, centers: &[f64]) -> usize {
    let cx = cell.center_x();
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, center) in centers.iter().enumerate() {
        let distance = (cx - center).abs();
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }

    best
}

/// `10 . 021  -  LEC01` to `10.021 - LEC01`
pub fn clean_course_line(line: &str) -> String {
    DOT_SPACING
        .replace_all(line, ".")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn time_of(hour: &str, minute: &str, meridiem: &str) -> Option<chrono::NaiveTime> {
    utils::to_24h(hour.parse().ok()?, minute.parse().ok()?, meridiem)
}

/// Read one event out of a schedule cell's text.
/// Returns `None` if the text doesn't look like a class.
pub fn extract_event(
    fragment: &Cell,
    week_start: NaiveDate,
    centers: &[f64],
) -> Option<Event> {
    let lines: Vec<&str> = fragment
        .text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let first = lines.first()?;
    if !COURSE_LINE.is_match(first) {
        debug!("Not a course: {}", preview(&fragment.text));
        return None;
    }

    let Some((time_idx, captures)) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| TIME_RANGE.captures(line).map(|c| (i, c)))
    else {
        debug!("No time range: {}", preview(&fragment.text));
        return None;
    };

    let (Some(start_time), Some(end_time)) = (
        time_of(&captures["h1"], &captures["m1"], &captures["ampm1"]),
        time_of(&captures["h2"], &captures["m2"], &captures["ampm2"]),
    ) else {
        warn!("Invalid time range: {}", preview(&fragment.text));
        return None;
    };

    let offset = i64::try_from(day_index(&fragment.rect, centers)).ok()?;
    let date = week_start + Duration::days(offset);

    let course = clean_course_line(first);
    let summary = [Some(course.as_str()), lines.get(1).copied(), lines.get(2).copied()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" - ");

    let location = lines[time_idx + 1..]
        .iter()
        .find(|line| !INSTRUCTOR.is_match(line))
        .map(|line| (*line).to_owned());

    let event = Event::new(
        summary,
        date.and_time(start_time),
        date.and_time(end_time),
        location,
        Some(lines.join("\n")),
    );
    if event.is_none() {
        warn!("Class ends before it starts: {}", preview(&fragment.text));
    }

    event
}

/// Read all the events of the displayed week
pub fn scrape_week<V: ScheduleView + ?Sized>(view: &V) -> Result<WeekSnapshot, Error> {
    let week_start = info::week_start(&view.page_text())?;

    let schedule = view
        .schedule()
        .ok_or_else(|| Error::MissingAnchor("#WEEKLY_SCHED_HTMLAREA".to_owned()))?;

    let centers = day_centers(&schedule.headers)?;

    let events = schedule
        .fragments
        .iter()
        .filter_map(|fragment| extract_event(fragment, week_start, &centers))
        .collect();

    Ok(WeekSnapshot {
        week_start,
        events: filter::dedupe(events),
    })
}

/// Exports several weeks of the portal into one calendar file
pub struct WebExporter {
    options: ExportOptions,
}

impl WebExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// `{prefix}_{yyyymmdd}_{weeks}w.ics`
    pub fn filename(&self, first_week: Option<NaiveDate>) -> String {
        let date = first_week.map_or_else(
            || "export".to_owned(),
            |date| date.format("%Y%m%d").to_string(),
        );

        format!(
            "{}_{date}_{}w.ics",
            self.options.filename_prefix, self.options.weeks
        )
    }

    /// Scrape the configured weeks, write them in an ICS file and
    /// return the events written. Nothing is written without events.
    pub async fn export_to_calendar<V: ScheduleView>(&self, view: &mut V) -> Result<Vec<Event>, Error> {
        let total = self.options.weeks;
        let mut weeks = Vec::new();

        for i in 0..total {
            let before = info::week_label(&view.page_text());

            let snapshot = scrape_week(&*view)?;
            println!(
                "[{}/{total}] {} → {} events",
                i + 1,
                snapshot.week_start.format("%a %b %d %Y"),
                snapshot.events.len()
            );
            weeks.push(snapshot);

            if i + 1 < total {
                self.goto_next_week(view, before.as_deref()).await?;
            }
        }

        let first_week = weeks.first().map(|week| week.week_start);
        let events = filter::merge_weeks(weeks);

        if events.is_empty() {
            warn!("No class found in {total} week(s), no file written");
            return Ok(events);
        }

        let path = self.options.output_dir.join(self.filename(first_week));
        ics::export(&events, &path, &self.options.zone, self.options.with_tz)?;
        println!("Exported {} events → {}", events.len(), path.display());

        Ok(events)
    }

    /// Press the navigation control then wait for the new week.
    ///
    /// The page is ready once the week label changed and the schedule has
    /// cells again. If that never shows up, wait a bit more and go on anyway:
    /// the next scrape may then read the old week or a half-loaded one.
    async fn goto_next_week<V: ScheduleView>(
        &self,
        view: &mut V,
        before: Option<&str>,
    ) -> Result<(), Error> {
        view.navigate(self.options.direction)?;

        let policy = PollPolicy::for_delay(self.options.poll_delay);
        let view = &*view;
        let settled = poll_until(policy, || {
            let after = info::week_label(&view.page_text());
            let cells = view.schedule().map_or(0, |schedule| schedule.fragments.len());

            after.is_some() && after.as_deref() != before && cells > 0
        })
        .await;

        if settled {
            info!("Week changed to {:?}", info::week_label(&view.page_text()));
        } else {
            warn!(
                "Week didn't change after {} checks, continuing after {:?}",
                policy.max_attempts, self.options.poll_delay
            );
            tokio::time::sleep(self.options.poll_delay).await;
        }

        Ok(())
    }
}
