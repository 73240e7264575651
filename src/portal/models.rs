use std::{path::PathBuf, time::Duration};

use crate::utils::models::FixedZone;

/// Bounding box of something drawn on the page
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Horizontal middle of the box
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.
    }
}

/// A piece of text and where it sits
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub text: String,
    pub rect: Rect,
}

/// What the schedule container shows for one week
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedSchedule {
    /// Column headers, day names among them
    pub headers: Vec<Cell>,
    /// Text blocks inside the table cells, each one a candidate event.
    /// The box is the one of the enclosing cell.
    pub fragments: Vec<Cell>,
}

/// Which way to walk through the weeks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Direction {
    /// Next Week
    #[default]
    Forward,
    /// Previous Week
    Backward,
}

impl Direction {
    /// Id of the navigation button
    pub fn control_id(self) -> &'static str {
        match self {
            Self::Forward => "DERIVED_CLASS_S_SSR_NEXT_WEEK",
            Self::Backward => "DERIVED_CLASS_S_SSR_PREV_WEEK",
        }
    }

    /// Text of the navigation button
    pub fn control_label(self) -> &'static str {
        match self {
            Self::Forward => "Next Week",
            Self::Backward => "Previous Week",
        }
    }
}

/// Settings of a web export
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    /// How many weeks to scrape, at least one
    pub weeks: u32,
    pub direction: Direction,
    /// Expected time for a week change to show up
    pub poll_delay: Duration,
    pub zone: FixedZone,
    /// If the times are tied to `zone`, else they are floating
    pub with_tz: bool,
    pub filename_prefix: String,
    /// Where the calendar file is written
    pub output_dir: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            weeks: 14,
            direction: Direction::Forward,
            poll_delay: Duration::from_millis(2200),
            zone: FixedZone::default(),
            with_tz: true,
            filename_prefix: "sutd_schedule".to_owned(),
            output_dir: PathBuf::from("."),
        }
    }
}
