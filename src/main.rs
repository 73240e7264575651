use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::warn;

use crate::{
    error::Error,
    portal::{
        models::{Direction, ExportOptions},
        replay::ReplayView,
        WebExporter,
    },
    utils::{models::FixedZone, parse_utc_offset},
};

mod csv;
mod error;
mod filter;
mod ics;
mod info;
mod pdf;
mod portal;
mod timetable;
mod utils;

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// User-Agent used to fetch pages given as URLs
    #[clap(long, global = true, value_name = "USER AGENT")]
    user_agent: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Export weekly schedule pages of the portal to iCalendar (.ics)
    Web {
        /// Captured pages, files or URLs, in the order the navigation visits them
        #[clap(value_parser, required = true, value_name = "CAPTURE")]
        captures: Vec<String>,

        /// Number of weeks to export, default to one per capture
        #[clap(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        weeks: Option<u32>,

        /// Walk through the weeks forward or backward
        #[clap(short, long, value_enum, default_value_t = Direction::Forward)]
        direction: Direction,

        /// Time a week change takes to show up, in milliseconds
        #[clap(long, default_value_t = 2200, value_parser = clap::value_parser!(u64).range(1..))]
        poll_delay_ms: u64,

        /// TZID of the calendar
        #[clap(long, default_value = "Asia/Singapore")]
        tzid: String,

        /// Short name of the timezone
        #[clap(long, default_value = "SGT")]
        tz_name: String,

        /// Fixed UTC offset of the timezone
        #[clap(long, default_value = "+08:00", value_parser = parse_utc_offset, allow_hyphen_values = true)]
        utc_offset: chrono::FixedOffset,

        /// Start of the exported file name
        #[clap(short, long, default_value = "sutd_schedule")]
        prefix: String,

        /// Directory of the exported file
        #[clap(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// If the exported ICS file should not use the timezone
        #[clap(short, long)]
        no_tz: bool,
    },

    /// Export a PDF timetable to CSV
    Pdf {
        /// The PDF timetable, default to the only PDF of the current directory
        #[clap(value_parser)]
        pdf: Option<PathBuf>,

        /// CSV file to write
        #[clap(short, long, default_value = "class_schedule.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let user_agent = args
        .user_agent
        .unwrap_or_else(|| format!("classcal/{}", env!("CARGO_PKG_VERSION")));

    let result = match args.command {
        Command::Web {
            captures,
            weeks,
            direction,
            poll_delay_ms,
            tzid,
            tz_name,
            utc_offset,
            prefix,
            output_dir,
            no_tz,
        } => match weeks_to_export(weeks, captures.len()) {
            Ok(weeks) => {
                let options = ExportOptions {
                    weeks,
                    direction,
                    poll_delay: Duration::from_millis(poll_delay_ms),
                    zone: FixedZone {
                        id: tzid,
                        name: tz_name,
                        offset: utc_offset,
                    },
                    with_tz: !no_tz,
                    filename_prefix: prefix,
                    output_dir,
                };
                web(&captures, options, &user_agent).await
            }
            Err(err) => Err(err),
        },
        Command::Pdf { pdf, output } => pdf_to_csv(pdf, &output),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
    }
}

async fn web(captures: &[String], options: ExportOptions, user_agent: &str) -> Result<(), Error> {
    println!("Loading {} schedule page(s)...", captures.len());
    let mut view = ReplayView::load(captures, user_agent).await?;

    let exporter = WebExporter::new(options);
    let events = exporter.export_to_calendar(&mut view).await?;
    if events.is_empty() {
        println!("No class found, nothing exported.");
    }

    Ok(())
}

/// One capture per week, every capture when not given
fn weeks_to_export(weeks: Option<u32>, captures: usize) -> Result<u32, Error> {
    let available = u32::try_from(captures).unwrap_or(u32::MAX);
    match weeks {
        None => Ok(available),
        Some(weeks) if weeks <= available => Ok(weeks),
        Some(weeks) => Err(Error::NotEnoughCaptures { weeks, captures }),
    }
}

fn pdf_to_csv(given: Option<PathBuf>, output: &std::path::Path) -> Result<(), Error> {
    let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
    let path = pdf::source::resolve_input(given, &cwd)?;

    println!("Reading {}...", path.display());
    let pages = pdf::source::extract_rows(&path)?;
    let events = pdf::events(&pages);

    if events.is_empty() {
        warn!("No class row recognised in {}", path.display());
        println!("No class found, nothing exported.");
        return Ok(());
    }

    csv::export(&events, output)?;
    println!("Exported {} events → {}", events.len(), output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn web_defaults() {
        let args = Args::parse_from(["classcal", "web", "week1.html"]);
        let Command::Web {
            weeks,
            direction,
            poll_delay_ms,
            utc_offset,
            ..
        } = args.command
        else {
            panic!("expected the web command");
        };
        assert_eq!(weeks, None);
        assert_eq!(direction, Direction::Forward);
        assert_eq!(poll_delay_ms, 2200);
        assert_eq!(utc_offset.local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn zero_weeks_rejected() {
        assert!(Args::try_parse_from(["classcal", "web", "-w", "0", "week1.html"]).is_err());
    }

    #[test]
    fn weeks_follow_the_captures() {
        assert_eq!(weeks_to_export(None, 2).unwrap(), 2);
        assert_eq!(weeks_to_export(Some(1), 2).unwrap(), 1);
        assert_eq!(weeks_to_export(Some(2), 2).unwrap(), 2);
    }

    #[test]
    fn more_weeks_than_captures_rejected() {
        let err = weeks_to_export(Some(14), 2).unwrap_err();
        assert!(matches!(
            err,
            Error::NotEnoughCaptures {
                weeks: 14,
                captures: 2
            }
        ));
    }

    #[test]
    fn pdf_output_default() {
        let args = Args::parse_from(["classcal", "pdf"]);
        let Command::Pdf { pdf, output } = args.command else {
            panic!("expected the pdf command");
        };
        assert_eq!(pdf, None);
        assert_eq!(output, PathBuf::from("class_schedule.csv"));
    }
}
