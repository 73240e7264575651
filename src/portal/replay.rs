use log::{info, warn};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::{error::Error, utils::get_webpage};

use super::{
    models::{Cell, Direction, Rect, RenderedSchedule},
    ScheduleView,
};

static SEL_SCHEDULE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#WEEKLY_SCHED_HTMLAREA").unwrap());
static SEL_TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static SEL_WITH_ID: Lazy<Selector> = Lazy::new(|| Selector::parse("[id]").unwrap());
static SEL_CONTROLS: Lazy<Selector> = Lazy::new(|| Selector::parse("input, button, a").unwrap());

/// Elements starting a new line in the visible text
const BLOCKS: [&str; 12] = [
    "div", "p", "tr", "table", "li", "ul", "h1", "h2", "h3", "h4", "form", "br",
];

/// Elements without visible text
const HIDDEN: [&str; 4] = ["head", "script", "style", "noscript"];

/// Weekly schedule pages saved from the portal, one per week.
///
/// Pressing the navigation control moves to the next capture, so the
/// captures must be given in the order the navigation visits them.
pub struct ReplayView {
    /// Where each page comes from and its HTML
    pages: Vec<(String, String)>,
    current: usize,
}

impl ReplayView {
    pub fn new(pages: Vec<(String, String)>) -> Self {
        Self { pages, current: 0 }
    }

    /// Read the captures, from files or `http(s)` URLs
    pub async fn load(sources: &[String], user_agent: &str) -> Result<Self, Error> {
        let mut pages = Vec::with_capacity(sources.len());
        for source in sources {
            let html = if source.starts_with("http://") || source.starts_with("https://") {
                get_webpage(source, user_agent).await?
            } else {
                tokio::fs::read_to_string(source)
                    .await
                    .map_err(|e| Error::io(source, e))?
            };
            pages.push((source.clone(), html));
        }

        Ok(Self::new(pages))
    }

    fn document(&self) -> Html {
        Html::parse_document(self.pages.get(self.current).map_or("", |page| page.1.as_str()))
    }
}

impl ScheduleView for ReplayView {
    fn page_text(&self) -> String {
        inner_text(self.document().root_element())
    }

    fn schedule(&self) -> Option<RenderedSchedule> {
        let document = self.document();
        let container = document.select(&SEL_SCHEDULE).next()?;

        Some(layout(container))
    }

    fn navigate(&mut self, direction: Direction) -> Result<(), Error> {
        let document = self.document();

        let by_id = document
            .select(&SEL_WITH_ID)
            .any(|element| element.value().id() == Some(direction.control_id()));
        let by_label = || {
            document.select(&SEL_CONTROLS).any(|element| {
                element
                    .value()
                    .attr("value")
                    .map_or_else(|| inner_text(element), ToOwned::to_owned)
                    .contains(direction.control_label())
            })
        };
        if !by_id && !by_label() {
            return Err(Error::MissingAnchor(format!(
                "{} button in the schedule page",
                direction.control_label()
            )));
        }

        if self.current + 1 < self.pages.len() {
            self.current += 1;
            info!("Showing {}", self.pages[self.current].0);
        } else {
            warn!("No capture left after {}", self.pages[self.current].0);
        }

        Ok(())
    }
}

/// Text as displayed: whitespace collapsed, block elements and `<br>` on their own lines
pub fn inner_text(element: ElementRef) -> String {
    let mut text = String::new();
    collect_text(element, &mut text);

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef, out: &mut String) {
    let name = element.value().name();
    if HIDDEN.contains(&name) {
        return;
    }
    let block = BLOCKS.contains(&name);
    if block {
        out.push('\n');
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            let mut words = text.split_whitespace().peekable();
            if words.peek().is_none() {
                if !text.is_empty() {
                    out.push(' ');
                }
                continue;
            }
            if text.starts_with(char::is_whitespace) {
                out.push(' ');
            }
            out.push_str(&words.collect::<Vec<_>>().join(" "));
            if text.ends_with(char::is_whitespace) {
                out.push(' ');
            }
        }
    }

    if block {
        out.push('\n');
    }
}

fn span_of(cell: ElementRef, attribute: &str) -> usize {
    cell.value()
        .attr(attribute)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(1)
        .max(1)
}

/// Place the table cells on a grid, honouring rowspan and colspan, and give
/// each one a box in grid units: one column is one unit wide.
#[allow(clippy::cast_precision_loss)]
pub fn layout(container: ElementRef) -> RenderedSchedule {
    let mut schedule = RenderedSchedule::default();
    // For each column, how many more rows are taken by a cell from above
    let mut taken: Vec<usize> = Vec::new();

    for (row_idx, row) in container.select(&SEL_TR).enumerate() {
        let mut col = 0;
        let cells = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"));

        for cell in cells {
            while taken.get(col).is_some_and(|rows| *rows > 0) {
                col += 1;
            }

            let colspan = span_of(cell, "colspan");
            let rowspan = span_of(cell, "rowspan");
            if taken.len() < col + colspan {
                taken.resize(col + colspan, 0);
            }
            taken[col..col + colspan].fill(rowspan);

            let rect = Rect {
                left: col as f64,
                top: row_idx as f64,
                width: colspan as f64,
                height: rowspan as f64,
            };

            if cell.value().name() == "th" {
                schedule.headers.push(Cell {
                    text: inner_text(cell),
                    rect,
                });
            } else {
                schedule.fragments.extend(
                    cell.children()
                        .filter_map(ElementRef::wrap)
                        .filter(|child| child.value().name() == "span")
                        .map(|span| Cell {
                            text: inner_text(span),
                            rect,
                        }),
                );
            }

            col += colspan;
        }

        for rows in &mut taken {
            *rows = rows.saturating_sub(1);
        }
    }

    schedule
}
