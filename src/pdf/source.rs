use std::{
    io::IsTerminal,
    path::{Path, PathBuf},
};

use dialoguer::Select;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;

use super::Row;

/// Columns are at least two spaces or a tab apart
static CELL_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+| {2,}").unwrap());

/// Pages of the PDF as rows of text cells
pub fn extract_rows(path: &Path) -> Result<Vec<Vec<Row>>, Error> {
    let owned = path.to_path_buf();
    // pdf_extract can panic on malformed PDFs
    let text = std::panic::catch_unwind(move || pdf_extract::extract_text(&owned))
        .map_err(|_| Error::Pdf {
            path: path.to_path_buf(),
            reason: "the PDF reader crashed".to_owned(),
        })?
        .map_err(|e| Error::Pdf {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    debug!("{} characters read from {}", text.len(), path.display());
    Ok(split_pages(&text))
}

/// Split extracted text on form feeds, lines and wide gaps
pub fn split_pages(text: &str) -> Vec<Vec<Row>> {
    text.split('\u{c}')
        .map(|page| page.lines().filter_map(split_cells).collect::<Vec<_>>())
        .filter(|rows| !rows.is_empty())
        .collect()
}

fn split_cells(line: &str) -> Option<Row> {
    let cells: Row = CELL_GAP
        .split(line.trim())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    (!cells.is_empty()).then_some(cells)
}

/// PDF files directly inside `dir`, sorted by name
pub fn find_pdfs(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();

    Ok(pdfs)
}

/// The PDF to read: the one given, else the only one in `dir`.
/// With several candidates, ask when a terminal is there to answer.
pub fn resolve_input(given: Option<PathBuf>, dir: &Path) -> Result<PathBuf, Error> {
    if let Some(path) = given {
        return Ok(path);
    }

    let mut pdfs = find_pdfs(dir)?;
    match pdfs.len() {
        0 => Err(Error::NoInput),
        1 => Ok(pdfs.remove(0)),
        _ if std::io::stdin().is_terminal() => {
            let names: Vec<String> = pdfs.iter().map(|p| p.display().to_string()).collect();
            let choice = Select::new()
                .with_prompt("Several PDF files found, pick the timetable")
                .items(&names)
                .default(0)
                .interact()?;
            Ok(pdfs.remove(choice))
        }
        _ => Err(Error::AmbiguousInput(pdfs)),
    }
}
