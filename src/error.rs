use std::path::PathBuf;

/// Fatal errors, anything here stops the current run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A structural element of the schedule page is missing
    #[error("Can't find {0}")]
    MissingAnchor(String),

    #[error("Can't read/write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{weeks} week(s) asked but only {captures} page(s) captured")]
    NotEnoughCaptures { weeks: u32, captures: usize },

    #[error("Can't reach {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Can't extract text from {}: {reason}", .path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("No PDF file given and none found in the current directory")]
    NoInput,

    #[error("Several PDF files found, pass one explicitly: {}", list_paths(.0))]
    AmbiguousInput(Vec<PathBuf>),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_anchor_names_the_anchor() {
        let err = Error::MissingAnchor("#WEEKLY_SCHED_HTMLAREA".into());
        assert_eq!(err.to_string(), "Can't find #WEEKLY_SCHED_HTMLAREA");
    }

    #[test]
    fn ambiguous_input_lists_candidates() {
        let err = Error::AmbiguousInput(vec!["a.pdf".into(), "b.pdf".into()]);
        assert!(err.to_string().ends_with("a.pdf, b.pdf"));
    }
}
