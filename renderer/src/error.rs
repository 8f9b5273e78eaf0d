use std::path::PathBuf;

use docpage::metadata::MetadataError;
use docpage::parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("page has unresolved references: {}", .labels.join(", "))]
    Unresolved { labels: Vec<String> },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

/// Failures that stop a whole site build.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot walk source directory: {0}")]
    Walk(walkdir::Error),
    #[error("source directory not found: {0}")]
    MissingSource(PathBuf),
}

/// Why a single page was skipped during a build.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<ParseError>),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read entry: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{} is already built from {}", .output.display(), .claimed_by.display())]
    OutputConflict { output: PathBuf, claimed_by: PathBuf },
}
