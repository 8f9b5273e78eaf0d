use std::ops::Range;

use serde::Serialize;

/// Where a link or image points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkTarget {
    /// A destination URL, either inline or produced by resolution.
    Url { url: String },
    /// A reference-style link still waiting for its definition:
    /// `[text][label]`, `[label][]` or `[label]`.
    Reference { label: String, span: Range<usize> },
}

impl LinkTarget {
    pub fn url(url: impl Into<String>) -> Self {
        LinkTarget::Url { url: url.into() }
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            LinkTarget::Url { url } => Some(url),
            LinkTarget::Reference { .. } => None,
        }
    }
}

/// A `[label]: url "title"` line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkDefinition {
    /// The label as written in the source.
    pub label: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub span: Range<usize>,
}

/// Normalize a link label for matching: case-folded, whitespace collapsed.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
