pub mod error;
pub mod front_matter;
mod inline;
mod structural;

pub use error::{ErrorKind, ParseError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Page;
use crate::resolve;

/// How to treat two definitions for the same link label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last definition wins, silently.
    Allow,
    /// Last definition wins, with a warning.
    #[default]
    Warn,
    /// Duplicates are a fatal error.
    Deny,
}

/// How to report malformed or unknown directives. Either way they never
/// break the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectivePolicy {
    #[default]
    Silent,
    Warn,
}

/// Validation strictness for a single parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    pub duplicate_definitions: DuplicatePolicy,
    pub directives: DirectivePolicy,
}

/// Warnings produced by a successful parse.
pub type Warnings = Vec<ParseError>;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    options: ParseOptions,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            options: ParseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse and resolve the page. Reference-style links in the returned
    /// page all point at URLs.
    pub fn parse(&self) -> Result<(Page, Warnings), Vec<ParseError>> {
        let (page, mut warnings) = self.parse_unresolved()?;
        let (page, resolve_warnings) = resolve::resolve(page, &self.source, self.options)?;
        warnings.extend(resolve_warnings);
        Ok((page, warnings))
    }

    /// Parse without resolving reference-style links.
    pub fn parse_unresolved(&self) -> Result<(Page, Warnings), Vec<ParseError>> {
        let front = front_matter::split(&self.source, self.file_id).map_err(|e| vec![e])?;
        debug!(
            file_id = self.file_id,
            format = ?front.format,
            body_offset = front.body_offset,
            "front matter split"
        );

        let (body, warnings) = structural::parse_body(
            &self.source,
            front.body_offset,
            self.file_id,
            self.options,
        )
        .map_err(|e| vec![e])?;

        Ok((
            Page {
                metadata: front.metadata,
                front_matter: front.format,
                body,
                source_id: self.file_id,
            },
            warnings,
        ))
    }
}
