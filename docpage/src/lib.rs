//! Content model and parser for documentation pages.
//!
//! A page is a front-matter block followed by Markdown with a few site
//! extensions: `<?...?>` processing-instruction directives that tag code
//! fences with excerpt paths, `{{% alert %}}` callout shortcodes, and
//! reference-style links resolved against the page's definition table.
//!
//! ```text
//! source ─▶ front matter ─▶ blocks + directives ─▶ link resolution ─▶ Page
//! ```
//!
//! The usual entry point is [`parser::Parser`].

pub mod block;
pub mod directive;
pub mod inline;
pub mod metadata;
pub mod parser;
pub mod resolve;

use std::fmt;

use serde::Serialize;

use crate::block::Block;
use crate::block::reference::LinkTarget;
use crate::inline::Inline;
use crate::metadata::{FrontMatterFormat, Metadata};

/// A parsed documentation page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub metadata: Metadata,
    /// Delimiter style of the front-matter block, if the source had one.
    pub front_matter: Option<FrontMatterFormat>,
    /// Top-level blocks in document order.
    pub body: Vec<Block>,
    /// The source file ID (for error reporting with codespan-reporting).
    #[serde(skip)]
    pub source_id: usize,
}

impl Page {
    /// Labels of reference-style links that still point at a definition
    /// rather than a URL, in document order.
    pub fn unresolved_labels(&self) -> Vec<&str> {
        let mut labels = Vec::new();
        block::visit_inlines(&self.body, &mut |inline| {
            if let Inline::Link { target: LinkTarget::Reference { label, .. }, .. }
            | Inline::Image { target: LinkTarget::Reference { label, .. }, .. } = inline
            {
                labels.push(label.as_str());
            }
        });
        labels
    }

    pub fn is_resolved(&self) -> bool {
        self.unresolved_labels().is_empty()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(format) = self.front_matter {
            match self.metadata.to_front_matter(format) {
                Ok(block) => write!(f, "{}", block)?,
                Err(_) => return Err(fmt::Error),
            }
        }
        for (i, block) in self.body.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}
