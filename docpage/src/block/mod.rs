pub mod reference;

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::block::reference::LinkDefinition;
use crate::inline::{Inline, write_text};

/// A block-level element of a page body.
/// Blocks are self-contained and ordered; only lists and callouts nest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        /// 1 = `#` through 6 = `######`.
        level: u8,
        content: Vec<Inline>,
        /// Explicit anchor from a trailing `{#id}`.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    Paragraph {
        content: Vec<Inline>,
    },
    List(List),
    CodeFence(CodeFence),
    Callout(Callout),
    /// A run of consecutive `[label]: url` lines, kept at its position.
    LinkDefinitions {
        definitions: Vec<LinkDefinition>,
    },
    Rule,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct List {
    pub ordered: bool,
    /// First item number (ordered lists only; 1 otherwise).
    pub start: u64,
    /// Tight lists render items without paragraph wrappers.
    pub tight: bool,
    pub items: Vec<Vec<Block>>,
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeFence {
    /// First word of the info string, copied verbatim.
    pub language: Option<String>,
    /// The whole info string.
    pub info: String,
    /// Source file this fence excerpts, set by a preceding directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_excerpt_path: Option<String>,
    /// Raw content; every line ends in `\n`.
    pub content: String,
    pub span: Range<usize>,
}

/// A callout box from an `{{% alert %}}` shortcode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Callout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub severity: Severity,
    pub body: Vec<Block>,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    /// Map a shortcode `color` argument onto a severity.
    pub fn from_color(color: &str) -> Self {
        match color.to_ascii_lowercase().as_str() {
            "warning" | "danger" | "caution" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

impl Block {
    /// The inline content directly owned by this block.
    pub fn inlines(&self) -> Option<&[Inline]> {
        match self {
            Block::Heading { content, .. } | Block::Paragraph { content } => Some(content),
            _ => None,
        }
    }
}

/// Visit every block in document order, descending into lists and callouts.
pub fn visit_blocks<'a>(blocks: &'a [Block], f: &mut impl FnMut(&'a Block)) {
    for block in blocks {
        f(block);
        match block {
            Block::List(list) => {
                for item in &list.items {
                    visit_blocks(item, f);
                }
            }
            Block::Callout(callout) => visit_blocks(&callout.body, f),
            _ => {}
        }
    }
}

/// Visit every inline in document order, including nested ones.
pub fn visit_inlines<'a>(blocks: &'a [Block], f: &mut impl FnMut(&'a Inline)) {
    visit_blocks(blocks, &mut |block| {
        if let Some(inlines) = block.inlines() {
            walk_inlines(inlines, &mut *f);
        }
    });
}

fn walk_inlines<'a>(inlines: &'a [Inline], f: &mut impl FnMut(&'a Inline)) {
    for inline in inlines {
        f(inline);
        walk_inlines(inline.children(), f);
    }
}

// ---------------------------------------------------------------------------
// Markdown output
// ---------------------------------------------------------------------------

fn write_inlines(f: &mut fmt::Formatter<'_>, inlines: &[Inline]) -> fmt::Result {
    let mut line_start = true;
    for inline in inlines {
        match inline {
            Inline::Text { text } => write_text(f, text, line_start)?,
            other => write!(f, "{}", other)?,
        }
        line_start = matches!(inline, Inline::SoftBreak | Inline::HardBreak);
    }
    Ok(())
}

/// Blocks separated by a blank line (or none, for tight list items).
fn join_blocks(blocks: &[Block], tight: bool) -> String {
    let separator = if tight { "" } else { "\n" };
    blocks
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Heading { level, content, id } => {
                write!(f, "{} ", "#".repeat(*level as usize))?;
                write_inlines(f, content)?;
                if let Some(id) = id {
                    write!(f, " {{#{}}}", id)?;
                }
                writeln!(f)
            }
            Block::Paragraph { content } => {
                write_inlines(f, content)?;
                writeln!(f)
            }
            Block::List(list) => {
                for (i, item) in list.items.iter().enumerate() {
                    let marker = if list.ordered {
                        format!("{}. ", list.start as usize + i)
                    } else {
                        "- ".to_string()
                    };
                    let indent = " ".repeat(marker.len());
                    let text = join_blocks(item, list.tight);
                    for (n, line) in text.lines().enumerate() {
                        if n == 0 {
                            writeln!(f, "{}{}", marker, line)?;
                        } else if line.is_empty() {
                            writeln!(f)?;
                        } else {
                            writeln!(f, "{}{}", indent, line)?;
                        }
                    }
                    if text.is_empty() {
                        writeln!(f, "{}", marker.trim_end())?;
                    }
                    if !list.tight && i + 1 < list.items.len() {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
            Block::CodeFence(fence) => {
                if let Some(path) = &fence.source_excerpt_path {
                    writeln!(f, "<?code-excerpt \"{}\"?>", path)?;
                }
                let ticks = if fence.content.contains("```") { "````" } else { "```" };
                writeln!(f, "{}{}", ticks, fence.info)?;
                write!(f, "{}", fence.content)?;
                writeln!(f, "{}", ticks)
            }
            Block::Callout(callout) => {
                write!(f, "{{{{% alert")?;
                if let Some(title) = &callout.title {
                    write!(f, " title=\"{}\"", title)?;
                }
                writeln!(f, " color=\"{}\" %}}}}", callout.severity.as_str())?;
                write!(f, "{}", join_blocks(&callout.body, false))?;
                writeln!(f, "{{{{% /alert %}}}}")
            }
            Block::LinkDefinitions { definitions } => {
                for def in definitions {
                    write!(f, "[{}]: {}", def.label, def.url)?;
                    if let Some(title) = &def.title {
                        write!(f, " \"{}\"", title)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            Block::Rule => writeln!(f, "***"),
        }
    }
}
