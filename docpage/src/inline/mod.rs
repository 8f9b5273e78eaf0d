use std::fmt;

use serde::Serialize;

use crate::block::reference::LinkTarget;

/// Inline elements that appear within a paragraph, heading or list item.
/// Inline types nest freely within one another.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Code { code: String },
    Emphasis { children: Vec<Inline> },
    Strong { children: Vec<Inline> },
    Strikethrough { children: Vec<Inline> },
    Link {
        target: LinkTarget,
        title: String,
        content: Vec<Inline>,
    },
    Image {
        target: LinkTarget,
        title: String,
        alt: Vec<Inline>,
    },
    /// Raw inline HTML, passed through untouched.
    Html { html: String },
    SoftBreak,
    HardBreak,
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text { text: s.into() }
    }

    /// Child inlines, for the variants that have any.
    pub fn children(&self) -> &[Inline] {
        match self {
            Inline::Emphasis { children }
            | Inline::Strong { children }
            | Inline::Strikethrough { children } => children,
            Inline::Link { content, .. } => content,
            Inline::Image { alt, .. } => alt,
            _ => &[],
        }
    }
}

/// Concatenated text content, with markup stripped.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_plain_text(inlines, &mut out);
    out
}

fn push_plain_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text { text } => out.push_str(text),
            Inline::Code { code } => out.push_str(code),
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
            Inline::Html { .. } => {}
            other => push_plain_text(other.children(), out),
        }
    }
}

/// Characters that open inline markup anywhere in a line.
const INLINE_MARKUP: &[char] = &['\\', '`', '*', '_', '[', ']', '<', '~'];

/// Characters that open a block when they start a line.
const BLOCK_MARKERS: &[char] = &['#', '-', '+', '>', '='];

/// Write literal text so that it parses back to the same text.
///
/// With `line_start`, a leading block marker (`#`, `-`, `1.` and the like)
/// is escaped too.
pub(crate) fn write_text(f: &mut fmt::Formatter<'_>, text: &str, line_start: bool) -> fmt::Result {
    let mut rest = text;
    if line_start {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let after = &rest[digits..];
        if digits > 0 && (after.starts_with('.') || after.starts_with(')')) {
            write!(f, "{}\\", &rest[..digits])?;
            rest = after;
        } else if rest.starts_with(BLOCK_MARKERS) {
            write!(f, "\\")?;
        }
    }
    for c in rest.chars() {
        if INLINE_MARKUP.contains(&c) {
            write!(f, "\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

fn write_all(f: &mut fmt::Formatter<'_>, inlines: &[Inline]) -> fmt::Result {
    for inline in inlines {
        write!(f, "{}", inline)?;
    }
    Ok(())
}

fn write_target(f: &mut fmt::Formatter<'_>, target: &LinkTarget, title: &str) -> fmt::Result {
    match target {
        LinkTarget::Url { url } if title.is_empty() => write!(f, "({})", url),
        LinkTarget::Url { url } => write!(f, "({} \"{}\")", url, title),
        LinkTarget::Reference { label, .. } => write!(f, "[{}]", label),
    }
}

impl fmt::Display for Inline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inline::Text { text } => write_text(f, text, false),
            Inline::Code { code } => write!(f, "`{}`", code),
            Inline::Emphasis { children } => {
                write!(f, "*")?;
                write_all(f, children)?;
                write!(f, "*")
            }
            Inline::Strong { children } => {
                write!(f, "**")?;
                write_all(f, children)?;
                write!(f, "**")
            }
            Inline::Strikethrough { children } => {
                write!(f, "~~")?;
                write_all(f, children)?;
                write!(f, "~~")
            }
            Inline::Link { target, title, content } => {
                write!(f, "[")?;
                write_all(f, content)?;
                write!(f, "]")?;
                write_target(f, target, title)
            }
            Inline::Image { target, title, alt } => {
                write!(f, "![")?;
                write_all(f, alt)?;
                write!(f, "]")?;
                write_target(f, target, title)
            }
            Inline::Html { html } => write!(f, "{}", html),
            Inline::SoftBreak => writeln!(f),
            Inline::HardBreak => writeln!(f, "\\"),
        }
    }
}
