//! HTML output.
//!
//! Pages render through [maud](https://maud.lambda.xyz/), so every piece of
//! text is escaped unless it is raw inline HTML from the source.
//!
//! - Headings get an `id`: the explicit `{#id}` anchor, or a slug of the
//!   heading text. Explicit anchors are reserved first, so a generated slug
//!   never takes one. Repeats are suffixed `-1`, `-2`, ...
//! - Code fences become `<pre><code class="language-x" data-source="path">`.
//! - Callouts become `<div class="alert alert-{severity}" role="alert">`.
//! - Link definition tables produce no output.

use std::collections::HashSet;
use std::path::Path;

use docpage::Page;
use docpage::block::reference::LinkTarget;
use docpage::block::{Block, Callout, CodeFence, List, visit_blocks};
use docpage::inline::{Inline, plain_text};
use docpage::metadata::Metadata;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use tracing::warn;
use serde::Deserialize;

use crate::error::RenderError;
use crate::site::SiteIndex;

/// HTML output settings, read from the `[render]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Appended to each page title: `Page | Site`.
    pub site_title: Option<String>,
    /// Wrap the page in a complete HTML document.
    pub standalone: bool,
    /// Include the site navigation list (site builds only).
    pub navigation: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            site_title: None,
            standalone: true,
            navigation: true,
        }
    }
}

/// Where the page being rendered sits in a site.
#[derive(Debug, Clone, Copy)]
pub struct Navigation<'a> {
    pub index: &'a SiteIndex,
    /// Output path of the current page, relative to the site root.
    pub current: &'a Path,
}

pub fn ensure_resolved(page: &Page) -> Result<(), RenderError> {
    let labels = page.unresolved_labels();
    if labels.is_empty() {
        Ok(())
    } else {
        Err(RenderError::Unresolved {
            labels: labels.into_iter().map(str::to_string).collect(),
        })
    }
}

/// Render the page body without any document wrapper.
pub fn render_fragment(page: &Page) -> Result<Markup, RenderError> {
    ensure_resolved(page)?;
    let mut html = HtmlWriter {
        ids: Slugger::reserving(&page.body),
    };
    Ok(html.blocks(&page.body, false))
}

/// Render a complete HTML document.
pub fn render_document(
    page: &Page,
    options: &RenderOptions,
    navigation: Option<Navigation<'_>>,
) -> Result<Markup, RenderError> {
    let body = render_fragment(page)?;
    let title = document_title(&page.metadata, options.site_title.as_deref());
    let navigation = navigation.filter(|_| options.navigation);

    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if let Some(description) = &page.metadata.description {
                    meta name="description" content=(description);
                }
            }
            body {
                @if let Some(navigation) = navigation {
                    (render_nav(navigation))
                }
                main {
                    article { (body) }
                }
            }
        }
    })
}

/// Render per `options.standalone`.
pub fn render_html(
    page: &Page,
    options: &RenderOptions,
    navigation: Option<Navigation<'_>>,
) -> Result<String, RenderError> {
    let markup = if options.standalone {
        render_document(page, options, navigation)?
    } else {
        render_fragment(page)?
    };
    Ok(markup.into_string())
}

fn document_title(metadata: &Metadata, site_title: Option<&str>) -> String {
    match (metadata.title.as_str(), site_title) {
        ("", Some(site)) => site.to_string(),
        (title, Some(site)) => format!("{} | {}", title, site),
        (title, None) => title.to_string(),
    }
}

fn render_nav(navigation: Navigation<'_>) -> Markup {
    html! {
        nav.site-nav {
            ul {
                @for entry in navigation.index.entries() {
                    @let is_current = entry.output.as_path() == navigation.current;
                    li class=[is_current.then_some("current")] {
                        a href=(entry.href()) { (entry.nav_title) }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Blocks
// ============================================================================

#[derive(Default)]
struct HtmlWriter {
    ids: Slugger,
}

impl HtmlWriter {
    fn blocks(&mut self, blocks: &[Block], tight: bool) -> Markup {
        html! {
            @for block in blocks {
                (self.block(block, tight))
            }
        }
    }

    fn block(&mut self, block: &Block, tight: bool) -> Markup {
        match block {
            Block::Heading { level, content, id } => {
                let id = match id {
                    Some(id) => self.ids.claim_explicit(id),
                    None => self.ids.claim(&slugify(&plain_text(content))),
                };
                heading(*level, &id, inlines(content))
            }
            Block::Paragraph { content } if tight => inlines(content),
            Block::Paragraph { content } => html! { p { (inlines(content)) } },
            Block::List(list) => self.list(list),
            Block::CodeFence(fence) => code_fence(fence),
            Block::Callout(callout) => self.callout(callout),
            Block::LinkDefinitions { .. } => html! {},
            Block::Rule => html! { hr; },
        }
    }

    fn list(&mut self, list: &List) -> Markup {
        let start = (list.ordered && list.start != 1).then_some(list.start);
        html! {
            @if list.ordered {
                ol start=[start] {
                    @for item in &list.items {
                        li { (self.blocks(item, list.tight)) }
                    }
                }
            } @else {
                ul {
                    @for item in &list.items {
                        li { (self.blocks(item, list.tight)) }
                    }
                }
            }
        }
    }

    fn callout(&mut self, callout: &Callout) -> Markup {
        html! {
            div class={ "alert alert-" (callout.severity.as_str()) } role="alert" {
                @if let Some(title) = &callout.title {
                    h4.alert-heading { (title) }
                }
                (self.blocks(&callout.body, false))
            }
        }
    }
}

fn heading(level: u8, id: &str, content: Markup) -> Markup {
    match level {
        1 => html! { h1 id=(id) { (content) } },
        2 => html! { h2 id=(id) { (content) } },
        3 => html! { h3 id=(id) { (content) } },
        4 => html! { h4 id=(id) { (content) } },
        5 => html! { h5 id=(id) { (content) } },
        _ => html! { h6 id=(id) { (content) } },
    }
}

fn code_fence(fence: &CodeFence) -> Markup {
    let class = fence
        .language
        .as_deref()
        .map(|language| format!("language-{}", language));
    html! {
        pre {
            code class=[class] data-source=[fence.source_excerpt_path.as_deref()] {
                (fence.content)
            }
        }
    }
}

// ============================================================================
// Inlines
// ============================================================================

fn inlines(inlines: &[Inline]) -> Markup {
    html! {
        @for node in inlines {
            (inline(node))
        }
    }
}

fn inline(node: &Inline) -> Markup {
    match node {
        Inline::Text { text } => html! { (text) },
        Inline::Code { code } => html! { code { (code) } },
        Inline::Emphasis { children } => html! { em { (inlines(children)) } },
        Inline::Strong { children } => html! { strong { (inlines(children)) } },
        Inline::Strikethrough { children } => html! { del { (inlines(children)) } },
        Inline::Link {
            target,
            title,
            content,
        } => html! {
            a href=(href(target)) title=[non_empty(title)] { (inlines(content)) }
        },
        Inline::Image { target, title, alt } => html! {
            img src=(href(target)) alt=(plain_text(alt)) title=[non_empty(title)];
        },
        Inline::Html { html } => PreEscaped(html.clone()),
        Inline::SoftBreak => html! { "\n" },
        Inline::HardBreak => html! { br; "\n" },
    }
}

/// Only called on resolved pages, where every target is a URL.
fn href(target: &LinkTarget) -> &str {
    target.as_url().unwrap_or_default()
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

// ============================================================================
// Heading ids
// ============================================================================

/// Lowercase alphanumeric words joined by `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_')
            && !slug.is_empty()
            && !slug.ends_with('-')
        {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[derive(Default)]
struct Slugger {
    used: HashSet<String>,
    /// Explicit `{#id}` anchors, off limits to generated slugs.
    explicit: HashSet<String>,
}

impl Slugger {
    fn reserving(blocks: &[Block]) -> Self {
        let mut explicit = HashSet::new();
        visit_blocks(blocks, &mut |block| {
            if let Block::Heading { id: Some(id), .. } = block {
                explicit.insert(id.clone());
            }
        });
        Slugger {
            used: HashSet::new(),
            explicit,
        }
    }

    /// Reserve an author-chosen anchor. Only a repeat of the same anchor is
    /// renamed.
    fn claim_explicit(&mut self, id: &str) -> String {
        if self.used.insert(id.to_string()) {
            return id.to_string();
        }
        let renamed = self.claim(id);
        warn!(id, renamed = %renamed, "heading anchor used twice");
        renamed
    }

    /// Reserve `base`, or the first free `base-N`.
    fn claim(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        let mut candidate = base.to_string();
        let mut n = 0;
        while self.used.contains(&candidate) || self.explicit.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{}", base, n);
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Install the agent"), "install-the-agent");
        assert_eq!(slugify("What's new in 2.0?"), "whats-new-in-20");
        assert_eq!(slugify("  --leading_and trailing--  "), "leading-and-trailing");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn repeated_ids_get_suffixes() {
        let mut ids = Slugger::default();
        assert_eq!(ids.claim("setup"), "setup");
        assert_eq!(ids.claim("setup"), "setup-1");
        assert_eq!(ids.claim("setup-1"), "setup-1-1");
        assert_eq!(ids.claim("setup"), "setup-2");
        assert_eq!(ids.claim(""), "section");
    }

    #[test]
    fn explicit_anchors_are_reserved() {
        let mut ids = Slugger::default();
        ids.explicit.insert("setup".to_string());
        assert_eq!(ids.claim("setup"), "setup-1");
        assert_eq!(ids.claim_explicit("setup"), "setup");
        assert_eq!(ids.claim_explicit("setup"), "setup-2");
    }
}
