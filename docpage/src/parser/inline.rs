use std::ops::Range;

use pulldown_cmark::{BrokenLink, CowStr, Event, LinkType, Options, Parser as CmarkParser, Tag, TagEnd};

use crate::block::reference::LinkTarget;
use crate::directive::{Directive, parse_directive};
use crate::inline::Inline;

/// Inline text assembled from one or more source lines, with enough
/// bookkeeping to map positions back to source byte offsets.
pub(super) struct InlineSource {
    text: String,
    /// `(position in text, source offset)` for the start of each line.
    segments: Vec<(usize, usize)>,
}

impl InlineSource {
    /// Paragraph text: lines joined with `\n`, each `(text, source offset)`.
    pub(super) fn lines<'s>(lines: impl IntoIterator<Item = (&'s str, usize)>) -> Self {
        let mut text = String::new();
        let mut segments = Vec::new();
        for (line, offset) in lines {
            if !segments.is_empty() {
                text.push('\n');
            }
            segments.push((text.len(), offset));
            text.push_str(line);
        }
        InlineSource { text, segments }
    }

    /// Heading text. It is parsed behind an ATX marker so a leading `1.`
    /// or `-` stays text instead of opening a list.
    pub(super) fn heading(content: &str, offset: usize) -> Self {
        let mut text = String::from("# ");
        let segments = vec![(text.len(), offset)];
        text.push_str(content);
        InlineSource { text, segments }
    }

    fn to_source(&self, pos: usize) -> usize {
        let idx = self
            .segments
            .partition_point(|(start, _)| *start <= pos)
            .saturating_sub(1);
        match self.segments.get(idx) {
            Some(&(start, offset)) => offset + pos.saturating_sub(start),
            None => pos,
        }
    }

    fn span(&self, range: &Range<usize>) -> Range<usize> {
        self.to_source(range.start)..self.to_source(range.end)
    }
}

/// Parsed inline content plus the directives found inside it.
pub(super) struct InlineOutput {
    pub inlines: Vec<Inline>,
    /// Inline processing instructions in document order. Malformed ones
    /// have already been turned into literal text.
    pub directives: Vec<(Result<Directive, String>, Range<usize>)>,
}

/// Parse inline Markdown with pulldown-cmark.
///
/// Reference-style links whose label is not defined in `source` (which
/// holds no definitions at all) reach the broken-link callback; they come
/// back as [`LinkTarget::Reference`] for the resolver.
pub(super) fn parse_inlines(source: &InlineSource) -> InlineOutput {
    let events = offset_events(&source.text);

    let mut collector = Collector {
        source,
        directives: Vec::new(),
    };
    let mut i = 0;
    let inlines = collector.collect(&events, &mut i, &|_| false);
    InlineOutput {
        inlines,
        directives: collector.directives,
    }
}

fn offset_events<'t>(text: &'t str) -> Vec<(Event<'t>, Range<usize>)> {
    let callback = |link: BrokenLink<'t>| -> Option<(CowStr<'t>, CowStr<'t>)> {
        Some((link.reference, CowStr::Borrowed("")))
    };
    CmarkParser::new_with_broken_link_callback(text, Options::ENABLE_STRIKETHROUGH, Some(callback))
        .into_offset_iter()
        .collect()
}

struct Collector<'s> {
    source: &'s InlineSource,
    directives: Vec<(Result<Directive, String>, Range<usize>)>,
}

impl Collector<'_> {
    /// Collect inline nodes until a matching End tag.
    fn collect(
        &mut self,
        events: &[(Event<'_>, Range<usize>)],
        i: &mut usize,
        is_end: &dyn Fn(&TagEnd) -> bool,
    ) -> Vec<Inline> {
        let mut inlines = Vec::new();

        while *i < events.len() {
            let (ref ev, ref range) = events[*i];
            *i += 1;
            match ev {
                Event::End(tag_end) if is_end(tag_end) => break,
                Event::Text(s) => push_text(&mut inlines, s),
                Event::Code(s) => inlines.push(Inline::Code {
                    code: s.to_string(),
                }),
                Event::SoftBreak => inlines.push(Inline::SoftBreak),
                Event::HardBreak => inlines.push(Inline::HardBreak),
                Event::Html(s) | Event::InlineHtml(s) => self.html(&mut inlines, s, range),
                Event::Start(Tag::Strong) => {
                    let children = self.collect(events, i, &|e| matches!(e, TagEnd::Strong));
                    inlines.push(Inline::Strong { children });
                }
                Event::Start(Tag::Emphasis) => {
                    let children = self.collect(events, i, &|e| matches!(e, TagEnd::Emphasis));
                    inlines.push(Inline::Emphasis { children });
                }
                Event::Start(Tag::Strikethrough) => {
                    let children =
                        self.collect(events, i, &|e| matches!(e, TagEnd::Strikethrough));
                    inlines.push(Inline::Strikethrough { children });
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    ..
                }) => {
                    let target = self.target(*link_type, dest_url, range);
                    let title = title.to_string();
                    let content = self.collect(events, i, &|e| matches!(e, TagEnd::Link));
                    inlines.push(Inline::Link {
                        target,
                        title,
                        content,
                    });
                }
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    ..
                }) => {
                    let target = self.target(*link_type, dest_url, range);
                    let title = title.to_string();
                    let alt = self.collect(events, i, &|e| matches!(e, TagEnd::Image));
                    inlines.push(Inline::Image { target, title, alt });
                }
                // Block wrappers (the paragraph or heading around the text)
                // and anything unsupported are transparent.
                _ => {}
            }
        }

        inlines
    }

    fn target(&self, link_type: LinkType, dest: &CowStr<'_>, range: &Range<usize>) -> LinkTarget {
        match link_type {
            LinkType::ReferenceUnknown | LinkType::CollapsedUnknown | LinkType::ShortcutUnknown => {
                LinkTarget::Reference {
                    label: dest.to_string(),
                    span: self.source.span(range),
                }
            }
            _ => LinkTarget::url(dest.to_string()),
        }
    }

    fn html(&mut self, inlines: &mut Vec<Inline>, html: &str, range: &Range<usize>) {
        match parse_directive(html) {
            Some(Ok(directive)) => {
                self.directives.push((Ok(directive), self.source.span(range)));
            }
            Some(Err(reason)) => {
                push_text(inlines, html.trim());
                self.directives.push((Err(reason), self.source.span(range)));
            }
            None => inlines.push(Inline::Html {
                html: html.to_string(),
            }),
        }
    }
}

/// Append text, merging with a preceding text node.
fn push_text(inlines: &mut Vec<Inline>, s: &str) {
    if let Some(Inline::Text { text }) = inlines.last_mut() {
        text.push_str(s);
    } else {
        inlines.push(Inline::text(s));
    }
}
