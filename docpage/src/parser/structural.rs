use std::ops::Range;

use tracing::{debug, trace};

use crate::block::reference::LinkDefinition;
use crate::block::{Block, Callout, CodeFence, List, Severity};
use crate::directive::{
    Directive, DirectiveContext, Invocation, looks_like_directive, parse_directive,
    parse_invocation,
};
use crate::inline::Inline;
use crate::parser::error::{ErrorKind, ParseError, line_of};
use crate::parser::inline::{InlineSource, parse_inlines};
use crate::parser::{DirectivePolicy, ParseOptions};

/// Shortcode names rendered as callout boxes.
const CALLOUT_SHORTCODES: &[&str] = &["alert", "callout"];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse the page body starting at `body_offset` into blocks.
/// Returns the blocks and any warnings; the error aborts the page.
pub fn parse_body(
    source: &str,
    body_offset: usize,
    file_id: usize,
    options: ParseOptions,
) -> Result<(Vec<Block>, Vec<ParseError>), ParseError> {
    let lines = split_lines(source, body_offset);
    let mut state = ParseState::new(source, file_id, options);
    let blocks = state.parse_lines(&lines, source.len())?;

    if let Some((path, span)) = state.dangling_excerpt() {
        state.directive_warning(
            ErrorKind::MalformedDirective,
            format!("excerpt `{}` is not followed by a code fence", path),
            span,
        );
    }

    Ok((blocks, state.warnings))
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// One source line, possibly with container indentation removed.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// Line text without its terminator.
    text: &'a str,
    /// Byte offset of `text` in the source.
    offset: usize,
}

impl<'a> Line<'a> {
    fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The line from byte `start` onwards.
    fn from_byte(self, start: usize) -> Line<'a> {
        let start = start.min(self.text.len());
        Line {
            text: &self.text[start..],
            offset: self.offset + start,
        }
    }

    /// Remove up to `columns` columns of leading whitespace.
    fn strip_columns(self, columns: usize) -> Line<'a> {
        let mut width = 0;
        let mut bytes = 0;
        for c in self.text.chars() {
            if width >= columns {
                break;
            }
            match c {
                ' ' => width += 1,
                '\t' => width += 4,
                _ => break,
            }
            bytes += 1;
        }
        self.from_byte(bytes)
    }

    fn trim_start(self) -> Line<'a> {
        let lead = self.text.len() - self.text.trim_start().len();
        self.from_byte(lead)
    }
}

fn split_lines(source: &str, start: usize) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = start;
    for raw in source[start..].split_inclusive('\n') {
        let text = raw.strip_suffix('\n').unwrap_or(raw);
        let text = text.strip_suffix('\r').unwrap_or(text);
        lines.push(Line { text, offset });
        offset += raw.len();
    }
    lines
}

/// Leading whitespace width in columns, tabs counting four.
fn indent_width(text: &str) -> usize {
    text.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Byte offset of `part` inside `whole`; `part` must be a subslice.
fn offset_in(whole: &str, part: &str) -> usize {
    (part.as_ptr() as usize).saturating_sub(whole.as_ptr() as usize)
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct FenceOpen<'a> {
    ch: char,
    len: usize,
    indent: usize,
    info: &'a str,
}

fn fence_open(text: &str) -> Option<FenceOpen<'_>> {
    let indent = indent_width(text);
    if indent > 3 {
        return None;
    }
    let t = text.trim_start();
    let ch = t.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = t.chars().take_while(|c| *c == ch).count();
    if len < 3 {
        return None;
    }
    let info = t[len..].trim();
    if ch == '`' && info.contains('`') {
        return None;
    }
    Some(FenceOpen {
        ch,
        len,
        indent,
        info,
    })
}

fn is_fence_close(text: &str, open: &FenceOpen<'_>) -> bool {
    if indent_width(text) > 3 {
        return false;
    }
    let t = text.trim();
    let run = t.chars().take_while(|c| *c == open.ch).count();
    run >= open.len && run == t.chars().count()
}

#[derive(Debug, Clone)]
struct Shortcode {
    name: String,
    closing: bool,
    invocation: Invocation,
}

/// A callout shortcode line: `{{% alert ... %}}`, `{{< alert ... >}}`, or
/// the matching `{{% /alert %}}`.
fn shortcode(text: &str) -> Option<Shortcode> {
    if indent_width(text) > 3 {
        return None;
    }
    let t = text.trim();
    let inner = t
        .strip_prefix("{{%")
        .and_then(|r| r.strip_suffix("%}}"))
        .or_else(|| t.strip_prefix("{{<").and_then(|r| r.strip_suffix(">}}")))?;
    if inner.contains("}}") || inner.contains("{{") {
        return None;
    }
    let inner = inner.trim();

    let (closing, invocation) = match inner.strip_prefix('/') {
        Some(name) => (
            true,
            Invocation {
                name: name.trim().to_string(),
                ..Invocation::default()
            },
        ),
        None => (false, parse_invocation(inner).ok()?),
    };
    if !CALLOUT_SHORTCODES.contains(&invocation.name.as_str()) {
        return None;
    }
    Some(Shortcode {
        name: invocation.name.clone(),
        closing,
        invocation,
    })
}

fn is_directive_line(text: &str) -> bool {
    indent_width(text) <= 3 && looks_like_directive(text)
}

/// `(level, content)` of an ATX heading, closing `#`s removed.
fn atx_heading(text: &str) -> Option<(u8, &str)> {
    if indent_width(text) > 3 {
        return None;
    }
    let t = text.trim_start();
    let level = t.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &t[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let content = rest.trim();
    let stripped = content.trim_end_matches('#');
    let content = if stripped.is_empty() {
        stripped
    } else if stripped.ends_with([' ', '\t']) {
        stripped.trim_end()
    } else {
        content
    };
    Some((level as u8, content))
}

/// Split a trailing `{#id}` anchor off heading content.
fn heading_id(content: &str) -> (&str, Option<String>) {
    if let Some(body) = content.strip_suffix('}') {
        if let Some(pos) = body.rfind("{#") {
            let id = &body[pos + 2..];
            if !id.is_empty() && !id.contains(char::is_whitespace) {
                return (body[..pos].trim_end(), Some(id.to_string()));
            }
        }
    }
    (content, None)
}

fn is_thematic_break(text: &str) -> bool {
    if indent_width(text) > 3 {
        return false;
    }
    let mut marks = text.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

/// `=` underlines make level 1, `-` underlines level 2.
fn setext_underline(text: &str) -> Option<u8> {
    if indent_width(text) > 3 {
        return None;
    }
    let t = text.trim();
    if !t.is_empty() && t.chars().all(|c| c == '=') {
        Some(1)
    } else if !t.is_empty() && t.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy)]
struct ListMarker {
    ordered: bool,
    start: u64,
    /// `-`, `*`, `+` for bullets, `.` or `)` for ordered items.
    delimiter: char,
    /// Column where item content starts.
    content_indent: usize,
    /// Byte where item content starts on the marker line.
    content_start: usize,
    empty: bool,
}

impl ListMarker {
    fn same_list(&self, other: &ListMarker) -> bool {
        self.ordered == other.ordered && self.delimiter == other.delimiter
    }

    fn can_interrupt_paragraph(&self) -> bool {
        !self.empty && (!self.ordered || self.start == 1)
    }
}

fn list_marker(text: &str) -> Option<ListMarker> {
    let indent = indent_width(text);
    if indent > 3 {
        return None;
    }
    let lead = text.len() - text.trim_start().len();
    let t = &text[lead..];

    let (ordered, start, delimiter, marker_len) = match t.chars().next()? {
        c @ ('-' | '*' | '+') => (false, 1, c, 1),
        _ => {
            let digits = t.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 || digits > 9 {
                return None;
            }
            let delimiter = t[digits..].chars().next()?;
            if delimiter != '.' && delimiter != ')' {
                return None;
            }
            (true, t[..digits].parse().ok()?, delimiter, digits + 1)
        }
    };

    let after = &t[marker_len..];
    if after.trim().is_empty() {
        return Some(ListMarker {
            ordered,
            start,
            delimiter,
            content_indent: indent + marker_len + 1,
            content_start: text.len(),
            empty: true,
        });
    }
    if !after.starts_with([' ', '\t']) {
        return None;
    }
    let space_bytes = after.len() - after.trim_start().len();
    let space_cols = indent_width(after);
    let (cols, bytes) = if space_cols > 4 {
        (1, 1)
    } else {
        (space_cols, space_bytes)
    };
    Some(ListMarker {
        ordered,
        start,
        delimiter,
        content_indent: indent + marker_len + cols,
        content_start: lead + marker_len + bytes,
        empty: false,
    })
}

fn link_definition(line: Line<'_>) -> Option<LinkDefinition> {
    if indent_width(line.text) > 3 {
        return None;
    }
    let rest = line.text.trim_start().strip_prefix('[')?;
    let close = rest.find("]:")?;
    let label = &rest[..close];
    if label.trim().is_empty() || label.contains(['[', ']']) {
        return None;
    }
    let after = rest[close + 2..].trim_start();
    if after.is_empty() {
        return None;
    }
    let (url, remainder) = if let Some(bracketed) = after.strip_prefix('<') {
        let end = bracketed.find('>')?;
        (&bracketed[..end], &bracketed[end + 1..])
    } else {
        let end = after.find(char::is_whitespace).unwrap_or(after.len());
        (&after[..end], &after[end..])
    };
    let remainder = remainder.trim();
    let title = if remainder.is_empty() {
        None
    } else {
        let quoted = [('"', '"'), ('\'', '\''), ('(', ')')]
            .iter()
            .find_map(|(open, close)| {
                remainder
                    .strip_prefix(*open)
                    .and_then(|r| r.strip_suffix(*close))
            })?;
        Some(quoted.to_string())
    };
    Some(LinkDefinition {
        label: label.to_string(),
        url: url.to_string(),
        title,
        span: line.offset..line.end(),
    })
}

/// Whether `text` begins a block other than a paragraph continuation.
fn starts_block(text: &str) -> bool {
    fence_open(text).is_some()
        || shortcode(text).is_some()
        || is_directive_line(text)
        || atx_heading(text).is_some()
        || is_thematic_break(text)
        || list_marker(text).is_some()
}

fn interrupts_paragraph(line: Line<'_>) -> bool {
    fence_open(line.text).is_some()
        || shortcode(line.text).is_some()
        || is_directive_line(line.text)
        || atx_heading(line.text).is_some()
        || is_thematic_break(line.text)
        || list_marker(line.text).is_some_and(|m| m.can_interrupt_paragraph())
        || link_definition(line).is_some()
}

/// A blank line outside fenced code, between two non-blank lines.
fn has_interior_blank(lines: &[Line<'_>]) -> bool {
    let mut fence: Option<FenceOpen<'_>> = None;
    for line in lines {
        if let Some(open) = &fence {
            if is_fence_close(line.text, open) {
                fence = None;
            }
            continue;
        }
        if line.is_blank() {
            return true;
        }
        fence = fence_open(line.text);
    }
    false
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'a> {
    source: &'a str,
    file_id: usize,
    options: ParseOptions,
    directives: DirectiveContext,
    /// Span of the directive that set the pending excerpt.
    excerpt_span: Option<Range<usize>>,
    warnings: Vec<ParseError>,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str, file_id: usize, options: ParseOptions) -> Self {
        ParseState {
            source,
            file_id,
            options,
            directives: DirectiveContext::new(),
            excerpt_span: None,
            warnings: Vec::new(),
        }
    }

    fn error(&self, kind: ErrorKind, message: String, span: Range<usize>) -> ParseError {
        let line = line_of(self.source, span.start);
        ParseError::error(kind, message, span, line, self.file_id)
    }

    fn directive_warning(&mut self, kind: ErrorKind, message: String, span: Range<usize>) {
        trace!(%message, "directive issue");
        if self.options.directives == DirectivePolicy::Warn {
            let line = line_of(self.source, span.start);
            self.warnings
                .push(ParseError::warning(kind, message, span, line, self.file_id));
        }
    }

    fn dangling_excerpt(&self) -> Option<(String, Range<usize>)> {
        let path = self.directives.pending_excerpt()?;
        Some((path.to_string(), self.excerpt_span.clone().unwrap_or(0..0)))
    }

    /// Parse a run of lines into blocks. `end` is the end offset of the
    /// enclosing container, used as the span end of unterminated blocks.
    fn parse_lines(&mut self, lines: &[Line<'a>], end: usize) -> Result<Vec<Block>, ParseError> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];

            if line.is_blank() {
                i += 1;
                continue;
            }

            if let Some(open) = fence_open(line.text) {
                let (fence, next) = self.parse_fence(lines, i, open, end)?;
                blocks.push(Block::CodeFence(fence));
                i = next;
                continue;
            }

            if let Some(code) = shortcode(line.text) {
                if !code.closing {
                    let (callout, next) = self.parse_callout(lines, i, code, end)?;
                    blocks.push(Block::Callout(callout));
                    i = next;
                    continue;
                }
                debug!(name = %code.name, "closing shortcode without an opening one");
            }

            if is_directive_line(line.text) {
                self.line_directive(line.trim_start(), &mut blocks);
                i += 1;
                continue;
            }

            if let Some((level, content)) = atx_heading(line.text) {
                let (content, id) = heading_id(content);
                let offset = line.offset + offset_in(line.text, content);
                let content = self.inline_content(&InlineSource::heading(content, offset));
                blocks.push(Block::Heading { level, content, id });
                i += 1;
                continue;
            }

            if is_thematic_break(line.text) {
                blocks.push(Block::Rule);
                i += 1;
                continue;
            }

            if let Some(marker) = list_marker(line.text) {
                let (list, next) = self.parse_list(lines, i, marker)?;
                blocks.push(Block::List(list));
                i = next;
                continue;
            }

            if link_definition(line).is_some() {
                let mut definitions = Vec::new();
                while let Some(def) = lines.get(i).and_then(|l| link_definition(*l)) {
                    definitions.push(def);
                    i += 1;
                }
                blocks.push(Block::LinkDefinitions { definitions });
                continue;
            }

            let (block, next) = self.parse_paragraph(lines, i);
            blocks.push(block);
            i = next;
        }

        Ok(blocks)
    }

    fn parse_fence(
        &mut self,
        lines: &[Line<'a>],
        i: usize,
        open: FenceOpen<'a>,
        end: usize,
    ) -> Result<(CodeFence, usize), ParseError> {
        let start = lines[i];
        let Some(close) = (i + 1..lines.len()).find(|&j| is_fence_close(lines[j].text, &open))
        else {
            let fence: String = std::iter::repeat_n(open.ch, open.len).collect();
            return Err(self
                .error(
                    ErrorKind::UnterminatedBlock,
                    "code fence is never closed".to_string(),
                    start.offset..end.max(start.end()),
                )
                .with_note(format!("close it with a `{}` line", fence)));
        };

        let mut content = String::new();
        for line in &lines[i + 1..close] {
            content.push_str(line.strip_columns(open.indent).text.trim_end());
            content.push('\n');
        }

        let language = open.info.split_whitespace().next().map(str::to_string);
        let source_excerpt_path = self.directives.take_excerpt();
        if source_excerpt_path.is_some() {
            self.excerpt_span = None;
        }

        Ok((
            CodeFence {
                language,
                info: open.info.to_string(),
                source_excerpt_path,
                content,
                span: start.offset..lines[close].end(),
            },
            close + 1,
        ))
    }

    fn parse_callout(
        &mut self,
        lines: &[Line<'a>],
        i: usize,
        open: Shortcode,
        end: usize,
    ) -> Result<(Callout, usize), ParseError> {
        let start = lines[i];
        let mut depth = 1usize;
        let mut fence: Option<FenceOpen<'a>> = None;
        let mut close = None;

        for (j, line) in lines.iter().enumerate().skip(i + 1) {
            if let Some(f) = &fence {
                if is_fence_close(line.text, f) {
                    fence = None;
                }
                continue;
            }
            if let Some(f) = fence_open(line.text) {
                fence = Some(f);
                continue;
            }
            if let Some(code) = shortcode(line.text).filter(|c| c.name == open.name) {
                if code.closing {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(j);
                        break;
                    }
                } else {
                    depth += 1;
                }
            }
        }

        let Some(close) = close else {
            return Err(self
                .error(
                    ErrorKind::UnterminatedBlock,
                    format!("`{}` callout is never closed", open.name),
                    start.offset..end.max(start.end()),
                )
                .with_note(format!("close it with `{{{{% /{} %}}}}`", open.name)));
        };

        let args = &open.invocation;
        let title = args
            .attribute("title")
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let severity = args
            .attribute("color")
            .or_else(|| args.attribute("severity"))
            .or_else(|| args.positional.first().map(String::as_str))
            .map(Severity::from_color)
            .unwrap_or(Severity::Info);

        let body = self.parse_lines(&lines[i + 1..close], lines[close].offset)?;

        Ok((
            Callout {
                title,
                severity,
                body,
                span: start.offset..lines[close].end(),
            },
            close + 1,
        ))
    }

    fn parse_list(
        &mut self,
        lines: &[Line<'a>],
        mut i: usize,
        first: ListMarker,
    ) -> Result<(List, usize), ParseError> {
        let mut items = Vec::new();
        let mut tight = true;
        let mut marker = first;

        loop {
            let mut item_lines = vec![lines[i].from_byte(marker.content_start)];
            let mut fence = fence_open(item_lines[0].text);
            let mut j = i + 1;

            while j < lines.len() {
                let line = lines[j];
                if line.is_blank() {
                    item_lines.push(line.from_byte(line.text.len()));
                    j += 1;
                    continue;
                }
                let stripped = if indent_width(line.text) >= marker.content_indent {
                    line.strip_columns(marker.content_indent)
                } else {
                    let after_blank = item_lines.last().is_some_and(Line::is_blank);
                    if after_blank || fence.is_some() || starts_block(line.text) {
                        break;
                    }
                    // Lazy paragraph continuation.
                    line.trim_start()
                };
                fence = match fence {
                    Some(open) if is_fence_close(stripped.text, &open) => None,
                    Some(open) => Some(open),
                    None => fence_open(stripped.text),
                };
                item_lines.push(stripped);
                j += 1;
            }

            let mut trailing_blank = false;
            while item_lines.len() > 1 && item_lines.last().is_some_and(Line::is_blank) {
                item_lines.pop();
                trailing_blank = true;
            }
            if has_interior_blank(&item_lines) {
                tight = false;
            }

            let item_end = item_lines.last().map(Line::end).unwrap_or(lines[i].end());
            items.push(self.parse_lines(&item_lines, item_end)?);
            i = j;

            match lines.get(i).and_then(|l| list_marker(l.text)) {
                Some(next) if next.same_list(&first) && !is_thematic_break(lines[i].text) => {
                    if trailing_blank {
                        tight = false;
                    }
                    marker = next;
                }
                _ => break,
            }
        }

        Ok((
            List {
                ordered: first.ordered,
                start: first.start,
                tight,
                items,
            },
            i,
        ))
    }

    fn parse_paragraph(&mut self, lines: &[Line<'a>], i: usize) -> (Block, usize) {
        let mut j = i + 1;
        while j < lines.len() {
            let line = lines[j];
            if line.is_blank() {
                break;
            }
            if let Some(level) = setext_underline(line.text) {
                let content = self.inline_content(&paragraph_source(&lines[i..j]));
                return (
                    Block::Heading {
                        level,
                        content,
                        id: None,
                    },
                    j + 1,
                );
            }
            if interrupts_paragraph(line) {
                break;
            }
            j += 1;
        }

        let content = self.inline_content(&paragraph_source(&lines[i..j]));
        (Block::Paragraph { content }, j)
    }

    /// Parse inline content and fold any inline directives into the context.
    fn inline_content(&mut self, source: &InlineSource) -> Vec<Inline> {
        let output = parse_inlines(source);
        for (directive, span) in output.directives {
            match directive {
                Ok(directive) => self.apply_directive(&directive, span),
                Err(reason) => self.directive_warning(
                    ErrorKind::MalformedDirective,
                    format!("malformed directive left as text: {}", reason),
                    span,
                ),
            }
        }
        output.inlines
    }

    /// A directive on a line of its own.
    fn line_directive(&mut self, line: Line<'a>, blocks: &mut Vec<Block>) {
        let text = line.text.trim_end();
        let span = line.offset..line.offset + text.len();
        match parse_directive(text) {
            Some(Ok(directive)) => self.apply_directive(&directive, span),
            Some(Err(reason)) => {
                self.directive_warning(
                    ErrorKind::MalformedDirective,
                    format!("malformed directive left as text: {}", reason),
                    span,
                );
                blocks.push(Block::Paragraph {
                    content: vec![Inline::text(text)],
                });
            }
            None => blocks.push(Block::Paragraph {
                content: vec![Inline::text(text)],
            }),
        }
    }

    fn apply_directive(&mut self, directive: &Directive, span: Range<usize>) {
        match directive {
            Directive::Unknown { name } => {
                self.directive_warning(
                    ErrorKind::UnknownDirective,
                    format!("unknown directive `{}` ignored", name),
                    span,
                );
            }
            Directive::Excerpt { .. } => {
                if let Some(previous) = self.directives.pending_excerpt() {
                    let message =
                        format!("excerpt `{}` is replaced before reaching a code fence", previous);
                    let previous_span = self.excerpt_span.clone().unwrap_or(span.clone());
                    self.directive_warning(ErrorKind::MalformedDirective, message, previous_span);
                }
                self.excerpt_span = Some(span);
            }
            Directive::PathBase(_) => {}
        }
        trace!(directive = directive.name(), "directive applied");
        self.directives.apply(directive);
    }
}

/// Paragraph lines with leading whitespace removed and the final line's
/// trailing whitespace dropped.
fn paragraph_source(lines: &[Line<'_>]) -> InlineSource {
    let last = lines.len().saturating_sub(1);
    InlineSource::lines(lines.iter().enumerate().map(|(n, line)| {
        let line = line.trim_start();
        let text = if n == last { line.text.trim_end() } else { line.text };
        (text, line.offset)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_marker_widths() {
        let m = list_marker("- item").unwrap();
        assert!(!m.ordered);
        assert_eq!(m.content_indent, 2);
        assert_eq!(m.content_start, 2);

        let m = list_marker("  10) item").unwrap();
        assert!(m.ordered);
        assert_eq!(m.start, 10);
        assert_eq!(m.delimiter, ')');
        assert_eq!(m.content_indent, 6);

        assert!(list_marker("-item").is_none());
        assert!(list_marker("1.5 apples").is_none());
    }

    #[test]
    fn heading_closing_sequence_and_anchor() {
        assert_eq!(atx_heading("## Setup ##"), Some((2, "Setup")));
        assert_eq!(atx_heading("#5 bolt"), None);
        assert_eq!(atx_heading("####### seven"), None);
        assert_eq!(
            heading_id("Install the agent {#install}"),
            ("Install the agent", Some("install".to_string()))
        );
        assert_eq!(heading_id("Sets {a, b}"), ("Sets {a, b}", None));
    }

    #[test]
    fn fence_delimiters() {
        let open = fence_open("````java title=\"x\"").unwrap();
        assert_eq!(open.len, 4);
        assert_eq!(open.info, "java title=\"x\"");
        assert!(!is_fence_close("```", &open));
        assert!(is_fence_close("`````  ", &open));
        assert!(fence_open("``` a`b").is_none());
    }

    #[test]
    fn link_definition_forms() {
        let line = Line {
            text: "[Traces]: <https://example.com/t> \"Tracing\"",
            offset: 0,
        };
        let def = link_definition(line).unwrap();
        assert_eq!(def.label, "Traces");
        assert_eq!(def.url, "https://example.com/t");
        assert_eq!(def.title.as_deref(), Some("Tracing"));

        let line = Line {
            text: "[x]: /a trailing junk",
            offset: 0,
        };
        assert!(link_definition(line).is_none());
    }

    #[test]
    fn shortcode_lines() {
        let open = shortcode(r#"{{% alert title="Note" color="warning" %}}"#).unwrap();
        assert!(!open.closing);
        assert_eq!(open.invocation.attribute("title"), Some("Note"));
        assert!(shortcode("{{< /alert >}}").unwrap().closing);
        assert!(shortcode(r#"{{< figure src="a.png" >}}"#).is_none());
    }
}
