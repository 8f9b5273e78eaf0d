//! Splitting the leading metadata block from the page body.

use crate::metadata::{FrontMatterFormat, Metadata};
use crate::parser::error::{ErrorKind, ParseError, line_of};

/// The result of splitting a document.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub metadata: Metadata,
    /// `None` when the document has no front-matter block.
    pub format: Option<FrontMatterFormat>,
    /// Byte offset of the first body line in the source.
    pub body_offset: usize,
}

/// Split `source` into metadata and the offset where the body starts.
///
/// A document whose first line is not `---` or `+++` is all body, with
/// default (empty) metadata.
pub fn split(source: &str, file_id: usize) -> Result<FrontMatter, ParseError> {
    let start = if source.starts_with('\u{feff}') { 3 } else { 0 };
    let rest = &source[start..];
    let first_end = rest.find('\n').map(|p| p + 1).unwrap_or(rest.len());
    let first_line = rest[..first_end].trim_end();

    let Some(format) = FrontMatterFormat::from_delimiter(first_line) else {
        return Ok(FrontMatter {
            metadata: Metadata::default(),
            format: None,
            body_offset: start,
        });
    };

    let inner_start = start + first_end;
    let mut pos = inner_start;
    let mut close = None;
    while pos < source.len() {
        let line_end = source[pos..]
            .find('\n')
            .map(|p| pos + p + 1)
            .unwrap_or(source.len());
        if source[pos..line_end].trim_end() == format.delimiter() {
            close = Some((pos, line_end));
            break;
        }
        pos = line_end;
    }

    let Some((close_start, body_offset)) = close else {
        return Err(ParseError::error(
            ErrorKind::MetadataParse,
            format!(
                "{} front matter opened with `{}` is never closed",
                format,
                format.delimiter()
            ),
            start..start + first_line.len(),
            1,
            file_id,
        )
        .with_note(format!(
            "add a `{}` line after the last metadata key",
            format.delimiter()
        )));
    };

    let inner = &source[inner_start..close_start];
    let inner_span = inner_start..close_start;
    if inner.trim().is_empty() {
        return Err(ParseError::error(
            ErrorKind::MetadataParse,
            "front matter is empty",
            start..body_offset,
            1,
            file_id,
        )
        .with_note("the `title` key is required"));
    }

    let metadata = Metadata::parse(inner, format).map_err(|e| {
        ParseError::error(
            ErrorKind::MetadataParse,
            format!("invalid front matter: {}", e),
            inner_span.clone(),
            line_of(source, inner_span.start),
            file_id,
        )
    })?;

    Ok(FrontMatter {
        metadata,
        format: Some(format),
        body_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_offset_points_past_the_closing_line() {
        let src = "---\ntitle: A\n---\nBody";
        let fm = split(src, 0).unwrap();
        assert_eq!(&src[fm.body_offset..], "Body");
    }

    #[test]
    fn crlf_delimiters() {
        let src = "+++\r\ntitle = \"A\"\r\n+++\r\nBody";
        let fm = split(src, 0).unwrap();
        assert_eq!(fm.format, Some(FrontMatterFormat::Toml));
        assert_eq!(fm.metadata.title, "A");
        assert_eq!(&src[fm.body_offset..], "Body");
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let src = "\u{feff}---\ntitle: A\n---\n";
        let fm = split(src, 0).unwrap();
        assert_eq!(fm.metadata.title, "A");
        assert_eq!(fm.body_offset, src.len());
    }
}
