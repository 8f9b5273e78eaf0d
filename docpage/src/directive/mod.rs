//! Processing-instruction directives: `<?name args?>`.
//!
//! Directives are never rendered. They are folded left-to-right into a
//! [`DirectiveContext`] that the block parser consults when it builds each
//! code fence:
//!
//! - `path-base` persists until the next `path-base` overrides it.
//! - an excerpt path applies to the next code fence only.
//!
//! ```text
//! <?code-excerpt path-base="examples/java/basic"?>
//! <?code-excerpt "src/main/java/Main.java"?>
//! ```java
//! ...
//! ```
//! ```

use tracing::debug;

/// A recognized, well-formed directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Base directory for later excerpt paths. An empty value clears it.
    PathBase(String),
    /// Path for the next code fence, with an optional base set in the same
    /// instruction.
    Excerpt {
        path: String,
        path_base: Option<String>,
    },
    /// Syntactically valid, but not a directive this parser knows.
    Unknown { name: String },
}

impl Directive {
    pub fn name(&self) -> &str {
        match self {
            Directive::PathBase(_) => "path-base",
            Directive::Excerpt { .. } => "code-excerpt",
            Directive::Unknown { name } => name,
        }
    }
}

/// The raw pieces of `name "positional" key="value"`, shared by
/// directives and shortcodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Invocation {
    pub name: String,
    pub positional: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

impl Invocation {
    /// Last value given for `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Whether `text` has the outer shape of a processing instruction.
pub fn looks_like_directive(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("<?") && text.ends_with("?>") && text.len() >= 4
}

/// Parse one processing instruction.
///
/// Returns `None` when `text` is not shaped like `<?...?>` at all, and
/// `Some(Err(reason))` when it is but its arguments are malformed.
pub fn parse_directive(text: &str) -> Option<Result<Directive, String>> {
    if !looks_like_directive(text) {
        return None;
    }
    let text = text.trim();
    let inner = &text[2..text.len() - 2];
    Some(parse_invocation(inner).and_then(interpret))
}

fn interpret(raw: Invocation) -> Result<Directive, String> {
    match raw.name.as_str() {
        "code-excerpt" => {
            if raw.positional.len() > 1 {
                return Err("code-excerpt takes at most one path".into());
            }
            let path_base = raw.attribute("path-base").map(str::to_string);
            match (raw.positional.into_iter().next(), path_base) {
                (Some(path), path_base) => Ok(Directive::Excerpt { path, path_base }),
                (None, Some(base)) => Ok(Directive::PathBase(base)),
                (None, None) => Err("code-excerpt needs a path or a path-base".into()),
            }
        }
        "path-base" => match raw.positional.as_slice() {
            [base] => Ok(Directive::PathBase(base.clone())),
            _ => Err("path-base takes exactly one quoted value".into()),
        },
        "source-excerpt-path" => match raw.positional.as_slice() {
            [path] => Ok(Directive::Excerpt {
                path: path.clone(),
                path_base: None,
            }),
            _ => Err("source-excerpt-path takes exactly one quoted value".into()),
        },
        _ => Ok(Directive::Unknown { name: raw.name }),
    }
}

/// Parse `name args...` into its parts.
pub fn parse_invocation(inner: &str) -> Result<Invocation, String> {
    let mut chars = inner.char_indices().peekable();
    let mut raw = Invocation::default();

    // Name
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' {
            raw.name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if raw.name.is_empty() || !raw.name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err("missing directive name".into());
    }

    loop {
        let mut saw_space = false;
        while let Some(&(_, c)) = chars.peek() {
            if c.is_whitespace() {
                saw_space = true;
                chars.next();
            } else {
                break;
            }
        }
        let Some(&(_, c)) = chars.peek() else {
            break;
        };
        if !saw_space {
            return Err(format!("unexpected `{}` after `{}`", c, raw.name));
        }

        if c == '"' {
            chars.next();
            raw.positional.push(read_quoted(&mut chars)?);
            continue;
        }

        let mut key = String::new();
        while let Some(&(_, c)) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                key.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if key.is_empty() {
            return Err(format!("unexpected `{}` in arguments", c));
        }
        match chars.next() {
            Some((_, '=')) => {}
            _ => return Err(format!("expected `=` after `{}`", key)),
        }
        match chars.next() {
            Some((_, '"')) => {}
            _ => return Err(format!("value of `{}` must be quoted", key)),
        }
        let value = read_quoted(&mut chars)?;
        raw.attributes.push((key, value));
    }

    Ok(raw)
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<String, String> {
    let mut value = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '"' => return Ok(value),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            _ => value.push(c),
        }
    }
    Err("unterminated string".into())
}

/// Directive state threaded through the block parser in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveContext {
    path_base: Option<String>,
    pending_excerpt: Option<String>,
}

impl DirectiveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_base(&self) -> Option<&str> {
        self.path_base.as_deref()
    }

    pub fn pending_excerpt(&self) -> Option<&str> {
        self.pending_excerpt.as_deref()
    }

    pub fn apply(&mut self, directive: &Directive) {
        match directive {
            Directive::PathBase(base) => self.set_base(base),
            Directive::Excerpt { path, path_base } => {
                if let Some(base) = path_base {
                    self.set_base(base);
                }
                let resolved = self.join(path);
                if let Some(previous) = self.pending_excerpt.replace(resolved) {
                    debug!(path = %previous, "excerpt replaced before reaching a code fence");
                }
            }
            Directive::Unknown { .. } => {}
        }
    }

    /// Consume the excerpt path for the code fence being built.
    pub fn take_excerpt(&mut self) -> Option<String> {
        self.pending_excerpt.take()
    }

    fn set_base(&mut self, base: &str) {
        self.path_base = if base.is_empty() {
            None
        } else {
            Some(base.to_string())
        };
    }

    fn join(&self, path: &str) -> String {
        match &self.path_base {
            Some(base) => format!("{}/{}", base, path),
            None => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_and_attribute_arguments() {
        let raw = parse_invocation(r#"code-excerpt "a/b.java" path-base="x" title="T""#).unwrap();
        assert_eq!(raw.name, "code-excerpt");
        assert_eq!(raw.positional, vec!["a/b.java"]);
        assert_eq!(raw.attribute("path-base"), Some("x"));
        assert_eq!(raw.attribute("title"), Some("T"));
    }

    #[test]
    fn escaped_quotes_inside_values() {
        let raw = parse_invocation(r#"note "say \"hi\"""#).unwrap();
        assert_eq!(raw.positional, vec![r#"say "hi""#]);
    }

    #[test]
    fn rejects_unquoted_values_and_missing_names() {
        assert!(parse_invocation(r#"code-excerpt path-base=x"#).is_err());
        assert!(parse_invocation(r#" "orphan""#).is_err());
        assert!(parse_invocation(r#"code-excerpt "open"#).is_err());
        assert!(parse_invocation(r#"code-excerpt"glued""#).is_err());
    }

    #[test]
    fn not_a_directive_at_all() {
        assert_eq!(parse_directive("<div>"), None);
        assert_eq!(parse_directive("plain text"), None);
    }
}
