//! Reference-style link resolution.
//!
//! Runs after the whole body is parsed: every `[label]: url` definition in
//! the page, wherever it sits, goes into one table, then each
//! [`LinkTarget::Reference`] is replaced by the URL it names.

use std::collections::HashMap;

use tracing::debug;

use crate::Page;
use crate::block::reference::{LinkDefinition, LinkTarget, normalize_label};
use crate::block::{Block, visit_blocks};
use crate::inline::Inline;
use crate::parser::error::{ErrorKind, ParseError, line_of};
use crate::parser::{DuplicatePolicy, ParseOptions};

/// Link definitions keyed by normalized label.
#[derive(Debug, Clone, Default)]
pub struct DefinitionTable {
    entries: HashMap<String, LinkDefinition>,
}

impl DefinitionTable {
    pub fn get(&self, label: &str) -> Option<&LinkDefinition> {
        self.entries.get(&normalize_label(label))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve every reference-style link in `page`.
///
/// All unresolved references are reported together. Duplicate
/// definitions follow `options.duplicate_definitions`; the last one wins
/// unless the policy makes them fatal.
pub fn resolve(
    page: Page,
    source: &str,
    options: ParseOptions,
) -> Result<(Page, Vec<ParseError>), Vec<ParseError>> {
    let file_id = page.source_id;
    let mut problems = Vec::new();
    let table = collect_definitions(
        &page.body,
        source,
        file_id,
        options.duplicate_definitions,
        &mut problems,
    );
    debug!(definitions = table.len(), "definition table built");

    let mut resolver = Resolver {
        table: &table,
        source,
        file_id,
        errors: Vec::new(),
    };
    let body = resolver.blocks(page.body);

    let (warnings, mut errors): (Vec<_>, Vec<_>) =
        problems.into_iter().partition(ParseError::is_warning);
    errors.extend(resolver.errors);
    if !errors.is_empty() {
        errors.sort_by_key(|e| e.span.start);
        return Err(errors);
    }
    Ok((Page { body, ..page }, warnings))
}

/// Gather definitions from the whole page into a table.
pub fn collect_definitions(
    body: &[Block],
    source: &str,
    file_id: usize,
    policy: DuplicatePolicy,
    problems: &mut Vec<ParseError>,
) -> DefinitionTable {
    let mut table = DefinitionTable::default();
    visit_blocks(body, &mut |block| {
        let Block::LinkDefinitions { definitions } = block else {
            return;
        };
        for def in definitions {
            let key = normalize_label(&def.label);
            if let Some(previous) = table.entries.get(&key) {
                let message = format!("duplicate definition for `{}`", def.label);
                let note = format!(
                    "first defined on line {}",
                    line_of(source, previous.span.start)
                );
                let line = line_of(source, def.span.start);
                let kind = ErrorKind::DuplicateDefinition;
                match policy {
                    DuplicatePolicy::Allow => {}
                    DuplicatePolicy::Warn => problems.push(
                        ParseError::warning(kind, message, def.span.clone(), line, file_id)
                            .with_note(note)
                            .with_note("the later definition wins"),
                    ),
                    DuplicatePolicy::Deny => problems.push(
                        ParseError::error(kind, message, def.span.clone(), line, file_id)
                            .with_note(note),
                    ),
                }
            }
            table.entries.insert(key, def.clone());
        }
    });
    table
}

struct Resolver<'t> {
    table: &'t DefinitionTable,
    source: &'t str,
    file_id: usize,
    errors: Vec<ParseError>,
}

impl Resolver<'_> {
    fn blocks(&mut self, blocks: Vec<Block>) -> Vec<Block> {
        blocks.into_iter().map(|b| self.block(b)).collect()
    }

    fn block(&mut self, block: Block) -> Block {
        match block {
            Block::Heading { level, content, id } => Block::Heading {
                level,
                content: self.inlines(content),
                id,
            },
            Block::Paragraph { content } => Block::Paragraph {
                content: self.inlines(content),
            },
            Block::List(mut list) => {
                list.items = list.items.into_iter().map(|item| self.blocks(item)).collect();
                Block::List(list)
            }
            Block::Callout(mut callout) => {
                callout.body = self.blocks(callout.body);
                Block::Callout(callout)
            }
            other => other,
        }
    }

    fn inlines(&mut self, inlines: Vec<Inline>) -> Vec<Inline> {
        inlines.into_iter().map(|i| self.inline(i)).collect()
    }

    fn inline(&mut self, inline: Inline) -> Inline {
        match inline {
            Inline::Link {
                target,
                title,
                content,
            } => {
                let (target, title) = self.target(target, title);
                Inline::Link {
                    target,
                    title,
                    content: self.inlines(content),
                }
            }
            Inline::Image { target, title, alt } => {
                let (target, title) = self.target(target, title);
                Inline::Image {
                    target,
                    title,
                    alt: self.inlines(alt),
                }
            }
            Inline::Emphasis { children } => Inline::Emphasis {
                children: self.inlines(children),
            },
            Inline::Strong { children } => Inline::Strong {
                children: self.inlines(children),
            },
            Inline::Strikethrough { children } => Inline::Strikethrough {
                children: self.inlines(children),
            },
            other => other,
        }
    }

    fn target(&mut self, target: LinkTarget, title: String) -> (LinkTarget, String) {
        let LinkTarget::Reference { label, span } = target else {
            return (target, title);
        };
        match self.table.get(&label) {
            Some(def) => {
                let title = if title.is_empty() {
                    def.title.clone().unwrap_or_default()
                } else {
                    title
                };
                (LinkTarget::url(def.url.clone()), title)
            }
            None => {
                let line = line_of(self.source, span.start);
                self.errors.push(
                    ParseError::error(
                        ErrorKind::UnresolvedReference,
                        format!("unresolved reference `{}`", label),
                        span.clone(),
                        line,
                        self.file_id,
                    )
                    .with_note(format!("add a `[{}]: <url>` definition to the page", label)),
                );
                (LinkTarget::Reference { label, span }, title)
            }
        }
    }
}
