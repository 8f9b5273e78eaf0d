//! Multi-page builds.
//!
//! A build runs in three steps:
//!
//! 1. **Discover**: walk the source directory for `*.md` files.
//! 2. **Parse**: parse and resolve every page in parallel. When two pages
//!    map to the same output file, the first in path order keeps it.
//! 3. **Render**: build one read-only [`SiteIndex`], then render and write
//!    every parsed page in parallel.
//!
//! A page that fails never stops the others; its errors land in the
//! [`BuildReport`].
//!
//! ```text
//! content/                 site/
//! ├── _index.md       ──▶  ├── index.html
//! ├── install.md      ──▶  ├── install.html
//! └── java/                └── java/
//!     └── index.md    ──▶      └── index.html
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use docpage::Page;
use docpage::parser::{ParseError, ParseOptions, Parser};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{BuildError, PageError};
use crate::html::{Navigation, RenderOptions, render_html};

/// One page as listed in the site navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteEntry {
    /// Source path relative to the source directory.
    pub source: PathBuf,
    /// Output path relative to the output directory.
    pub output: PathBuf,
    pub title: String,
    pub nav_title: String,
    pub weight: Option<i64>,
}

impl SiteEntry {
    /// Root-relative URL of the rendered page.
    pub fn href(&self) -> String {
        let parts: Vec<_> = self
            .output
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        format!("/{}", parts.join("/"))
    }
}

/// Every page of a site, ordered by weight (unweighted last) then title.
#[derive(Debug, Clone, Default)]
pub struct SiteIndex {
    entries: Vec<SiteEntry>,
}

impl SiteIndex {
    pub fn new(mut entries: Vec<SiteEntry>) -> Self {
        entries.sort_by(|a, b| {
            let weight = |e: &SiteEntry| (e.weight.is_none(), e.weight.unwrap_or(0));
            weight(a)
                .cmp(&weight(b))
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.source.cmp(&b.source))
        });
        SiteIndex { entries }
    }

    pub fn entries(&self) -> &[SiteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub parse: ParseOptions,
    pub render: RenderOptions,
}

/// A page that could not be built, with its source for diagnostics.
#[derive(Debug)]
pub struct PageFailure {
    pub path: PathBuf,
    pub source: String,
    pub error: PageError,
}

/// Warnings from a page that built successfully.
#[derive(Debug)]
pub struct PageWarnings {
    pub path: PathBuf,
    pub source: String,
    pub warnings: Vec<ParseError>,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub index: SiteIndex,
    /// Output files written, relative to the output directory.
    pub written: Vec<PathBuf>,
    pub failures: Vec<PageFailure>,
    pub warnings: Vec<PageWarnings>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

struct ParsedPage {
    path: PathBuf,
    output: PathBuf,
    page: Page,
}

/// Build every page under `source` into `output`.
///
/// Pages are parsed with file id 0, so each failure's diagnostics refer to
/// its own `source` text.
pub fn build(source: &Path, output: &Path, options: &BuildOptions) -> Result<BuildReport, BuildError> {
    if !source.is_dir() {
        return Err(BuildError::MissingSource(source.to_path_buf()));
    }
    let discovered = discover(source)?;
    info!(pages = discovered.pages.len(), source = %source.display(), "discovered pages");

    let mut report = BuildReport::default();
    for error in discovered.errors {
        let path = error
            .path()
            .and_then(|p| p.strip_prefix(source).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        warn!(path = %path.display(), error = %error, "skipping unreadable entry");
        report.failures.push(PageFailure {
            path,
            source: String::new(),
            error: PageError::Walk(error),
        });
    }

    let results: Vec<_> = discovered
        .pages
        .par_iter()
        .map(|path| parse_page(source, path, options.parse))
        .collect();

    let mut parsed = Vec::new();
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    for result in results {
        match result {
            Ok((page, warnings)) => {
                if let Some(owner) = claimed.get(&page.output) {
                    warn!(
                        path = %page.path.display(),
                        output = %page.output.display(),
                        "output path already taken"
                    );
                    report.failures.push(PageFailure {
                        path: page.path,
                        source: warnings.source,
                        error: PageError::OutputConflict {
                            output: page.output,
                            claimed_by: owner.clone(),
                        },
                    });
                    continue;
                }
                claimed.insert(page.output.clone(), page.path.clone());
                if !warnings.warnings.is_empty() {
                    report.warnings.push(warnings);
                }
                parsed.push(page);
            }
            Err(failure) => report.failures.push(failure),
        }
    }

    let index = SiteIndex::new(parsed.iter().map(site_entry).collect());
    fs::create_dir_all(output)?;

    let written: Vec<_> = parsed
        .par_iter()
        .map(|page| write_page(page, &index, output, &options.render))
        .collect();
    for result in written {
        match result {
            Ok(path) => report.written.push(path),
            Err(failure) => report.failures.push(failure),
        }
    }

    report.written.sort();
    report.failures.sort_by(|a, b| a.path.cmp(&b.path));
    report.index = index;
    info!(
        written = report.written.len(),
        failed = report.failures.len(),
        "build finished"
    );
    Ok(report)
}

/// Markdown files found under a source directory.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Page paths relative to the root, in path order.
    pub pages: Vec<PathBuf>,
    /// Entries below the root that could not be read.
    pub errors: Vec<walkdir::Error>,
}

/// Walk `root` for Markdown files, following symlinks.
///
/// Only a failure on `root` itself is an error; unreadable entries below it
/// are collected in [`Discovered::errors`] and the walk goes on.
pub fn discover(root: &Path) -> Result<Discovered, BuildError> {
    let mut discovered = Discovered::default();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(BuildError::Walk(e)),
            Err(e) => {
                discovered.errors.push(e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("md")
        {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            discovered.pages.push(relative.to_path_buf());
        }
    }
    Ok(discovered)
}

/// `index.md` and `_index.md` become `index.html`; `name.md` becomes
/// `name.html`.
pub fn output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("index");
    let name = match stem {
        "_index" | "index" => "index.html".to_string(),
        other => format!("{}.html", other),
    };
    source.with_file_name(name)
}

fn parse_page(
    root: &Path,
    path: &Path,
    options: ParseOptions,
) -> Result<(ParsedPage, PageWarnings), PageFailure> {
    let text = match fs::read_to_string(root.join(path)) {
        Ok(text) => text,
        Err(e) => {
            return Err(PageFailure {
                path: path.to_path_buf(),
                source: String::new(),
                error: PageError::Io(e),
            });
        }
    };

    let parser = Parser::new(text, 0).with_options(options);
    match parser.parse() {
        Ok((page, warnings)) => {
            debug!(path = %path.display(), warnings = warnings.len(), "parsed page");
            Ok((
                ParsedPage {
                    path: path.to_path_buf(),
                    output: output_path(path),
                    page,
                },
                PageWarnings {
                    path: path.to_path_buf(),
                    source: parser.source().to_string(),
                    warnings,
                },
            ))
        }
        Err(errors) => {
            warn!(path = %path.display(), errors = errors.len(), "page failed to parse");
            Err(PageFailure {
                path: path.to_path_buf(),
                source: parser.source().to_string(),
                error: PageError::Parse(errors),
            })
        }
    }
}

fn site_entry(parsed: &ParsedPage) -> SiteEntry {
    let metadata = &parsed.page.metadata;
    let title = if metadata.title.is_empty() {
        parsed
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        metadata.title.clone()
    };
    let nav_title = match &metadata.link_title {
        Some(link_title) => link_title.clone(),
        None => title.clone(),
    };
    SiteEntry {
        source: parsed.path.clone(),
        output: parsed.output.clone(),
        title,
        nav_title,
        weight: metadata.weight,
    }
}

fn write_page(
    parsed: &ParsedPage,
    index: &SiteIndex,
    output: &Path,
    options: &RenderOptions,
) -> Result<PathBuf, PageFailure> {
    let failure = |error: PageError| PageFailure {
        path: parsed.path.clone(),
        source: String::new(),
        error,
    };
    let navigation = Navigation {
        index,
        current: &parsed.output,
    };
    let html = render_html(&parsed.page, options, Some(navigation))
        .map_err(|e| failure(e.into()))?;

    let target = output.join(&parsed.output);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| failure(e.into()))?;
    }
    fs::write(&target, html).map_err(|e| failure(e.into()))?;
    debug!(path = %target.display(), "wrote page");
    Ok(parsed.output.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths() {
        assert_eq!(output_path(Path::new("_index.md")), PathBuf::from("index.html"));
        assert_eq!(
            output_path(Path::new("java/index.md")),
            PathBuf::from("java/index.html")
        );
        assert_eq!(
            output_path(Path::new("java/getting-started.md")),
            PathBuf::from("java/getting-started.html")
        );
    }

    #[test]
    fn href_uses_forward_slashes() {
        let entry = SiteEntry {
            source: PathBuf::from("java/index.md"),
            output: PathBuf::from("java").join("index.html"),
            title: "Java".into(),
            nav_title: "Java".into(),
            weight: None,
        };
        assert_eq!(entry.href(), "/java/index.html");
    }
}
