//! Output for parsed documentation pages: HTML, JSON, Markdown and
//! front matter, plus multi-page site builds.

pub mod error;
pub mod html;
pub mod site;

pub use error::{BuildError, PageError, RenderError};
pub use html::{Navigation, RenderOptions, render_document, render_fragment, render_html};
pub use site::{BuildOptions, BuildReport, SiteEntry, SiteIndex, build};

use docpage::Page;
use docpage::metadata::FrontMatterFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
    Markdown,
    /// Just the front-matter block.
    Metadata,
}

/// Render a single page in `format`.
pub fn render(
    page: &Page,
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    match format {
        OutputFormat::Html => render_html(page, options, None),
        OutputFormat::Json => render_json(page),
        OutputFormat::Markdown => render_markdown(page),
        OutputFormat::Metadata => Ok(page
            .metadata
            .to_front_matter(page.front_matter.unwrap_or(FrontMatterFormat::Yaml))?),
    }
}

pub fn render_json(page: &Page) -> Result<String, RenderError> {
    html::ensure_resolved(page)?;
    Ok(serde_json::to_string_pretty(page)?)
}

/// Markdown source that parses back to an equivalent page.
pub fn render_markdown(page: &Page) -> Result<String, RenderError> {
    let mut out = match page.front_matter {
        Some(format) => page.metadata.to_front_matter(format)?,
        None => String::new(),
    };
    let body: Vec<String> = page.body.iter().map(ToString::to_string).collect();
    out.push_str(&body.join("\n"));
    Ok(out)
}
