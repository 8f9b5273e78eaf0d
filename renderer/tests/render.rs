use docpage::Page;
use docpage::parser::Parser;
use renderer::{OutputFormat, RenderError, RenderOptions, render, render_fragment};

fn parse(source: &str) -> Page {
    let (page, _) = Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed");
    page
}

fn fragment(source: &str) -> String {
    render_fragment(&parse(source))
        .expect("render failed")
        .into_string()
}

#[test]
fn headings_get_unique_ids() {
    let html = fragment("# Setup\n\n## Setup\n\n## Install {#agent}\n\n### Setup\n");
    assert_eq!(
        html,
        "<h1 id=\"setup\">Setup</h1>\
         <h2 id=\"setup-1\">Setup</h2>\
         <h2 id=\"agent\">Install</h2>\
         <h3 id=\"setup-2\">Setup</h3>"
    );
}

#[test]
fn explicit_anchor_wins_over_an_earlier_slug() {
    let html = fragment("## Setup\n\n## Install {#setup}\n");
    assert_eq!(
        html,
        "<h2 id=\"setup-1\">Setup</h2>\
         <h2 id=\"setup\">Install</h2>"
    );
}

#[test]
fn code_fence_carries_language_and_excerpt_path() {
    let html = fragment(
        "<?code-excerpt path-base=\"examples/java\"?>\n<?code-excerpt \"Main.java\"?>\n```java\nif (a < b) {}\n```\n",
    );
    assert_eq!(
        html,
        "<pre><code class=\"language-java\" data-source=\"examples/java/Main.java\">if (a &lt; b) {}\n</code></pre>"
    );
}

#[test]
fn fence_without_language_has_no_class() {
    assert_eq!(fragment("```\nx\n```\n"), "<pre><code>x\n</code></pre>");
}

#[test]
fn callouts_render_as_alerts() {
    let html = fragment(
        "{{% alert title=\"Note\" color=\"warning\" %}}\nCheck the **version**.\n{{% /alert %}}\n\n{{% alert %}}\nPlain.\n{{% /alert %}}\n",
    );
    assert_eq!(
        html,
        "<div class=\"alert alert-warning\" role=\"alert\">\
         <h4 class=\"alert-heading\">Note</h4>\
         <p>Check the <strong>version</strong>.</p></div>\
         <div class=\"alert alert-info\" role=\"alert\"><p>Plain.</p></div>"
    );
}

#[test]
fn tight_lists_drop_paragraph_wrappers() {
    assert_eq!(
        fragment("- one\n- two\n"),
        "<ul><li>one</li><li>two</li></ul>"
    );
    assert_eq!(
        fragment("3. three\n\n4. four\n"),
        "<ol start=\"3\"><li><p>three</p></li><li><p>four</p></li></ol>"
    );
}

#[test]
fn links_resolve_and_definitions_vanish() {
    let html = fragment("See [the agent][agent].\n\n[agent]: https://example.com/agent?a=1&b=2 \"Java agent\"\n");
    assert_eq!(
        html,
        "<p>See <a href=\"https://example.com/agent?a=1&amp;b=2\" title=\"Java agent\">the agent</a>.</p>"
    );
}

#[test]
fn inline_html_passes_through() {
    assert_eq!(
        fragment("Press <kbd>Ctrl</kbd> now.\n"),
        "<p>Press <kbd>Ctrl</kbd> now.</p>"
    );
}

#[test]
fn unresolved_page_cannot_be_rendered() {
    let (page, _) = Parser::new("[missing]\n".to_string(), 0)
        .parse_unresolved()
        .expect("structure is fine");
    match render_fragment(&page) {
        Err(RenderError::Unresolved { labels }) => assert_eq!(labels, vec!["missing"]),
        other => panic!("expected Unresolved, got {:?}", other.map(|m| m.into_string())),
    }
    assert!(render(&page, OutputFormat::Json, &RenderOptions::default()).is_err());
}

#[test]
fn standalone_document() {
    let page = parse("---\ntitle: Getting Started\ndescription: First steps & more\n---\nHello.\n");
    let options = RenderOptions {
        site_title: Some("Docs".to_string()),
        ..RenderOptions::default()
    };
    let html = render(&page, OutputFormat::Html, &options).expect("render failed");
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Getting Started | Docs</title>"));
    assert!(html.contains("<meta name=\"description\" content=\"First steps &amp; more\">"));
    assert!(html.contains("<main><article><p>Hello.</p></article></main>"));
    assert!(!html.contains("<nav"));

    let fragment_only = RenderOptions {
        standalone: false,
        ..RenderOptions::default()
    };
    assert_eq!(
        render(&page, OutputFormat::Html, &fragment_only).expect("render failed"),
        "<p>Hello.</p>"
    );
}

#[test]
fn json_output() {
    let page = parse("---\ntitle: X\nweight: 5\n---\nHello [traces][]\n\n[traces]: /docs/traces/\n");
    let json = render(&page, OutputFormat::Json, &RenderOptions::default()).expect("render failed");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(value["metadata"]["title"], "X");
    assert_eq!(value["metadata"]["weight"], 5);
    assert_eq!(value["body"][0]["type"], "paragraph");
    assert_eq!(value["body"][0]["content"][1]["target"]["url"], "/docs/traces/");
}

#[test]
fn markdown_and_metadata_output() {
    let source = "+++\ntitle = \"Java\"\n+++\n# Intro\n\n- a\n- b\n";
    let page = parse(source);
    let markdown = render(&page, OutputFormat::Markdown, &RenderOptions::default()).expect("render failed");
    assert_eq!(markdown, "+++\ntitle = \"Java\"\n+++\n# Intro\n\n- a\n- b\n");
    assert_eq!(parse(&markdown), page);

    let metadata = render(&page, OutputFormat::Metadata, &RenderOptions::default()).expect("render failed");
    assert_eq!(metadata, "+++\ntitle = \"Java\"\n+++\n");
}
