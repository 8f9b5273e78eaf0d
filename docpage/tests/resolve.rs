use docpage::Page;
use docpage::block::reference::LinkTarget;
use docpage::block::visit_inlines;
use docpage::inline::Inline;
use docpage::parser::{DuplicatePolicy, ErrorKind, ParseError, ParseOptions, Parser};

fn parse_with(source: &str, options: ParseOptions) -> Result<(Page, Vec<ParseError>), Vec<ParseError>> {
    Parser::new(source.to_string(), 0).with_options(options).parse()
}

fn duplicates(policy: DuplicatePolicy) -> ParseOptions {
    ParseOptions {
        duplicate_definitions: policy,
        ..ParseOptions::default()
    }
}

/// `(url, title)` of every link in the page, in document order.
fn links(page: &Page) -> Vec<(String, String)> {
    let mut out = Vec::new();
    visit_inlines(&page.body, &mut |inline| {
        if let Inline::Link { target, title, .. } = inline {
            let url = target.as_url().expect("link left unresolved");
            out.push((url.to_string(), title.clone()));
        }
    });
    out
}

#[test]
fn labels_match_case_insensitively() {
    let source = "\
See [the SDK][OTel SDK], [otel   sdk][] and [OTEL SDK].

[otel sdk]: https://opentelemetry.io/docs/languages/java/
";
    let (page, warnings) = parse_with(source, ParseOptions::default()).expect("parse failed");
    assert!(warnings.is_empty());
    let url = "https://opentelemetry.io/docs/languages/java/";
    assert_eq!(
        links(&page),
        vec![
            (url.to_string(), String::new()),
            (url.to_string(), String::new()),
            (url.to_string(), String::new()),
        ]
    );
    assert!(page.is_resolved());
}

#[test]
fn definition_title_fills_an_empty_link_title() {
    let source = "[Guide][guide] and [inline](/x \"Own\") and [kept][guide]\n\n[guide]: /guide \"The guide page\"\n";
    let (page, _) = parse_with(source, ParseOptions::default()).expect("parse failed");
    assert_eq!(
        links(&page),
        vec![
            ("/guide".to_string(), "The guide page".to_string()),
            ("/x".to_string(), "Own".to_string()),
            ("/guide".to_string(), "The guide page".to_string()),
        ]
    );
}

#[test]
fn definitions_inside_containers_are_visible_everywhere() {
    let source = "\
Top: [agent].

{{% alert %}}
[agent]: /docs/agent/
{{% /alert %}}

- Item: [agent]
";
    let (page, _) = parse_with(source, ParseOptions::default()).expect("parse failed");
    assert_eq!(links(&page).len(), 2);
    assert!(links(&page).iter().all(|(url, _)| url == "/docs/agent/"));
}

#[test]
fn image_references_resolve() {
    let source = "![diagram][arch]\n\n[arch]: /img/arch.png\n";
    let (page, _) = parse_with(source, ParseOptions::default()).expect("parse failed");
    let mut targets = Vec::new();
    visit_inlines(&page.body, &mut |inline| {
        if let Inline::Image { target, .. } = inline {
            targets.push(target.clone());
        }
    });
    assert_eq!(targets, vec![LinkTarget::url("/img/arch.png")]);
}

#[test]
fn unresolved_reference_names_label_and_line() {
    let source = "---\ntitle: T\n---\nIntro.\n\nSee [exporters][] here.\n";
    let errors = parse_with(source, ParseOptions::default()).expect_err("should fail");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::UnresolvedReference);
    assert!(errors[0].message.contains("exporters"), "{}", errors[0].message);
    assert_eq!(errors[0].line, 6);
    assert_eq!(&source[errors[0].span.clone()], "[exporters][]");
}

#[test]
fn all_unresolved_references_are_reported_together() {
    let source = "[one][] and [two][]\n\n- [three]\n";
    let errors = parse_with(source, ParseOptions::default()).expect_err("should fail");
    let labels: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
    assert_eq!(errors.len(), 3, "{:?}", labels);
    assert!(errors.iter().all(|e| e.kind == ErrorKind::UnresolvedReference));
    assert_eq!(errors[2].line, 3);
}

#[test]
fn unresolved_page_is_available_before_resolution() {
    let parser = Parser::new("[missing] link\n".to_string(), 0);
    let (page, _) = parser.parse_unresolved().expect("structure is fine");
    assert_eq!(page.unresolved_labels(), vec!["missing"]);
    assert!(!page.is_resolved());
}

#[test]
fn duplicate_definitions_follow_the_policy() {
    let source = "[docs][]\n\n[docs]: /old/\n[Docs]: /new/\n";

    let (page, warnings) = parse_with(source, duplicates(DuplicatePolicy::Allow)).expect("allow");
    assert!(warnings.is_empty());
    assert_eq!(links(&page)[0].0, "/new/");

    let (page, warnings) = parse_with(source, duplicates(DuplicatePolicy::Warn)).expect("warn");
    assert_eq!(links(&page)[0].0, "/new/");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, ErrorKind::DuplicateDefinition);
    assert_eq!(warnings[0].line, 4);
    assert!(warnings[0].notes.iter().any(|n| n.contains("line 3")));

    let errors = parse_with(source, duplicates(DuplicatePolicy::Deny)).expect_err("deny");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::DuplicateDefinition);
    assert!(!errors[0].is_warning());
}

#[test]
fn diagnostics_carry_the_error_kind() {
    let errors = parse_with("[nope]\n", ParseOptions::default()).expect_err("should fail");
    let diagnostic = errors[0].to_diagnostic();
    assert_eq!(diagnostic.code.as_deref(), Some("unresolved-reference"));
    assert_eq!(diagnostic.labels[0].range, errors[0].span);
}
