use std::fs;
use std::path::{Path, PathBuf};

use docpage::parser::ErrorKind;
use renderer::site::{BuildOptions, build, discover};
use renderer::{BuildError, PageError};

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "_index.md", "---\ntitle: Documentation\nweight: 1\n---\n# Welcome\n");
    write(
        root,
        "java/getting-started.md",
        "---\ntitle: Getting Started\nlinkTitle: Start\nweight: 10\n---\nSee [agent][].\n\n[agent]: /java/agent.html\n",
    );
    write(root, "java/agent.md", "---\ntitle: Agent\nweight: 10\n---\nAgent docs.\n");
    write(root, "faq.md", "---\ntitle: FAQ\n---\nQuestions.\n");
    write(root, "notes.txt", "not markdown");
    dir
}

#[test]
fn discovers_markdown_in_path_order() {
    let dir = sample_site();
    let discovered = discover(dir.path()).unwrap();
    assert!(discovered.errors.is_empty());
    assert_eq!(
        discovered.pages,
        vec![
            PathBuf::from("_index.md"),
            PathBuf::from("faq.md"),
            PathBuf::from("java/agent.md"),
            PathBuf::from("java/getting-started.md"),
        ]
    );
}

#[test]
fn builds_every_page_with_navigation() {
    let site = sample_site();
    let out = tempfile::tempdir().unwrap();
    let report = build(site.path(), out.path(), &BuildOptions::default()).unwrap();

    assert!(report.is_success());
    assert_eq!(report.written.len(), 4);
    assert!(out.path().join("index.html").is_file());
    assert!(out.path().join("java/getting-started.html").is_file());

    let titles: Vec<_> = report
        .index
        .entries()
        .iter()
        .map(|e| e.nav_title.as_str())
        .collect();
    assert_eq!(titles, vec!["Documentation", "Agent", "Start", "FAQ"]);

    let html = fs::read_to_string(out.path().join("java/getting-started.html")).unwrap();
    assert!(html.contains("<title>Getting Started</title>"));
    assert!(html.contains("<a href=\"/java/agent.html\">agent</a>"));
    assert!(html.contains("<li class=\"current\"><a href=\"/java/getting-started.html\">Start</a></li>"));
}

#[test]
fn failing_pages_do_not_stop_the_build() {
    let site = sample_site();
    write(site.path(), "broken.md", "---\ntitle: Broken\n---\n```java\nnever closed\n");
    write(site.path(), "dangling.md", "See [nowhere].\n");
    let out = tempfile::tempdir().unwrap();

    let report = build(site.path(), out.path(), &BuildOptions::default()).unwrap();
    assert!(!report.is_success());
    assert_eq!(report.written.len(), 4);
    assert_eq!(report.failures.len(), 2);

    let broken = &report.failures[0];
    assert_eq!(broken.path, PathBuf::from("broken.md"));
    match &broken.error {
        PageError::Parse(errors) => assert_eq!(errors[0].kind, ErrorKind::UnterminatedBlock),
        other => panic!("expected a parse failure, got {}", other),
    }
    assert!(broken.source.contains("never closed"));

    match &report.failures[1].error {
        PageError::Parse(errors) => assert_eq!(errors[0].kind, ErrorKind::UnresolvedReference),
        other => panic!("expected a parse failure, got {}", other),
    }
    assert!(!out.path().join("broken.html").exists());
}

#[test]
fn missing_source_directory() {
    let out = tempfile::tempdir().unwrap();
    let missing = out.path().join("nope");
    assert!(matches!(
        build(&missing, out.path(), &BuildOptions::default()),
        Err(BuildError::MissingSource(_))
    ));
}

#[test]
fn index_and_section_page_cannot_share_an_output() {
    let site = tempfile::tempdir().unwrap();
    write(site.path(), "_index.md", "---\ntitle: Section\n---\nSECTION BODY\n");
    write(site.path(), "index.md", "---\ntitle: Leaf\n---\nLEAF BODY\n");
    let out = tempfile::tempdir().unwrap();

    let report = build(site.path(), out.path(), &BuildOptions::default()).unwrap();
    assert!(!report.is_success());
    assert_eq!(report.written, vec![PathBuf::from("index.html")]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, PathBuf::from("index.md"));
    match &report.failures[0].error {
        PageError::OutputConflict { output, claimed_by } => {
            assert_eq!(output, &PathBuf::from("index.html"));
            assert_eq!(claimed_by, &PathBuf::from("_index.md"));
        }
        other => panic!("expected an output conflict, got {}", other),
    }

    let html = fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(html.contains("SECTION BODY"));
    assert!(!html.contains("LEAF BODY"));
}

#[cfg(unix)]
#[test]
fn unreadable_entries_do_not_stop_the_build() {
    let site = sample_site();
    std::os::unix::fs::symlink(site.path().join("missing.md"), site.path().join("dead.md")).unwrap();
    let out = tempfile::tempdir().unwrap();

    let report = build(site.path(), out.path(), &BuildOptions::default()).unwrap();
    assert_eq!(report.written.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, PathBuf::from("dead.md"));
    assert!(matches!(report.failures[0].error, PageError::Walk(_)));
}
