use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn docpage(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docpage"))
        .args(args)
        .arg("--no-color")
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run docpage")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn fixtures() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures")
}

#[test]
fn fixture_suite_passes() {
    let dir = tempfile::tempdir().unwrap();
    let output = docpage(&["test", fixtures()], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("test result: ok."));
}

#[test]
fn fixture_categories_can_be_selected() {
    let dir = tempfile::tempdir().unwrap();
    let output = docpage(&["test", fixtures(), "-c", "links"], dir.path());
    let err = stderr(&output);
    assert!(output.status.success(), "{}", err);
    assert!(err.contains("test result: ok. 4 passed, 0 failed"), "{}", err);
    assert!(!err.contains("front-matter"));
}

#[test]
fn check_reports_unresolved_reference_with_location() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.md"), "---\ntitle: Good\n---\nFine.\n").unwrap();
    fs::write(dir.path().join("bad.md"), "---\ntitle: Bad\n---\nSee [exporters][].\n").unwrap();

    let output = docpage(&["check", "good.md", "bad.md"], dir.path());
    let err = stderr(&output);
    assert_eq!(output.status.code(), Some(1), "{}", err);
    assert!(err.contains("ok: good.md"), "{}", err);
    assert!(err.contains("error[unresolved-reference]"), "{}", err);
    assert!(err.contains("exporters"), "{}", err);
    assert!(err.contains("bad.md:4:"), "{}", err);
}

#[test]
fn render_writes_html_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("page.md"),
        "---\ntitle: Java\n---\n## Install {#install}\n",
    )
    .unwrap();

    let output = docpage(&["render", "page.md", "--fragment"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "<h2 id=\"install\">Install</h2>"
    );

    let output = docpage(&["render", "page.md", "-f", "metadata"], dir.path());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "---\ntitle: Java\n---\n");
}

#[test]
fn config_file_sets_validation_policy() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("docpage.toml"),
        "[validation]\nduplicate_definitions = \"deny\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("dup.md"), "[a][]\n\n[a]: /x\n[a]: /y\n").unwrap();

    let output = docpage(&["check", "dup.md"], dir.path());
    assert_eq!(output.status.code(), Some(1), "{}", stderr(&output));
    assert!(stderr(&output).contains("duplicate-definition"));

    fs::write(dir.path().join("docpage.toml"), "[validation]\nstrict = true\n").unwrap();
    let output = docpage(&["check", "dup.md"], dir.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn build_renders_a_site() {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    fs::create_dir_all(content.join("java")).unwrap();
    fs::write(content.join("_index.md"), "---\ntitle: Docs\n---\nWelcome.\n").unwrap();
    fs::write(content.join("java/index.md"), "---\ntitle: Java\n---\nJava docs.\n").unwrap();

    let output = docpage(&["build", "-j", "2"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(dir.path().join("public/index.html").is_file());
    let java = fs::read_to_string(dir.path().join("public/java/index.html")).unwrap();
    assert!(java.contains("<title>Java</title>"));
}
