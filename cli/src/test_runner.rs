use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;
use walkdir::WalkDir;

use docpage::parser::{ParseError, ParseOptions, Parser};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// The page under test.
    pub source: String,

    /// Validation policies for this page.
    #[serde(default)]
    pub options: ParseOptions,

    /// Expected parse error: some error's message or kind must contain this.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If set alongside `expect_error`, the matching error must start on
    /// this 1-based line.
    #[serde(default)]
    pub expect_error_line: Option<usize>,

    /// Substrings that must all appear in the rendered HTML fragment.
    #[serde(default)]
    pub expect_html: Vec<String>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    // 1. Read file
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    // 2. Parse the fixture
    let config: TestConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("fixture error: {}", e)),
            };
        }
    };

    let description = config.description.clone();
    let outcome = match check(&config) {
        Some(reason) => TestOutcome::Fail(reason),
        None => TestOutcome::Pass,
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Run one fixture. Returns `Some(reason)` on failure.
fn check(config: &TestConfig) -> Option<String> {
    let parser = Parser::new(config.source.clone(), 0).with_options(config.options);
    let result = parser.parse();

    // Expected errors
    if let Some(expected) = &config.expect_error {
        return match result {
            Err(errors) => check_error(&errors, expected, config.expect_error_line),
            Ok(_) => Some(format!(
                "expected error containing \"{}\", but parsing succeeded",
                expected
            )),
        };
    }

    let (page, warnings) = match result {
        Ok(pair) => pair,
        Err(errs) => {
            let msgs: Vec<String> = errs.iter().map(|e| e.message.clone()).collect();
            return Some(format!("unexpected parse error: {}", msgs.join("; ")));
        }
    };

    // Rendered output
    if !config.expect_html.is_empty() {
        let html = match renderer::render_fragment(&page) {
            Ok(markup) => markup.into_string(),
            Err(e) => return Some(format!("render error: {}", e)),
        };
        for expected in &config.expect_html {
            if !html.contains(expected.as_str()) {
                return Some(format!(
                    "HTML mismatch\n  expected to contain: {}\n  actual: {}",
                    expected, html
                ));
            }
        }
    }

    // Warnings
    if let Some(expected_warnings) = &config.expect_warnings {
        return check_warnings(&warnings, expected_warnings);
    }

    None
}

fn check_error(errors: &[ParseError], expected: &str, line: Option<usize>) -> Option<String> {
    let matching = errors
        .iter()
        .find(|e| e.message.contains(expected) || e.kind.as_str().contains(expected));
    match (matching, line) {
        (None, _) => {
            let msgs: Vec<String> = errors
                .iter()
                .map(|e| format!("[{}] {}", e.kind, e.message))
                .collect();
            Some(format!(
                "expected error containing \"{}\", got: {}",
                expected,
                msgs.join("; ")
            ))
        }
        (Some(error), Some(line)) if error.line != line => Some(format!(
            "expected error on line {}, but it is on line {}",
            line, error.line
        )),
        _ => None,
    }
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(warnings: &[ParseError], expected: &[ExpectedWarning]) -> Option<String> {
    if warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = warnings
            .iter()
            .map(|w| format!("  - {} (line {})", w, w.line))
            .collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected.iter()).enumerate() {
        let msg = actual.to_string();

        if !msg.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }

        if let Some(expected_line) = expected.line {
            if actual.line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but it is on line {}",
                    i, expected_line, actual.line
                ));
            }
        }
    }

    None
}

/// Fixture files grouped by category, the subfolder path relative to the
/// root with `/` separators. Files directly in the root get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let fixtures = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| warn!(error = %e, "skipping unreadable fixture entry"))
                .ok()
        })
        .filter(|entry| {
            entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(".test.toml")
        });
    for entry in fixtures {
        let category = entry
            .path()
            .parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
            .map(|dir| {
                dir.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();
        categories.entry(category).or_default().push(entry.into_path());
    }
    categories
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.toml files found in {}", path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// The categories to run: every one when `requested` is empty, otherwise
/// each requested category together with its subcategories.
fn select_categories(
    path: &Path,
    requested: &[String],
) -> Result<BTreeMap<String, Vec<PathBuf>>, String> {
    if path.is_file() {
        return Ok(BTreeMap::from([(String::new(), vec![path.to_path_buf()])]));
    }
    let mut all = discover_categorized(path);
    if all.is_empty() {
        return Err(format!("no .test.toml files found in {}", path.display()));
    }
    if requested.is_empty() {
        return Ok(all);
    }

    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let nested = format!("{}/", request);
        let matching: Vec<String> = all
            .keys()
            .filter(|category| *category == request || category.starts_with(&nested))
            .cloned()
            .collect();
        if matching.is_empty() {
            let available: Vec<&str> = all.keys().map(|c| category_label(c)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                available.join(", ")
            );
        }
        for category in matching {
            if let Some(files) = all.remove(&category) {
                selected.insert(category, files);
            }
        }
    }
    if selected.is_empty() {
        return Err("no matching categories found".to_string());
    }
    Ok(selected)
}

fn paint(s: &str, code: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    }
}

fn test_label(result: &TestResult) -> &str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(".test.toml"))
            .unwrap_or("?")
    })
}

/// Run all `.test.toml` files under `path` (or a single file), limited to
/// `categories` when any are given. Returns the exit code: 0 when every
/// fixture passes, 1 otherwise.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let selected = match select_categories(path, categories) {
        Ok(selected) => selected,
        Err(message) => {
            eprintln!("{}", message);
            return 1;
        }
    };

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();
    for (category, files) in &selected {
        eprintln!();
        eprintln!("{}", paint(category_label(category), "1", no_color));
        for file in files {
            let result = run_single_test(file);
            if matches!(result.outcome, TestOutcome::Pass) {
                passed += 1;
                eprintln!("  {}  {}", paint("PASS", "32", no_color), test_label(&result));
            } else {
                eprintln!("  {}  {}", paint("FAIL", "31", no_color), test_label(&result));
                failures.push(result);
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            if let TestOutcome::Fail(reason) = &failure.outcome {
                eprintln!();
                eprintln!("  --- {} ---", failure.path.display());
                reason.lines().for_each(|line| eprintln!("  {}", line));
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
