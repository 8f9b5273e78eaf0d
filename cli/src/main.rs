mod config;
mod test_runner;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use docpage::parser::ParseError;
use renderer::{BuildOptions, OutputFormat, PageError, RenderOptions};

use crate::config::DocpageConfig;

#[derive(Parser)]
#[command(name = "docpage", version, about = "Documentation page parser and renderer")]
struct Cli {
    /// Config file [default: ./docpage.toml when present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and resolve pages, reporting every problem
    Check(CheckArgs),

    /// Render a single page
    Render(RenderArgs),

    /// Render every page under a source directory
    Build(BuildArgs),

    /// Run .test.toml fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Pages to check
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Json,
    Markdown,
    Metadata,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Html => OutputFormat::Html,
            Format::Json => OutputFormat::Json,
            Format::Markdown => OutputFormat::Markdown,
            Format::Metadata => OutputFormat::Metadata,
        }
    }
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Markdown page to render
    file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Emit only the page body, without the HTML document wrapper
    #[arg(long)]
    fragment: bool,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Source directory [default: build.source from config]
    #[arg(long)]
    source: Option<PathBuf>,

    /// Output directory [default: build.output from config]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.toml file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let config = match DocpageConfig::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    let exit_code = match cli.command {
        Command::Check(args) => do_check(&args, &config, color_choice),
        Command::Render(args) => do_render(&args, &config, color_choice),
        Command::Build(args) => do_build(&args, &config, color_choice),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                0
            } else {
                test_runner::run_tests(&args.path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(exit_code);
}

/// `RUST_LOG` wins; otherwise `-q` means warn, `-v` debug, and the default
/// is info. Logs go to stderr so rendered output stays clean.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: cannot initialize logging: {}", e);
    }
}

fn do_check(args: &CheckArgs, config: &DocpageConfig, color_choice: ColorChoice) -> i32 {
    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();
    let mut files = SimpleFiles::new();
    let mut failed = 0usize;

    for path in &args.files {
        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path.display(), e);
                failed += 1;
                continue;
            }
        };
        let file_id = files.add(path.display().to_string(), source.clone());

        let parser = docpage::parser::Parser::new(source, file_id).with_options(config.validation);
        match parser.parse() {
            Ok((_, warnings)) => {
                emit_diagnostics(&writer, &term_config, &files, &warnings);
                eprintln!("ok: {}", path.display());
            }
            Err(errors) => {
                emit_diagnostics(&writer, &term_config, &files, &errors);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("error: {} of {} page(s) failed", failed, args.files.len());
        1
    } else {
        0
    }
}

fn do_render(args: &RenderArgs, config: &DocpageConfig, color_choice: ColorChoice) -> i32 {
    let source = match fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file.display(), e);
            return 1;
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.display().to_string(), source.clone());
    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();

    let parser = docpage::parser::Parser::new(source, file_id).with_options(config.validation);
    let page = match parser.parse() {
        Ok((page, warnings)) => {
            emit_diagnostics(&writer, &term_config, &files, &warnings);
            page
        }
        Err(errors) => {
            emit_diagnostics(&writer, &term_config, &files, &errors);
            return 1;
        }
    };

    let options = RenderOptions {
        standalone: config.render.standalone && !args.fragment,
        ..config.render.clone()
    };
    let rendered = match renderer::render(&page, args.format.into(), &options) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    match &args.output {
        Some(output) => {
            if let Err(e) = fs::write(output, rendered) {
                eprintln!("error: cannot write '{}': {}", output.display(), e);
                return 1;
            }
            info!(path = %output.display(), "wrote page");
        }
        None => print!("{}", rendered),
    }
    0
}

fn do_build(args: &BuildArgs, config: &DocpageConfig, color_choice: ColorChoice) -> i32 {
    let source = args.source.as_ref().unwrap_or(&config.build.source);
    let output = args.output.as_ref().unwrap_or(&config.build.output);
    init_thread_pool(args.jobs.unwrap_or(config.build.threads));

    let options = BuildOptions {
        parse: config.validation,
        render: config.render.clone(),
    };
    let report = match renderer::build(source, output, &options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();

    for page in &report.warnings {
        let files = single_file(source, &page.path, &page.source);
        emit_diagnostics(&writer, &term_config, &files, &page.warnings);
    }
    for failure in &report.failures {
        match &failure.error {
            PageError::Parse(errors) => {
                let files = single_file(source, &failure.path, &failure.source);
                emit_diagnostics(&writer, &term_config, &files, errors);
            }
            other => eprintln!("error: {}: {}", failure.path.display(), other),
        }
    }

    eprintln!(
        "built {} page(s) into {}, {} failed",
        report.written.len(),
        output.display(),
        report.failures.len()
    );
    if report.is_success() { 0 } else { 1 }
}

/// Initialize the rayon thread pool. 0 keeps rayon's default.
fn init_thread_pool(threads: usize) {
    if threads == 0 {
        return;
    }
    debug!(threads, "configuring thread pool");
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!(threads, error = %e, "cannot configure thread pool, keeping the default");
    }
}

/// A file database holding one page as file id 0, the id site builds parse with.
fn single_file(root: &Path, path: &Path, source: &str) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(root.join(path).display().to_string(), source.to_string());
    files
}

fn emit_diagnostics(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    diagnostics: &[ParseError],
) {
    for diag in diagnostics {
        let diagnostic = diag.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_pool_is_configured_once() {
        init_thread_pool(2);
        init_thread_pool(5);
        assert_eq!(rayon::current_num_threads(), 2);
    }
}
