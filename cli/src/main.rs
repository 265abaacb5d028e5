//! docshift CLI - document conversion tool

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};

use docshift::{
    detect_format_from_path, is_valid_path, supported_formats, supported_paths,
    ConversionRequest, ConvertOptions, Engine, Format, JobSnapshot, PageLayout, PageSize,
    ParseOptions, RenderOptions,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "docshift")]
#[command(author = "docshift contributors")]
#[command(version)]
#[command(about = "Convert documents between Markdown, HTML, and PDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one document
    Convert {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Target format
        #[arg(short, long, value_enum)]
        to: FormatArg,

        /// Source format (detected from the file if not specified)
        #[arg(short, long, value_enum)]
        from: Option<FormatArg>,

        /// Output file (stdout for text formats if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: Settings,
    },

    /// Convert several documents in parallel
    Batch {
        /// Input files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Target format
        #[arg(short, long, value_enum)]
        to: FormatArg,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,

        #[command(flatten)]
        settings: Settings,
    },

    /// Join several documents of one format into a single output
    Concat {
        /// Input files, in order
        #[arg(value_name = "FILES", required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// Target format
        #[arg(short, long, value_enum)]
        to: FormatArg,

        /// Output file (stdout for text formats if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: Settings,
    },

    /// List formats and conversion paths
    Formats {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show document information
    Info {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

/// Flags shared by the converting subcommands.
#[derive(clap::Args)]
struct Settings {
    /// PDF page size: letter, a4, legal or WIDTHxHEIGHT in points
    #[arg(long, env = "DOCSHIFT_PAGE_SIZE", default_value = "letter")]
    page_size: String,

    /// PDF page margin in points
    #[arg(long, default_value = "72")]
    margin: f32,

    /// Largest accepted input in bytes
    #[arg(long, env = "DOCSHIFT_MAX_INPUT")]
    max_input: Option<usize>,

    /// Fail on malformed HTML instead of recovering
    #[arg(long)]
    strict: bool,

    /// Include YAML frontmatter in Markdown output
    #[arg(long)]
    frontmatter: bool,

    /// Emit a complete HTML document instead of a fragment
    #[arg(long)]
    standalone: bool,
}

impl Settings {
    fn engine(&self) -> CliResult<Engine> {
        Ok(Engine::with_options(self.options()?))
    }

    fn options(&self) -> CliResult<ConvertOptions> {
        let page = PageLayout::new()
            .with_size(self.page_size.parse::<PageSize>()?)
            .with_margin(self.margin);
        let render = RenderOptions::new()
            .with_frontmatter(self.frontmatter)
            .with_standalone_html(self.standalone)
            .with_page_layout(page);
        let parse = if self.strict {
            ParseOptions::new().strict()
        } else {
            ParseOptions::new().lenient()
        };

        let mut options = ConvertOptions::new()
            .with_parse_options(parse)
            .with_render_options(render);
        if let Some(limit) = self.max_input {
            options = options.with_max_input_bytes(limit);
        }
        Ok(options)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum FormatArg {
    /// Markdown (CommonMark)
    #[value(alias = "md")]
    Markdown,
    /// HTML
    #[value(alias = "htm")]
    Html,
    /// PDF (output only)
    Pdf,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => Format::Markdown,
            FormatArg::Html => Format::Html,
            FormatArg::Pdf => Format::Pdf,
        }
    }
}

/// Some inputs of a batch failed; each was already reported.
#[derive(Debug)]
struct BatchFailed {
    failed: usize,
    total: usize,
    client_only: bool,
}

impl fmt::Display for BatchFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} conversions failed", self.failed, self.total)
    }
}

impl std::error::Error for BatchFailed {}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            to,
            from,
            output,
            settings,
        } => cmd_convert(
            &input,
            from.map(Format::from),
            to.into(),
            output.as_deref(),
            &settings,
        ),
        Commands::Batch {
            inputs,
            to,
            output,
            settings,
        } => cmd_batch(&inputs, to.into(), &output, &settings),
        Commands::Concat {
            inputs,
            to,
            output,
            settings,
        } => cmd_concat(&inputs, to.into(), output.as_deref(), &settings),
        Commands::Formats { json } => cmd_formats(json),
        Commands::Info { input, json } => cmd_info(&input, json),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

/// 2 for bad requests (unknown format, unsupported path, unparsable input),
/// 1 for everything else.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    if let Some(e) = err.downcast_ref::<docshift::Error>() {
        return if e.kind().is_client_error() { 2 } else { 1 };
    }
    if let Some(batch) = err.downcast_ref::<BatchFailed>() {
        return if batch.client_only { 2 } else { 1 };
    }
    1
}

fn cmd_convert(
    input: &Path,
    from: Option<Format>,
    to: Format,
    output: Option<&Path>,
    settings: &Settings,
) -> CliResult<()> {
    let source = match from {
        Some(format) => format,
        None => detect_format_from_path(input)?,
    };
    let engine = settings.engine()?;
    let result = engine.convert_file(input, source, to)?;
    log::info!(
        "converted {} ({} to {}) in job {}",
        input.display(),
        source,
        to,
        result.job.id
    );

    let output = output
        .map(Path::to_path_buf)
        .or_else(|| (!to.is_text()).then(|| default_output(input, Path::new("."), to)));
    write_output(output.as_deref(), &result.output)
}

fn cmd_batch(inputs: &[PathBuf], to: Format, output_dir: &Path, settings: &Settings) -> CliResult<()> {
    fs::create_dir_all(output_dir)?;

    let mut requests = Vec::with_capacity(inputs.len());
    for input in inputs {
        let source = detect_format_from_path(input)?;
        requests.push(ConversionRequest::new(fs::read(input)?, source, to));
    }

    let pb = ProgressBar::new(requests.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("Converting...");

    let (tx, rx) = crossbeam_channel::unbounded();
    let engine = settings.engine()?.with_observer(Arc::new(tx));
    let watcher = spawn_batch_progress(pb.clone(), rx);

    let results = engine.convert_batch(&requests);
    // The engine owns the only sender; dropping it ends the watcher.
    drop(engine);
    let _ = watcher.join();
    pb.finish_with_message("Done!");

    let mut failed = 0;
    let mut client_only = true;
    println!();
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(result) => {
                let path = default_output(input, output_dir, to);
                fs::write(&path, &result.output)?;
                println!("  {} {}", "✓".green(), path.display());
            }
            Err(e) => {
                failed += 1;
                client_only &= e.kind().is_client_error();
                println!("  {} {}: {}", "✗".red(), input.display(), e);
            }
        }
    }

    if failed > 0 {
        return Err(Box::new(BatchFailed {
            failed,
            total: inputs.len(),
            client_only,
        }));
    }
    println!(
        "\n{} {} documents converted",
        "Done!".green().bold(),
        inputs.len()
    );
    Ok(())
}

fn spawn_batch_progress(pb: ProgressBar, rx: Receiver<JobSnapshot>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for job in rx {
            if job.is_finished() {
                pb.inc(1);
            }
        }
    })
}

fn cmd_concat(
    inputs: &[PathBuf],
    to: Format,
    output: Option<&Path>,
    settings: &Settings,
) -> CliResult<()> {
    let source = detect_format_from_path(&inputs[0])?;
    let mut contents = Vec::with_capacity(inputs.len());
    for input in inputs {
        let format = detect_format_from_path(input)?;
        if format != source {
            return Err(Box::new(docshift::Error::InvalidInput(format!(
                "{} is {}, expected {}",
                input.display(),
                format,
                source
            ))));
        }
        contents.push(fs::read(input)?);
    }

    let parts: Vec<&[u8]> = contents.iter().map(Vec::as_slice).collect();
    let engine = settings.engine()?;
    let result = engine.concatenate(&parts, source, to)?;

    let output = output
        .map(Path::to_path_buf)
        .or_else(|| (!to.is_text()).then(|| PathBuf::from(format!("concat.{}", to.extension()))));
    write_output(output.as_deref(), &result.output)
}

fn cmd_formats(json: bool) -> CliResult<()> {
    if json {
        let formats: Vec<_> = supported_formats()
            .iter()
            .map(|format| {
                serde_json::json!({
                    "name": format,
                    "mime_type": format.mime_type(),
                    "extension": format.extension(),
                    "readable": format.is_readable(),
                })
            })
            .collect();
        let value = serde_json::json!({
            "formats": formats,
            "paths": supported_paths(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Formats".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for format in supported_formats() {
        let role = if format.is_readable() {
            "read/write"
        } else {
            "write only"
        };
        println!(
            "{:<10} {:<18} .{:<6} {}",
            format.as_str().bold(),
            format.mime_type(),
            format.extension(),
            role.dimmed()
        );
    }

    println!();
    println!("{}", "Conversion paths (from → to)".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    print!("{:<10}", "");
    for target in supported_formats() {
        print!("{:<10}", target.as_str());
    }
    println!();
    for source in supported_formats() {
        print!("{:<10}", source.as_str().bold());
        for target in supported_formats() {
            let mark = if is_valid_path(source, target) {
                "✓".green()
            } else {
                "-".dimmed()
            };
            print!("{:<10}", mark);
        }
        println!();
    }
    Ok(())
}

fn cmd_info(input: &Path, json: bool) -> CliResult<()> {
    let format = detect_format_from_path(input)?;
    let bytes = fs::metadata(input)?.len();
    let doc = if format.is_readable() {
        Some(docshift::parse(&fs::read(input)?, format)?)
    } else {
        None
    };
    let title = doc.as_ref().and_then(|doc| doc.title());
    let stats = doc.as_ref().map(|doc| doc.stats());

    if json {
        let value = serde_json::json!({
            "file": input.display().to_string(),
            "format": format,
            "mime_type": format.mime_type(),
            "bytes": bytes,
            "title": title,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {} ({})", "Format".bold(), format, format.mime_type());
    println!("{}: {} bytes", "Size".bold(), bytes);
    if let Some(ref title) = title {
        println!("{}: {}", "Title".bold(), title);
    }

    let Some(stats) = stats else {
        println!();
        println!("{}", "PDF files can be produced but not read.".dimmed());
        return Ok(());
    };

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Headings".bold(), stats.heading_count);
    println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    println!(
        "{}: {} ({} items)",
        "Lists".bold(),
        stats.list_count,
        stats.list_item_count
    );
    println!("{}: {}", "Code blocks".bold(), stats.code_block_count);
    println!("{}: {}", "Links".bold(), stats.link_count);
    println!("{}: {}", "Words".bold(), stats.word_count);
    println!("{}: {}", "Characters".bold(), stats.char_count);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docshift".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Markdown, HTML and PDF conversion tool");
    println!();
    println!("License: MIT");
}

/// `<dir>/<input stem>.<target extension>`
fn default_output(input: &Path, dir: &Path, to: Format) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    dir.join(format!("{}.{}", stem, to.extension()))
}

fn write_output(path: Option<&Path>, output: &[u8]) -> CliResult<()> {
    match path {
        Some(path) => {
            fs::write(path, output)?;
            println!("{} {}", "Saved to".green(), path.display());
        }
        None => print!("{}", String::from_utf8_lossy(output)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            page_size: "letter".to_string(),
            margin: 72.0,
            max_input: None,
            strict: false,
            frontmatter: false,
            standalone: false,
        }
    }

    #[test]
    fn test_default_output() {
        let path = default_output(Path::new("docs/readme.md"), Path::new("out"), Format::Html);
        assert_eq!(path, PathBuf::from("out/readme.html"));
    }

    #[test]
    fn test_settings_options() {
        let mut settings = settings();
        settings.page_size = "a4".to_string();
        settings.max_input = Some(100);
        settings.strict = true;
        let options = settings.options().unwrap();
        assert_eq!(options.render.page.size, PageSize::A4);
        assert_eq!(options.max_input_bytes, 100);
        assert_eq!(options.parse.error_mode, docshift::ErrorMode::Strict);
    }

    #[test]
    fn test_bad_page_size_is_client_error() {
        let mut settings = settings();
        settings.page_size = "tabloid".to_string();
        let err = settings.options().err().unwrap();
        assert_eq!(exit_code(err.as_ref()), 2);
    }

    #[test]
    fn test_exit_codes() {
        let unsupported = docshift::Error::UnsupportedPath {
            from: Format::Pdf,
            to: Format::Html,
        };
        assert_eq!(exit_code(&unsupported), 2);
        assert_eq!(exit_code(&docshift::Error::Render("x".into())), 1);

        let batch = BatchFailed {
            failed: 1,
            total: 2,
            client_only: false,
        };
        assert_eq!(exit_code(&batch), 1);
    }

    #[test]
    fn test_convert_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.md");
        fs::write(&input, "# Notes\n\n- one\n- two\n").unwrap();
        let output = dir.path().join("notes.html");

        cmd_convert(&input, None, Format::Html, Some(&output), &settings()).unwrap();
        let html = fs::read_to_string(&output).unwrap();
        assert!(html.contains("<h1>Notes</h1>"));
        assert!(html.contains("<li>two</li>"));
    }

    #[test]
    fn test_batch_writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.md");
        let b = dir.path().join("b.html");
        fs::write(&a, "# A").unwrap();
        fs::write(&b, "<h1>B</h1>").unwrap();
        let out = dir.path().join("out");

        cmd_batch(&[a, b], Format::Pdf, &out, &settings()).unwrap();
        for name in ["a.pdf", "b.pdf"] {
            let bytes = fs::read(out.join(name)).unwrap();
            assert!(bytes.starts_with(b"%PDF-"));
        }
    }

    #[test]
    fn test_concat_rejects_mixed_formats() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.md");
        let b = dir.path().join("b.html");
        fs::write(&a, "# A").unwrap();
        fs::write(&b, "<h1>B</h1>").unwrap();

        let err = cmd_concat(&[a, b], Format::Html, None, &settings()).unwrap_err();
        assert_eq!(exit_code(err.as_ref()), 2);
    }
}
