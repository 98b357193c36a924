//! CLI binary for edgequake-pdf2deck.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes the deck.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2deck::{
    inspect_with_password, write_deck, ConversionConfig, ConversionMode, ConversionOutput,
    ConversionProgressCallback, ConversionSession, JobStatus, PageSelection, ProgressCallback,
    ProgressUpdate, SlideLayout,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: one percentage bar driven by the blended
/// extract/generate progress, plus a log line per extracted page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize, mode: ConversionMode) {
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_pages} pages ({mode})…"))
        ));
    }

    fn on_progress(&self, update: &ProgressUpdate) {
        self.bar.set_position(u64::from(update.overall()));
        self.bar.set_message(update.phase.clone());
    }

    fn on_page_extracted(&self, page_num: usize, total_pages: usize, text_runs: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{text_runs:>4} text runs")),
        ));
    }

    fn on_remote_status(&self, job_id: &str, status: JobStatus, _progress: u8, _stage: Option<&str>) {
        self.bar.set_prefix(format!("Job {job_id} {status}"));
    }

    fn on_conversion_complete(&self, _total_pages: usize, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", green("✔"), message);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert next to the input name (report.pdf -> report.json)
  pdf2deck report.pdf

  # Text-only deck, 4:3 slides
  pdf2deck --mode editable --layout standard report.pdf -o slides.json

  # Specific pages, sharper page images
  pdf2deck --pages 1-5 --image-scale 2.5 paper.pdf

  # External high-precision worker
  pdf2deck --mode remote_high_precision --remote-url http://10.0.0.5:8000/api/v1 deck.pdf

  # Inspect PDF metadata
  pdf2deck --inspect-only document.pdf

  # JSON summary (stats, per-page strategy, worker report)
  pdf2deck --json document.pdf > summary.json

MODES:
  fidelity                 page image on every slide + editable text (default)
  balanced                 page image only on sparse pages (< 12 text runs)
  editable                 editable text only, pages are never rendered
  remote_high_precision    hand the file to the external worker

ENVIRONMENT VARIABLES:
  PDF2DECK_*              Fallback for every flag (e.g. PDF2DECK_MODE=editable)
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Override log filtering
"#;

/// Reflow PDF documents into editable slide decks.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2deck",
    version,
    about = "Reflow PDF documents into editable slide decks",
    long_about = "Rebuild every page of a PDF as a slide: text runs are put back into reading \
order, merged, and placed as editable text boxes, optionally on top of an image of the page. \
The remote_high_precision mode delegates the conversion to an external worker.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: String,

    /// Write the deck to this file instead of `<input stem>.<ext>`.
    #[arg(short, long, env = "PDF2DECK_OUTPUT")]
    output: Option<PathBuf>,

    /// Conversion mode: fidelity, balanced, editable, remote_high_precision.
    #[arg(long, env = "PDF2DECK_MODE", default_value = "fidelity")]
    mode: ConversionMode,

    /// Slide layout: wide (16:9) or standard (4:3).
    #[arg(long, env = "PDF2DECK_LAYOUT", default_value = "wide")]
    layout: SlideLayout,

    /// Page raster scale (1–3). Default depends on the mode.
    #[arg(long, env = "PDF2DECK_IMAGE_SCALE")]
    image_scale: Option<f64>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2DECK_PAGES", default_value = "all")]
    pages: PageSelection,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2DECK_PASSWORD")]
    password: Option<String>,

    /// Number of pages reflowed concurrently.
    #[arg(short, long, env = "PDF2DECK_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// API root of the high-precision worker.
    #[arg(long, env = "PDF2DECK_REMOTE_URL")]
    remote_url: Option<String>,

    /// Give up on a remote job after this many seconds.
    #[arg(long, env = "PDF2DECK_REMOTE_TIMEOUT", default_value_t = 1200)]
    remote_timeout: u64,

    /// Log a conversion summary (and worker diagnostics).
    #[arg(long, env = "PDF2DECK_DEBUG")]
    debug: bool,

    /// Print a JSON summary of the conversion to stdout.
    #[arg(long, env = "PDF2DECK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2DECK_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2DECK_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are suppressed while the progress bar is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect_with_password(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let (Some(w), Some(h)) = (meta.first_page_width, meta.first_page_height) {
                println!("Page size:    {:.0} × {:.0} pt", w, h);
            }
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    // Ctrl-C resets the session, which stops remote polling at its next tick.
    let session = Arc::new(ConversionSession::new());
    {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                session.reset();
            }
        });
    }

    let output = session
        .convert(&cli.input, &config)
        .await
        .context("Conversion failed")?;

    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&output.file_name));
    write_deck(&path, &output.deck)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }
    if !cli.quiet && !cli.json {
        print_summary(&output, &path, show_progress);
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .mode(cli.mode)
        .slide_layout(cli.layout)
        .debug(cli.debug)
        .pages(cli.pages.clone())
        .concurrency(cli.concurrency)
        .remote_timeout(Duration::from_secs(cli.remote_timeout));

    if let Some(scale) = cli.image_scale {
        builder = builder.image_scale(scale);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref url) = cli.remote_url {
        builder = builder.remote_base_url(url.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(output: &ConversionOutput, path: &std::path::Path, show_progress: bool) {
    let stats = &output.stats;
    if !show_progress {
        // The progress callback already printed the message otherwise.
        eprintln!("{}", output.message);
    }
    eprintln!(
        "{}  {} slides  {}ms  →  {}",
        green("✔"),
        stats.converted_pages,
        stats.total_duration_ms,
        bold(&path.display().to_string()),
    );
    if let Some(ref job_id) = output.remote_job_id {
        eprintln!("   {}", dim(&format!("remote job {job_id}")));
    } else {
        eprintln!(
            "   {}",
            dim(&format!(
                "{} text boxes  /  {} page images  /  {} runs merged  /  {} skipped",
                stats.text_boxes, stats.image_count, stats.merged_text_runs, stats.skipped_text_runs
            )),
        );
    }
}
