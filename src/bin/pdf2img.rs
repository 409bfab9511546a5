//! CLI binary for pdf2img.
//!
//! `pdf2img convert` writes one image per page to a directory;
//! `pdf2img serve` runs the HTTP service. Both are thin shims over the
//! library crate.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2img::server::{self, ServerConfig, SessionPolicy};
use pdf2img::{
    convert_to_dir, ConversionProgressCallback, ImageFormat, ProgressCallback, RenderConfig,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar; its length is set once the page count is known.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Rendering");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.reset_eta();
    }

    fn on_page_rendered(&self, _page_num: usize, _total_pages: usize, _encoded_len: usize) {
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(error)
        ));
        self.bar.abandon();
    }

    fn on_conversion_complete(&self, _total_pages: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page of report.pdf as PNG next to the PDF
  pdf2img convert report.pdf

  # JPEG at 300 DPI into out/
  pdf2img convert report.pdf -f JPG -d 300 -o out/

  # Convert from URL
  pdf2img convert https://example.com/slides.pdf -o slides/

  # Run the web service on port 8080
  pdf2img serve --bind 0.0.0.0:8080

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium; otherwise ./ then the system path
  RUST_LOG                Overrides the log filter (e.g. pdf2img=debug)
"#;

/// Rasterise PDF pages to images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Rasterise PDF pages to PNG/JPEG/TIFF/BMP images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a PDF into one image file per page.
    Convert(ConvertArgs),
    /// Run the HTTP conversion service.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    pdf_path: String,

    /// Output image format.
    #[arg(short, long, value_enum, ignore_case = true, default_value = "png")]
    format: FormatArg,

    /// Output directory (default: the PDF's directory).
    #[arg(short, long, env = "PDF2IMG_OUTPUT")]
    output: Option<PathBuf>,

    /// Rendering DPI.
    #[arg(short, long, env = "PDF2IMG_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(1..=pdf2img::config::MAX_DPI as i64))]
    dpi: u32,

    /// Cap the longest edge of each rendered page, in pixels.
    #[arg(long, env = "PDF2IMG_MAX_PIXELS",
          value_parser = clap::value_parser!(u32).range(100..))]
    max_pixels: Option<u32>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMG_PASSWORD")]
    password: Option<String>,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2IMG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PDF2IMG_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Largest accepted upload in bytes.
    #[arg(long, env = "PDF2IMG_MAX_UPLOAD_BYTES", default_value_t = server::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Highest DPI a request may ask for.
    #[arg(long, env = "PDF2IMG_MAX_DPI", default_value_t = 600)]
    max_dpi: u32,

    /// Seconds a conversion session stays downloadable.
    #[arg(long, env = "PDF2IMG_SESSION_TTL", default_value_t = 3600)]
    session_ttl: u64,

    /// Maximum number of live sessions; the oldest is evicted beyond this.
    #[arg(long, env = "PDF2IMG_MAX_SESSIONS", default_value_t = 256)]
    max_sessions: usize,

    /// Seconds between sweeps for expired sessions.
    #[arg(long, env = "PDF2IMG_SWEEP_INTERVAL", default_value_t = 60)]
    sweep_interval: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    #[value(alias = "jpg")]
    Jpeg,
    Tiff,
    Bmp,
}

impl From<FormatArg> for ImageFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpeg => ImageFormat::Jpeg,
            FormatArg::Tiff => ImageFormat::Tiff,
            FormatArg::Bmp => ImageFormat::Bmp,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs during `convert`.
    let show_progress = match &cli.command {
        Command::Convert(args) => !cli.quiet && !args.no_progress,
        Command::Serve(_) => false,
    };
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

    match cli.command {
        Command::Convert(args) => run_convert(args, cli.quiet, show_progress).await,
        Command::Serve(args) => run_serve(args).await,
    }
}

async fn run_convert(args: ConvertArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let format: ImageFormat = args.format.into();

    let mut builder = RenderConfig::builder()
        .dpi(args.dpi)
        .format(format)
        .download_timeout_secs(args.download_timeout);
    if let Some(px) = args.max_pixels {
        builder = builder.max_rendered_pixels(px);
    }
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    if !quiet {
        eprintln!("Converting {} to {} format...", args.pdf_path, format);
    }

    let written = convert_to_dir(&args.pdf_path, args.output.as_deref(), &config)
        .await
        .context("Error converting PDF")?;

    if !quiet {
        for path in &written {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            eprintln!("  {} Saved: {}", green("✓"), dim(&name));
        }
        eprintln!(
            "{} Successfully converted {} pages to {}",
            green("✔"),
            bold(&written.len().to_string()),
            format
        );
    }

    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        bind: args.bind,
        max_upload_bytes: args.max_upload_bytes,
        max_dpi: args.max_dpi,
        sessions: SessionPolicy {
            ttl: Duration::from_secs(args.session_ttl),
            max_sessions: args.max_sessions,
        },
        sweep_interval: Duration::from_secs(args.sweep_interval),
        ..ServerConfig::default()
    };
    config.validate().context("Invalid server configuration")?;

    if !pdf2img::pdfium_available() {
        tracing::warn!("pdfium could not be bound; conversions will fail until it is installed");
    }

    server::serve(config).await.context("Server failed")
}
