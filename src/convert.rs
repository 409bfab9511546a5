//! Conversion entry points.
//!
//! [`convert`] and [`convert_from_bytes`] return the encoded pages in memory;
//! the HTTP service builds on these. [`convert_to_dir`] writes one file per
//! page and backs the `pdf2img convert` command.

use crate::config::{ImageFormat, RenderConfig};
use crate::error::Pdf2ImgError;
use crate::output::{ConversionOutput, ConversionStats, RenderedPage};
use crate::pipeline::{input, render};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file or URL to one encoded image per page.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — DPI, format and friends
///
/// # Errors
/// Any failure is fatal: missing file, not a PDF, corrupt document, a page
/// that fails to rasterise or encode.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    convert_path(resolved.path(), config).await
}

/// Convert PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] for pdfium to open. The
/// file is deleted when this function returns, on success and on error.
///
/// # Example
/// ```rust,no_run
/// use pdf2img::{convert_from_bytes, RenderConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("document.pdf")?;
/// let output = convert_from_bytes(&bytes, &RenderConfig::default()).await?;
/// println!("{} pages", output.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &RenderConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("pdf2img-upload-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| Pdf2ImgError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| Pdf2ImgError::Internal(format!("tempfile write: {e}")))?;
    debug!("Spooled {} bytes to {}", bytes.len(), tmp.path().display());

    // `tmp` is dropped (and the file deleted) after rendering returns
    convert_path(tmp.path(), config).await
}

/// Convert a PDF and write each page to `output_dir`.
///
/// Files are named `{pdf_stem}_page_{NNN}.{ext}`. When `output_dir` is
/// `None` the images land next to the input file (or in the current
/// directory for URL inputs). The directory is created if missing.
///
/// Each image is written to a temporary sibling then renamed, so a crash
/// never leaves a truncated image under the final name.
pub async fn convert_to_dir(
    input_str: impl AsRef<str>,
    output_dir: Option<&Path>,
    config: &RenderConfig,
) -> Result<Vec<PathBuf>, Pdf2ImgError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let stem = resolved.stem();

    let out_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None if input::is_url(input_str) => PathBuf::from("."),
        None => resolved
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: out_dir.clone(),
            source: e,
        })?;

    let output = convert_path(resolved.path(), config).await?;

    let mut written = Vec::with_capacity(output.pages.len());
    for page in &output.pages {
        let path = out_dir.join(output_file_name(&stem, page.page_num, page.format));
        write_atomic(&path, &page.data).await?;
        info!("Saved: {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// File name for one page of a directory conversion.
pub fn output_file_name(stem: &str, page_num: usize, format: ImageFormat) -> String {
    format!("{}_page_{:03}.{}", stem, page_num, format.extension())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn convert_path(
    pdf_path: &Path,
    config: &RenderConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let total_start = Instant::now();

    let render_start = Instant::now();
    let pages = render::render_pages(pdf_path, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = ConversionStats {
        page_count: pages.len(),
        dpi: config.dpi,
        total_bytes: pages.iter().map(|p| p.data.len()).sum(),
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages as {} at {} DPI, {}ms",
        stats.page_count, config.format, config.dpi, stats.total_duration_ms
    );
    debug_assert!(pages_are_contiguous(&pages));

    Ok(ConversionOutput { pages, stats })
}

fn pages_are_contiguous(pages: &[RenderedPage]) -> bool {
    pages.iter().enumerate().all(|(i, p)| p.page_num == i + 1)
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), Pdf2ImgError> {
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, data)
        .await
        .map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
