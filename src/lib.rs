//! # pdf2img
//!
//! Rasterise every page of a PDF into PNG, JPEG, TIFF or BMP images, from
//! Rust, from the command line, or over HTTP.
//!
//! Rendering is delegated to [pdfium](https://pdfium.googlesource.com/pdfium/)
//! through `pdfium-render`; packaging to the `zip` crate. This crate supplies
//! the plumbing around them: input resolution, scoped temp files, encoding,
//! an in-memory session store and the HTTP routes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   resolve local file, URL, or uploaded bytes (temp file)
//!  ├─ 2. Render  rasterise pages at dpi/72 scale via pdfium (spawn_blocking)
//!  ├─ 3. Encode  RGB → PNG / JPEG / TIFF / BMP bytes
//!  └─ 4. Output  in-memory pages, files on disk, a ZIP, or a session
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2img::{convert, ImageFormat, RenderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenderConfig::builder()
//!         .dpi(150)
//!         .format(ImageFormat::Png)
//!         .build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     for page in &output.pages {
//!         println!("{}: {}x{} px", page.file_name(), page.width, page.height);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | The `pdf2img` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | The axum HTTP service in [`server`] |
//!
//! ## Finding pdfium
//!
//! The pdfium shared library is loaded at run time from `PDFIUM_LIB_PATH`,
//! the current directory, or the system library path, in that order.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use archive::{build_zip, page_entry_name};
pub use config::{ImageFormat, RenderConfig, RenderConfigBuilder};
pub use convert::{convert, convert_from_bytes, convert_sync, convert_to_dir};
pub use error::Pdf2ImgError;
pub use output::{ConversionOutput, ConversionStats, RenderedPage};
pub use pipeline::render::pdfium_available;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
