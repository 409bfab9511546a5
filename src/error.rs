//! Error types for the pdf2img library.
//!
//! Every failure in the rasterisation pipeline is fatal for the document that
//! triggered it: a conversion either yields an image for every page or
//! returns a [`Pdf2ImgError`].
//!
//! The HTTP layer maps these onto status codes in
//! `crate::server::error::ApiError`; the CLI prints them verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2img library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// A rendered page could not be encoded in the requested format.
    #[error("Failed to encode page {page} as {format}: {detail}")]
    EncodeFailed {
        page: usize,
        format: String,
        detail: String,
    },

    /// Building the ZIP archive failed.
    #[error("Failed to build ZIP archive: {0}")]
    ArchiveFailed(String),

    /// Could not create or write an output image file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested image format name is not one we can produce.
    #[error("Unsupported image format '{0}' (expected PNG, JPEG, JPG, TIFF or BMP)")]
    UnsupportedFormat(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2ImgError {
    /// True when the error was caused by the document itself rather than by
    /// the environment (missing library, disk full, ...).
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            Pdf2ImgError::NotAPdf { .. }
                | Pdf2ImgError::CorruptPdf { .. }
                | Pdf2ImgError::PasswordRequired { .. }
                | Pdf2ImgError::WrongPassword { .. }
                | Pdf2ImgError::RasterisationFailed { .. }
        )
    }
}
