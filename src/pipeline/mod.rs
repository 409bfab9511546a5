//! Pipeline stages for PDF-to-image conversion.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode
//! (URL/path)  (pdfium)  (png/jpeg/tiff/bmp)
//! ```
//!
//! 1. [`input`]  — canonicalise the user-supplied path or URL to a local file
//! 2. [`render`] — bind pdfium and rasterise every page on the blocking pool
//! 3. [`encode`] — flatten to RGB and encode in the requested format; called
//!    per page from inside `render` so only one bitmap is alive at a time

pub mod encode;
pub mod input;
pub mod render;
