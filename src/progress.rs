//! Progress-callback trait for per-page rasterisation events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::RenderConfigBuilder::progress_callback`] to receive
//! events as each page is rendered and encoded.
//!
//! Events are emitted from the blocking render thread, not from the async
//! caller, so implementations must be `Send + Sync`.
//!
//! # Example
//!
//! ```rust
//! use pdf2img::{ConversionProgressCallback, RenderConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ByteCounter {
//!     bytes: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for ByteCounter {
//!     fn on_page_rendered(&self, _page_num: usize, _total_pages: usize, encoded_len: usize) {
//!         self.bytes.fetch_add(encoded_len, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(ByteCounter { bytes: AtomicUsize::new(0) });
//!
//! let config = RenderConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the render pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the document is opened, before any page is rendered.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after a page has been rasterised and encoded.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages in the document
    /// * `encoded_len` — byte length of the encoded image
    fn on_page_rendered(&self, page_num: usize, total_pages: usize, encoded_len: usize) {
        let _ = (page_num, total_pages, encoded_len);
    }

    /// Called when a page fails. The conversion aborts right after.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been rendered.
    fn on_conversion_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenderConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
