//! Result types produced by a conversion.

use crate::config::ImageFormat;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One rasterised and encoded PDF page.
///
/// Immutable once produced; the pipeline emits them in document order with
/// `page_num` running 1..=N without gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    /// 1-indexed page number.
    pub page_num: usize,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Encoded image bytes. Clones share the buffer.
    #[serde(skip)]
    pub data: Bytes,
}

impl RenderedPage {
    /// Archive / download name, e.g. `page_007.png`.
    pub fn file_name(&self) -> String {
        crate::archive::page_entry_name(self.page_num, self.format)
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Timing and size figures for a finished conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub page_count: usize,
    pub dpi: u32,
    /// Sum of encoded image sizes.
    pub total_bytes: usize,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a successful conversion yields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub pages: Vec<RenderedPage>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// `(entry name, bytes)` pairs in page order, ready for [`crate::archive::build_zip`].
    pub fn archive_entries(&self) -> Vec<(String, &[u8])> {
        self.pages
            .iter()
            .map(|p| (p.file_name(), p.data.as_ref()))
            .collect()
    }
}
