//! Configuration types for PDF rasterisation.
//!
//! All rendering behaviour is controlled through [`RenderConfig`], built via
//! its [`RenderConfigBuilder`]. The CLI and the HTTP service both reduce their
//! inputs to one of these before touching pdfium, so the two surfaces cannot
//! drift apart in how they interpret DPI or format.

use crate::error::Pdf2ImgError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default rasterisation resolution.
pub const DEFAULT_DPI: u32 = 200;

/// Upper bound accepted by [`RenderConfigBuilder::build`].
///
/// A US-Letter page at 1200 DPI is already ~10 200 × 13 200 px.
pub const MAX_DPI: u32 = 1200;

/// Output encoding for rendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Tiff,
    Bmp,
}

impl ImageFormat {
    /// File extension used for output files and archive entries.
    ///
    /// JPEG pages are written as `.jpeg`, never `.jpg`.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Bmp => "image/bmp",
        }
    }

    /// Whether browsers can display this format inline.
    ///
    /// The HTTP service returns base64 previews, so it only accepts these.
    pub fn is_web_previewable(self) -> bool {
        matches!(self, ImageFormat::Png | ImageFormat::Jpeg)
    }

    pub(crate) fn as_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::Bmp => "BMP",
        };
        f.write_str(name)
    }
}

impl FromStr for ImageFormat {
    type Err = Pdf2ImgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PNG" => Ok(ImageFormat::Png),
            "JPEG" | "JPG" => Ok(ImageFormat::Jpeg),
            "TIFF" | "TIF" => Ok(ImageFormat::Tiff),
            "BMP" => Ok(ImageFormat::Bmp),
            _ => Err(Pdf2ImgError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Configuration for one PDF rasterisation.
///
/// # Example
/// ```rust
/// use pdf2img::{ImageFormat, RenderConfig};
///
/// let config = RenderConfig::builder()
///     .dpi(150)
///     .format(ImageFormat::Jpeg)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Rendering resolution. Default: 200.
    ///
    /// PDF user space is 72 units per inch, so each page is scaled by
    /// `dpi / 72` before rasterisation.
    pub dpi: u32,

    /// Encoding of every output page. Default: PNG.
    pub format: ImageFormat,

    /// Optional cap on the rendered width and height in pixels.
    ///
    /// When set, pdfium scales the page down so neither edge exceeds the cap,
    /// whatever the DPI. Unset by default.
    pub max_rendered_pixels: Option<u32>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            format: ImageFormat::default(),
            max_rendered_pixels: None,
            password: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("dpi", &self.dpi)
            .field("format", &self.format)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Scale factor applied to PDF user space (72 units per inch).
    pub fn scale_factor(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = Some(px.max(100));
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, Pdf2ImgError> {
        let c = &self.config;
        if c.dpi == 0 || c.dpi > MAX_DPI {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "DPI must be 1–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!("png".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("Jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("TIFF".parse::<ImageFormat>().unwrap(), ImageFormat::Tiff);
        assert_eq!(" bmp ".parse::<ImageFormat>().unwrap(), ImageFormat::Bmp);
    }

    #[test]
    fn jpg_normalises_to_jpeg() {
        let f: ImageFormat = "JPG".parse().unwrap();
        assert_eq!(f, ImageFormat::Jpeg);
        assert_eq!(f.extension(), "jpeg");
        assert_eq!(f.to_string(), "JPEG");
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "GIF".parse::<ImageFormat>().unwrap_err();
        assert!(matches!(err, Pdf2ImgError::UnsupportedFormat(ref s) if s == "GIF"));
    }

    #[test]
    fn mime_types() {
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert!(ImageFormat::Jpeg.is_web_previewable());
        assert!(!ImageFormat::Tiff.is_web_previewable());
    }

    #[test]
    fn defaults() {
        let c = RenderConfig::default();
        assert_eq!(c.dpi, 200);
        assert_eq!(c.format, ImageFormat::Png);
        assert!(c.password.is_none());
        assert!(c.max_rendered_pixels.is_none());
    }

    #[test]
    fn builder_rejects_zero_and_huge_dpi() {
        assert!(RenderConfig::builder().dpi(0).build().is_err());
        assert!(RenderConfig::builder().dpi(MAX_DPI + 1).build().is_err());
        assert!(RenderConfig::builder().dpi(72).build().is_ok());
    }

    #[test]
    fn scale_factor_maps_dpi_to_user_space() {
        let c = RenderConfig::builder().dpi(144).build().unwrap();
        assert!((c.scale_factor() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn debug_redacts_password() {
        let c = RenderConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
