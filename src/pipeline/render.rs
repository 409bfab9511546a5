//! PDF rasterisation: render every page to encoded image bytes via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! async-aware. `tokio::task::spawn_blocking` moves the work onto the
//! blocking thread pool so Tokio worker threads keep serving requests while a
//! large document renders.
//!
//! ## Why a process-wide lock?
//!
//! pdfium keeps library-global state: binding initialises it and dropping the
//! last `Pdfium` tears it down. Two conversions overlapping on different
//! threads could tear the library down under each other, so rendering is
//! serialised through [`RENDER_LOCK`].

use crate::config::{ImageFormat, RenderConfig};
use crate::error::Pdf2ImgError;
use crate::output::RenderedPage;
use crate::pipeline::encode;
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

static RENDER_LOCK: Mutex<()> = Mutex::new(());

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium shared library.
///
/// Resolution order: `PDFIUM_LIB_PATH`, then a library in the current working
/// directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2ImgError> {
    if let Ok(path) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        debug!("Binding pdfium from {}={}", PDFIUM_LIB_PATH_ENV, path);
        return Pdfium::bind_to_library(&path)
            .map(Pdfium::new)
            .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(format!("{path}: {e}")));
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(e.to_string()))
}

/// Returns true if a pdfium library can be bound in this environment.
pub fn pdfium_available() -> bool {
    let _guard = RENDER_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    bind_pdfium().is_ok()
}

/// Rasterise and encode every page of a PDF.
///
/// All-or-nothing: the first page that fails aborts the conversion and no
/// pages are returned.
pub async fn render_pages(
    pdf_path: &Path,
    config: &RenderConfig,
) -> Result<Vec<RenderedPage>, Pdf2ImgError> {
    let job = RenderJob {
        path: pdf_path.to_path_buf(),
        scale: config.scale_factor(),
        format: config.format,
        max_pixels: config.max_rendered_pixels,
        password: config.password.clone(),
        progress: config.progress_callback.clone(),
    };

    tokio::task::spawn_blocking(move || job.run())
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Render task panicked: {}", e)))?
}

/// Owned copy of everything the blocking render thread needs.
struct RenderJob {
    path: PathBuf,
    scale: f32,
    format: ImageFormat,
    max_pixels: Option<u32>,
    password: Option<String>,
    progress: Option<ProgressCallback>,
}

impl RenderJob {
    fn run(self) -> Result<Vec<RenderedPage>, Pdf2ImgError> {
        let _guard = RENDER_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let pdfium = bind_pdfium()?;

        let password = self.password.as_deref();
        let document = pdfium
            .load_pdf_from_file(&self.path, password)
            .map_err(|e| self.classify_load_error(e))?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        if let Some(ref cb) = self.progress {
            cb.on_conversion_start(total_pages);
        }

        let mut render_config = PdfRenderConfig::new().scale_page_by_factor(self.scale);
        if let Some(px) = self.max_pixels {
            render_config = render_config
                .set_maximum_width(px as i32)
                .set_maximum_height(px as i32);
        }

        let mut results = Vec::with_capacity(total_pages);

        for (idx, page) in pages.iter().enumerate() {
            let page_num = idx + 1;

            let rendered = page
                .render_with_config(&render_config)
                .map_err(|e| Pdf2ImgError::RasterisationFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                })
                .and_then(|bitmap| {
                    let image = bitmap.as_image();
                    let data = encode::encode_page(&image, self.format, page_num)?;
                    Ok((image.width(), image.height(), data))
                });

            let (width, height, data) = match rendered {
                Ok(r) => r,
                Err(e) => {
                    warn!("Page {}/{} failed: {}", page_num, total_pages, e);
                    if let Some(ref cb) = self.progress {
                        cb.on_page_error(page_num, total_pages, &e.to_string());
                    }
                    return Err(e);
                }
            };

            debug!("Rendered page {} → {}x{} px", page_num, width, height);
            if let Some(ref cb) = self.progress {
                cb.on_page_rendered(page_num, total_pages, data.len());
            }

            results.push(RenderedPage {
                page_num,
                format: self.format,
                width,
                height,
                data: data.into(),
            });
        }

        if let Some(ref cb) = self.progress {
            cb.on_conversion_complete(total_pages);
        }

        Ok(results)
    }

    fn classify_load_error(&self, e: PdfiumError) -> Pdf2ImgError {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if self.password.is_some() {
                Pdf2ImgError::WrongPassword {
                    path: self.path.clone(),
                }
            } else {
                Pdf2ImgError::PasswordRequired {
                    path: self.path.clone(),
                }
            }
        } else {
            Pdf2ImgError::CorruptPdf {
                path: self.path.clone(),
                detail: err_str,
            }
        }
    }
}
