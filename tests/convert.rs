//! Library-level conversion tests against generated PDFs.
//!
//! Rendering tests need the pdfium shared library; they print SKIP and
//! return early when it cannot be bound. Input validation runs everywhere.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test convert -- --nocapture

#[macro_use]
mod common;

use common::minimal_pdf;
use pdf2img::{
    convert, convert_from_bytes, convert_sync, convert_to_dir, ConversionProgressCallback,
    ImageFormat, Pdf2ImgError, RenderConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Upload spools share one temp-file prefix; tests that inspect the temp
/// directory must not overlap with any in-flight `convert_from_bytes`.
static SPOOL: Mutex<()> = Mutex::new(());

fn spool_guard() -> MutexGuard<'static, ()> {
    SPOOL.lock().unwrap_or_else(|e| e.into_inner())
}

fn leftover_spools() -> Vec<String> {
    std::fs::read_dir(std::env::temp_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("pdf2img-upload-"))
        .collect()
}

fn write_pdf(dir: &std::path::Path, name: &str, pages: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, minimal_pdf(pages)).unwrap();
    path
}

// ── Input errors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_input_is_file_not_found() {
    let err = convert("/definitely/not/here.pdf", &RenderConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2ImgError::FileNotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn non_pdf_input_is_rejected_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.pdf");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n....").unwrap();

    let err = convert(path.to_str().unwrap(), &RenderConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2ImgError::NotAPdf { .. }), "{err:?}");
}

// ── Rendering ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_page_is_rendered_in_order() {
    skip_unless_pdfium!();
    let _spool = spool_guard();
    let config = RenderConfig::builder().dpi(72).build().unwrap();
    let output = convert_from_bytes(&minimal_pdf(4), &config).await.unwrap();

    let nums: Vec<usize> = output.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(nums, [1, 2, 3, 4]);
    assert_eq!(output.stats.page_count, 4);
    assert_eq!(output.stats.dpi, 72);
    for page in &output.pages {
        assert_eq!((page.width, page.height), (612, 792));
        assert!(page.data.starts_with(b"\x89PNG"));
    }
    assert_eq!(
        output.stats.total_bytes,
        output.pages.iter().map(|p| p.data.len()).sum::<usize>()
    );
}

#[tokio::test]
async fn dpi_scales_pixel_dimensions() {
    skip_unless_pdfium!();
    let _spool = spool_guard();
    let config = RenderConfig::builder()
        .dpi(144)
        .format(ImageFormat::Jpeg)
        .build()
        .unwrap();
    let output = convert_from_bytes(&minimal_pdf(1), &config).await.unwrap();

    let page = &output.pages[0];
    assert_eq!((page.width, page.height), (1224, 1584));
    assert!(page.data.starts_with(&[0xFF, 0xD8, 0xFF]));
    assert_eq!(page.file_name(), "page_001.jpeg");
}

#[tokio::test]
async fn tiff_and_bmp_are_available_to_the_library() {
    skip_unless_pdfium!();
    let _spool = spool_guard();
    for (format, magic) in [
        (ImageFormat::Tiff, &b"II*\0"[..]),
        (ImageFormat::Bmp, &b"BM"[..]),
    ] {
        let config = RenderConfig::builder().dpi(36).format(format).build().unwrap();
        let output = convert_from_bytes(&minimal_pdf(1), &config).await.unwrap();
        assert!(output.pages[0].data.starts_with(magic), "{format}");
    }
}

#[tokio::test]
async fn corrupt_pdf_is_reported_and_spool_removed() {
    skip_unless_pdfium!();
    let _spool = spool_guard();
    let before = leftover_spools();
    // valid magic, nothing else
    let err = convert_from_bytes(b"%PDF-1.4\ngarbage", &RenderConfig::default())
        .await
        .unwrap_err();
    assert!(err.is_document_error(), "{err:?}");
    let new_spools: Vec<String> = leftover_spools()
        .into_iter()
        .filter(|name| !before.contains(name))
        .collect();
    assert!(new_spools.is_empty(), "{new_spools:?}");
}

#[tokio::test]
async fn failed_directory_conversion_writes_nothing() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, b"%PDF-1.4\ngarbage").unwrap();

    let res = convert_to_dir(path.to_str().unwrap(), Some(&out), &RenderConfig::default()).await;
    assert!(res.is_err());

    let leftovers: Vec<String> = std::fs::read_dir(&out)
        .map(|d| {
            d.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    assert!(
        leftovers
            .iter()
            .all(|n| !n.contains("_page_") && !n.ends_with(".tmp")),
        "{leftovers:?}"
    );
}

#[tokio::test]
async fn pixel_cap_bounds_longest_edge() {
    skip_unless_pdfium!();
    let _spool = spool_guard();
    let config = RenderConfig::builder()
        .dpi(300)
        .max_rendered_pixels(500)
        .build()
        .unwrap();
    let output = convert_from_bytes(&minimal_pdf(1), &config).await.unwrap();

    let page = &output.pages[0];
    assert!(page.width.max(page.height) <= 500, "{}x{}", page.width, page.height);
    // Letter is taller than wide; the cap lands on the height
    assert!(page.height > page.width);
}

#[test]
fn blocking_conversion_from_a_file() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "sync.pdf", 2);
    let config = RenderConfig::builder().dpi(36).build().unwrap();

    let output = convert_sync(pdf.to_str().unwrap(), &config).unwrap();
    assert_eq!(output.stats.page_count, 2);
    assert_eq!(output.pages[1].page_num, 2);
}

#[tokio::test]
async fn directory_conversion_names_files_after_the_pdf() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "report.pdf", 3);
    let out = dir.path().join("images");
    let config = RenderConfig::builder()
        .dpi(50)
        .format(ImageFormat::Jpeg)
        .build()
        .unwrap();

    let written = convert_to_dir(pdf.to_str().unwrap(), Some(&out), &config)
        .await
        .unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        ["report_page_001.jpeg", "report_page_002.jpeg", "report_page_003.jpeg"]
    );
    for path in &written {
        assert!(path.starts_with(&out));
        assert!(std::fs::metadata(path).unwrap().len() > 0);
    }
    // no temporary siblings survive
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 3);
}

#[tokio::test]
async fn directory_conversion_defaults_to_pdf_parent() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "notes.pdf", 1);
    let config = RenderConfig::builder().dpi(30).build().unwrap();

    let written = convert_to_dir(pdf.to_str().unwrap(), None, &config)
        .await
        .unwrap();
    assert_eq!(written, [dir.path().join("notes_page_001.png")]);
}

// ── Progress callbacks ───────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    started: Mutex<Option<usize>>,
    rendered: AtomicUsize,
    completed: Mutex<Option<usize>>,
}

impl ConversionProgressCallback for Recorder {
    fn on_conversion_start(&self, total_pages: usize) {
        *self.started.lock().unwrap() = Some(total_pages);
    }
    fn on_page_rendered(&self, _page_num: usize, _total: usize, encoded_len: usize) {
        assert!(encoded_len > 0);
        self.rendered.fetch_add(1, Ordering::SeqCst);
    }
    fn on_conversion_complete(&self, total_pages: usize) {
        *self.completed.lock().unwrap() = Some(total_pages);
    }
}

#[tokio::test]
async fn progress_callback_sees_every_page() {
    skip_unless_pdfium!();
    let _spool = spool_guard();
    let recorder = Arc::new(Recorder::default());
    let config = RenderConfig::builder()
        .dpi(30)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    convert_from_bytes(&minimal_pdf(5), &config).await.unwrap();

    assert_eq!(*recorder.started.lock().unwrap(), Some(5));
    assert_eq!(recorder.rendered.load(Ordering::SeqCst), 5);
    assert_eq!(*recorder.completed.lock().unwrap(), Some(5));
}
