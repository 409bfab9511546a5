//! ZIP packaging of rendered pages.
//!
//! Archives are built entirely in memory: a session holds at most one
//! document's worth of images, already resident, so spilling to disk buys
//! nothing.

use crate::config::ImageFormat;
use crate::error::Pdf2ImgError;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Name of the archive returned by the HTTP service.
pub const ARCHIVE_FILE_NAME: &str = "converted_images.zip";

/// Entry name for a page inside an archive: `page_{NNN}.{ext}`.
pub fn page_entry_name(page_num: usize, format: ImageFormat) -> String {
    format!("page_{:03}.{}", page_num, format.extension())
}

/// Pack `entries` into a ZIP archive, preserving their order.
pub fn build_zip<N, B>(entries: impl IntoIterator<Item = (N, B)>) -> Result<Vec<u8>, Pdf2ImgError>
where
    N: AsRef<str>,
    B: AsRef<[u8]>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    let mut count = 0usize;
    for (name, bytes) in entries {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        writer
            .start_file(name.as_ref(), options)
            .map_err(|e| Pdf2ImgError::ArchiveFailed(e.to_string()))?;
        writer
            .write_all(bytes.as_ref())
            .map_err(|e| Pdf2ImgError::ArchiveFailed(e.to_string()))?;
        count += 1;
    }

    let cursor = writer
        .finish()
        .map_err(|e| Pdf2ImgError::ArchiveFailed(e.to_string()))?;
    let buf = cursor.into_inner();
    debug!("Built ZIP archive: {} entries, {} bytes", count, buf.len());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn entry_names() {
        assert_eq!(page_entry_name(1, ImageFormat::Png), "page_001.png");
        assert_eq!(page_entry_name(12, ImageFormat::Tiff), "page_012.tiff");
        assert_eq!(page_entry_name(1000, ImageFormat::Bmp), "page_1000.bmp");
    }

    #[test]
    fn archive_preserves_order_and_content() {
        let entries = vec![
            ("page_002.png".to_string(), b"second".to_vec()),
            ("page_001.png".to_string(), b"first".to_vec()),
        ];
        let zip_bytes = build_zip(entries).expect("zip should build");

        let mut archive = ZipArchive::new(Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.name_for_index(0), Some("page_002.png"));
        assert_eq!(archive.name_for_index(1), Some("page_001.png"));

        let mut content = Vec::new();
        archive
            .by_name("page_001.png")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"first");
    }

    #[test]
    fn empty_archive_is_valid() {
        let zip_bytes = build_zip(Vec::<(&str, &[u8])>::new()).unwrap();
        let archive = ZipArchive::new(Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
