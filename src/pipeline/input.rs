//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! pdfium opens documents from a file-system path. Remote PDFs are
//! downloaded into a `TempDir` that lives inside [`ResolvedInput`], so the
//! download is removed when the input is dropped, including on error paths.
//! The `%PDF` magic bytes are checked up front so callers get
//! [`Pdf2ImgError::NotAPdf`] instead of an opaque pdfium failure.

use crate::error::Pdf2ImgError;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF on the local file system, ready for pdfium.
pub enum ResolvedInput {
    /// The caller's own file.
    Local(PathBuf),
    /// Fetched from a URL; the directory (and the file) go away on drop.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) | ResolvedInput::Downloaded { path: p, .. } => p,
        }
    }

    /// File name without extension, used to prefix output images.
    pub fn stem(&self) -> String {
        self.path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "document".to_string())
    }
}

/// True for `http://` and `https://` inputs.
pub fn is_url(input: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| input.starts_with(scheme))
}

/// Returns true if `bytes` starts with the PDF header.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// First four bytes of `bytes`, zero-padded.
fn leading_magic(bytes: &[u8]) -> [u8; 4] {
    let mut magic = [0u8; 4];
    let n = bytes.len().min(magic.len());
    magic[..n].copy_from_slice(&bytes[..n]);
    magic
}

/// Turn a CLI/library input into a local PDF path, downloading URLs.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2ImgError> {
    if is_url(input) {
        return download_url(input, timeout_secs).await;
    }
    resolve_local(input)
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, Pdf2ImgError> {
    let path = PathBuf::from(path_str);
    if !path.is_file() {
        return Err(Pdf2ImgError::FileNotFound { path });
    }

    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    let opened = std::fs::File::open(&path)
        .and_then(|f| f.take(PDF_MAGIC.len() as u64).read_to_end(&mut head));
    match opened {
        Ok(_) if has_pdf_magic(&head) => {}
        Ok(_) => {
            return Err(Pdf2ImgError::NotAPdf {
                magic: leading_magic(&head),
                path,
            })
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(Pdf2ImgError::PermissionDenied { path })
        }
        Err(_) => return Err(Pdf2ImgError::FileNotFound { path }),
    }

    debug!("Local input: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2ImgError> {
    let failed = |reason: String| Pdf2ImgError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            Pdf2ImgError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    info!("Fetching {}", url);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let bytes = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(classify)?
        .bytes()
        .await
        .map_err(classify)?;

    let temp_dir = TempDir::new().map_err(|e| Pdf2ImgError::Internal(format!("temp dir: {e}")))?;
    let path = temp_dir.path().join(filename_from_url(url));

    if !has_pdf_magic(&bytes) {
        return Err(Pdf2ImgError::NotAPdf {
            magic: leading_magic(&bytes),
            path,
        });
    }

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
    debug!("Fetched {} bytes into {}", bytes.len(), path.display());

    Ok(ResolvedInput::Downloaded {
        path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it looks like a file name, else
/// `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.next_back().map(str::to_string))
        })
        .filter(|name| name.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}
