//! Route handlers for the HTTP service.

use super::error::ApiError;
use super::session::SessionId;
use super::{AppState, ServerConfig};
use crate::archive::{self, ARCHIVE_FILE_NAME};
use crate::config::{ImageFormat, RenderConfig};
use crate::convert::convert_from_bytes;
use crate::output::RenderedPage;
use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const INDEX_HTML: &str = include_str!("index.html");

/// How `/convert` should answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Store a session and return base64 previews.
    #[default]
    Json,
    /// Return the ZIP archive straight away; nothing is stored.
    Zip,
}

impl ResponseMode {
    fn parse(s: &str) -> Result<Self, ApiError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "json" => Ok(ResponseMode::Json),
            "zip" => Ok(ResponseMode::Zip),
            other => Err(ApiError::validation(format!(
                "Invalid response mode '{other}' (expected json or zip)"
            ))),
        }
    }
}

/// JSON body returned by `/convert` in [`ResponseMode::Json`].
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub session_id: String,
    /// Base64 (standard alphabet) of each page, in page order.
    pub pages: Vec<String>,
}

/// Raw multipart fields as received.
#[derive(Debug, Default)]
struct UploadForm {
    /// `(filename, bytes)` of the `pdf` file part.
    pdf: Option<(String, Bytes)>,
    format: Option<String>,
    dpi: Option<String>,
    password: Option<String>,
    response: Option<String>,
}

impl UploadForm {
    async fn read(mut form: Multipart) -> Result<Self, ApiError> {
        let mut upload = UploadForm::default();
        while let Some(field) = form.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "pdf" => {
                    // a plain text field named `pdf` is not a file upload
                    let Some(filename) = field.file_name().map(str::to_string) else {
                        continue;
                    };
                    let bytes = field.bytes().await?;
                    upload.pdf = Some((filename, bytes));
                }
                "format" => upload.format = Some(field.text().await?),
                "dpi" => upload.dpi = Some(field.text().await?),
                "password" => upload.password = Some(field.text().await?),
                "response" => upload.response = Some(field.text().await?),
                other => debug!("Ignoring unknown form field '{}'", other),
            }
        }
        Ok(upload)
    }

    /// Apply the upload rules and defaults.
    fn validate(self, conf: &ServerConfig) -> Result<ConversionRequest, ApiError> {
        let (filename, bytes) = self
            .pdf
            .ok_or_else(|| ApiError::validation("No PDF file uploaded"))?;
        if filename.is_empty() {
            return Err(ApiError::validation("No file selected"));
        }
        if !has_pdf_extension(&filename) {
            return Err(ApiError::validation("Please upload a PDF file"));
        }

        let format = match non_blank(self.format) {
            Some(f) => f
                .parse::<ImageFormat>()
                .map_err(|e| ApiError::validation(e.to_string()))?,
            None => conf.default_format,
        };
        if !format.is_web_previewable() {
            return Err(ApiError::validation(format!(
                "Format {format} is not available here; use PNG or JPEG"
            )));
        }

        let dpi = match non_blank(self.dpi) {
            Some(d) => d
                .trim()
                .parse::<u32>()
                .map_err(|_| ApiError::validation(format!("Invalid DPI value '{d}'")))?,
            None => conf.default_dpi,
        };
        if dpi == 0 || dpi > conf.max_dpi {
            return Err(ApiError::validation(format!(
                "DPI must be between 1 and {}, got {dpi}",
                conf.max_dpi
            )));
        }

        let response = match self.response {
            Some(r) => ResponseMode::parse(&r)?,
            None => ResponseMode::default(),
        };

        Ok(ConversionRequest {
            filename,
            pdf: bytes,
            format,
            dpi,
            password: non_blank(self.password),
            response,
        })
    }
}

/// A validated upload, ready to render.
#[derive(Debug)]
struct ConversionRequest {
    filename: String,
    pdf: Bytes,
    format: ImageFormat,
    dpi: u32,
    password: Option<String>,
    response: ResponseMode,
}

impl ConversionRequest {
    fn render_config(&self) -> Result<RenderConfig, ApiError> {
        let mut builder = RenderConfig::builder().dpi(self.dpi).format(self.format);
        if let Some(ref pwd) = self.password {
            builder = builder.password(pwd.clone());
        }
        builder
            .build()
            .map_err(|e| ApiError::validation(e.to_string()))
    }
}

/// True if `filename` ends in `.pdf`, ignoring case.
pub fn has_pdf_extension(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Serve the upload form.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Convert an uploaded PDF.
#[instrument(name = "routes::convert", skip_all)]
async fn convert(State(state): State<AppState>, form: Multipart) -> Result<Response, ApiError> {
    let request = UploadForm::read(form).await?.validate(&state.config)?;
    info!(
        "Converting '{}' ({} bytes) to {} at {} DPI",
        request.filename,
        request.pdf.len(),
        request.format,
        request.dpi
    );

    let config = request.render_config()?;
    let output = convert_from_bytes(&request.pdf, &config).await?;

    match request.response {
        ResponseMode::Zip => {
            let zip = zip_pages(output.pages.into()).await?;
            Ok(zip_response(zip))
        }
        ResponseMode::Json => {
            let previews: Vec<String> =
                output.pages.iter().map(|p| STANDARD.encode(&p.data)).collect();
            let session_id = state.sessions.put(output.pages);
            info!("Created session {}", session_id);
            Ok(Json(ConvertResponse {
                session_id: session_id.to_string(),
                pages: previews,
            })
            .into_response())
        }
    }
}

/// Download one page of a session.
#[instrument(name = "routes::download", skip_all)]
async fn download(
    State(state): State<AppState>,
    Path((session_id, page_index)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let pages = lookup_session(&state, &session_id)?;
    let page = page_index
        .parse::<usize>()
        .ok()
        .and_then(|i| pages.get(i))
        .ok_or_else(|| ApiError::not_found(format!("Page {page_index} not found")))?;

    Ok(page_response(page))
}

/// Download every page of a session as a ZIP.
#[instrument(name = "routes::download_all", skip_all)]
async fn download_all(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let pages = lookup_session(&state, &session_id)?;
    let zip = zip_pages(pages).await?;
    Ok(zip_response(zip))
}

fn lookup_session(state: &AppState, raw_id: &str) -> Result<Arc<[RenderedPage]>, ApiError> {
    raw_id
        .parse::<SessionId>()
        .ok()
        .and_then(|id| state.sessions.get(&id))
        .ok_or_else(|| ApiError::not_found("Session not found"))
}

/// Deflate runs on the blocking pool; archives can be tens of megabytes.
async fn zip_pages(pages: Arc<[RenderedPage]>) -> Result<Vec<u8>, ApiError> {
    tokio::task::spawn_blocking(move || {
        archive::build_zip(pages.iter().map(|p| (p.file_name(), p.data.as_ref())))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Archive task panicked: {e}")))?
    .map_err(ApiError::from)
}

fn page_response(page: &RenderedPage) -> Response {
    (
        [
            (header::CONTENT_TYPE, page.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", page.file_name()),
            ),
        ],
        page.data.clone(),
    )
        .into_response()
}

fn zip_response(zip: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
            ),
        ],
        zip,
    )
        .into_response()
}

/// Add the conversion routes to a router.
pub fn mount(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/", get(index))
        .route("/convert", post(convert))
        .route("/download/{session_id}/{page_index}", get(download))
        .route("/download-all/{session_id}", get(download_all))
}
