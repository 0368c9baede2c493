//! The upload-encrypt-respond pipeline.
//!
//! One handler owns the whole per-request lifecycle: multipart intake,
//! validation, staging to a unique temp path, the external encryption
//! invocation, response-format negotiation, and cleanup. Cleanup is carried
//! by the [`TempFiles`] guard created at staging time, so every exit path
//! below — including an error response or a client disconnect mid-download —
//! removes both temp files.

use crate::AppState;
use crate::api::models::encrypt::EncryptResponse;
use crate::errors::{Error, Result};
use crate::staging::{TempFileStream, TempFiles};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, State, multipart::MultipartError},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use std::path::Path;
use tokio_util::io::ReaderStream;

#[utoipa::path(
    post,
    path = "/upload",
    tag = "encryption",
    summary = "Encrypt a PDF",
    description = "Upload a PDF and a password, receive a password-encrypted copy. \
                   The response is a file download by default; send `return_base64=true` \
                   or `Accept: application/json` for an inline base64 payload.",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: `pdf` (file), `password` (string), `filename` (optional string), \
                       `return_base64` (optional \"true\"/\"false\")"
    ),
    responses(
        (status = 200, description = "Encrypted PDF, as attachment or JSON", body = EncryptResponse),
        (status = 400, description = "Missing file or password", body = crate::api::models::encrypt::ErrorResponse),
        (status = 413, description = "Upload exceeds the configured ceiling", body = crate::api::models::encrypt::ErrorResponse),
        (status = 500, description = "Staging or encryption failure", body = crate::api::models::encrypt::ErrorResponse)
    )
)]
pub async fn encrypt_pdf(State(state): State<AppState>, headers: HeaderMap, mut multipart: Multipart) -> Result<Response> {
    let mut pdf: Option<(Bytes, Option<String>)> = None;
    let mut password: Option<String> = None;
    let mut filename: Option<String> = None;
    let mut return_base64 = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "pdf" => {
                let original_name = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await.map_err(multipart_error)?;
                pdf = Some((data, original_name));
            }
            "password" => {
                password = Some(field.text().await.map_err(multipart_error)?);
            }
            "filename" => {
                filename = Some(field.text().await.map_err(multipart_error)?);
            }
            "return_base64" => {
                let value = field.text().await.map_err(multipart_error)?;
                return_base64 = value.trim().eq_ignore_ascii_case("true");
            }
            // Unknown fields are ignored (permissive by design)
            _ => {}
        }
    }

    let (pdf_bytes, original_name) = match pdf {
        Some((bytes, name)) if !bytes.is_empty() => (bytes, name),
        _ => {
            return Err(Error::BadRequest {
                message: "No PDF file provided".to_string(),
            });
        }
    };
    let password = match password {
        Some(p) if !p.is_empty() => p,
        _ => {
            return Err(Error::BadRequest {
                message: "No password provided".to_string(),
            });
        }
    };

    // The guard owns both temp paths from here on; any early return below
    // (staging error, encryption error) drops it and removes the files.
    let files = TempFiles::stage(&state.config.data_dir, &pdf_bytes).await?;

    tracing::info!(
        staged = %files.staged().display(),
        size = pdf_bytes.len(),
        "Staged upload, invoking encryption"
    );

    state.encryptor.encrypt(files.staged(), files.encrypted(), &password).await?;

    let download_name = filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| encrypted_download_name(original_name.as_deref()));

    if return_base64 || accepts_json(&headers) {
        // Inline mode: the whole encrypted file is read into memory (bounded
        // by the upload ceiling), then the temp files are removed before the
        // response goes out.
        let encrypted = tokio::fs::read(files.encrypted()).await.map_err(|e| Error::Internal {
            operation: format!("read encrypted output ({e})"),
        })?;
        drop(files);

        Ok(Json(EncryptResponse {
            base64: BASE64.encode(&encrypted),
            filename: download_name,
        })
        .into_response())
    } else {
        // Download mode: the guard rides inside the body stream and fires
        // when the transfer completes, fails, or the client disconnects.
        let file = tokio::fs::File::open(files.encrypted()).await.map_err(|e| Error::Internal {
            operation: format!("open encrypted output ({e})"),
        })?;
        let body = Body::from_stream(TempFileStream::new(ReaderStream::new(file), files));

        let disposition = HeaderValue::from_str(&content_disposition(&download_name))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"document.encrypted.pdf\""));

        Ok((
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            body,
        )
            .into_response())
    }
}

#[utoipa::path(
    get,
    path = "/upload",
    tag = "encryption",
    summary = "Redirect browsers back to the upload page",
    responses((status = 302, description = "Redirect to /"))
)]
pub async fn upload_redirect() -> impl IntoResponse {
    // axum's Redirect helpers emit 303/307/308; this endpoint stays a plain 302
    (StatusCode::FOUND, [(header::LOCATION, HeaderValue::from_static("/"))])
}

fn multipart_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            message: "Uploaded file exceeds the maximum allowed size".to_string(),
        }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {err}"),
        }
    }
}

/// Whether the Accept header lists `application/json` among its media ranges
fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| {
            accept
                .split(',')
                .filter_map(|range| range.split(';').next())
                .any(|media| media.trim().eq_ignore_ascii_case("application/json"))
        })
}

/// Default download name: the upload's base name with a trailing `.pdf`
/// replaced by `.encrypted.pdf` (appended when absent)
fn encrypted_download_name(original: Option<&str>) -> String {
    let base = original
        .map(|name| Path::new(name).file_name().and_then(|n| n.to_str()).unwrap_or(""))
        .filter(|base| !base.is_empty())
        .unwrap_or("document.pdf");

    let bytes = base.as_bytes();
    let stem = if bytes.len() >= 4 && bytes[bytes.len() - 4..].eq_ignore_ascii_case(b".pdf") {
        &base[..base.len() - 4]
    } else {
        base
    };
    format!("{stem}.encrypted.pdf")
}

/// Attachment disposition with quotes, backslashes, and non-printable
/// characters stripped out of the file name
fn content_disposition(name: &str) -> String {
    let safe: String = name
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"' && *c != '\\')
        .collect();
    let safe = if safe.trim().is_empty() {
        "document.encrypted.pdf".to_string()
    } else {
        safe
    };
    format!("attachment; filename=\"{safe}\"")
}
