//! HTTP handlers for document upload and download.
//! Request parsing and validation happen here; storage concerns are delegated
//! to `UploadService`.

use crate::{
    errors::AppError,
    models::{
        api_response::{ApiResponse, CODE_STREAM_ERROR},
        document::{UploadBase64Request, UploadFileRequest, UploadedDocument},
    },
    services::upload_service::{FileUpload, UploadService},
    utils::validation::{Validate, translate},
};
use axum::{
    Json,
    body::Body,
    extract::{
        Multipart, Path, Query, State, multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

/// `?type=` of the download endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct DownloadQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
struct Base64Document {
    document_base64: String,
}

/// Reject with the translated field errors when `request` has violations.
fn ensure_valid(request: &impl Validate) -> Result<(), AppError> {
    let violations = request.validate();
    if violations.is_empty() {
        return Ok(());
    }
    warn!(count = violations.len(), "validation failed");
    Err(AppError::validation(translate(&violations)))
}

fn created(doc: UploadedDocument) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(ApiResponse::success("Document uploaded successfully", doc)),
    )
}

/// `POST /api/v1/upload/base64`
pub async fn upload_base64(
    State(service): State<UploadService>,
    payload: Result<Json<UploadBase64Request>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|err| {
        error!("error parsing request body: {}", err);
        AppError::bad_request("Failed to parse request body")
    })?;
    ensure_valid(&request)?;

    let doc = service.upload_base64(&request).await.map_err(|err| {
        error!("error uploading base64 document: {}", err);
        AppError::from(err)
    })?;

    info!(
        document_key = %request.document_key,
        document_name = %request.document_name,
        "document uploaded successfully"
    );
    Ok(created(doc))
}

/// `POST /api/v1/upload/file` with multipart fields `file`, `document_key`
/// and `document_name`.
pub async fn upload_file(
    State(service): State<UploadService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart.map_err(|err| {
        error!("request is not multipart: {}", err);
        AppError::bad_request("Failed to parse request body")
    })?;

    let mut request = UploadFileRequest::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!("failed to read multipart field: {}", err);
        AppError::bad_request("Failed to parse request body")
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|err| {
                    error!("failed to read file field: {}", err);
                    AppError::bad_request("Error get file from form")
                })?;
                file = Some(FileUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            "document_key" => request.document_key = read_text(field).await?,
            "document_name" => request.document_name = read_text(field).await?,
            _ => {}
        }
    }

    let Some(file) = file else {
        error!("multipart request has no file field");
        return Err(AppError::bad_request("Error get file from form"));
    };
    ensure_valid(&request)?;

    let doc = service.upload_file(&request, file).await.map_err(|err| {
        error!("error uploading file: {}", err);
        AppError::from(err)
    })?;

    info!(
        document_key = %request.document_key,
        document_name = %request.document_name,
        "document uploaded successfully"
    );
    Ok(created(doc))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(|err| {
        error!("failed to read text field: {}", err);
        AppError::bad_request("Failed to parse request body")
    })
}

/// `GET /api/v1/download/{doc_key}/{doc_name}`
///
/// `?type=base64` answers with a JSON envelope, `?type=download` with an
/// attachment and anything else with the bytes inline.
pub async fn get_file(
    State(service): State<UploadService>,
    Path((doc_key, doc_name)): Path<(String, String)>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let key = format!("{}/{}", doc_key, doc_name);
    let stored = service.download_file(&key).await.map_err(|err| {
        error!("error getting file {}: {}", key, err);
        AppError::from(err)
    })?;

    match query.kind.as_deref() {
        Some("base64") => {
            let mut reader = stored.reader;
            let mut buf = Vec::with_capacity(stored.object.size_bytes.max(0) as usize);
            reader.read_to_end(&mut buf).await.map_err(|err| {
                error!("error reading document {}: {}", key, err);
                AppError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    CODE_STREAM_ERROR,
                    "Failed to get document",
                )
            })?;
            let data = Base64Document {
                document_base64: general_purpose::STANDARD.encode(&buf),
            };
            Ok((
                StatusCode::OK,
                Json(ApiResponse::success("Document Get Data successfully", data)),
            )
                .into_response())
        }
        kind => {
            let disposition = if kind == Some("download") {
                "attachment"
            } else {
                "inline"
            };
            let content_type = stored.object.content_type.clone();
            let length = stored.object.size_bytes;

            let mut response = Response::new(Body::from_stream(ReaderStream::new(stored.reader)));
            *response.status_mut() = StatusCode::OK;
            set_document_headers(
                response.headers_mut(),
                content_type.as_deref(),
                length,
                disposition,
                &doc_name,
            );
            Ok(response)
        }
    }
}

fn set_document_headers(
    headers: &mut HeaderMap,
    content_type: Option<&str>,
    length: i64,
    disposition: &str,
    file_name: &str,
) {
    headers.insert(
        header::CONTENT_TYPE,
        content_type
            .and_then(|ct| HeaderValue::from_str(ct).ok())
            .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length.max(0)));

    let value = format!(
        "{}; filename=\"{}\"",
        disposition,
        file_name.replace(['"', '\\'], "_")
    );
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
}
