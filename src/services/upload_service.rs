//! Upload orchestration: turns validated requests into object-store calls and
//! builds the public document URL.

use crate::{
    models::document::{UploadBase64Request, UploadFileRequest, UploadedDocument},
    services::storage_service::{ObjectStore, StorageError, StoredObject},
    utils::data_uri::{self, PayloadError},
};
use bytes::Bytes;
use std::{path::Path, sync::Arc};
use thiserror::Error;
use tracing::debug;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Settings the upload flow needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub bucket_name: String,
    /// Public base URL without trailing slash, e.g. `https://files.example.com`.
    pub base_url: String,
}

/// A file received through the multipart endpoint.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>, config: UploadConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Decode the data URI and store it as `<document_key>/<document_name>.<subtype>`.
    pub async fn upload_base64(
        &self,
        request: &UploadBase64Request,
    ) -> UploadResult<UploadedDocument> {
        let payload = data_uri::decode(&request.document_base64)?;
        let key = format!(
            "{}/{}.{}",
            request.document_key, request.document_name, payload.subtype
        );

        debug!(%key, mime_type = %payload.mime_type, "storing base64 document");
        self.store
            .put(
                &self.config.bucket_name,
                &key,
                Bytes::from(payload.bytes),
                Some(payload.mime_type),
            )
            .await?;

        Ok(self.document(&key))
    }

    /// Store an uploaded file as `<document_key>/<document_name><ext>`, where
    /// `<ext>` is the original file name's extension including the dot.
    pub async fn upload_file(
        &self,
        request: &UploadFileRequest,
        file: FileUpload,
    ) -> UploadResult<UploadedDocument> {
        let key = format!(
            "{}/{}{}",
            request.document_key,
            request.document_name,
            extension_of(&file.file_name)
        );
        let content_type = file
            .content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.into());

        debug!(%key, %content_type, "storing multipart document");
        self.store
            .put(&self.config.bucket_name, &key, file.data, Some(content_type))
            .await?;

        Ok(self.document(&key))
    }

    pub async fn download_file(&self, key: &str) -> UploadResult<StoredObject> {
        Ok(self.store.get(&self.config.bucket_name, key).await?)
    }

    fn document(&self, key: &str) -> UploadedDocument {
        UploadedDocument {
            document_url: format!("{}/api/v1/download/{}", self.config.base_url, key),
        }
    }
}

/// `".png"` for `"photo.png"`, empty when there is no extension.
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
