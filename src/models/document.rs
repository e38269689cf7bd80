//! Request and response bodies of the upload API.

use crate::utils::validation::{FieldViolation, Validate, require};
use serde::{Deserialize, Serialize};

/// JSON body of `POST /api/v1/upload/base64`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UploadBase64Request {
    /// Folder the document is stored under, e.g. `folder-in-s3`.
    #[serde(default)]
    pub document_key: String,
    /// File name without extension, e.g. `example`.
    #[serde(default)]
    pub document_name: String,
    /// `data:<type>/<subtype>;base64,<payload>`
    #[serde(default)]
    pub document_base64: String,
}

impl Validate for UploadBase64Request {
    fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        require(&mut violations, "DocumentKey", &self.document_key);
        require(&mut violations, "DocumentName", &self.document_name);
        require(&mut violations, "DocumentBase64", &self.document_base64);
        violations
    }
}

/// Text fields of the multipart `POST /api/v1/upload/file`.
#[derive(Debug, Clone, Default)]
pub struct UploadFileRequest {
    pub document_key: String,
    pub document_name: String,
}

impl Validate for UploadFileRequest {
    fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        require(&mut violations, "DocumentKey", &self.document_key);
        require(&mut violations, "DocumentName", &self.document_name);
        violations
    }
}

/// Data returned after a successful upload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub document_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::translate;

    #[test]
    fn empty_base64_request_reports_all_fields_in_order() {
        let errors = translate(&UploadBase64Request::default().validate());
        let params: Vec<&str> = errors.iter().map(|e| e.parameter.as_str()).collect();
        assert_eq!(
            params,
            ["document_key", "document_name", "document_base64"]
        );
        assert_eq!(errors[2].message, "Parameter document_base64 Required field");
    }

    #[test]
    fn complete_file_request_is_valid() {
        let request = UploadFileRequest {
            document_key: "folder-in-s3".into(),
            document_name: "example".into(),
        };
        assert!(request.validate().is_empty());
    }

    #[test]
    fn missing_json_fields_default_to_empty() {
        let request: UploadBase64Request =
            serde_json::from_str(r#"{"document_key":"folder"}"#).unwrap();
        assert_eq!(request.document_key, "folder");
        assert_eq!(request.validate().len(), 2);
    }
}
