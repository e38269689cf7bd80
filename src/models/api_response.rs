//! Response envelope shared by every API endpoint.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const CODE_SUCCESS: &str = "2000";
pub const CODE_PARSING_REQUEST: &str = "4000";
pub const CODE_VALIDATION_ERROR: &str = "4001";
pub const CODE_INVALID_PAYLOAD: &str = "4002";
pub const CODE_INVALID_KEY: &str = "4003";
pub const CODE_NOT_FOUND: &str = "4004";
pub const CODE_RATE_LIMITED: &str = "4029";
pub const CODE_GENERAL_ERROR: &str = "5000";
pub const CODE_STREAM_ERROR: &str = "5002";

/// One client-facing validation failure.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub parameter: String,
}

/// JSON envelope: `{code, messages, errors, data, server_time}`.
///
/// `errors` and `data` serialize as `null` when absent, `code` is omitted.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T = serde_json::Value> {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<String>,
    #[serde(rename = "messages")]
    pub message: String,
    pub errors: Option<Vec<ValidationError>>,
    pub data: Option<T>,
    pub server_time: String,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            code: Some(CODE_SUCCESS.into()),
            message: message.into(),
            errors: None,
            data: Some(data),
            server_time: server_time(),
        }
    }

    pub fn failure(
        code: impl Into<String>,
        message: impl Into<String>,
        errors: Option<Vec<ValidationError>>,
    ) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            errors,
            data: None,
            server_time: server_time(),
        }
    }
}

fn server_time() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_serializes_null_data() {
        let resp: ApiResponse = ApiResponse::failure(
            CODE_VALIDATION_ERROR,
            "Validation failed",
            Some(vec![ValidationError {
                message: "Parameter document_key Required field".into(),
                parameter: "document_key".into(),
            }]),
        );

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["code"], "4001");
        assert_eq!(value["messages"], "Validation failed");
        assert_eq!(value["data"], serde_json::Value::Null);
        assert_eq!(
            value["errors"],
            json!([{
                "message": "Parameter document_key Required field",
                "parameter": "document_key"
            }])
        );
        assert!(value["server_time"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn missing_code_is_omitted() {
        let mut resp = ApiResponse::success("ok", 1);
        resp.code = None;
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("code").is_none());
        assert_eq!(value["errors"], serde_json::Value::Null);
        assert_eq!(value["data"], 1);
    }
}
