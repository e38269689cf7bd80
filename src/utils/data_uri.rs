//! Data-URI payload decoding.
//!
//! Accepts strings shaped like `data:<type>/<subtype>;base64,<payload>` and
//! splits them into the MIME type, the subtype (used as a file extension when
//! building storage keys) and the decoded bytes.

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;

const SCHEME: &str = "data";
const ENCODING: &str = "base64";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid base64 string format")]
    InvalidFormat,
    #[error(transparent)]
    Decode(#[from] base64::DecodeError),
}

/// Result of a successful [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Full MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Part after the `/`, e.g. `png`.
    pub subtype: String,
    /// The base64 text exactly as it appeared after the comma.
    pub raw_base64: String,
    pub bytes: Vec<u8>,
}

/// Parse and decode a data URI.
///
/// Structural problems yield [`PayloadError::InvalidFormat`]; a well-formed
/// header followed by a payload that is not padded standard base64 yields
/// [`PayloadError::Decode`].
pub fn decode(input: &str) -> Result<DecodedPayload, PayloadError> {
    let segments: Vec<&str> = input.split(',').collect();
    let [header, payload] = segments.as_slice() else {
        return Err(PayloadError::InvalidFormat);
    };

    let mut params = header.split(';');
    let media = params.next().unwrap_or_default();
    if params.last() != Some(ENCODING) {
        return Err(PayloadError::InvalidFormat);
    }

    let scheme_parts: Vec<&str> = media.split(':').collect();
    let [scheme, mime_type] = scheme_parts.as_slice() else {
        return Err(PayloadError::InvalidFormat);
    };
    if *scheme != SCHEME {
        return Err(PayloadError::InvalidFormat);
    }

    let type_parts: Vec<&str> = mime_type.split('/').collect();
    let subtype = match type_parts.as_slice() {
        [kind, subtype] if !kind.is_empty() && !subtype.is_empty() => *subtype,
        _ => return Err(PayloadError::InvalidFormat),
    };

    let bytes = general_purpose::STANDARD.decode(payload)?;

    Ok(DecodedPayload {
        mime_type: (*mime_type).to_string(),
        subtype: subtype.to_string(),
        raw_base64: (*payload).to_string(),
        bytes,
    })
}

/// Build a data URI for `mime_type` around an already-encoded payload.
#[cfg(test)]
pub fn build(mime_type: &str, encoded: &str) -> String {
    format!("{SCHEME}:{mime_type};{ENCODING},{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &str = "iVBORw0KGgoAAAANSUhEUgAAAAUA";

    #[test]
    fn decodes_png_payload() {
        let input = format!("data:image/png;base64,{PNG_HEADER}");
        let decoded = decode(&input).expect("valid data uri");

        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.subtype, "png");
        assert_eq!(decoded.raw_base64, PNG_HEADER);
        assert_eq!(
            decoded.bytes,
            general_purpose::STANDARD.decode(PNG_HEADER).unwrap()
        );
        assert_eq!(&decoded.bytes[1..4], b"PNG");
    }

    #[test]
    fn rejects_malformed_structure() {
        for input in [
            "",
            "dataimage/pngbase64,XXX",
            "data:imagepngbase64,XXX",
            "data:image/png;base64",
            "data:image/png;base64,AAAA,AAAA",
            "data:image/;base64,AAAA",
            "data:/png;base64,AAAA",
            "data:image/png/x;base64,AAAA",
            "data:image/png,AAAA",
            "data:image/png;utf8,AAAA",
            "blob:image/png;base64,AAAA",
            "data:a:image/png;base64,AAAA",
        ] {
            assert!(
                matches!(decode(input), Err(PayloadError::InvalidFormat)),
                "expected format error for {input:?}"
            );
        }
    }

    #[test]
    fn format_error_message_is_stable() {
        let err = decode("nope").unwrap_err();
        assert_eq!(err.to_string(), "invalid base64 string format");
    }

    #[test]
    fn bad_payload_is_a_decode_error() {
        for payload in ["@@@@", "AAA", "AAAA=A=="] {
            let input = build("text/plain", payload);
            assert!(
                matches!(decode(&input), Err(PayloadError::Decode(_))),
                "expected decode error for {payload:?}"
            );
        }
    }

    #[test]
    fn accepts_extra_media_parameters() {
        let decoded = decode("data:text/plain;charset=utf-8;base64,aGk=").unwrap();
        assert_eq!(decoded.mime_type, "text/plain");
        assert_eq!(decoded.subtype, "plain");
        assert_eq!(decoded.bytes, b"hi");
    }

    #[test]
    fn empty_payload_decodes_to_no_bytes() {
        let decoded = decode("data:application/json;base64,").unwrap();
        assert!(decoded.bytes.is_empty());
        assert_eq!(decoded.subtype, "json");
    }

    #[test]
    fn round_trips_arbitrary_bytes() {
        let samples: [&[u8]; 4] = [b"", b"\x00\xff\x10", b"hello world", &[7u8; 300]];
        for (bytes, mime) in samples
            .iter()
            .zip(["image/png", "application/pdf", "text/csv", "video/mp4"])
        {
            let uri = build(mime, &general_purpose::STANDARD.encode(bytes));
            let decoded = decode(&uri).unwrap();
            assert_eq!(decoded.bytes, *bytes);
            assert_eq!(decoded.mime_type, mime);
        }
    }
}
