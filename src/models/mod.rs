//! Data models for the document service.
//!
//! `document` holds the request/response bodies of the upload API,
//! `api_response` the envelope every endpoint answers with and `object`
//! the metadata the object store keeps per stored document.

pub mod api_response;
pub mod document;
pub mod object;
