//! Pure helpers used by the upload flow: data-URI decoding and
//! validation-error translation.

pub mod data_uri;
pub mod validation;
