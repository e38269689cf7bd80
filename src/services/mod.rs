//! Object storage and the upload flow built on top of it.

#[cfg(test)]
pub mod memory_store;
pub mod storage_service;
pub mod upload_service;
