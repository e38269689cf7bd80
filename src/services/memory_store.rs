//! In-memory object store for tests.

use crate::{
    models::object::Object,
    services::storage_service::{
        HealthCheck, ObjectStore, StorageError, StorageResult, StoredObject, ensure_key_safe,
        filename_of,
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::{
    collections::HashMap,
    io::{self, Cursor},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<(String, String), (Object, Bytes)>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `put` fail with an I/O error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn contents(&self, bucket: &str, key: &str) -> Option<(Object, Bytes)> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<String>,
    ) -> StorageResult<Object> {
        ensure_key_safe(key)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("write refused")));
        }

        let object = Object {
            id: Uuid::new_v4(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            filename: filename_of(key),
            content_type,
            size_bytes: body.len() as i64,
            etag: Some(format!("{:x}", md5::compute(&body))),
            last_modified: Utc::now(),
        };
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), (object.clone(), body));
        Ok(object)
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        ensure_key_safe(key)?;
        let (object, body) = self
            .contents(bucket, key)
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        Ok(StoredObject {
            object,
            reader: Box::new(Cursor::new(body.to_vec())),
        })
    }

    async fn health_check(&self) -> Vec<HealthCheck> {
        vec![HealthCheck::ok("memory")]
    }
}
