//! src/services/storage_service.rs
//!
//! Object storage behind the upload API. `ObjectStore` is the narrow
//! `get`/`put` surface the upload flow depends on; `DiskObjectStore` backs it
//! with SQLite for metadata and local disk for payloads sharded beneath
//! `root/{bucket}/{shard}/{shard}/{key}`.

use crate::models::object::Object;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use md5::Digest;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::{AsyncRead, AsyncWriteExt},
};
use tracing::debug;
use uuid::Uuid;

const MIGRATION_SQL: &str = include_str!("../../migrations/0001_init.sql");
const MAX_OBJECT_KEY_LEN: usize = 1024;
const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("object `{key}` not found in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, key: String },
    #[error("invalid object key")]
    InvalidObjectKey,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Payload reader handed out by [`ObjectStore::get`].
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Metadata plus a reader positioned at the start of the payload.
pub struct StoredObject {
    pub object: Object,
    pub reader: ObjectReader,
}

/// Outcome of one readiness check run by [`ObjectStore::health_check`].
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub name: &'static str,
    pub error: Option<String>,
}

impl HealthCheck {
    pub fn ok(name: &'static str) -> Self {
        Self { name, error: None }
    }

    pub fn failed(name: &'static str, error: impl Into<String>) -> Self {
        Self {
            name,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `bucket/key`, replacing any previous object.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<String>,
    ) -> StorageResult<Object>;

    /// Open a stored object for reading.
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<StoredObject>;

    /// Check backing resources; ready when every returned check `is_ok()`.
    async fn health_check(&self) -> Vec<HealthCheck>;
}

/// Reject keys that are empty, oversized or could escape the bucket directory.
pub fn ensure_key_safe(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
        return Err(StorageError::InvalidObjectKey);
    }
    if key.starts_with('/') || key.ends_with('/') || key.contains("..") {
        return Err(StorageError::InvalidObjectKey);
    }
    if key
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        return Err(StorageError::InvalidObjectKey);
    }
    Ok(())
}

/// Validate a bucket name against S3-like naming rules:
/// - 3–63 characters
/// - lowercase letters, digits, dots, hyphens only
/// - cannot start/end with dot or hyphen
/// - cannot contain consecutive dots or dot-hyphen patterns
/// - cannot look like an IPv4 address
pub fn ensure_bucket_name_safe(name: &str) -> StorageResult<()> {
    let invalid = |reason: &str| StorageError::InvalidBucketName {
        name: name.to_string(),
        reason: reason.into(),
    };

    let len = name.len();
    if !(BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&len) {
        return Err(invalid("must be between 3 and 63 characters"));
    }

    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        return Err(invalid(
            "allowed characters are lowercase letters, digits, dots, and hyphens",
        ));
    }

    if name.starts_with(['.', '-']) || name.ends_with(['.', '-']) {
        return Err(invalid("must start and end with a lowercase letter or digit"));
    }

    if name.contains("..") || name.contains("-.") || name.contains(".-") {
        return Err(invalid(
            "cannot contain consecutive dots or dot-hyphen combinations",
        ));
    }

    if is_ipv4_like(name) {
        return Err(invalid("must not be formatted like an IP address"));
    }

    Ok(())
}

/// Last path segment of an object key.
pub fn filename_of(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).to_string()
}

/// DiskObjectStore keeps object metadata in SQLite and payloads on local disk.
#[derive(Clone)]
pub struct DiskObjectStore {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where object payloads are stored.
    pub base_path: PathBuf,
}

impl DiskObjectStore {
    pub fn new(db: Arc<SqlitePool>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            db,
            base_path: base_path.into(),
        }
    }

    /// Open (creating if missing) the SQLite database at `database_url`,
    /// apply the schema and return a store rooted at `base_path`.
    pub async fn connect(database_url: &str, base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self::new(Arc::new(pool), base_path);
        fs::create_dir_all(&store.base_path).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Run the embedded schema statements. Idempotent.
    pub async fn migrate(&self) -> StorageResult<()> {
        let statements = MIGRATION_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        debug!("running {} migration statements", statements.len());
        for stmt in statements {
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Generate two-level shard identifiers for an object key.
    ///
    /// Uses MD5(bucket/key) and returns the first two bytes as lowercase
    /// hexadecimal strings (00–ff). Reduces file count per directory.
    fn object_shards(bucket: &str, key: &str) -> (String, String) {
        let digest = md5::compute(format!("{}/{}", bucket, key));
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Combines base_path/bucket/{shard}/{shard}/{key}.
    /// Parent directories may not exist yet.
    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::object_shards(bucket, key);
        let mut path = self.base_path.join(bucket);
        path.push(shard_a);
        path.push(shard_b);
        path.push(key);
        path
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> StorageResult<Object> {
        sqlx::query_as::<_, Object>(
            "SELECT id, bucket, key, filename, content_type, size_bytes, etag, last_modified
             FROM objects
             WHERE bucket = ? AND key = ?",
        )
        .bind(bucket)
        .bind(key)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => StorageError::Sqlx(other),
        })
    }

    /// Write `body` to a fsynced temp file next to `file_path` and return its
    /// path. The temp file is removed on failure.
    async fn write_temp(&self, file_path: &Path, body: &[u8]) -> StorageResult<PathBuf> {
        let parent = file_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| io::Error::other("object path missing parent directory"))?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));

        let written = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(body).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        Ok(tmp_path)
    }

    /// Move a temp file over `file_path`.
    async fn commit_temp(&self, tmp_path: &Path, file_path: &Path) -> StorageResult<()> {
        if let Err(err) = fs::rename(tmp_path, file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(file_path).await?;
                fs::rename(tmp_path, file_path).await?;
            } else {
                let _ = fs::remove_file(tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for DiskObjectStore {
    /// Stage the payload in a temp file, upsert its metadata row, then move
    /// the payload into place (S3-like overwrite semantics). A failed upsert
    /// leaves any previous version untouched.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<String>,
    ) -> StorageResult<Object> {
        ensure_bucket_name_safe(bucket)?;
        ensure_key_safe(key)?;

        let file_path = self.object_path(bucket, key);
        let tmp_path = self.write_temp(&file_path, &body).await?;

        let digest: Digest = md5::compute(&body);
        let etag = format!("{:x}", digest);

        let insert_result = sqlx::query_as::<_, Object>(
            r#"
            INSERT INTO objects (
                id, bucket, key, filename, content_type, size_bytes, etag, last_modified
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(bucket, key) DO UPDATE SET
                filename = excluded.filename,
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                last_modified = excluded.last_modified
            RETURNING id, bucket, key, filename, content_type, size_bytes, etag, last_modified
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(bucket)
        .bind(key)
        .bind(filename_of(key))
        .bind(content_type)
        .bind(body.len() as i64)
        .bind(&etag)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await;

        let obj = match insert_result {
            Ok(obj) => obj,
            Err(err) => {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Sqlx(err));
            }
        };

        self.commit_temp(&tmp_path, &file_path).await?;
        debug!("stored {}/{} ({} bytes)", bucket, key, obj.size_bytes);
        Ok(obj)
    }

    /// Returns ObjectNotFound if metadata exists but the physical file is missing.
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        ensure_bucket_name_safe(bucket)?;
        ensure_key_safe(key)?;
        let object = self.fetch_object(bucket, key).await?;

        let file_path = self.object_path(bucket, key);
        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StorageError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
            } else {
                StorageError::Io(err)
            }
        })?;

        Ok(StoredObject {
            object,
            reader: Box::new(file),
        })
    }

    /// 1. Runs `SELECT 1` against SQLite.
    /// 2. Performs a write/read/delete of a temp file under `base_path`.
    async fn health_check(&self) -> Vec<HealthCheck> {
        let sqlite = match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await
        {
            Ok(1) => HealthCheck::ok("sqlite"),
            Ok(v) => HealthCheck::failed("sqlite", format!("unexpected result: {}", v)),
            Err(e) => HealthCheck::failed("sqlite", format!("error: {}", e)),
        };

        let tmp_path = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        let disk = match fs::write(&tmp_path, b"readyz").await {
            Ok(_) => {
                let check = match fs::read(&tmp_path).await {
                    Ok(bytes) if bytes == b"readyz" => HealthCheck::ok("disk"),
                    Ok(_) => HealthCheck::failed("disk", "file content mismatch"),
                    Err(e) => {
                        HealthCheck::failed("disk", format!("could not read tmp file: {}", e))
                    }
                };
                let _ = fs::remove_file(&tmp_path).await;
                check
            }
            Err(e) => HealthCheck::failed("disk", format!("could not write tmp file: {}", e)),
        };

        vec![sqlite, disk]
    }
}

/// Check if a string matches IPv4-like dotted decimal form.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|segment| {
            !segment.is_empty()
                && segment.len() <= 3
                && segment.chars().all(|c| c.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}
