use crate::services::upload_service::UploadConfig;
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket_name: String,
    pub base_url: String,
    pub storage_dir: String,
    pub database_url: String,
    pub max_body_bytes: usize,
    /// Zero disables rate limiting.
    pub rate_limit_rps: u32,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Document upload API over an object store")]
pub struct Args {
    /// Host to bind to (overrides APP_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides APP_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket documents are stored in (overrides BUCKET_NAME)
    #[arg(long)]
    pub bucket_name: Option<String>,

    /// Public base URL used in document links (overrides BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory where object payloads are stored (overrides STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Metadata database URL (overrides DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Maximum request body size in bytes (overrides MAX_BODY_BYTES)
    #[arg(long)]
    pub max_body_bytes: Option<usize>,

    /// Requests per second allowed across all clients, 0 = unlimited (overrides RATE_LIMIT_RPS)
    #[arg(long)]
    pub rate_limit_rps: Option<u32>,
}

impl AppConfig {
    /// Parse CLI args, falling back to process environment variables.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge `args` over values looked up through `env`, then defaults.
    pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match args.port {
            Some(port) => port,
            None => parse_env(&env, "APP_PORT")?.unwrap_or(3000),
        };
        let max_body_bytes = match args.max_body_bytes {
            Some(v) => v,
            None => parse_env(&env, "MAX_BODY_BYTES")?.unwrap_or(DEFAULT_MAX_BODY_BYTES),
        };
        let rate_limit_rps = match args.rate_limit_rps {
            Some(v) => v,
            None => parse_env(&env, "RATE_LIMIT_RPS")?.unwrap_or(0),
        };

        let base_url = args
            .base_url
            .or_else(|| env("BASE_URL"))
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Ok(Self {
            host: args
                .host
                .or_else(|| env("APP_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port,
            bucket_name: args
                .bucket_name
                .or_else(|| env("BUCKET_NAME"))
                .unwrap_or_else(|| "documents".into()),
            base_url: base_url.trim_end_matches('/').to_string(),
            storage_dir: args
                .storage_dir
                .or_else(|| env("STORAGE_DIR"))
                .unwrap_or_else(|| "./data/objects".into()),
            database_url: args
                .database_url
                .or_else(|| env("DATABASE_URL"))
                .unwrap_or_else(|| "sqlite://./data/meta/documents.db".into()),
            max_body_bytes,
            rate_limit_rps,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            bucket_name: self.bucket_name.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

fn parse_env<T>(env: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env(name)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", name, value))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_args_or_env() {
        let cfg = AppConfig::resolve(Args::default(), env_from(&[])).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.bucket_name, "documents");
        assert_eq!(cfg.base_url, "http://localhost:3000");
        assert_eq!(cfg.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(cfg.rate_limit_rps, 0);
    }

    #[test]
    fn args_override_env() {
        let args = Args {
            port: Some(9000),
            bucket_name: Some("from-args".into()),
            ..Args::default()
        };
        let env = env_from(&[
            ("APP_PORT", "8000"),
            ("BUCKET_NAME", "from-env"),
            ("BASE_URL", "https://files.example.com/"),
            ("RATE_LIMIT_RPS", "50"),
        ]);

        let cfg = AppConfig::resolve(args, env).unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.bucket_name, "from-args");
        assert_eq!(cfg.base_url, "https://files.example.com");
        assert_eq!(cfg.rate_limit_rps, 50);
        assert_eq!(cfg.upload_config().bucket_name, "from-args");
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err =
            AppConfig::resolve(Args::default(), env_from(&[("APP_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }
}
