use std::{env, path::PathBuf};

use anyhow::Context;

/// Where promoted images end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub stripe_secret_key: Option<String>,
    pub payment_currency: String,
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_public_url: Option<String>,
    pub local_storage_dir: PathBuf,
    pub upload_tmp_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .unwrap_or(24);

        let storage_backend = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("s3") => StorageBackend::S3,
            Ok("local") | Err(_) => StorageBackend::Local,
            Ok(other) => anyhow::bail!("unknown STORAGE_BACKEND {other:?}, expected s3 or local"),
        };
        let s3_bucket = env::var("S3_BUCKET").ok().filter(|b| !b.is_empty());
        if storage_backend == StorageBackend::S3 && s3_bucket.is_none() {
            anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
        }

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|b| b.parse::<usize>().ok())
            .unwrap_or(5 * 1024 * 1024);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_ttl_hours,
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").ok().filter(|k| !k.is_empty()),
            payment_currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            storage_backend,
            s3_bucket,
            s3_public_url: env::var("S3_PUBLIC_URL").ok().filter(|u| !u.is_empty()),
            local_storage_dir: env::var("LOCAL_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage")),
            upload_tmp_dir: env::var("UPLOAD_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage/tmp")),
            max_upload_bytes,
        })
    }
}
