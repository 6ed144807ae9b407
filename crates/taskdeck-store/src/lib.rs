mod s3;

pub use s3::S3Links;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Internal(String),
}

/// Mints upload links and computes retrieval URLs for task attachments.
///
/// The blob key equals the task id. Existence and ownership of the task are
/// the caller's responsibility, not the issuer's.
#[async_trait]
pub trait LinkIssuer: Send + Sync {
    /// A write-scoped URL for the object keyed by `task_id`, valid for the
    /// configured expiration window and nothing else.
    async fn upload_url(&self, task_id: &str) -> Result<String, StoreError>;

    /// The stable URL at which the object is publicly readable once the
    /// client completes the upload. Distinct from the short-lived write URL.
    fn public_url(&self, task_id: &str) -> String;
}

/// Configuration for the attachment blob store.
pub struct StoreConfig {
    /// S3 bucket holding attachments.
    pub bucket: Option<String>,
    /// S3 region (e.g., "us-east-1").
    pub region: Option<String>,
    /// Custom S3-compatible endpoint URL. When set, path-style addressing
    /// is used.
    pub endpoint_url: Option<String>,
    /// AWS access key ID.
    pub access_key_id: Option<String>,
    /// AWS secret access key.
    pub secret_access_key: Option<String>,
    /// Lifetime of a presigned upload URL, in seconds.
    pub url_expiration_secs: u32,
    /// Domain used in public retrieval URLs:
    /// `https://<bucket>.<domain>/<task_id>`.
    pub public_domain: String,
}

pub const DEFAULT_URL_EXPIRATION_SECS: u32 = 300;
pub const DEFAULT_PUBLIC_DOMAIN: &str = "s3.amazonaws.com";

impl StoreConfig {
    /// Build from environment variables, falling back to the standard AWS
    /// variables where they exist.
    pub fn from_env() -> Self {
        Self {
            bucket: std::env::var("TASKDECK_S3_BUCKET").ok(),
            region: std::env::var("TASKDECK_S3_REGION")
                .or_else(|_| std::env::var("AWS_REGION"))
                .ok(),
            endpoint_url: std::env::var("TASKDECK_S3_ENDPOINT")
                .or_else(|_| std::env::var("AWS_ENDPOINT_URL"))
                .ok(),
            access_key_id: std::env::var("TASKDECK_S3_ACCESS_KEY_ID")
                .or_else(|_| std::env::var("AWS_ACCESS_KEY_ID"))
                .ok(),
            secret_access_key: std::env::var("TASKDECK_S3_SECRET_ACCESS_KEY")
                .or_else(|_| std::env::var("AWS_SECRET_ACCESS_KEY"))
                .ok(),
            url_expiration_secs: std::env::var("TASKDECK_SIGNED_URL_EXPIRATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_URL_EXPIRATION_SECS),
            public_domain: std::env::var("TASKDECK_S3_PUBLIC_DOMAIN")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_DOMAIN.to_string()),
        }
    }
}
