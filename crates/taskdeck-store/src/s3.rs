use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use s3::Bucket;
use tracing::debug;

use crate::{LinkIssuer, StoreConfig, StoreError};

pub struct S3Links {
    bucket: Box<Bucket>,
    bucket_name: String,
    public_domain: String,
    expiry_secs: u32,
}

impl std::fmt::Debug for S3Links {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Links")
            .field("bucket", &self.bucket_name)
            .field("expiry_secs", &self.expiry_secs)
            .finish_non_exhaustive()
    }
}

impl S3Links {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let bucket_name = config
            .bucket
            .as_deref()
            .ok_or_else(|| StoreError::Internal("bucket name required".into()))?;

        let region = match &config.endpoint_url {
            Some(endpoint) => Region::Custom {
                region: config.region.clone().unwrap_or_else(|| "us-east-1".into()),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .clone()
                .unwrap_or_else(|| "us-east-1".into())
                .parse()
                .map_err(|e| StoreError::Internal(format!("region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StoreError::Internal(format!("credentials: {e}")))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StoreError::Internal(format!("bucket: {e}")))?;
        if config.endpoint_url.is_some() {
            bucket.set_path_style();
        }

        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            public_domain: config.public_domain.clone(),
            expiry_secs: config.url_expiration_secs,
        })
    }
}

fn map_s3_error(e: S3Error) -> StoreError {
    StoreError::Internal(format!("s3: {e}"))
}

#[async_trait]
impl LinkIssuer for S3Links {
    async fn upload_url(&self, task_id: &str) -> Result<String, StoreError> {
        debug!(task_id, expiry_secs = self.expiry_secs, "presigning upload url");
        self.bucket
            .presign_put(format!("/{task_id}"), self.expiry_secs, None, None)
            .await
            .map_err(map_s3_error)
    }

    fn public_url(&self, task_id: &str) -> String {
        format!(
            "https://{}.{}/{}",
            self.bucket_name, self.public_domain, task_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_PUBLIC_DOMAIN;

    fn test_config() -> StoreConfig {
        StoreConfig {
            bucket: Some("taskdeck-attachments".into()),
            region: Some("us-east-1".into()),
            endpoint_url: None,
            access_key_id: Some("key".into()),
            secret_access_key: Some("secret".into()),
            url_expiration_secs: 300,
            public_domain: DEFAULT_PUBLIC_DOMAIN.into(),
        }
    }

    #[test]
    fn missing_bucket_produces_error() {
        let mut config = test_config();
        config.bucket = None;
        let err = S3Links::new(&config).unwrap_err();
        assert!(err.to_string().contains("bucket name required"));
    }

    #[test]
    fn public_url_is_deterministic() {
        let links = S3Links::new(&test_config()).unwrap();
        assert_eq!(
            links.public_url("t-1"),
            "https://taskdeck-attachments.s3.amazonaws.com/t-1"
        );
        assert_eq!(links.public_url("t-1"), links.public_url("t-1"));
    }

    #[test]
    fn public_url_honours_custom_domain() {
        let mut config = test_config();
        config.public_domain = "objects.example.net".into();
        let links = S3Links::new(&config).unwrap();
        assert_eq!(
            links.public_url("t-9"),
            "https://taskdeck-attachments.objects.example.net/t-9"
        );
    }

    // Presigning is pure computation over the configured credentials; no
    // network call is made, so this runs everywhere.
    #[tokio::test]
    async fn upload_url_scopes_key_and_expiry() {
        let links = S3Links::new(&test_config()).unwrap();
        let url = links.upload_url("t-42").await.unwrap();

        assert!(url.contains("/t-42"));
        assert!(url.contains("X-Amz-Expires=300"));
        assert!(url.contains("X-Amz-Signature="));
        assert_ne!(url, links.public_url("t-42"));
    }

    #[tokio::test]
    async fn upload_urls_differ_per_task() {
        let links = S3Links::new(&test_config()).unwrap();
        let a = links.upload_url("t-a").await.unwrap();
        let b = links.upload_url("t-b").await.unwrap();
        assert_ne!(a, b);
    }
}
