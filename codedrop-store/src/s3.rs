use async_trait::async_trait;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, error};

use crate::error::StoreError;
use crate::store::ObjectStore;

/// Configuration for the S3-compatible blob backend.
#[derive(Clone)]
pub struct S3Config {
    /// Bucket holding all chunk objects.
    pub bucket: String,

    /// AWS region. MinIO accepts any value; defaults to `us-east-1`.
    pub region: String,

    /// Endpoint URL override for local development (e.g. MinIO at
    /// `http://127.0.0.1:9000`). When unset the SDK resolves AWS endpoints.
    pub endpoint_url: Option<String>,

    /// Static access key. When unset the SDK's default credential chain is
    /// used.
    pub access_key: Option<String>,

    /// Static secret key, paired with `access_key`.
    pub secret_key: Option<String>,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key", &self.access_key.as_ref().map(|_| "[REDACTED]"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl S3Config {
    /// Create a new `S3Config` for the given bucket.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: "us-east-1".to_owned(),
            endpoint_url: None,
            access_key: None,
            secret_key: None,
        }
    }

    /// Set the AWS region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the endpoint URL override (for MinIO).
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set static credentials instead of the SDK default chain.
    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }
}

/// [`ObjectStore`] backed by an S3-compatible service.
///
/// Uses path-style addressing so bucket names do not have to resolve as DNS
/// subdomains, which is what MinIO requires.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3ObjectStore {
    /// Build an S3 client from the configuration.
    pub async fn new(config: S3Config) -> Self {
        let mut loader =
            aws_config::from_env().region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            debug!(endpoint = %endpoint, "using custom S3 endpoint");
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "codedrop",
            ));
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket,
        }
    }

    /// Create an `S3ObjectStore` with a pre-built client (for testing).
    pub fn with_client(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), StoreError> {
        debug!(bucket = %self.bucket, key = %key, size = body.len(), "uploading object");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body.to_vec()))
            .send()
            .await
            .map_err(|e| {
                error!(key = %key, error = %e, "S3 put_object failed");
                StoreError::Backend(e.to_string())
            })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        debug!(bucket = %self.bucket, key = %key, "downloading object");

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    return Err(StoreError::NotFound(key.to_owned()));
                }
                error!(key = %key, error = %service_err, "S3 get_object failed");
                return Err(StoreError::Backend(service_err.to_string()));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Backend(format!("failed to read object body: {e}")))?
            .into_bytes();

        Ok(bytes.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        debug!(bucket = %self.bucket, key = %key, "deleting object");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!(key = %key, error = %e, "S3 delete_object failed");
                StoreError::Backend(e.to_string())
            })?;

        Ok(())
    }
}


#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    fn test_config() -> S3Config {
        S3Config::new(
            std::env::var("S3_TEST_BUCKET").unwrap_or_else(|_| "codedrop-test".to_string()),
        )
        .with_endpoint_url(
            std::env::var("S3_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:9000".to_string()),
        )
        .with_credentials("minioadmin", "minioadmin")
    }

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let store = S3ObjectStore::new(test_config()).await;
        let key = "chunks/test-object";

        store.put(key, b"hello blob").await.expect("put should succeed");
        let body = store.get(key).await.expect("get should succeed");
        assert_eq!(body, b"hello blob");

        store.delete(key).await.expect("delete should succeed");
        let err = store.get(key).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
