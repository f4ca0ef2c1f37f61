//! HTTP client for the CodeDrop v1 API.
//!
//! A thin typed wrapper over `reqwest`. Two behaviors matter beyond plain
//! request plumbing:
//!
//! - [`CodedropClient::get_drop_metadata`] surfaces `410 Gone` as
//!   [`Error::Gone`] so callers can tell "come back never" apart from
//!   transient failures. Fetching metadata consumes one of the drop's
//!   admission slots; callers must not retry it on ambiguous errors.
//! - [`CodedropClient::upload_chunk`] and
//!   [`CodedropClient::download_chunk`] are idempotent on the server and
//!   safe to retry.
//!
//! # Example
//!
//! ```no_run
//! use codedrop_client::CodedropClient;
//!
//! # async fn example() -> Result<(), codedrop_client::Error> {
//! let client = CodedropClient::new("http://localhost:8080");
//! if client.health().await? {
//!     println!("Server is healthy");
//! }
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::Error;

use std::time::Duration;

use reqwest::{Client, StatusCode};

use codedrop_core::schemas::{
    ChunkUploadResponse, CreateDropRequest, CreateDropResponse, GetDropMetadataResponse,
    StatsResponse,
};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the CodeDrop server.
#[derive(Debug, Clone)]
pub struct CodedropClient {
    client: Client,
    base_url: String,
}

/// Builder for configuring a [`CodedropClient`].
#[derive(Debug)]
pub struct CodedropClientBuilder {
    base_url: String,
    timeout: Duration,
    client: Option<Client>,
}

impl CodedropClientBuilder {
    /// Create a new builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: None,
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom reqwest Client.
    ///
    /// Useful for configuring TLS, proxies, or other advanced settings.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CodedropClient, Error> {
        let client = match self.client {
            Some(c) => c,
            None => Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| Error::Configuration(e.to_string()))?,
        };

        Ok(CodedropClient {
            client,
            base_url: self.base_url,
        })
    }
}

impl CodedropClient {
    /// Create a new client with default configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        CodedropClientBuilder::new(base_url)
            .build()
            .expect("default client configuration should not fail")
    }

    /// Create a builder for advanced configuration.
    pub fn builder(base_url: impl Into<String>) -> CodedropClientBuilder {
        CodedropClientBuilder::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the server is healthy.
    pub async fn health(&self) -> Result<bool, Error> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Open an upload session. Returns the drop id and absolute expiry.
    pub async fn create_drop(
        &self,
        req: &CreateDropRequest,
    ) -> Result<CreateDropResponse, Error> {
        let url = format!("{}/api/v1/drop", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status() == StatusCode::OK {
            response
                .json::<CreateDropResponse>()
                .await
                .map_err(|e| Error::Deserialization(e.to_string()))
        } else {
            Err(api_error(response).await)
        }
    }

    /// Upload one ciphertext chunk. Safe to retry; the server stores the
    /// first write for each position and ignores the rest.
    pub async fn upload_chunk(
        &self,
        drop_id: &str,
        chunk_index: u32,
        ciphertext: Vec<u8>,
    ) -> Result<ChunkUploadResponse, Error> {
        let url = format!("{}/api/v1/drop/{}/chunk", self.base_url, drop_id);

        let response = self
            .client
            .post(&url)
            .header("X-Chunk-Index", chunk_index.to_string())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(ciphertext)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status() == StatusCode::CREATED {
            response
                .json::<ChunkUploadResponse>()
                .await
                .map_err(|e| Error::Deserialization(e.to_string()))
        } else {
            Err(api_error(response).await)
        }
    }

    /// Fetch a drop's metadata.
    ///
    /// Consumes one admission slot on the server. Do NOT retry this call on
    /// ambiguous failures; a retry spends another slot.
    pub async fn get_drop_metadata(
        &self,
        drop_id: &str,
    ) -> Result<GetDropMetadataResponse, Error> {
        let url = format!("{}/api/v1/drop/{}", self.base_url, drop_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<GetDropMetadataResponse>()
                .await
                .map_err(|e| Error::Deserialization(e.to_string())),
            StatusCode::GONE => Err(Error::Gone(
                "this drop has expired or reached its download limit".to_owned(),
            )),
            _ => Err(api_error(response).await),
        }
    }

    /// Download one ciphertext chunk. Read-only and safe to retry.
    pub async fn download_chunk(&self, drop_id: &str, chunk_index: u32) -> Result<Vec<u8>, Error> {
        let url = format!(
            "{}/api/v1/drop/{}/chunk/{}",
            self.base_url, drop_id, chunk_index
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status() == StatusCode::OK {
            Ok(response
                .bytes()
                .await
                .map_err(|e| Error::Connection(e.to_string()))?
                .to_vec())
        } else {
            Err(api_error(response).await)
        }
    }

    /// Fetch storage statistics.
    pub async fn stats(&self) -> Result<StatsResponse, Error> {
        let url = format!("{}/api/v1/stats", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status() == StatusCode::OK {
            response
                .json::<StatsResponse>()
                .await
                .map_err(|e| Error::Deserialization(e.to_string()))
        } else {
            Err(api_error(response).await)
        }
    }
}

/// Turn a non-success response into [`Error::Api`] carrying the server's
/// plain-text body.
async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_owned());
    Error::Api {
        status,
        message: message.trim().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = CodedropClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn client_preserves_url_without_slash() {
        let client = CodedropClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn builder_sets_timeout() {
        let client = CodedropClientBuilder::new("http://localhost:8080")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn connection_errors_surface_as_connection() {
        // Nothing listens on this port; reqwest fails before any response.
        let client = CodedropClientBuilder::new("http://127.0.0.1:1")
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
