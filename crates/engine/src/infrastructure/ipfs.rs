//! IPFS pinning client.
//!
//! Implements the PinStorePort trait against the IPFS HTTP API
//! (`/api/v0/add?pin=true`). Upload failures fall back once to a secondary
//! backend. After a successful pin, a detached task probes each mirror
//! gateway and logs the result - mirrors lag behind the pinning node, so a
//! negative probe is expected noise, never a failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use blockhome_domain::IPFS_SCHEME;

use crate::infrastructure::ports::{PinStorePort, StorageError};

/// Default local IPFS daemon API.
pub const DEFAULT_IPFS_API_URL: &str = "http://localhost:5001";

/// Mirror gateways, in preference order. The first is the primary used for
/// HTTP resolution of freshly pinned content.
pub const DEFAULT_GATEWAYS: [&str; 3] = [
    "https://gateway.pinata.cloud/ipfs/",
    "https://ipfs.io/ipfs/",
    "https://ipfs.infura.io/ipfs/",
];

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const PROPAGATION_CHECK_DELAY: Duration = Duration::from_secs(5);

/// Client for an IPFS pinning backend with one fallback backend.
#[derive(Clone)]
pub struct IpfsClient {
    client: Client,
    api_url: String,
    fallback_api_url: Option<String>,
    gateways: Vec<String>,
    propagation_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: Option<String>,
}

impl IpfsClient {
    pub fn new(api_url: &str, fallback_api_url: Option<&str>, gateways: Vec<String>) -> Self {
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        let gateways = if gateways.is_empty() {
            DEFAULT_GATEWAYS.iter().map(|g| g.to_string()).collect()
        } else {
            gateways
        };

        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            fallback_api_url: fallback_api_url.map(|u| u.trim_end_matches('/').to_string()),
            gateways,
            propagation_delay: PROPAGATION_CHECK_DELAY,
        }
    }

    /// Shorter propagation delay (for tests).
    pub fn with_propagation_delay(mut self, delay: Duration) -> Self {
        self.propagation_delay = delay;
        self
    }

    async fn add_bytes(
        &self,
        api_url: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<String, StorageError> {
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{api_url}/api/v0/add"))
            .query(&[("pin", "true")])
            .multipart(form)
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            return Err(StorageError::Unreachable(format!(
                "{api_url} returned {}",
                response.status()
            )));
        }

        let body: AddResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Unreachable(e.to_string()))?;

        body.hash
            .filter(|h| !h.is_empty())
            .ok_or(StorageError::MissingHash)
    }

    /// Pin bytes, falling back once to the secondary backend, and return
    /// the canonical content URI string.
    async fn pin(&self, bytes: Vec<u8>, filename: &str) -> Result<String, StorageError> {
        let size = bytes.len();
        let hash = match self.add_bytes(&self.api_url, bytes.clone(), filename).await {
            Ok(hash) => hash,
            Err(primary_err) => {
                let Some(fallback) = &self.fallback_api_url else {
                    return Err(primary_err);
                };
                tracing::warn!(
                    error = %primary_err,
                    fallback = %fallback,
                    "Primary content store failed, trying fallback backend"
                );
                self.add_bytes(fallback, bytes, filename).await?
            }
        };

        tracing::info!(cid = %hash, file = filename, bytes = size, "Pinned content");
        self.spawn_propagation_check(hash.clone());
        Ok(format!("{IPFS_SCHEME}{hash}"))
    }

    /// Best-effort, detached: never blocks or fails the upload it follows.
    fn spawn_propagation_check(&self, cid: String) {
        let client = self.client.clone();
        let gateways = self.gateways.clone();
        let delay = self.propagation_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for gateway in gateways {
                let url = format!("{gateway}{cid}");
                match client.head(&url).send().await {
                    Ok(response) if response.status().is_success() => {
                        tracing::info!(url = %url, "Content visible on gateway");
                    }
                    Ok(response) => {
                        tracing::warn!(
                            url = %url,
                            status = %response.status(),
                            "Content not yet visible on gateway, propagation may lag"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "Gateway probe failed");
                    }
                }
            }
        });
    }
}

fn map_transport(e: reqwest::Error) -> StorageError {
    if e.is_timeout() {
        StorageError::Timeout
    } else {
        StorageError::Unreachable(e.to_string())
    }
}

#[async_trait]
impl PinStorePort for IpfsClient {
    async fn pin_blob(&self, bytes: Vec<u8>, filename: String) -> Result<String, StorageError> {
        self.pin(bytes, &filename).await
    }

    async fn pin_json(
        &self,
        document: serde_json::Value,
        filename: String,
    ) -> Result<String, StorageError> {
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.pin(bytes, &filename).await
    }

    async fn check_file(&self, cid: String) -> bool {
        for gateway in &self.gateways {
            let url = format!("{gateway}{cid}");
            match self.client.head(&url).send().await {
                Ok(response) if response.status().is_success() => return true,
                Ok(_) | Err(_) => continue,
            }
        }
        false
    }

    fn gateways(&self) -> Vec<String> {
        self.gateways.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_response_parsing() {
        let body = r#"{"Name":"BlockCharacter.png","Hash":"QmTestHash123","Size":"12345"}"#;
        let parsed: AddResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.hash.as_deref(), Some("QmTestHash123"));

        let no_hash: AddResponse = serde_json::from_str(r#"{"Name":"x"}"#).expect("parse");
        assert!(no_hash.hash.is_none());
    }

    #[test]
    fn test_defaults_and_url_normalization() {
        let client = IpfsClient::new("http://localhost:5001/", None, Vec::new());
        assert_eq!(client.api_url, "http://localhost:5001");
        // Gateways default to the mirror list and are never empty.
        assert_eq!(client.gateways.len(), 3);
        assert!(client.gateways[0].contains("pinata"));
    }

    #[test]
    fn test_fallback_url_normalization() {
        let client =
            IpfsClient::new("http://primary:5001", Some("http://backup:5001/"), Vec::new());
        assert_eq!(client.fallback_api_url.as_deref(), Some("http://backup:5001"));
    }
}
