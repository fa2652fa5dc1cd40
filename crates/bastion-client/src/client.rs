//! The Bastion REST transport.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};

use bastion_core::error::{BastionError, BastionResult};

use crate::config::ApiConfig;

/// Client for the WALLIX Bastion REST API.
///
/// Wraps a connection-pooled HTTP client with the appliance's request
/// conventions: basic auth on every call, JSON bodies, 404 read as
/// "resource absent" and 204 as the acknowledgement for mutations. Any
/// other status is surfaced verbatim as a backend error.
pub struct BastionClient {
    config: ApiConfig,
    http: Client,
}

impl std::fmt::Debug for BastionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BastionClient")
            .field("config", &self.config.redacted())
            .finish()
    }
}

impl BastionClient {
    /// Create a client from a validated configuration.
    pub fn new(config: ApiConfig) -> BastionResult<Self> {
        config.validate()?;
        config.tls.warn_if_insecure();

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.connection.read_timeout_secs))
            .connect_timeout(Duration::from_secs(
                config.connection.connection_timeout_secs,
            ));

        if !config.tls.verify_certificate {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|e| {
            BastionError::invalid_config(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self { config, http })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// GET a resource. Returns `None` on 404.
    pub async fn get(&self, path: &str) -> BastionResult<Option<Value>> {
        let url = self.config.url(path);
        debug!(url = %url, "GET");

        let response = self.send(self.http.get(&url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = Self::read_body(response).await?;
                let value = serde_json::from_str(&body).map_err(|e| {
                    BastionError::serialization(format!("invalid JSON from GET {url}: {e}"))
                })?;
                Ok(Some(value))
            }
            _ => Err(Self::backend_error(response).await),
        }
    }

    /// POST a JSON body, expecting 204.
    pub async fn post(&self, path: &str, body: &Value) -> BastionResult<()> {
        let url = self.config.url(path);
        debug!(url = %url, "POST");
        trace!(body = %body, "POST body");

        let response = self.send(self.http.post(&url).json(body)).await?;
        Self::expect_no_content(response).await
    }

    /// PUT a JSON body, expecting 204.
    pub async fn put(&self, path: &str, body: &Value) -> BastionResult<()> {
        let url = self.config.url(path);
        debug!(url = %url, "PUT");
        trace!(body = %body, "PUT body");

        let response = self.send(self.http.put(&url).json(body)).await?;
        Self::expect_no_content(response).await
    }

    /// DELETE a resource, expecting 204.
    pub async fn delete(&self, path: &str) -> BastionResult<()> {
        let url = self.config.url(path);
        debug!(url = %url, "DELETE");

        let response = self.send(self.http.delete(&url)).await?;
        Self::expect_no_content(response).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> BastionResult<Response> {
        request
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| BastionError::network_with_source("request failed", e))
    }

    async fn read_body(response: Response) -> BastionResult<String> {
        response
            .text()
            .await
            .map_err(|e| BastionError::network_with_source("failed to read response body", e))
    }

    async fn expect_no_content(response: Response) -> BastionResult<()> {
        if response.status() == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(Self::backend_error(response).await)
        }
    }

    async fn backend_error(response: Response) -> BastionError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        BastionError::backend(status, body)
    }
}
