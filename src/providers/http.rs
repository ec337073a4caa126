//! Shared HTTP client for all provider adapters

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{ProviderError, ProviderKind};

/// Thin wrapper over `reqwest::Client` that classifies failures
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("EnviroSnap/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// GET `url` and return the body text.
    ///
    /// Transport errors become [`ProviderError::NetworkFailure`] and non-2xx
    /// statuses [`ProviderError::HttpStatus`].
    pub async fn get_text(
        &self,
        kind: ProviderKind,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> std::result::Result<String, ProviderError> {
        let start_time = Instant::now();
        debug!(provider = %kind, "GET {}", url);

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(provider = %kind, "HTTP error {}", status);
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkFailure(format!("Failed to read body: {e}")))?;

        let elapsed = start_time.elapsed();
        debug!(
            provider = %kind,
            "Received {} bytes in {:.3}s",
            body.len(),
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!(provider = %kind, "Slow provider response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(body)
    }
}
