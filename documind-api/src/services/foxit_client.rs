//! Foxit PDF Services client
//!
//! OAuth client-credentials token (cached until shortly before expiry), then HTML to
//! PDF through doc-gen with the `blink` engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{http_client, PdfRenderer, ServiceError, StructuredContent};

const SERVICE: &str = "Foxit";
const TOKEN_SCOPE: &str = "pdf-services";
const RENDER_ENGINE: &str = "blink";

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
struct HtmlToPdfRequest<'a> {
    html: &'a str,
    engine: &'a str,
}

struct CachedToken {
    value: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at.map_or(true, |at| Instant::now() + EXPIRY_MARGIN < at)
    }
}

/// Foxit API client
pub struct FoxitClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl FoxitClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        base_url: String,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            http_client: http_client(SERVICE)?,
            client_id,
            client_secret,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    /// Cached access token, fetching a new one when absent or stale
    async fn access_token(&self) -> Result<String, ServiceError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let url = format!("{}/oauth/token", self.base_url);
        tracing::debug!(url = %url, "Requesting Foxit access token");

        let response = self
            .http_client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", TOKEN_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::network(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::parse(SERVICE, e))?;

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: token
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        });
        tracing::info!("Obtained Foxit access token");
        Ok(value)
    }

    async fn html_to_pdf(&self, token: &str, html: &str) -> Result<reqwest::Response, ServiceError> {
        let url = format!("{}/doc-gen/html-to-pdf", self.base_url);
        self.http_client
            .post(&url)
            .bearer_auth(token)
            .json(&HtmlToPdfRequest {
                html,
                engine: RENDER_ENGINE,
            })
            .send()
            .await
            .map_err(|e| ServiceError::network(SERVICE, e))
    }
}

#[async_trait]
impl PdfRenderer for FoxitClient {
    async fn render(
        &self,
        html: &str,
        content: &StructuredContent,
    ) -> Result<Vec<u8>, ServiceError> {
        tracing::info!(
            doc_type = %content.doc_type(),
            html_bytes = html.len(),
            "Sending HTML to Foxit doc-gen"
        );

        let token = self.access_token().await?;
        let mut response = self.html_to_pdf(&token, html).await?;

        // A revoked token is dropped and fetched once more
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!("Foxit rejected the cached token, re-authenticating");
            *self.token.lock().await = None;
            let token = self.access_token().await?;
            response = self.html_to_pdf(&token, html).await?;
        }

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::network(SERVICE, e))?;
        if bytes.is_empty() {
            return Err(ServiceError::Empty("PDF generation returned no data.".to_string()));
        }

        tracing::info!(pdf_bytes = bytes.len(), "PDF generated");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness() {
        let no_expiry = CachedToken {
            value: "t".to_string(),
            expires_at: None,
        };
        assert!(no_expiry.is_fresh());

        let long_lived = CachedToken {
            value: "t".to_string(),
            expires_at: Some(Instant::now() + Duration::from_secs(3600)),
        };
        assert!(long_lived.is_fresh());

        let about_to_expire = CachedToken {
            value: "t".to_string(),
            expires_at: Some(Instant::now() + Duration::from_secs(5)),
        };
        assert!(!about_to_expire.is_fresh());
    }
}
