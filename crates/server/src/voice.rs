//! Voice vendor API client
//!
//! Thin client for the hosted voice vendor: mints client access tokens
//! via the client-credentials grant and resolves signed recorded-audio
//! URLs for finished chats. The browser talks to the vendor directly;
//! the server only does the credentialed plumbing.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::ServerError;

/// Configuration for the voice vendor client
#[derive(Debug, Clone)]
pub struct VoiceVendorConfig {
    /// Vendor API key (HUME_API_KEY)
    pub api_key: Option<String>,
    /// Vendor secret key (HUME_SECRET_KEY), required for token minting
    pub secret_key: Option<String>,
    /// Vendor API endpoint
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for VoiceVendorConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("HUME_API_KEY").ok(),
            secret_key: std::env::var("HUME_SECRET_KEY").ok(),
            endpoint: "https://api.hume.ai".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the voice vendor REST API
pub struct VoiceVendorClient {
    config: VoiceVendorConfig,
    client: Client,
}

impl VoiceVendorClient {
    pub fn new(config: VoiceVendorConfig) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServerError::Vendor(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn api_key(&self) -> Result<&str, ServerError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ServerError::Configuration("HUME_API_KEY not set".to_string()))
    }

    fn secret_key(&self) -> Result<&str, ServerError> {
        self.config
            .secret_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ServerError::Configuration("HUME_SECRET_KEY not set".to_string()))
    }

    /// Mint a short-lived browser access token via the vendor's
    /// client-credentials grant.
    pub async fn mint_access_token(&self) -> Result<String, ServerError> {
        let api_key = self.api_key()?;
        let secret_key = self.secret_key()?;

        let basic = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", api_key, secret_key));

        let response = self
            .client
            .post(format!("{}/oauth2-cc/token", self.config.endpoint))
            .header("Authorization", format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ServerError::Vendor(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServerError::Vendor(format!("HTTP {}: {}", status, error_text)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ServerError::Vendor(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Resolve the signed audio URL for a finished vendor chat.
    ///
    /// The vendor signs URLs for 60 minutes. Returns `AudioNotFound`
    /// when no recording exists for the chat id.
    pub async fn chat_audio_url(&self, chat_id: &str) -> Result<String, ServerError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!(
                "{}/v0/evi/chats/{}/audio",
                self.config.endpoint, chat_id
            ))
            .header("X-Hume-Api-Key", api_key)
            .send()
            .await
            .map_err(|e| ServerError::Vendor(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ServerError::AudioNotFound);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServerError::Vendor(format!("HTTP {}: {}", status, error_text)));
        }

        let audio: AudioResponse = response
            .json()
            .await
            .map_err(|e| ServerError::Vendor(e.to_string()))?;

        Ok(audio.url)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AudioResponse {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_without_credentials() -> VoiceVendorClient {
        VoiceVendorClient::new(VoiceVendorConfig {
            api_key: None,
            secret_key: None,
            endpoint: "https://api.hume.ai".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_token_requires_both_credentials() {
        let client = client_without_credentials();
        let err = client.mint_access_token().await.unwrap_err();
        assert!(matches!(err, ServerError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_audio_lookup_requires_api_key() {
        let client = client_without_credentials();
        let err = client.chat_audio_url("chat_123").await.unwrap_err();
        assert!(matches!(err, ServerError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_empty_key_counts_as_missing() {
        let client = VoiceVendorClient::new(VoiceVendorConfig {
            api_key: Some(String::new()),
            secret_key: Some(String::new()),
            endpoint: "https://api.hume.ai".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert!(matches!(
            client.mint_access_token().await.unwrap_err(),
            ServerError::Configuration(_)
        ));
    }
}
