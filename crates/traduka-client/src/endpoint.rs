//! Translation endpoint client with connection pooling
//!
//! This module provides the HTTP client for the remote translation endpoint:
//! a single `POST /translate` call carrying the source text and the target
//! language code, answered with the translated text. Non-2xx responses and
//! unusable payloads are reported as errors; the client makes exactly one
//! attempt per call, retry policy belongs to the caller.

use crate::backend::TranslationBackend;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use traduka_common::{Result, TradukaError};
use tracing::{debug, instrument, warn};
use url::Url;

/// Configuration for the translation endpoint client
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Base URL of the translation service (e.g., "https://api.example.com")
    base_url: Url,
    /// Request timeout in seconds (default: 30)
    timeout_secs: u64,
    /// Connection pool max idle connections per host (default: 10)
    max_idle_per_host: usize,
}

impl EndpointConfig {
    /// Create a new configuration for the given base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| TradukaError::config_with_source("Invalid endpoint base URL", e))?;
        Ok(Self {
            base_url,
            timeout_secs: 30,
            max_idle_per_host: 10,
        })
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the connection pool size
    pub fn with_pool_size(mut self, max_idle_per_host: usize) -> Self {
        self.max_idle_per_host = max_idle_per_host;
        self
    }

    /// Request timeout in seconds
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Connection pool max idle connections per host
    pub fn max_idle_per_host(&self) -> usize {
        self.max_idle_per_host
    }

    /// URL of the translate operation
    pub fn translate_url(&self) -> String {
        format!(
            "{}/translate",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

/// Request body sent to the translation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    /// Source text to translate
    pub text: String,
    /// Target language code
    pub target_language: String,
}

/// Success response body from the translation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    /// Translated text
    pub translated_text: String,
    /// Original text as echoed back by the endpoint
    pub original_text: String,
    /// Target language code as echoed back by the endpoint
    pub target_language: String,
}

/// HTTP client for the translation endpoint
#[derive(Debug, Clone)]
pub struct TranslationEndpoint {
    client: Client,
    config: EndpointConfig,
}

impl TranslationEndpoint {
    /// Create a new endpoint client with the given configuration
    pub fn new(config: EndpointConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| TradukaError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self { client, config })
    }

    /// Create a new client with default configuration
    pub fn with_defaults(base_url: impl AsRef<str>) -> Result<Self> {
        Self::new(EndpointConfig::new(base_url)?)
    }

    /// Issue one translation request and parse the response.
    #[instrument(skip(self, text), fields(target = %target))]
    async fn request_translation(&self, text: &str, target: &str) -> Result<TranslateResponse> {
        let url = self.config.translate_url();
        let body = TranslateRequest {
            text: text.to_string(),
            target_language: target.to_string(),
        };

        debug!("Posting translation request to {}", url);

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("Translation endpoint returned {}", status);
            return Err(TradukaError::endpoint_with_status(
                format!("Endpoint returned non-success status: {}", status),
                status.as_u16(),
            ));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TradukaError::network_with_source("Malformed endpoint response", e))?;

        // A success status with a blank translation is just as unusable as a
        // failure status; reject it so nothing empty can be cached upstream.
        if parsed.translated_text.trim().is_empty() {
            return Err(TradukaError::endpoint(
                "Endpoint returned an empty translatedText",
            ));
        }

        Ok(parsed)
    }
}

#[async_trait]
impl TranslationBackend for TranslationEndpoint {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let response = self.request_translation(text, target).await?;
        debug!(
            "Translated {} chars into '{}'",
            text.len(),
            response.target_language
        );
        Ok(response.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = EndpointConfig::new("https://api.example.com").unwrap();
        assert_eq!(config.timeout_secs(), 30);
        assert_eq!(config.max_idle_per_host(), 10);
    }

    #[test]
    fn test_config_builder() {
        let config = EndpointConfig::new("https://api.example.com")
            .unwrap()
            .with_timeout(60)
            .with_pool_size(20);

        assert_eq!(config.timeout_secs(), 60);
        assert_eq!(config.max_idle_per_host(), 20);
    }

    #[test]
    fn test_config_rejects_invalid_url() {
        let result = EndpointConfig::new("not a url");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Configuration error"));
    }

    #[test]
    fn test_translate_url_building() {
        let config = EndpointConfig::new("https://api.example.com/").unwrap();
        assert_eq!(config.translate_url(), "https://api.example.com/translate");

        let nested = EndpointConfig::new("https://example.com/api/v1").unwrap();
        assert_eq!(nested.translate_url(), "https://example.com/api/v1/translate");
    }

    #[test]
    fn test_client_creation() {
        let config = EndpointConfig::new("https://api.example.com").unwrap();
        assert!(TranslationEndpoint::new(config).is_ok());
        assert!(TranslationEndpoint::with_defaults("https://api.example.com").is_ok());
    }

    #[test]
    fn test_request_serialization() {
        let request = TranslateRequest {
            text: "Bienvenido a su nueva casa".to_string(),
            target_language: "en".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["text"], "Bienvenido a su nueva casa");
        assert_eq!(json["targetLanguage"], "en");
        // Wire format is camelCase only
        assert!(json.get("target_language").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "translatedText": "Welcome to your new home",
            "originalText": "Bienvenido a su nueva casa",
            "targetLanguage": "en"
        }"#;

        let response: TranslateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.translated_text, "Welcome to your new home");
        assert_eq!(response.original_text, "Bienvenido a su nueva casa");
        assert_eq!(response.target_language, "en");
    }

    #[test]
    fn test_response_missing_translation_is_rejected() {
        // A 2xx body without translatedText must not deserialize into a
        // usable response.
        let json = r#"{
            "originalText": "Bienvenido",
            "targetLanguage": "en"
        }"#;

        let result = serde_json::from_str::<TranslateResponse>(json);
        assert!(result.is_err());
    }
}
