//! OCR gateway
//!
//! Turns one image URL into recognized text by calling hosted OCR providers
//! in a fixed order. The free chain tries the aggregator endpoint first and
//! moves on to ocr.space only when the aggregator could not be reached or
//! answered with something that is not JSON. The credentialed path calls
//! Cloud Vision once and never falls back after the request is made.

pub mod providers;

use crate::config::GatewayConfig;
use crate::credentials::{CredentialStore, API_KEY_FIELD, GOOGLE_VISION_SERVICE};
use crate::error::OcrError;
use reqwest::Client;
use std::sync::Arc;

/// Feature requested from the vision provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognitionMode {
    /// Sparse text such as signs and screenshots
    #[default]
    Text,
    /// Dense text and handwriting
    Document,
}

impl RecognitionMode {
    pub fn from_handwriting(detect_handwriting: bool) -> Self {
        if detect_handwriting {
            Self::Document
        } else {
            Self::Text
        }
    }

    /// Feature type name on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT_DETECTION",
            Self::Document => "DOCUMENT_TEXT_DETECTION",
        }
    }
}

/// Successful outcome of one recognition request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// Recognized text (may be empty for ocr.space)
    Text(String),
    /// Provider answered but found no text
    NoText,
    /// Provider answered with a shape we don't know; raw body kept for display
    Unrecognized(String),
}

/// Exactly one of these is produced per request
pub type OcrResult = Result<Recognition, OcrError>;

/// Gateway to the hosted OCR providers
pub struct Gateway {
    client: Client,
    config: GatewayConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl Gateway {
    /// Build the gateway and its pooled HTTP client
    pub fn new(
        config: GatewayConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("imageocr-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                OcrError::Initialization(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!(
            "OCR gateway ready (timeout {}s)",
            config.request_timeout.as_secs()
        );

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Whether a Cloud Vision key is currently available
    pub async fn has_vision_key(&self) -> bool {
        self.vision_key().await.is_some()
    }

    async fn vision_key(&self) -> Option<String> {
        self.credentials
            .get(GOOGLE_VISION_SERVICE, API_KEY_FIELD)
            .await
    }

    /// Recognize text using only the free providers
    pub async fn recognize_free(&self, image_url: &str) -> OcrResult {
        match providers::free_ocr(&self.client, &self.config.free_ocr_url, image_url).await {
            Ok(response) => return Ok(providers::parse_free_ocr(response)),
            Err(e) if e.allows_fallback() => {
                tracing::warn!("Free OCR endpoint unavailable, trying ocr.space: {}", e);
            }
            Err(e) => return Err(e),
        }

        let response = providers::ocr_space(
            &self.client,
            &self.config.ocr_space_url,
            &self.config.ocr_space_api_key,
            image_url,
        )
        .await?;

        Ok(providers::parse_ocr_space(response))
    }

    /// Recognize text with Cloud Vision, or the free providers when no key is set
    pub async fn recognize(&self, image_url: &str, detect_handwriting: bool) -> OcrResult {
        let Some(api_key) = self.vision_key().await else {
            tracing::debug!("No Cloud Vision key, using free providers");
            return self.recognize_free(image_url).await;
        };

        let mode = RecognitionMode::from_handwriting(detect_handwriting);
        let response = providers::vision_annotate(
            &self.client,
            &self.config.vision_url,
            &api_key,
            image_url,
            mode,
        )
        .await?;

        providers::parse_vision(&response)
    }

    /// Release the HTTP client and its pooled connections
    pub fn shutdown(self) {
        tracing::info!("Closing OCR gateway HTTP client");
        drop(self.client);
    }
}
