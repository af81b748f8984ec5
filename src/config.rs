use crate::Args;
use std::time::Duration;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub gateway: GatewayConfig,
    pub google_vision_api_key: Option<String>,
    pub cooldown: Duration,
    pub page_length: usize,
}

/// Provider endpoints and client settings used by the OCR gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the free aggregator OCR endpoint
    pub free_ocr_url: String,
    /// Base URL of the ocr.space REST API
    pub ocr_space_url: String,
    pub ocr_space_api_key: String,
    /// Base URL of the Cloud Vision API
    pub vision_url: String,
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            free_ocr_url: "https://api.kaogurai.xyz".to_string(),
            ocr_space_url: "https://api.ocr.space".to_string(),
            ocr_space_api_key: "helloworld".to_string(),
            vision_url: "https://vision.googleapis.com".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            gateway: GatewayConfig {
                free_ocr_url: trim_base(args.free_ocr_url),
                ocr_space_url: trim_base(args.ocr_space_url),
                ocr_space_api_key: args.ocr_space_api_key,
                vision_url: trim_base(args.vision_url),
                request_timeout: Duration::from_secs(args.request_timeout_secs),
            },
            google_vision_api_key: args
                .google_vision_api_key
                .filter(|key| !key.trim().is_empty()),
            cooldown: Duration::from_secs(args.cooldown_secs),
            page_length: args.page_length,
        }
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
