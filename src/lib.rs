//! Chat-command OCR service.
//!
//! Resolves an image reference from a chat invocation, sends it to a hosted
//! OCR provider and turns the recognized text into a reply the chat host can
//! deliver.

use clap::Parser;

pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod server;

pub use commands::{Invocation, OcrCommands, Reply};
pub use config::{Config, GatewayConfig};
pub use credentials::{CredentialStore, StaticCredentials};
pub use error::OcrError;
pub use gateway::{Gateway, OcrResult, Recognition, RecognitionMode};

#[derive(Parser, Debug)]
#[command(name = "imageocr-gateway")]
#[command(about = "Extract text from chat images through hosted OCR APIs")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Base URL of the free aggregator OCR API
    #[arg(long, env = "OCR_FREE_URL", default_value = "https://api.kaogurai.xyz")]
    pub free_ocr_url: String,

    /// Base URL of the ocr.space API
    #[arg(long, env = "OCR_SPACE_URL", default_value = "https://api.ocr.space")]
    pub ocr_space_url: String,

    /// API key sent to ocr.space ("helloworld" is their public demo key)
    #[arg(long, env = "OCR_SPACE_API_KEY", default_value = "helloworld")]
    pub ocr_space_api_key: String,

    /// Base URL of the Cloud Vision API
    #[arg(long, env = "OCR_VISION_URL", default_value = "https://vision.googleapis.com")]
    pub vision_url: String,

    /// Cloud Vision API key; without it `ocr` falls back to the free providers
    #[arg(long, env = "GOOGLE_VISION_API_KEY")]
    pub google_vision_api_key: Option<String>,

    /// Timeout for each outbound provider request, in seconds
    #[arg(long, env = "OCR_REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Per-user cooldown between commands, in seconds
    #[arg(long, env = "OCR_COOLDOWN_SECS", default_value = "5")]
    pub cooldown_secs: u64,

    /// Maximum length of one reply page
    #[arg(long, env = "OCR_PAGE_LENGTH", default_value = "2000")]
    pub page_length: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}
