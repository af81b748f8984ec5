//! `freeocr` and `ocr` chat commands
//!
//! Handlers resolve an image from the invocation, hand the first candidate to
//! the gateway and render whatever comes back into a single [`Reply`].

pub mod cooldown;
pub mod reply;

pub use cooldown::{Cooldown, OnCooldown};
pub use reply::{pagify, render, split_chars, Reply, NO_IMAGES, NO_TEXT};

use crate::error::OcrError;
use crate::gateway::Gateway;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// One command invocation as seen by the host
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Cooldowns are tracked per user
    pub user_id: String,
    /// Free-form image argument typed after the command
    pub image: Option<String>,
    /// Id of the message this invocation replies to
    pub reply_to: Option<String>,
}

/// Finds image URLs in the chat context of an invocation
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Images named by the explicit command argument
    async fn from_argument(&self, argument: &str) -> Vec<String> {
        links_in(argument)
    }

    /// Images attached to or linked in the replied-to message
    async fn from_reply(&self, invocation: &Invocation) -> Vec<String>;

    /// Images found in recent channel history
    async fn from_history(&self, invocation: &Invocation) -> Vec<String>;
}

/// Resolve candidates: explicit argument, then the replied-to message, then history
pub async fn resolve_images(invocation: &Invocation, resolver: &dyn ImageResolver) -> Vec<String> {
    if let Some(argument) = invocation.image.as_deref().filter(|a| !a.trim().is_empty()) {
        return resolver.from_argument(argument).await;
    }
    if invocation.reply_to.is_some() {
        return resolver.from_reply(invocation).await;
    }
    resolver.from_history(invocation).await
}

/// http(s) links in a piece of message text, in order
pub fn links_in(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| word.trim_start_matches('<').trim_end_matches('>'))
        .filter_map(|word| url::Url::parse(word).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(String::from)
        .collect()
}

/// The two OCR commands, sharing one gateway
pub struct OcrCommands {
    gateway: Arc<Gateway>,
    cooldown: Cooldown,
    page_length: usize,
}

impl OcrCommands {
    pub fn new(gateway: Arc<Gateway>, cooldown: Duration, page_length: usize) -> Self {
        Self {
            gateway,
            cooldown: Cooldown::new(cooldown),
            page_length,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown.window()
    }

    /// `freeocr [image]`: free providers only
    pub async fn freeocr(
        &self,
        invocation: &Invocation,
        resolver: &dyn ImageResolver,
    ) -> Result<Reply, OnCooldown> {
        self.cooldown
            .check(&format!("freeocr:{}", invocation.user_id))
            .await?;

        let result = match first_image(invocation, resolver).await {
            Ok(image) => self.gateway.recognize_free(&image).await,
            Err(e) => Err(e),
        };

        Ok(self.finish("freeocr", invocation, result))
    }

    /// `ocr [detect_handwriting] [image]`: Cloud Vision when a key is configured
    pub async fn ocr(
        &self,
        invocation: &Invocation,
        detect_handwriting: bool,
        resolver: &dyn ImageResolver,
    ) -> Result<Reply, OnCooldown> {
        self.cooldown
            .check(&format!("ocr:{}", invocation.user_id))
            .await?;

        let result = match first_image(invocation, resolver).await {
            Ok(image) => self.gateway.recognize(&image, detect_handwriting).await,
            Err(e) => Err(e),
        };

        Ok(self.finish("ocr", invocation, result))
    }

    fn finish(
        &self,
        command: &str,
        invocation: &Invocation,
        result: crate::gateway::OcrResult,
    ) -> Reply {
        match &result {
            Ok(_) => tracing::info!("{} for user {} completed", command, invocation.user_id),
            Err(e) => tracing::info!("{} for user {} failed: {}", command, invocation.user_id, e),
        }
        render(result, self.page_length)
    }
}

async fn first_image(
    invocation: &Invocation,
    resolver: &dyn ImageResolver,
) -> Result<String, OcrError> {
    resolve_images(invocation, resolver)
        .await
        .into_iter()
        .next()
        .ok_or(OcrError::NoImageFound)
}
