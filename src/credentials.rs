//! Host-managed API credentials.
//!
//! Keys are looked up on every call and never cached by the gateway, so a
//! host can rotate or remove them at runtime.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Service name under which the Cloud Vision key is stored
pub const GOOGLE_VISION_SERVICE: &str = "google_vision";
/// Field holding the key inside a service entry
pub const API_KEY_FIELD: &str = "api_key";

/// Lookup of shared API tokens by service and field name
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, service: &str, field: &str) -> Option<String>;
}

/// In-memory credential store
#[derive(Debug, Default)]
pub struct StaticCredentials {
    tokens: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store carrying only the Cloud Vision key, if any
    pub fn with_google_vision(api_key: Option<String>) -> Self {
        let store = Self::new();
        if let Some(key) = api_key {
            store.set(GOOGLE_VISION_SERVICE, API_KEY_FIELD, key);
        }
        store
    }

    pub fn set(&self, service: &str, field: &str, value: impl Into<String>) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens
            .entry(service.to_string())
            .or_default()
            .insert(field.to_string(), value.into());
    }

    pub fn remove(&self, service: &str, field: &str) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        if let Some(fields) = tokens.get_mut(service) {
            fields.remove(field);
        }
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn get(&self, service: &str, field: &str) -> Option<String> {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        tokens
            .get(service)
            .and_then(|fields| fields.get(field))
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }
}
