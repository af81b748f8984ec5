//! Per-user command cooldown: one invocation per window per user.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Rejection returned while a user is still cooling down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnCooldown {
    pub retry_after: Duration,
}

impl OnCooldown {
    pub fn message(&self) -> String {
        // Round up so we never tell the user to retry too early
        let secs = self.retry_after.as_millis().div_ceil(1000).max(1);
        format!("This command is on cooldown. Try again in {}s.", secs)
    }
}

pub struct Cooldown {
    window: Duration,
    last_used: Mutex<HashMap<String, Instant>>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_used: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an invocation for `key`, or reject it if the window is still open
    pub async fn check(&self, key: &str) -> Result<(), OnCooldown> {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Result<(), OnCooldown> {
        if self.window.is_zero() {
            return Ok(());
        }

        let mut last_used = self.last_used.lock().await;

        if let Some(&previous) = last_used.get(key) {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.window {
                tracing::debug!("Cooldown active for {}", key);
                return Err(OnCooldown {
                    retry_after: self.window - elapsed,
                });
            }
        }

        // Forget users whose window has long passed
        let window = self.window;
        last_used.retain(|_, at| now.saturating_duration_since(*at) < window);
        last_used.insert(key.to_string(), now);
        Ok(())
    }
}
