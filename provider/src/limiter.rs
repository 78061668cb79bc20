use crate::ProviderError;

use reqwest::Client;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

pub static HTTP_CLIENT: LazyLock<Client> = LazyLock::new(Client::new);

/// Fixed-window token bucket. Polygon reports nothing about remaining
/// quota in its responses, so the window is tracked entirely client-side.
pub struct FixedWindowBucket {
    max_tokens: usize,
    available_tokens: usize,
    window_started: Instant,
    window: Duration,
}

impl FixedWindowBucket {
    pub fn new(max_tokens: usize, window: Duration) -> Self {
        Self {
            max_tokens,
            available_tokens: max_tokens,
            window_started: Instant::now(),
            window,
        }
    }

    fn refill(&mut self) {
        if self.window_started.elapsed() >= self.window {
            self.available_tokens = self.max_tokens;
            self.window_started = Instant::now();
        }
    }

    /// Takes `tokens` from the current window, or returns how long to
    /// wait until the window rolls over.
    pub fn calculate_wait_time(&mut self, tokens: usize) -> Option<Duration> {
        self.refill();

        if self.available_tokens >= tokens {
            self.available_tokens -= tokens;
            return None;
        }

        Some(self.window.saturating_sub(self.window_started.elapsed()))
    }
}

/// GET with the shared client, honoring the limiter. Non-2xx statuses
/// are errors; the body is returned as text otherwise.
pub async fn http_get_with_limiter(
    url: &str,
    limiter: &tokio::sync::Mutex<FixedWindowBucket>,
) -> Result<String, ProviderError> {
    let mut bucket = limiter.lock().await;

    if let Some(wait_time) = bucket.calculate_wait_time(1) {
        log::warn!(
            "Rate limit hit for: {}. Waiting for {:?}",
            endpoint_of(url),
            wait_time
        );
        tokio::time::sleep(wait_time).await;
        bucket.calculate_wait_time(1);
    }

    let response = HTTP_CLIENT
        .get(url)
        .send()
        .await
        .map_err(ProviderError::from)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status));
    }

    response.text().await.map_err(ProviderError::from)
}

pub async fn http_parse_with_limiter<V>(
    url: &str,
    limiter: &tokio::sync::Mutex<FixedWindowBucket>,
) -> Result<V, ProviderError>
where
    V: serde::de::DeserializeOwned,
{
    let body = http_get_with_limiter(url, limiter).await?;
    let trimmed = body.trim();

    let body_preview = |body: &str, n: usize| {
        let trimmed = body.trim();
        let mut preview = trimmed.chars().take(n).collect::<String>();
        if trimmed.len() > n {
            preview.push('…');
        }
        preview
    };

    if trimmed.is_empty() {
        let msg = format!("Empty response body | url={}", endpoint_of(url));
        log::error!("{}", msg);
        return Err(ProviderError::Parse(msg));
    }
    if trimmed.starts_with('<') {
        let msg = format!(
            "Non-JSON (HTML?) response | url={} | len={} | preview={:?}",
            endpoint_of(url),
            body.len(),
            body_preview(&body, 200)
        );
        log::error!("{}", msg);
        return Err(ProviderError::Parse(msg));
    }

    serde_json::from_str(&body).map_err(|e| {
        let msg = format!(
            "JSON parse failed: {} | url={} | response_len={} | preview={:?}",
            e,
            endpoint_of(url),
            body.len(),
            body_preview(&body, 200)
        );
        log::error!("{}", msg);
        ProviderError::Parse(msg)
    })
}

/// URL with the query string cut off, so the API key stays out of logs.
fn endpoint_of(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
