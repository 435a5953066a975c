//! Discord REST client
//!
//! Single-page message retrieval with HTTP status classification, plus cosmetic channel
//! and guild lookups that never fail the caller.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_retry::strategy::jitter;
use tokio_retry::{Retry, strategy::ExponentialBackoff};
use tracing::{debug, warn};
use url::Url;

use crate::core::config::DEFAULT_DISCORD_API_BASE;
use crate::core::models::{ChannelInfo, GuildInfo, Message};
use crate::errors::DigestError;

/// Largest page the messages endpoint will return.
pub const PAGE_SIZE: usize = 100;

/// Used when a 429 carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub const UNKNOWN_CHANNEL: &str = "Unknown Channel";
pub const UNKNOWN_SERVER: &str = "Unknown Server";

/// Anything that can hand back one newest-first page of channel history.
#[async_trait]
pub trait MessagePageSource: Send + Sync {
    /// Fetch up to [`PAGE_SIZE`] messages strictly before `before` (and after `after`),
    /// newest first.
    async fn fetch_page(
        &self,
        channel_id: &str,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<Message>, DigestError>;
}

/// Discord REST API client
pub struct DiscordClient {
    token: String,
    api_base: String,
    http: Client,
}

impl DiscordClient {
    /// `token` is sent verbatim in the `Authorization` header, so bot tokens
    /// must already carry their `Bot ` prefix.
    #[must_use]
    pub fn new(token: String, api_base: Option<String>) -> Self {
        let api_base = api_base
            .unwrap_or_else(|| DEFAULT_DISCORD_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            token,
            api_base,
            http,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, DigestError> {
        Url::parse(&format!("{}/{}", self.api_base, path.trim_start_matches('/')))
            .map_err(|e| DigestError::Request(format!("Invalid Discord URL: {e}")))
    }

    /// Build the `channels/{id}/messages` URL for one page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base cannot be combined into a valid URL.
    pub fn messages_url(
        &self,
        channel_id: &str,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Url, DigestError> {
        let mut url = self.endpoint(&format!("channels/{channel_id}/messages"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &PAGE_SIZE.to_string());
            if let Some(before) = before {
                query.append_pair("before", before);
            }
            if let Some(after) = after {
                query.append_pair("after", after);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, DigestError> {
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .send()
            .await
            .map_err(|e| DigestError::Request(format!("Discord request failed: {e}")))?;

        let resp = Self::check_status(resp)?;

        resp.json::<T>()
            .await
            .map_err(|e| DigestError::Parse(format!("Discord response body: {e}")))
    }

    /// Map a non-2xx response onto the error taxonomy. 2xx passes through.
    fn check_status(resp: Response) -> Result<Response, DigestError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        Err(match status {
            StatusCode::UNAUTHORIZED => DigestError::Auth,
            StatusCode::FORBIDDEN => DigestError::Permission,
            StatusCode::NOT_FOUND => DigestError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => DigestError::RateLimited {
                retry_after_seconds: Self::parse_retry_after(&resp),
            },
            other => DigestError::Http {
                status: other.as_u16(),
            },
        })
    }

    /// Seconds from the `Retry-After` header, falling back to
    /// [`DEFAULT_RETRY_AFTER_SECS`]. Fractional values are rounded up.
    fn parse_retry_after(resp: &Response) -> u64 {
        resp.headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after_value)
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, DigestError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, DigestError>> + Send,
        T: Send,
    {
        // 100ms, 200ms, 400ms before jitter
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(3);

        Retry::spawn(strategy, operation).await
    }

    /// Channel name and parent guild. Failures degrade to an empty [`ChannelInfo`].
    pub async fn get_channel_info(&self, channel_id: &str) -> ChannelInfo {
        let result = self
            .with_retry(|| async {
                let url = self.endpoint(&format!("channels/{channel_id}"))?;
                self.get_json::<ChannelInfo>(url).await
            })
            .await;

        result.unwrap_or_else(|e| {
            warn!("Failed to fetch channel info for {}: {}", channel_id, e);
            ChannelInfo::default()
        })
    }

    pub async fn get_guild_name(&self, guild_id: &str) -> String {
        let result = self
            .with_retry(|| async {
                let url = self.endpoint(&format!("guilds/{guild_id}"))?;
                self.get_json::<GuildInfo>(url).await
            })
            .await;

        match result {
            Ok(GuildInfo { name: Some(name) }) => name,
            Ok(GuildInfo { name: None }) => UNKNOWN_SERVER.to_string(),
            Err(e) => {
                warn!("Failed to fetch guild info for {}: {}", guild_id, e);
                UNKNOWN_SERVER.to_string()
            }
        }
    }
}

#[async_trait]
impl MessagePageSource for DiscordClient {
    async fn fetch_page(
        &self,
        channel_id: &str,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<Message>, DigestError> {
        let url = self.messages_url(channel_id, before, after)?;
        debug!("Fetching page {}", url);
        self.get_json::<Vec<Message>>(url).await
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_retry_after_value(raw: &str) -> Option<u64> {
    let secs = raw.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(secs.ceil() as u64)
}
