//! Bounded walk backwards through channel history
//!
//! Pages arrive newest-first. The first `before` cursor is the snowflake of `to`, and
//! `before` is exclusive, so the walk starts strictly before `to`'s millisecond: a message
//! created in that exact millisecond is never fetched even though it is inside the window.
//! The walk follows the oldest id of each full page and stops at the first message older
//! than `from`, at a short page, or after `max_pages` requests. Messages are keyed by id
//! while accumulating and sorted by timestamp once the walk ends.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::{MessagePageSource, PAGE_SIZE};
use super::snowflake::date_to_snowflake;
use crate::core::cancel::{ensure_active, until_cancelled};
use crate::core::config::{DEFAULT_MAX_PAGES, DEFAULT_RATE_LIMIT_DELAY_MS};
use crate::core::models::Message;
use crate::errors::DigestError;

#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub max_pages: u32,
    /// Fixed pause between consecutive page requests.
    pub rate_limit_delay: Duration,
    /// How many 429 responses the walk may sit out before failing. Zero surfaces the
    /// first `RateLimited` immediately.
    pub rate_limit_retries: u32,
    /// Checked before every page request. Also interrupts the page request itself and
    /// any delay or `Retry-After` wait in progress.
    pub cancel: Option<CancellationToken>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            rate_limit_delay: Duration::from_millis(DEFAULT_RATE_LIMIT_DELAY_MS),
            rate_limit_retries: 0,
            cancel: None,
        }
    }
}

/// Result of a window walk.
#[derive(Debug, Clone, Default)]
pub struct FetchedWindow {
    /// Unique messages in the window, ascending by timestamp.
    pub messages: Vec<Message>,
    pub pages_fetched: u32,
    /// The walk stopped at `max_pages` before reaching `from` or the start of the channel.
    pub truncated: bool,
}

/// Fetch every message in `[from, to]`, deduplicated and sorted ascending by timestamp.
///
/// `to` defaults to now. Equal timestamps come out in an unspecified order.
///
/// # Errors
///
/// Any page failure aborts the walk with `FetchWindow` wrapping the cause.
pub async fn get_all_messages_between_dates<S>(
    source: &S,
    channel_id: &str,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
    max_pages: Option<u32>,
    rate_limit_delay: Duration,
) -> Result<Vec<Message>, DigestError>
where
    S: MessagePageSource + ?Sized,
{
    let options = WindowOptions {
        max_pages: max_pages.unwrap_or(DEFAULT_MAX_PAGES),
        rate_limit_delay,
        ..WindowOptions::default()
    };
    Ok(fetch_window(source, channel_id, from, to, &options)
        .await?
        .messages)
}

/// Same walk as [`get_all_messages_between_dates`], also reporting page count and truncation.
///
/// # Errors
///
/// `FetchWindow` wrapping the first unrecoverable page failure, or `Cancelled`.
pub async fn fetch_window<S>(
    source: &S,
    channel_id: &str,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
    options: &WindowOptions,
) -> Result<FetchedWindow, DigestError>
where
    S: MessagePageSource + ?Sized,
{
    let to = to.unwrap_or_else(Utc::now);

    // An unencodable end date falls back to the newest page; the `to` filter still applies.
    let mut before = date_to_snowflake(to);
    if before.is_none() {
        warn!("No snowflake for end date {}, starting from newest message", to);
    }

    let mut accumulated: HashMap<String, Message> = HashMap::new();
    let mut pages_fetched = 0u32;
    let mut rate_limit_retries_left = options.rate_limit_retries;
    let mut has_more = true;
    let mut hit_old_message = false;

    while has_more && !hit_old_message && pages_fetched < options.max_pages {
        let cancel = options.cancel.as_ref();
        if let Err(e) = ensure_active(cancel) {
            info!("Window fetch for channel {} cancelled", channel_id);
            return Err(e);
        }

        if pages_fetched > 0 && !options.rate_limit_delay.is_zero() {
            until_cancelled(cancel, tokio::time::sleep(options.rate_limit_delay)).await?;
        }

        let request = source.fetch_page(channel_id, before.as_deref(), None);
        let page = match until_cancelled(cancel, request).await? {
            Ok(page) => page,
            Err(DigestError::RateLimited {
                retry_after_seconds,
            }) if rate_limit_retries_left > 0 => {
                rate_limit_retries_left -= 1;
                warn!(
                    "Rate limited on channel {}, waiting {}s ({} retries left)",
                    channel_id, retry_after_seconds, rate_limit_retries_left
                );
                let wait = tokio::time::sleep(Duration::from_secs(retry_after_seconds));
                until_cancelled(cancel, wait).await?;
                continue;
            }
            Err(e) => return Err(DigestError::FetchWindow(Box::new(e))),
        };
        pages_fetched += 1;

        if page.is_empty() {
            has_more = false;
            continue;
        }

        let page_len = page.len();
        let next_cursor = page.last().map(|m| m.id.clone());

        for message in page {
            if message.timestamp < from {
                hit_old_message = true;
                break;
            }
            if message.timestamp <= to {
                accumulated.insert(message.id.clone(), message);
            }
        }

        info!(
            "Fetched page {} for channel {} ({} messages, {} in window so far)",
            pages_fetched,
            channel_id,
            page_len,
            accumulated.len()
        );

        if page_len < PAGE_SIZE {
            has_more = false;
        } else if !hit_old_message {
            debug!("Advancing cursor to {:?}", next_cursor);
            before = next_cursor;
        }
    }

    let truncated = has_more && !hit_old_message;
    if truncated {
        warn!(
            "Stopped after {} pages for channel {} before reaching {}",
            pages_fetched, channel_id, from
        );
    }

    let mut messages: Vec<Message> = accumulated.into_values().collect();
    messages.sort_by_key(|m| m.timestamp);

    Ok(FetchedWindow {
        messages,
        pages_fetched,
        truncated,
    })
}
