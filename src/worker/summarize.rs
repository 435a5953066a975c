use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::LlmClient;
use crate::ai::prompt_builder::{create_prompt, format_messages_for_prompt};
use crate::core::cancel::{ensure_active, until_cancelled};
use crate::core::config::AppConfig;
use crate::core::models::MessageWindow;
use crate::discord::client::{DiscordClient, UNKNOWN_CHANNEL, UNKNOWN_SERVER};
use crate::discord::window::{WindowOptions, fetch_window};
use crate::errors::DigestError;

use super::deliver::DigestNote;

/// What a summary run produced.
#[derive(Debug)]
pub enum SummaryOutcome {
    Summary(DigestNote),
    NoMessages,
}

/// Per-run knobs that the host may set on top of [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub channel_id: Option<String>,
    pub server_id: Option<String>,
    pub max_pages: Option<u32>,
    pub rate_limit_retries: u32,
    /// Interrupts the run at any await point; the completion request is never sent once
    /// this has fired.
    pub cancel: Option<CancellationToken>,
}

/// Fetch the window, summarize it and build the note.
///
/// # Errors
///
/// Propagates window fetch failures (wrapped in `FetchWindow`) and completion failures.
/// Returns `Cancelled` if `run.cancel` fires before the note is built.
pub async fn summarize_window(
    config: &AppConfig,
    window: &MessageWindow,
    run: &RunOptions,
) -> Result<SummaryOutcome, DigestError> {
    let correlation_id = Uuid::new_v4();
    let channel_id = run.channel_id.as_deref().unwrap_or(&config.channel_id);
    let to = window.effective_to();

    info!(
        "Summarizing channel {} from {} to {} (corr_id={})",
        channel_id, window.from, to, correlation_id
    );

    let discord = DiscordClient::new(
        config.discord_token.clone(),
        Some(config.discord_api_base.clone()),
    );

    let options = WindowOptions {
        max_pages: run.max_pages.unwrap_or(config.max_pages),
        rate_limit_delay: config.rate_limit_delay(),
        rate_limit_retries: run.rate_limit_retries,
        cancel: run.cancel.clone(),
    };

    let cancel = run.cancel.as_ref();
    let fetched = fetch_window(&discord, channel_id, window.from, Some(to), &options).await?;
    ensure_active(cancel)?;

    info!(
        "Collected {} messages over {} pages (truncated={}, corr_id={})",
        fetched.messages.len(),
        fetched.pages_fetched,
        fetched.truncated,
        correlation_id
    );

    if fetched.truncated {
        warn!(
            "Page limit reached, summary may not cover the start of the window (corr_id={})",
            correlation_id
        );
    }

    let message_text = format_messages_for_prompt(&fetched.messages);
    if message_text.is_empty() {
        return Ok(SummaryOutcome::NoMessages);
    }

    let channel_info = until_cancelled(cancel, discord.get_channel_info(channel_id)).await?;
    let channel_name = channel_info
        .name
        .clone()
        .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string());
    let server_name = match run
        .server_id
        .as_deref()
        .or(config.server_id.as_deref())
        .or(channel_info.guild_id.as_deref())
    {
        Some(guild_id) => until_cancelled(cancel, discord.get_guild_name(guild_id)).await?,
        None => UNKNOWN_SERVER.to_string(),
    };

    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_org_id.clone(),
        config.openai_model.clone(),
    )
    .with_api_base(config.openai_api_base.clone());

    let prompt = create_prompt(&message_text);
    let summary = until_cancelled(cancel, llm.generate_summary(&prompt)).await??;
    ensure_active(cancel)?;

    Ok(SummaryOutcome::Summary(DigestNote {
        server_name,
        channel_name,
        from: window.from,
        to,
        message_count: fetched.messages.len(),
        truncated: fetched.truncated,
        summary,
    }))
}
