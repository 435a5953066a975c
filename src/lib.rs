/// Channel Digest - summarizes a date range of Discord channel history with an LLM.
///
/// The core walks a channel's history backwards one page at a time, starting from a
/// snowflake cursor derived from the end of the requested window, until it reaches a message
/// older than the start of the window. Messages are deduplicated by id, sorted by timestamp,
/// flattened into a prompt and sent to the `OpenAI` Responses API. The resulting note is
/// inserted into a Markdown document.
///
/// # Architecture
///
/// - `discord::snowflake` converts between dates and snowflake ids
/// - `discord::client` fetches single pages and classifies HTTP failures
/// - `discord::window` drives the bounded, rate-limited walk
/// - `ai` formats the prompt and calls the completion API
/// - `worker` ties everything together for the command-line host
///
/// # Example
///
/// ```no_run
/// use channel_digest::discord::{DiscordClient, get_all_messages_between_dates};
/// use channel_digest::ai::{create_prompt, format_messages_for_prompt};
/// use chrono::{Duration, Utc};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     channel_digest::setup_logging();
///
///     let client = DiscordClient::new("token".to_string(), None);
///     let from = Utc::now() - Duration::days(1);
///     let messages = get_all_messages_between_dates(
///         &client,
///         "123456789012345678",
///         from,
///         None,
///         None,
///         std::time::Duration::from_millis(500),
///     )
///     .await?;
///
///     println!("{}", create_prompt(&format_messages_for_prompt(&messages)));
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod core;
pub mod discord;
pub mod errors;
pub mod worker;

pub use errors::DigestError;

/// Configure structured logging with JSON output on stderr, leaving stdout for the note.
///
/// Honours `RUST_LOG`, defaulting to `info`. Safe to call more than once; later calls
/// are ignored.
///
/// # Example
///
/// ```
/// channel_digest::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_writer(std::io::stderr);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
