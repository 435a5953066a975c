// Command-line host: pick a window, summarize it, insert the note into a document.

use anyhow::Context;
use channel_digest::DigestError;
use channel_digest::core::config::AppConfig;
use channel_digest::core::models::{DayBound, MessageWindow, parse_window_date};
use channel_digest::worker::{
    RunOptions, SummaryOutcome, insert_note, render_note, summarize_window,
};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "channel-digest", about = "Summarize a Discord channel over a date range")]
struct Cli {
    /// Start of the window (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    from: String,

    /// End of the window (YYYY-MM-DD or RFC 3339), defaults to now
    #[arg(long)]
    to: Option<String>,

    /// Overrides DISCORD_CHANNEL_ID
    #[arg(long)]
    channel: Option<String>,

    /// Overrides DISCORD_SERVER_ID
    #[arg(long)]
    server: Option<String>,

    /// Overrides MAX_PAGES
    #[arg(long)]
    max_pages: Option<u32>,

    /// Wait out this many 429 responses before giving up
    #[arg(long, default_value_t = 0)]
    rate_limit_retries: u32,

    /// Markdown document to append the summary to; prints to stdout when absent
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    channel_digest::setup_logging();

    let cli = Cli::parse();
    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    let from = parse_window_date(&cli.from, DayBound::Start)?;
    let to = cli
        .to
        .as_deref()
        .map(|raw| parse_window_date(raw, DayBound::End))
        .transpose()?;
    let window = MessageWindow::from_selection(from, to)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    let run = RunOptions {
        channel_id: cli.channel,
        server_id: cli.server,
        max_pages: cli.max_pages,
        rate_limit_retries: cli.rate_limit_retries,
        cancel: Some(cancel.clone()),
    };

    let outcome = summarize_window(&config, &window, &run)
        .await
        .and_then(|outcome| {
            // An interrupt after the summary arrived still leaves the document untouched.
            if cancel.is_cancelled() {
                Err(DigestError::Cancelled)
            } else {
                Ok(outcome)
            }
        });

    match outcome {
        Ok(SummaryOutcome::Summary(note)) => {
            match &cli.output {
                Some(path) => insert_note(path, &note)?,
                None => print!("{}", render_note(&note)),
            }
            Ok(())
        }
        Ok(SummaryOutcome::NoMessages) => {
            eprintln!("No messages found in the selected date range.");
            Ok(())
        }
        Err(e) => {
            error!("Failed to generate summary: {}", e);
            eprintln!("{}", e.user_notice());
            std::process::exit(1);
        }
    }
}
