use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::errors::DigestError;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// A finished summary plus the context needed to render it.
#[derive(Debug, Clone)]
pub struct DigestNote {
    pub server_name: String,
    pub channel_name: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub message_count: usize,
    pub truncated: bool,
    pub summary: String,
}

/// Markdown block inserted into the user's document.
#[must_use]
pub fn render_note(note: &DigestNote) -> String {
    let mut out = format!(
        "## Discord Summary: {} / #{}\n\n*{} to {} · {} messages*\n",
        note.server_name,
        note.channel_name,
        note.from.format(DATE_FORMAT),
        note.to.format(DATE_FORMAT),
        note.message_count
    );
    if note.truncated {
        out.push_str(
            "\n> Page limit reached; the earliest messages in this range were not included.\n",
        );
    }
    out.push('\n');
    out.push_str(note.summary.trim());
    out.push('\n');
    out
}

/// Append the rendered note to `document`, creating the file if needed.
///
/// # Errors
///
/// Returns `Io` if the file cannot be opened or written.
pub fn insert_note(document: &Path, note: &DigestNote) -> Result<(), DigestError> {
    let needs_separator = document.metadata().map(|m| m.len() > 0).unwrap_or(false);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(document)?;

    if needs_separator {
        file.write_all(b"\n")?;
    }
    file.write_all(render_note(note).as_bytes())?;

    info!("Inserted summary into {}", document.display());
    Ok(())
}
