use crate::core::models::Message;

/// Instructions placed ahead of the transcript. `{messages}` is replaced with the
/// formatted message block.
pub const SUMMARY_PROMPT_TEMPLATE: &str = "\
You are summarizing a Discord channel conversation for someone who was not there.

Write the summary in two parts:
1. A short prose overview (2-4 sentences) of what was discussed.
2. A bulleted list of the key points, decisions, questions and links that came up.

Whenever a stock, token, currency, commodity or other financial instrument is mentioned \
together with a price, target, level or range, call it out explicitly in a separate \
\"Instruments & Levels\" list in the form `TICKER: level (context, who said it)`. \
If none were mentioned, omit that list.

Do not invent information that is not in the messages.

Messages:
{messages}";

/// Render messages as `username: content` lines in the given order.
///
/// Messages without an author or with blank content are skipped.
#[must_use]
pub fn format_messages_for_prompt(messages: &[Message]) -> String {
    messages
        .iter()
        .filter_map(|msg| {
            let author = msg.author.as_ref()?;
            let content = msg.content.trim();
            if content.is_empty() {
                return None;
            }
            Some(format!("{}: {}", author.username, content))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap a formatted message block in [`SUMMARY_PROMPT_TEMPLATE`].
#[must_use]
pub fn create_prompt(message_text: &str) -> String {
    SUMMARY_PROMPT_TEMPLATE.replace("{messages}", message_text)
}
