//! Discord-specific functionality: id codec, REST client and the window walk

pub mod client;
pub mod snowflake;
pub mod window;

// Re-export main types for convenience
pub use client::{DiscordClient, MessagePageSource, PAGE_SIZE};
pub use snowflake::{SnowflakeCodec, date_to_snowflake, snowflake_to_date};
pub use window::{FetchedWindow, WindowOptions, fetch_window, get_all_messages_between_dates};
