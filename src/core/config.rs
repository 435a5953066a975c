use std::env;
use std::time::Duration;

pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v9";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_PAGES: u32 = 50;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discord_token: String,
    pub channel_id: String,
    pub server_id: Option<String>,
    pub discord_api_base: String,
    pub rate_limit_delay_ms: u64,
    pub max_pages: u32,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_org_id: Option<String>,
    pub openai_api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| format!("{key}: environment variable not found"))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            discord_token: required("DISCORD_TOKEN")?,
            channel_id: required("DISCORD_CHANNEL_ID")?,
            server_id: optional("DISCORD_SERVER_ID"),
            discord_api_base: optional("DISCORD_API_BASE")
                .unwrap_or_else(|| DEFAULT_DISCORD_API_BASE.to_string()),
            rate_limit_delay_ms: match optional("RATE_LIMIT_DELAY_MS") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| format!("RATE_LIMIT_DELAY_MS: {e}"))?,
                None => DEFAULT_RATE_LIMIT_DELAY_MS,
            },
            max_pages: match optional("MAX_PAGES") {
                Some(raw) => raw.trim().parse().map_err(|e| format!("MAX_PAGES: {e}"))?,
                None => DEFAULT_MAX_PAGES,
            },
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: optional("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_org_id: optional("OPENAI_ORG_ID"),
            openai_api_base: optional("OPENAI_API_BASE")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
        })
    }

    #[must_use]
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}
