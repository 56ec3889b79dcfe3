//! Application configuration. API credentials, run window, tuning knobs.

use serde::Deserialize;

use crate::shared::rate_limit::DEFAULT_MIN_INTERVAL_MS;

/// Default lookback window in hours.
pub const DEFAULT_HOURS_BACK: i64 = 24;

/// Default messages per classification request.
pub const DEFAULT_CHUNK_SIZE: usize = 25;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Slack bot token. Read from SLACK_BOT_TOKEN.
    pub slack_bot_token: Option<String>,

    /// Anthropic API key for model-backed classification. Read from
    /// ANTHROPIC_API_KEY. When absent the rule-based classifier runs.
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    /// Model name. Read from SLACK_DIGEST_MODEL.
    #[serde(default)]
    pub model: Option<String>,

    /// Lookback window in hours (default 24). Read from HOURS_BACK.
    #[serde(default)]
    pub hours_back: Option<i64>,

    /// Comma-separated channel names to include. Read from SLACK_CHANNELS.
    #[serde(default)]
    pub channels: Option<String>,

    /// Minimum ms between Slack API calls. Read from SLACK_DIGEST_RATE_LIMIT_MS.
    #[serde(default)]
    pub rate_limit_ms: Option<u64>,

    /// Messages per classification request. Read from SLACK_DIGEST_CHUNK_SIZE.
    #[serde(default)]
    pub chunk_size: Option<usize>,

    /// Directory for the rendered dashboard. Read from SLACK_DIGEST_OUTPUT_DIR.
    #[serde(default)]
    pub output_dir: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Notion Export Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// Notion integration token. Read from NOTION_API_KEY.
    #[serde(default)]
    pub notion_api_key: Option<String>,

    /// Notion database to create digest pages in. Read from NOTION_DATABASE_ID.
    #[serde(default)]
    pub notion_database_id: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("SLACK_DIGEST"));
        if let Ok(path) = std::env::var("SLACK_DIGEST_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // Unprefixed names are read directly so .env can use SLACK_BOT_TOKEN=...
        if let Ok(s) = std::env::var("SLACK_BOT_TOKEN") {
            cfg.slack_bot_token = Some(s);
        }
        if let Ok(s) = std::env::var("ANTHROPIC_API_KEY") {
            cfg.anthropic_api_key = Some(s);
        }
        if let Ok(s) = std::env::var("HOURS_BACK") {
            if let Ok(h) = s.parse::<i64>() {
                cfg.hours_back = Some(h);
            }
        }
        if let Ok(s) = std::env::var("SLACK_CHANNELS") {
            cfg.channels = Some(s);
        }
        if let Ok(s) = std::env::var("NOTION_API_KEY") {
            cfg.notion_api_key = Some(s);
        }
        if let Ok(s) = std::env::var("NOTION_DATABASE_ID") {
            cfg.notion_database_id = Some(s);
        }
        Ok(cfg)
    }

    /// Returns the Slack bot token if configured.
    pub fn slack_bot_token(&self) -> Option<String> {
        self.slack_bot_token.clone()
    }

    /// Returns the lookback window in hours. Defaults to 24 if unset.
    pub fn hours_back_or_default(&self) -> i64 {
        self.hours_back.unwrap_or(DEFAULT_HOURS_BACK)
    }

    /// Returns the channel name filter, split on commas, or None for all
    /// channels.
    pub fn channel_filter(&self) -> Option<Vec<String>> {
        let raw = self.channels.as_deref()?;
        let names: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if names.is_empty() { None } else { Some(names) }
    }

    /// Returns the minimum ms between Slack API calls. Defaults to 1100.
    pub fn rate_limit_ms_or_default(&self) -> u64 {
        self.rate_limit_ms.unwrap_or(DEFAULT_MIN_INTERVAL_MS)
    }

    /// Returns messages per classification request. Defaults to 25.
    pub fn chunk_size_or_default(&self) -> usize {
        self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    /// Returns the output directory for rendered dashboards. Defaults to
    /// "./output".
    pub fn output_dir_or_default(&self) -> String {
        self.output_dir
            .clone()
            .unwrap_or_else(|| "./output".to_string())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Model Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the Anthropic API key if configured.
    pub fn anthropic_api_key(&self) -> Option<String> {
        self.anthropic_api_key.clone()
    }

    /// Returns the model name. Defaults to "claude-sonnet-4-20250514".
    pub fn model_or_default(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| "claude-sonnet-4-20250514".to_string())
    }

    /// Returns true if model-backed classification is configured (API key
    /// present).
    pub fn is_model_configured(&self) -> bool {
        self.anthropic_api_key.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Notion Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the Notion integration token if configured.
    pub fn notion_api_key(&self) -> Option<String> {
        self.notion_api_key.clone()
    }

    /// Returns the Notion database id if configured.
    pub fn notion_database_id(&self) -> Option<String> {
        self.notion_database_id.clone()
    }

    /// Returns true if the Notion export is fully configured.
    pub fn is_notion_configured(&self) -> bool {
        self.notion_api_key.is_some() && self.notion_database_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_filter_splits_and_trims() {
        let cfg = AppConfig {
            channels: Some("eng, product ,,general".to_string()),
            ..Default::default()
        };
        assert_eq!(
            cfg.channel_filter().unwrap(),
            vec!["eng", "product", "general"]
        );
    }

    #[test]
    fn channel_filter_empty_means_all() {
        let cfg = AppConfig {
            channels: Some(" , ".to_string()),
            ..Default::default()
        };
        assert!(cfg.channel_filter().is_none());
        assert!(AppConfig::default().channel_filter().is_none());
    }

    #[test]
    fn notion_requires_both_credentials() {
        let mut cfg = AppConfig {
            notion_api_key: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(!cfg.is_notion_configured());
        cfg.notion_database_id = Some("db".to_string());
        assert!(cfg.is_notion_configured());
    }
}
