//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the bot's fixed constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Wikipedia language edition to search in
    #[serde(default = "default_wiki_language")]
    pub wiki_language: String,
    /// MediaWiki API endpoint; `{lang}` is replaced with the language code
    #[serde(default = "default_wiki_api_endpoint")]
    pub wiki_api_endpoint: String,
    /// User-Agent sent to the MediaWiki API; should name a contact URL or email
    #[serde(default = "default_wiki_user_agent")]
    pub wiki_user_agent: String,
    /// Timeout for a single MediaWiki request
    #[serde(default = "default_wiki_http_timeout_secs")]
    pub wiki_http_timeout_secs: u64,

    /// Sentences requested for inline-query answers
    #[serde(default = "default_inline_summary_sentences")]
    pub inline_summary_sentences: u32,
    /// Sentences requested for paginated direct-message answers
    #[serde(default = "default_paged_summary_sentences")]
    pub paged_summary_sentences: u32,
    /// Append a link to the article after the summary
    #[serde(default = "default_include_source_link")]
    pub include_source_link: bool,
    /// Cache hint passed to Telegram with inline answers
    #[serde(default = "default_inline_cache_time_secs")]
    pub inline_cache_time_secs: u32,

    /// Idle time after which a reading cursor is evicted
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Maximum number of reading cursors kept in memory
    #[serde(default = "default_session_max_size")]
    pub session_max_size: u64,
}

fn default_wiki_language() -> String {
    DEFAULT_WIKI_LANGUAGE.to_string()
}

fn default_wiki_api_endpoint() -> String {
    DEFAULT_WIKI_API_ENDPOINT.to_string()
}

fn default_wiki_user_agent() -> String {
    concat!(
        "wiki-lookup-bot/",
        env!("CARGO_PKG_VERSION"),
        " (https://github.com/0FL01; Telegram bot) reqwest"
    )
    .to_string()
}

const fn default_wiki_http_timeout_secs() -> u64 {
    10
}

const fn default_inline_summary_sentences() -> u32 {
    3
}

const fn default_paged_summary_sentences() -> u32 {
    5
}

const fn default_include_source_link() -> bool {
    true
}

const fn default_inline_cache_time_secs() -> u32 {
    60
}

const fn default_session_ttl_secs() -> u64 {
    SESSION_TTL_SECS
}

const fn default_session_max_size() -> u64 {
    SESSION_MAX_SIZE
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wiki_lookup_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the bot token is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = build_config()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings the bot cannot start with.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "TELEGRAM_TOKEN is not set".to_string(),
            ));
        }
        if self.inline_summary_sentences == 0 || self.paged_summary_sentences == 0 {
            return Err(ConfigError::Message(
                "summary sentence counts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// MediaWiki API URL for the configured language
    #[must_use]
    pub fn wiki_endpoint(&self) -> String {
        self.wiki_api_endpoint.replace("{lang}", &self.wiki_language)
    }
}

/// Build the layered configuration source shared by all settings.
///
/// # Errors
///
/// Returns a `ConfigError` if any source fails to load.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg.. `APP__WIKI_LANGUAGE=en ./target/app`
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE variables map to snake_case keys; empty values count as unset
        .add_source(
            Environment::default()
                .ignore_empty(true)
                .try_parsing(true),
        )
        .build()
}

/// Default Wikipedia language edition
pub const DEFAULT_WIKI_LANGUAGE: &str = "ru";
/// Default MediaWiki API endpoint template
pub const DEFAULT_WIKI_API_ENDPOINT: &str = "https://{lang}.wikipedia.org/w/api.php";

/// Maximum characters in one paginated chunk
pub const CHUNK_SIZE: usize = 1000;
/// Maximum disambiguation candidates shown to the user
pub const MAX_CANDIDATES: usize = 5;
/// Maximum characters of the inline result description
pub const INLINE_DESCRIPTION_LIMIT: usize = 100;

/// Idle time-to-live (seconds) for reading cursors.
/// Default: 24 hours.
pub const SESSION_TTL_SECS: u64 = 86_400;
/// Maximum number of reading cursors kept in memory.
pub const SESSION_MAX_SIZE: u64 = 10_000;
