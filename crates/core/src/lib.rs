pub mod domain;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod random;
pub mod scoring;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub keyword_api_base_url: Option<String>,
        pub keyword_api_key: Option<String>,
        pub backlink_api_base_url: Option<String>,
        pub backlink_api_key: Option<String>,
        pub trends_api_base_url: Option<String>,
        pub trends_api_key: Option<String>,
        pub provider_timeout_secs: u64,
        /// When false, a failing keyword provider drops the keyword instead of using mock data.
        pub keyword_fallback_enabled: bool,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: non_empty_var("DATABASE_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                keyword_api_base_url: non_empty_var("KEYWORD_API_BASE_URL"),
                keyword_api_key: non_empty_var("KEYWORD_API_KEY"),
                backlink_api_base_url: non_empty_var("BACKLINK_API_BASE_URL"),
                backlink_api_key: non_empty_var("BACKLINK_API_KEY"),
                trends_api_base_url: non_empty_var("TRENDS_API_BASE_URL"),
                trends_api_key: non_empty_var("TRENDS_API_KEY"),
                provider_timeout_secs: std::env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
                keyword_fallback_enabled: std::env::var("KEYWORD_FALLBACK_ENABLED")
                    .ok()
                    .and_then(|s| s.parse::<bool>().ok())
                    .unwrap_or(true),
            })
        }

        pub fn provider_timeout(&self) -> Duration {
            Duration::from_secs(self.provider_timeout_secs.max(1))
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_keyword_api_base_url(&self) -> anyhow::Result<&str> {
            self.keyword_api_base_url
                .as_deref()
                .context("KEYWORD_API_BASE_URL is required")
        }

        pub fn require_backlink_api_base_url(&self) -> anyhow::Result<&str> {
            self.backlink_api_base_url
                .as_deref()
                .context("BACKLINK_API_BASE_URL is required")
        }

        pub fn require_trends_api_base_url(&self) -> anyhow::Result<&str> {
            self.trends_api_base_url
                .as_deref()
                .context("TRENDS_API_BASE_URL is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
