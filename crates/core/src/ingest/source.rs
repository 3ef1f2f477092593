use crate::domain::niche::KeywordRecord;
use crate::ingest::mock::mock_keyword_record;
use crate::ingest::provider::KeywordDataProvider;
use crate::random::RandomSource;
use std::sync::Arc;

/// What came back from a provider boundary. Errors are folded into `Failed` so nothing is
/// thrown across the scoring layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome<T> {
    Live(T),
    Fallback { value: T, reason: String },
    Failed { reason: String },
}

impl<T> ProviderOutcome<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Live(value) | Self::Fallback { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Keyword provider plus the mock fallback.
#[derive(Clone)]
pub struct KeywordSource {
    live: Option<Arc<dyn KeywordDataProvider>>,
    fallback_enabled: bool,
    random: RandomSource,
}

impl KeywordSource {
    pub fn new(
        live: Option<Arc<dyn KeywordDataProvider>>,
        fallback_enabled: bool,
        random: RandomSource,
    ) -> Self {
        Self {
            live,
            fallback_enabled,
            random,
        }
    }

    /// Mock data only.
    pub fn offline(random: RandomSource) -> Self {
        Self::new(None, true, random)
    }

    pub async fn fetch(&self, keyword: &str) -> ProviderOutcome<KeywordRecord> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return ProviderOutcome::Failed {
                reason: "blank keyword".to_string(),
            };
        }

        let reason = match &self.live {
            Some(provider) => match provider.fetch_keyword(keyword).await {
                Ok(record) => return ProviderOutcome::Live(record),
                Err(err) => {
                    tracing::warn!(
                        keyword,
                        provider = provider.provider_name(),
                        error = %err,
                        "keyword provider failed"
                    );
                    format!("{}: {err:#}", provider.provider_name())
                }
            },
            None => "no keyword provider configured".to_string(),
        };

        if !self.fallback_enabled {
            return ProviderOutcome::Failed { reason };
        }

        tracing::debug!(keyword, %reason, "using mock keyword data");
        ProviderOutcome::Fallback {
            value: mock_keyword_record(keyword, &self.random),
            reason,
        }
    }
}
