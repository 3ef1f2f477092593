use crate::config::Settings;
use crate::domain::niche::KeywordRecord;
use crate::ingest::types::{
    InterestSeriesResponse, KeywordMetricsResponse, RankingPage, RankingPagesResponse,
};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const KEYWORDS_PATH: &str = "/v1/keywords";
const RANKING_PAGES_PATH: &str = "/v1/serp/top-pages";
const INTEREST_PATH: &str = "/v1/interest-over-time";

#[async_trait::async_trait]
pub trait KeywordDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_keyword(&self, keyword: &str) -> Result<KeywordRecord>;
}

#[async_trait::async_trait]
pub trait BacklinkProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Top ranking pages for `query`, best first, at most `limit`.
    async fn top_pages(&self, query: &str, limit: usize) -> Result<Vec<RankingPage>>;
}

#[async_trait::async_trait]
pub trait TrendsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Interest values in chronological order.
    async fn interest_over_time(&self, keyword: &str) -> Result<Vec<f64>>;
}

/// GET-and-decode helper shared by the HTTP providers. Timeouts are enforced by the client;
/// there is no retry.
#[derive(Debug, Clone)]
struct HttpJsonClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    label: &'static str,
}

impl HttpJsonClient {
    fn new(
        label: &'static str,
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| format!("failed to build {label} http client"))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            label,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let res = self
            .http
            .get(self.url(path))
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.label))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read {} response", self.label))?;
        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("{} response is not valid JSON: {text}", self.label))?;

        if !status.is_success() {
            anyhow::bail!("{} HTTP {status}: {raw_json}", self.label);
        }

        serde_json::from_value::<T>(raw_json)
            .with_context(|| format!("failed to decode {} response", self.label))
    }
}

#[derive(Debug, Clone)]
pub struct HttpKeywordProvider {
    client: HttpJsonClient,
}

impl HttpKeywordProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_keyword_api_base_url()?;
        Ok(Self {
            client: HttpJsonClient::new(
                "keyword provider",
                base_url,
                settings.keyword_api_key.clone(),
                settings.provider_timeout(),
            )?,
        })
    }
}

#[async_trait::async_trait]
impl KeywordDataProvider for HttpKeywordProvider {
    fn provider_name(&self) -> &'static str {
        "keyword_http_json"
    }

    async fn fetch_keyword(&self, keyword: &str) -> Result<KeywordRecord> {
        let resp: KeywordMetricsResponse = self
            .client
            .get_json(KEYWORDS_PATH, &[("keyword", keyword.to_string())])
            .await?;
        validate_keyword_metrics(&resp)?;

        Ok(KeywordRecord {
            text: keyword.to_string(),
            search_volume: resp.search_volume,
            competition: resp.competition,
            cpc: resp.cpc,
            related_keywords: resp
                .related_keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpBacklinkProvider {
    client: HttpJsonClient,
}

impl HttpBacklinkProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_backlink_api_base_url()?;
        Ok(Self {
            client: HttpJsonClient::new(
                "backlink provider",
                base_url,
                settings.backlink_api_key.clone(),
                settings.provider_timeout(),
            )?,
        })
    }
}

#[async_trait::async_trait]
impl BacklinkProvider for HttpBacklinkProvider {
    fn provider_name(&self) -> &'static str {
        "backlink_http_json"
    }

    async fn top_pages(&self, query: &str, limit: usize) -> Result<Vec<RankingPage>> {
        let resp: RankingPagesResponse = self
            .client
            .get_json(
                RANKING_PAGES_PATH,
                &[("query", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        let mut pages = resp.pages;
        pages.retain(|p| !p.domain.trim().is_empty());
        pages.truncate(limit);
        Ok(pages)
    }
}

#[derive(Debug, Clone)]
pub struct HttpTrendsProvider {
    client: HttpJsonClient,
}

impl HttpTrendsProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_trends_api_base_url()?;
        Ok(Self {
            client: HttpJsonClient::new(
                "trends provider",
                base_url,
                settings.trends_api_key.clone(),
                settings.provider_timeout(),
            )?,
        })
    }
}

#[async_trait::async_trait]
impl TrendsProvider for HttpTrendsProvider {
    fn provider_name(&self) -> &'static str {
        "trends_http_json"
    }

    async fn interest_over_time(&self, keyword: &str) -> Result<Vec<f64>> {
        let mut resp: InterestSeriesResponse = self
            .client
            .get_json(INTEREST_PATH, &[("keyword", keyword.to_string())])
            .await?;
        resp.points.sort_by_key(|p| p.date);
        Ok(resp.points.into_iter().map(|p| p.value).collect())
    }
}

fn validate_keyword_metrics(resp: &KeywordMetricsResponse) -> Result<()> {
    anyhow::ensure!(!resp.keyword.trim().is_empty(), "keyword must be non-empty");
    anyhow::ensure!(
        (0.0..=1.0).contains(&resp.competition),
        "competition must be between 0 and 1 (got {})",
        resp.competition
    );
    anyhow::ensure!(
        resp.cpc.is_finite() && resp.cpc >= 0.0,
        "cpc must be a non-negative number (got {})",
        resp.cpc
    );
    Ok(())
}
