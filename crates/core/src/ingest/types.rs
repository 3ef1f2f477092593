use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMetricsResponse {
    pub keyword: String,
    pub search_volume: u64,
    pub competition: f64,
    pub cpc: f64,
    #[serde(default)]
    pub related_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingPagesResponse {
    pub pages: Vec<RankingPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingPage {
    #[serde(default)]
    pub url: Option<String>,
    pub domain: String,
    pub domain_rating: f64,
    pub backlinks: f64,
    #[serde(default)]
    pub traffic: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestSeriesResponse {
    pub keyword: String,
    pub points: Vec<InterestPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestPoint {
    pub date: NaiveDate,
    pub value: f64,
}
