use crate::domain::niche::{KeywordRecord, ScoredNiche};
use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 5;
pub const DISPLAY_RELATED_KEYWORDS: usize = 10;
pub const DISPLAY_COMPETITORS: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
    #[serde(default)]
    pub include_keyword_data: bool,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub industry: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisInput {
    pub keywords: Vec<String>,
    pub limit: usize,
    pub industry: Option<String>,
    pub include_keyword_data: bool,
    pub save: bool,
}

impl AnalyzeRequest {
    pub fn validate(self, default_limit: usize) -> Result<AnalysisInput, AnalysisError> {
        if self.keywords.is_empty() {
            return Err(AnalysisError::Input("keywords must be non-empty".to_string()));
        }

        let keywords: Vec<String> = self
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .collect();
        if keywords.iter().all(|k| k.is_empty()) {
            return Err(AnalysisError::Input(
                "keywords must contain at least one non-blank entry".to_string(),
            ));
        }

        let limit = self.limit.unwrap_or(default_limit);
        if limit == 0 {
            return Err(AnalysisError::Input("limit must be >= 1".to_string()));
        }

        let industry = self
            .preferences
            .and_then(|p| p.industry)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(AnalysisInput {
            keywords,
            limit,
            industry,
            include_keyword_data: self.include_keyword_data,
            save: self.save,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheRecommendation {
    pub niche_name: String,
    pub monthly_search_volume: u64,
    pub competition_score: f64,
    pub monetization_potential: f64,
    pub trending_score: f64,
    pub estimated_cpc: f64,
    pub related_keywords: Vec<String>,
    pub top_competitors: Vec<CompetitorView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorView {
    pub domain: String,
    pub domain_authority: f64,
    pub estimated_traffic: u64,
}

impl From<&ScoredNiche> for NicheRecommendation {
    fn from(scored: &ScoredNiche) -> Self {
        let niche = &scored.niche;
        Self {
            niche_name: niche.name.clone(),
            monthly_search_volume: niche.monthly_search_volume,
            competition_score: round2(scored.competition_score),
            monetization_potential: round2(scored.monetization_potential),
            trending_score: round2(scored.trending_score),
            estimated_cpc: round2(niche.estimated_cpc),
            related_keywords: niche
                .related_keywords
                .iter()
                .take(DISPLAY_RELATED_KEYWORDS)
                .cloned()
                .collect(),
            top_competitors: niche
                .top_competitors
                .iter()
                .take(DISPLAY_COMPETITORS)
                .map(|c| CompetitorView {
                    domain: c.domain.clone(),
                    domain_authority: round2(c.authority),
                    estimated_traffic: c.traffic,
                })
                .collect(),
        }
    }
}

/// Wire shape shared by the API and the worker. Failures keep `success: false` plus `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche_recommendations: Option<Vec<NicheRecommendation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_data: Option<Vec<KeywordRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn success(
        timestamp: DateTime<Utc>,
        niche_recommendations: Vec<NicheRecommendation>,
    ) -> Self {
        Self {
            success: true,
            timestamp: Some(timestamp),
            niche_recommendations: Some(niche_recommendations),
            keyword_data: None,
            saved: None,
            persistence_error: None,
            error: None,
        }
    }

    pub fn failure(err: &AnalysisError) -> Self {
        Self {
            success: false,
            timestamp: None,
            niche_recommendations: None,
            keyword_data: None,
            saved: None,
            persistence_error: None,
            error: Some(err.to_string()),
        }
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
