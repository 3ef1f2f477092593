use serde::{Deserialize, Serialize};

/// Ranking weights. The competition score enters as `EASE_REFERENCE - competition_score`.
const EASE_WEIGHT: f64 = 0.4;
const EASE_REFERENCE: f64 = 10.0;
const MONETIZATION_WEIGHT: f64 = 0.4;
const TRENDING_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub text: String,
    pub search_volume: u64,
    pub competition: f64,
    pub cpc: f64,
    pub related_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub domain: String,
    pub authority: f64,
    pub traffic: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateNiche {
    pub name: String,
    pub monthly_search_volume: u64,
    /// Raw competition index in [0, 1].
    pub competition: f64,
    pub estimated_cpc: f64,
    pub related_keywords: Vec<String>,
    /// Empty until the competition scorer has looked at ranking pages.
    pub top_competitors: Vec<Competitor>,
}

impl CandidateNiche {
    pub fn from_record(record: &KeywordRecord) -> Self {
        Self {
            name: record.text.clone(),
            monthly_search_volume: record.search_volume,
            competition: record.competition,
            estimated_cpc: record.cpc,
            related_keywords: record.related_keywords.clone(),
            top_competitors: Vec::new(),
        }
    }

    /// True when the name or any related keyword contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.name.contains(needle) || self.related_keywords.iter().any(|k| k.contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredNiche {
    #[serde(flatten)]
    pub niche: CandidateNiche,
    pub competition_score: f64,
    pub monetization_potential: f64,
    pub trending_score: f64,
}

impl ScoredNiche {
    /// Ranking key; higher is better.
    pub fn weighted_score(&self) -> f64 {
        EASE_WEIGHT * (EASE_REFERENCE - self.competition_score)
            + MONETIZATION_WEIGHT * self.monetization_potential
            + TRENDING_WEIGHT * self.trending_score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCandidate {
    pub name: String,
    pub tld: String,
    pub score: f64,
}

impl DomainCandidate {
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.name, self.tld)
    }
}
