use crate::domain::niche::{CandidateNiche, Competitor};
use crate::ingest::provider::BacklinkProvider;
use crate::ingest::types::RankingPage;
use crate::scoring::{clamp_score, log10_floor1, COMPETITION_MAX};
use std::sync::Arc;

const TOP_PAGES: usize = 10;

#[derive(Clone, Default)]
pub struct CompetitionScorer {
    backlinks: Option<Arc<dyn BacklinkProvider>>,
}

impl CompetitionScorer {
    pub fn new(backlinks: Option<Arc<dyn BacklinkProvider>>) -> Self {
        Self { backlinks }
    }

    /// Scores `niche` in [0, 100]. With a backlink provider, `top_competitors` is filled from
    /// the ranking pages.
    pub async fn score(&self, niche: &mut CandidateNiche) -> f64 {
        let Some(provider) = &self.backlinks else {
            return keyword_competition_score(niche);
        };

        match provider.top_pages(&niche.name, TOP_PAGES).await {
            Ok(pages) if !pages.is_empty() => {
                niche.top_competitors = pages.iter().map(competitor_from_page).collect();
                backlink_competition_score(&pages)
            }
            Ok(_) => {
                tracing::warn!(
                    niche = %niche.name,
                    provider = provider.provider_name(),
                    "no ranking pages returned; using degraded competition estimate"
                );
                degraded_competition_score(niche)
            }
            Err(err) => {
                tracing::warn!(
                    niche = %niche.name,
                    provider = provider.provider_name(),
                    error = %err,
                    "backlink provider failed; using degraded competition estimate"
                );
                degraded_competition_score(niche)
            }
        }
    }
}

/// Used when no backlink provider is configured.
pub fn keyword_competition_score(niche: &CandidateNiche) -> f64 {
    let competition_part = 0.6 * (niche.competition * 100.0);
    let volume_part = 0.2 * (log10_floor1(niche.monthly_search_volume as f64) * 2.0);
    let cpc_part = 0.2 * (niche.estimated_cpc * 5.0);
    clamp_score(competition_part + volume_part + cpc_part, 0.0, COMPETITION_MAX)
}

pub fn backlink_competition_score(pages: &[RankingPage]) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }

    let n = pages.len() as f64;
    let avg_authority = pages.iter().map(|p| p.domain_rating).sum::<f64>() / n;
    let avg_backlinks = pages.iter().map(|p| p.backlinks).sum::<f64>() / n;

    clamp_score(
        0.7 * avg_authority + 3.0 * log10_floor1(avg_backlinks),
        0.0,
        COMPETITION_MAX,
    )
}

/// Used when the backlink provider fails.
pub fn degraded_competition_score(niche: &CandidateNiche) -> f64 {
    clamp_score(niche.competition * 80.0 + 20.0, 0.0, COMPETITION_MAX)
}

fn competitor_from_page(page: &RankingPage) -> Competitor {
    Competitor {
        domain: page.domain.trim().to_string(),
        authority: page.domain_rating,
        traffic: page.traffic,
    }
}
