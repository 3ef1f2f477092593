//! Niche recommendation pipeline.
//!
//! keywords → keyword records (concurrent, failures dropped) → candidate niches → optional
//! industry filter → scoring (concurrent per candidate) → monetization filter → stable rank →
//! limit → optional all-or-nothing save.

use crate::config::Settings;
use crate::domain::contract::{
    AnalysisInput, AnalysisResponse, AnalyzeRequest, NicheRecommendation, DEFAULT_LIMIT,
};
use crate::domain::niche::{CandidateNiche, KeywordRecord, ScoredNiche};
use crate::error::AnalysisError;
use crate::ingest::provider::{
    BacklinkProvider, HttpBacklinkProvider, HttpKeywordProvider, HttpTrendsProvider,
    KeywordDataProvider, TrendsProvider,
};
use crate::ingest::KeywordSource;
use crate::random::RandomSource;
use crate::scoring::{
    clamp_score, evaluate_monetization_potential, CompetitionScorer, ScoringConfig,
    TrendingScorer, COMPETITION_MAX, MONETIZATION_MAX, TRENDING_MAX,
};
use crate::storage::NicheStore;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

const MIN_DERIVED_NAME_CHARS: usize = 5;
const MIN_DERIVED_VOLUME: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Used when a request has no `limit`.
    pub default_limit: usize,
    pub scoring: ScoringConfig,
    pub random: RandomSource,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            scoring: ScoringConfig::default(),
            random: RandomSource::Entropy,
        }
    }
}

impl AnalysisOptions {
    pub fn from_env() -> Self {
        let mut out = Self {
            scoring: ScoringConfig::from_env(),
            random: RandomSource::from_env(),
            ..Self::default()
        };

        if let Ok(s) = std::env::var("NICHE_DEFAULT_LIMIT") {
            if let Ok(n) = s.parse::<usize>() {
                if n >= 1 {
                    out.default_limit = n;
                }
            }
        }

        out
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub generated_at: DateTime<Utc>,
    pub keyword_records: Vec<KeywordRecord>,
    pub recommendations: Vec<ScoredNiche>,
    pub saved: Option<usize>,
    pub persistence_error: Option<AnalysisError>,
}

impl AnalysisOutcome {
    pub fn into_response(self, include_keyword_data: bool) -> AnalysisResponse {
        let mut resp = AnalysisResponse::success(
            self.generated_at,
            self.recommendations
                .iter()
                .map(NicheRecommendation::from)
                .collect(),
        );
        if include_keyword_data {
            resp.keyword_data = Some(self.keyword_records);
        }
        resp.saved = self.saved;
        resp.persistence_error = self.persistence_error.map(|e| e.to_string());
        resp
    }
}

#[derive(Clone)]
pub struct NicheEngine {
    keywords: KeywordSource,
    competition: CompetitionScorer,
    trending: TrendingScorer,
    store: Option<Arc<dyn NicheStore>>,
    options: AnalysisOptions,
}

impl NicheEngine {
    pub fn new(
        keywords: KeywordSource,
        competition: CompetitionScorer,
        trending: TrendingScorer,
        options: AnalysisOptions,
    ) -> Self {
        Self {
            keywords,
            competition,
            trending,
            store: None,
            options,
        }
    }

    /// Mock keyword data and provider-free scoring.
    pub fn offline(options: AnalysisOptions) -> Self {
        Self::new(
            KeywordSource::offline(options.random),
            CompetitionScorer::default(),
            TrendingScorer::new(None, options.random),
            options,
        )
    }

    /// Wires an HTTP provider for each collaborator whose base URL is configured.
    pub fn from_settings(settings: &Settings, options: AnalysisOptions) -> anyhow::Result<Self> {
        let keyword_provider: Option<Arc<dyn KeywordDataProvider>> =
            match settings.keyword_api_base_url {
                Some(_) => Some(Arc::new(HttpKeywordProvider::from_settings(settings)?)),
                None => None,
            };
        let backlink_provider: Option<Arc<dyn BacklinkProvider>> =
            match settings.backlink_api_base_url {
                Some(_) => Some(Arc::new(HttpBacklinkProvider::from_settings(settings)?)),
                None => None,
            };
        let trends_provider: Option<Arc<dyn TrendsProvider>> = match settings.trends_api_base_url
        {
            Some(_) => Some(Arc::new(HttpTrendsProvider::from_settings(settings)?)),
            None => None,
        };

        tracing::info!(
            keyword_provider = keyword_provider.is_some(),
            backlink_provider = backlink_provider.is_some(),
            trends_provider = trends_provider.is_some(),
            deterministic = options.random.is_deterministic(),
            "niche engine configured"
        );

        Ok(Self::new(
            KeywordSource::new(
                keyword_provider,
                settings.keyword_fallback_enabled,
                options.random,
            ),
            CompetitionScorer::new(backlink_provider),
            TrendingScorer::new(trends_provider, options.random),
            options,
        ))
    }

    pub fn with_store(mut self, store: Arc<dyn NicheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Request in, wire response out. Never fails; failures become `success: false`.
    pub async fn analyze(&self, request: AnalyzeRequest) -> AnalysisResponse {
        let input = match request.validate(self.options.default_limit) {
            Ok(input) => input,
            Err(err) => {
                tracing::warn!(error = %err, "rejected niche analysis request");
                return AnalysisResponse::failure(&err);
            }
        };

        match self.run(&input).await {
            Ok(outcome) => outcome.into_response(input.include_keyword_data),
            Err(err) => {
                tracing::warn!(error = %err, keywords = input.keywords.len(), "niche analysis failed");
                AnalysisResponse::failure(&err)
            }
        }
    }

    pub async fn run(&self, input: &AnalysisInput) -> Result<AnalysisOutcome, AnalysisError> {
        let records = self.fetch_keyword_records(&input.keywords).await;
        if records.is_empty() {
            return Err(AnalysisError::NoValidData);
        }

        let mut candidates = self.generate_candidates(&records);
        if let Some(industry) = &input.industry {
            candidates.retain(|c| c.mentions(industry));
        }
        let candidate_count = candidates.len();

        let scored = join_all(candidates.into_iter().map(|c| self.score_candidate(c))).await;
        let recommendations = rank_niches(scored, self.options.scoring.min_monetization, input.limit);

        tracing::info!(
            keywords = input.keywords.len(),
            records = records.len(),
            candidates = candidate_count,
            recommendations = recommendations.len(),
            "niche analysis complete"
        );

        let mut outcome = AnalysisOutcome {
            generated_at: Utc::now(),
            keyword_records: records,
            recommendations,
            saved: None,
            persistence_error: None,
        };

        if input.save {
            match self.persist(&outcome.recommendations).await {
                Ok(n) => outcome.saved = Some(n),
                Err(err) => {
                    tracing::error!(error = %err, "saving niche recommendations failed");
                    outcome.persistence_error = Some(err);
                }
            }
        }

        Ok(outcome)
    }

    async fn fetch_keyword_records(&self, keywords: &[String]) -> Vec<KeywordRecord> {
        let outcomes = join_all(keywords.iter().map(|k| self.keywords.fetch(k))).await;

        outcomes
            .into_iter()
            .zip(keywords)
            .filter_map(|(outcome, keyword)| {
                if outcome.is_failed() {
                    tracing::warn!(keyword = %keyword, ?outcome, "dropping keyword without data");
                }
                outcome.into_value()
            })
            .collect()
    }

    /// Each record becomes a candidate, plus its related keywords that are distinct, at least
    /// five characters, and keep at least 1000 searches after volume scaling.
    pub fn generate_candidates(&self, records: &[KeywordRecord]) -> Vec<CandidateNiche> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for record in records {
            if seen.insert(record.text.clone()) {
                out.push(CandidateNiche::from_record(record));
            }

            let mut rng = self.options.random.rng_for("candidates", &record.text);
            for related in &record.related_keywords {
                let related = related.trim();
                let source = record.text.trim();
                if related == source || related.chars().count() < MIN_DERIVED_NAME_CHARS {
                    continue;
                }

                let scaled_volume = record.search_volume as f64 * rng.gen_range(0.3..1.0);
                if scaled_volume < MIN_DERIVED_VOLUME {
                    continue;
                }
                let competition = (record.competition * rng.gen_range(0.8..1.2)).clamp(0.0, 1.0);
                let cpc = (record.cpc * rng.gen_range(0.8..1.2)).max(0.0);

                if !seen.insert(related.to_string()) {
                    continue;
                }
                out.push(CandidateNiche {
                    name: related.to_string(),
                    monthly_search_volume: scaled_volume.floor() as u64,
                    competition,
                    estimated_cpc: cpc,
                    related_keywords: std::iter::once(record.text.clone())
                        .chain(
                            record
                                .related_keywords
                                .iter()
                                .filter(|k| k.trim() != related && k.trim() != source)
                                .cloned(),
                        )
                        .collect(),
                    top_competitors: Vec::new(),
                });
            }
        }

        out
    }

    async fn score_candidate(&self, mut niche: CandidateNiche) -> ScoredNiche {
        let monetization = evaluate_monetization_potential(&niche);
        let name = niche.name.clone();
        let (competition_score, trending_score) = tokio::join!(
            self.competition.score(&mut niche),
            self.trending.score(&name)
        );

        ScoredNiche {
            niche,
            competition_score: clamp_score(competition_score, 0.0, COMPETITION_MAX),
            monetization_potential: clamp_score(monetization, 0.0, MONETIZATION_MAX),
            trending_score: clamp_score(trending_score, 0.0, TRENDING_MAX),
        }
    }

    async fn persist(&self, niches: &[ScoredNiche]) -> Result<usize, AnalysisError> {
        let Some(store) = &self.store else {
            return Err(AnalysisError::Persistence(
                "no niche store configured".to_string(),
            ));
        };

        store.save_niches(niches).await.map_err(|err| {
            AnalysisError::Persistence(format!("{} store: {err:#}", store.store_name()))
        })
    }
}

/// Drops niches under `min_monetization`, orders by weighted score (stable, so ties keep input
/// order) and keeps the first `limit`.
pub fn rank_niches(
    scored: Vec<ScoredNiche>,
    min_monetization: f64,
    limit: usize,
) -> Vec<ScoredNiche> {
    let mut kept: Vec<ScoredNiche> = scored
        .into_iter()
        .filter(|s| s.monetization_potential >= min_monetization)
        .collect();

    kept.sort_by(|a, b| {
        b.weighted_score()
            .partial_cmp(&a.weighted_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    kept.truncate(limit);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::Preferences;
    use crate::ingest::types::RankingPage;
    use crate::storage::MemoryNicheStore;

    fn seeded_options() -> AnalysisOptions {
        AnalysisOptions {
            random: RandomSource::Seeded(2024),
            ..Default::default()
        }
    }

    fn request(keywords: &[&str]) -> AnalyzeRequest {
        AnalyzeRequest {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn scored(name: &str, comp: f64, mon: f64, trend: f64) -> ScoredNiche {
        ScoredNiche {
            niche: CandidateNiche {
                name: name.to_string(),
                monthly_search_volume: 5000,
                competition: 0.5,
                estimated_cpc: 2.0,
                related_keywords: Vec::new(),
                top_competitors: Vec::new(),
            },
            competition_score: comp,
            monetization_potential: mon,
            trending_score: trend,
        }
    }

    fn record(text: &str, volume: u64, related: &[&str]) -> KeywordRecord {
        KeywordRecord {
            text: text.to_string(),
            search_volume: volume,
            competition: 0.5,
            cpc: 2.0,
            related_keywords: related.iter().map(|s| s.to_string()).collect(),
        }
    }

    struct DownProvider;

    #[async_trait::async_trait]
    impl KeywordDataProvider for DownProvider {
        fn provider_name(&self) -> &'static str {
            "down"
        }

        async fn fetch_keyword(&self, _keyword: &str) -> anyhow::Result<KeywordRecord> {
            anyhow::bail!("connection refused")
        }
    }

    struct DomainsProvider;

    #[async_trait::async_trait]
    impl BacklinkProvider for DomainsProvider {
        fn provider_name(&self) -> &'static str {
            "domains"
        }

        async fn top_pages(&self, query: &str, limit: usize) -> anyhow::Result<Vec<RankingPage>> {
            Ok((0..limit)
                .map(|i| RankingPage {
                    url: None,
                    domain: format!("{}-{i}.com", query.replace(' ', "")),
                    domain_rating: 10.0,
                    backlinks: 10.0,
                    traffic: 500,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn empty_keywords_fail() {
        let engine = NicheEngine::offline(seeded_options());
        let resp = engine.analyze(request(&[])).await;
        assert!(!resp.success);
        assert!(resp.error.is_some());
        assert!(resp.niche_recommendations.is_none());
    }

    #[tokio::test]
    async fn hydroponics_without_providers_yields_recommendations() {
        let engine = NicheEngine::offline(AnalysisOptions::default());
        let resp = engine.analyze(request(&["hydroponics"])).await;

        assert!(resp.success);
        assert!(resp.timestamp.is_some());
        let recs = resp.niche_recommendations.unwrap();
        assert!(!recs.is_empty());
        assert!(recs.len() <= DEFAULT_LIMIT);
        for rec in &recs {
            assert!(rec.monthly_search_volume > 0);
            assert!((0.0..=100.0).contains(&rec.competition_score));
            assert!((6.0..=10.0).contains(&rec.monetization_potential));
            assert!((0.0..=10.0).contains(&rec.trending_score));
            assert!(rec.estimated_cpc > 0.0);
            assert!(rec.related_keywords.len() <= 10);
            assert!(rec.top_competitors.len() <= 5);
        }
    }

    #[tokio::test]
    async fn seeded_runs_are_reproducible() {
        let engine = NicheEngine::offline(seeded_options());
        let a = engine.analyze(request(&["hydroponics", "aquaponics"])).await;
        let b = engine.analyze(request(&["aquaponics", "hydroponics"])).await;

        let names = |r: &AnalysisResponse| -> Vec<(String, f64)> {
            r.niche_recommendations
                .as_ref()
                .unwrap()
                .iter()
                .map(|n| (n.niche_name.clone(), n.monetization_potential))
                .collect()
        };
        let mut na = names(&a);
        let mut nb = names(&b);
        na.sort_by(|x, y| x.0.cmp(&y.0));
        nb.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(na, nb);
    }

    #[tokio::test]
    async fn all_keywords_failing_is_no_valid_data() {
        let engine = NicheEngine::new(
            KeywordSource::new(Some(Arc::new(DownProvider)), false, RandomSource::Entropy),
            CompetitionScorer::default(),
            TrendingScorer::default(),
            AnalysisOptions::default(),
        );
        let input = request(&["hydroponics", "garden"])
            .validate(DEFAULT_LIMIT)
            .unwrap();
        let err = engine.run(&input).await.unwrap_err();
        assert_eq!(err, AnalysisError::NoValidData);
    }

    #[tokio::test]
    async fn one_failed_keyword_is_not_fatal() {
        let engine = NicheEngine::offline(seeded_options());
        let resp = engine.analyze(request(&["hydroponics", "   "])).await;
        assert!(resp.success);
    }

    #[tokio::test]
    async fn include_keyword_data_attaches_records() {
        let engine = NicheEngine::offline(seeded_options());
        let mut req = request(&["hydroponics"]);
        req.include_keyword_data = true;
        let resp = engine.analyze(req).await;
        let data = resp.keyword_data.unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].text, "hydroponics");

        let plain = engine.analyze(request(&["hydroponics"])).await;
        assert!(plain.keyword_data.is_none());
    }

    #[tokio::test]
    async fn industry_preference_filters_candidates() {
        let engine = NicheEngine::offline(seeded_options());
        let mut req = request(&["hydroponics", "woodworking"]);
        req.preferences = Some(Preferences {
            industry: Some("woodwork".to_string()),
        });
        req.limit = Some(50);

        let recs = engine.analyze(req).await.niche_recommendations.unwrap();
        assert!(!recs.is_empty());
        assert!(recs
            .iter()
            .all(|r| r.niche_name.contains("woodwork")
                || r.related_keywords.iter().any(|k| k.contains("woodwork"))));
        assert!(recs.iter().all(|r| !r.niche_name.contains("hydroponics")));
    }

    #[tokio::test]
    async fn backlink_provider_populates_competitors_for_display() {
        let engine = NicheEngine::new(
            KeywordSource::offline(RandomSource::Seeded(3)),
            CompetitionScorer::new(Some(Arc::new(DomainsProvider))),
            TrendingScorer::new(None, RandomSource::Seeded(3)),
            AnalysisOptions::default(),
        );
        let recs = engine
            .analyze(request(&["hydroponics"]))
            .await
            .niche_recommendations
            .unwrap();
        assert!(!recs.is_empty());
        for rec in recs {
            assert_eq!(rec.top_competitors.len(), 5);
            assert_eq!(rec.top_competitors[0].estimated_traffic, 500);
        }
    }

    #[test]
    fn easier_niche_ranks_first() {
        let a = scored("a", 20.0, 8.0, 8.0);
        let b = scored("b", 80.0, 9.0, 2.0);
        let ranked = rank_niches(vec![b, a], 6.0, 5);
        assert_eq!(ranked[0].niche.name, "a");
        assert_eq!(ranked[1].niche.name, "b");
    }

    #[test]
    fn ranking_drops_low_monetization_and_truncates() {
        let input = vec![
            scored("low", 10.0, 5.99, 10.0),
            scored("a", 30.0, 7.0, 5.0),
            scored("b", 20.0, 7.0, 5.0),
            scored("c", 40.0, 7.0, 5.0),
        ];
        let ranked = rank_niches(input, 6.0, 2);
        let names: Vec<_> = ranked.iter().map(|s| s.niche.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let input = vec![
            scored("first", 30.0, 7.0, 5.0),
            scored("second", 30.0, 7.0, 5.0),
            scored("third", 30.0, 7.0, 5.0),
        ];
        let ranked = rank_niches(input, 6.0, 5);
        let names: Vec<_> = ranked.iter().map(|s| s.niche.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn candidate_generation_applies_related_keyword_rules() {
        let engine = NicheEngine::offline(seeded_options());
        let records = vec![record(
            "garden",
            100_000,
            &["garden", "kits", "Garden", "garden tools", "raised garden beds"],
        )];
        let candidates = engine.generate_candidates(&records);
        let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
        // Only an exact repeat of the source is skipped; a case variant is its own candidate.
        assert_eq!(
            names,
            vec!["garden", "Garden", "garden tools", "raised garden beds"]
        );

        for derived in &candidates[1..] {
            assert!(derived.monthly_search_volume >= 30_000);
            assert!(derived.monthly_search_volume < 100_000);
            assert!((0.4..0.6).contains(&derived.competition));
            assert!((1.6..2.4).contains(&derived.estimated_cpc));
            assert_eq!(derived.related_keywords[0], "garden");
        }
    }

    #[test]
    fn case_variant_of_source_becomes_a_candidate() {
        let engine = NicheEngine::offline(seeded_options());
        let records = vec![record("garden", 1_000_000, &["Garden"])];
        let candidates = engine.generate_candidates(&records);
        let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["garden", "Garden"]);
        assert_eq!(candidates[1].related_keywords, vec!["garden"]);
    }

    #[test]
    fn low_volume_sources_yield_no_derived_candidates() {
        let engine = NicheEngine::offline(seeded_options());
        let records = vec![record("tiny niche", 1200, &[])];
        assert_eq!(engine.generate_candidates(&records).len(), 1);

        // 900 * [0.3, 1.0) never reaches 1000.
        let records = vec![record("tiny niche", 900, &["tiny niche ideas"])];
        assert_eq!(engine.generate_candidates(&records).len(), 1);
    }

    #[tokio::test]
    async fn save_persists_ranked_niches() {
        let store = Arc::new(MemoryNicheStore::new());
        let engine = NicheEngine::offline(seeded_options()).with_store(store.clone());
        let mut req = request(&["hydroponics"]);
        req.save = true;

        let resp = engine.analyze(req).await;
        assert!(resp.success);
        let recs = resp.niche_recommendations.unwrap();
        assert_eq!(resp.saved, Some(recs.len()));
        assert_eq!(store.len().await, recs.len());
    }

    #[tokio::test]
    async fn persistence_failure_still_returns_results() {
        let engine = NicheEngine::offline(seeded_options());
        let top = engine
            .analyze(request(&["hydroponics"]))
            .await
            .niche_recommendations
            .unwrap();
        let doomed = top.last().unwrap().niche_name.clone();

        let store = Arc::new(MemoryNicheStore::failing_on(doomed));
        let engine = engine.with_store(store.clone());
        let mut req = request(&["hydroponics"]);
        req.save = true;

        let resp = engine.analyze(req).await;
        assert!(resp.success);
        assert!(resp.persistence_error.is_some());
        assert_eq!(resp.saved, None);
        assert_eq!(resp.niche_recommendations.unwrap(), top);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn save_without_store_reports_persistence_error() {
        let engine = NicheEngine::offline(seeded_options());
        let mut req = request(&["hydroponics"]);
        req.save = true;
        let resp = engine.analyze(req).await;
        assert!(resp.success);
        assert!(resp.persistence_error.is_some());
    }
}
