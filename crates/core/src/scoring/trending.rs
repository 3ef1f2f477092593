use crate::ingest::mock::char_code_sum;
use crate::ingest::provider::TrendsProvider;
use crate::random::RandomSource;
use crate::scoring::{clamp_score, TRENDING_MAX};
use rand::Rng;
use std::sync::Arc;

pub const NEUTRAL_TRENDING_SCORE: f64 = 5.0;

#[derive(Clone, Default)]
pub struct TrendingScorer {
    trends: Option<Arc<dyn TrendsProvider>>,
    random: RandomSource,
}

impl TrendingScorer {
    pub fn new(trends: Option<Arc<dyn TrendsProvider>>, random: RandomSource) -> Self {
        Self { trends, random }
    }

    pub async fn score(&self, name: &str) -> f64 {
        let Some(provider) = &self.trends else {
            return hashed_trending_score(name, &self.random);
        };

        match provider.interest_over_time(name).await {
            Ok(series) if !series.is_empty() => series_trending_score(&series),
            Ok(_) => {
                tracing::warn!(niche = name, "empty interest series; using neutral trending score");
                NEUTRAL_TRENDING_SCORE
            }
            Err(err) => {
                tracing::warn!(
                    niche = name,
                    provider = provider.provider_name(),
                    error = %err,
                    "trends provider failed; using neutral trending score"
                );
                NEUTRAL_TRENDING_SCORE
            }
        }
    }
}

/// `avg/20 + slope*20`, with the slope fitted by least squares over the point index.
pub fn series_trending_score(series: &[f64]) -> f64 {
    if series.is_empty() {
        return NEUTRAL_TRENDING_SCORE;
    }

    let avg = series.iter().sum::<f64>() / series.len() as f64;
    clamp_score(avg / 20.0 + regression_slope(series) * 20.0, 0.0, TRENDING_MAX)
}

/// Name hash scaled into [2, 8] plus a jitter in [-1, 1).
pub fn hashed_trending_score(name: &str, random: &RandomSource) -> f64 {
    let bucket = (char_code_sum(name) % 60) as f64;
    let base = 2.0 + 6.0 * (bucket / 60.0);
    let jitter = random.rng_for("trending", name).gen_range(-1.0..1.0);
    clamp_score(base + jitter, 0.0, TRENDING_MAX)
}

pub fn regression_slope(series: &[f64]) -> f64 {
    let n = series.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = series.iter().sum::<f64>() / n_f;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in series.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }

    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SeriesProvider(Result<Vec<f64>, String>);

    #[async_trait::async_trait]
    impl TrendsProvider for SeriesProvider {
        fn provider_name(&self) -> &'static str {
            "series"
        }

        async fn interest_over_time(&self, _keyword: &str) -> anyhow::Result<Vec<f64>> {
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(anyhow::anyhow!(e.clone())),
            }
        }
    }

    #[test]
    fn slope_of_linear_series() {
        assert!((regression_slope(&[1.0, 2.0, 3.0, 4.0]) - 1.0).abs() < 1e-12);
        assert_eq!(regression_slope(&[7.0]), 0.0);
        assert_eq!(regression_slope(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn flat_series_scores_by_average() {
        let score = series_trending_score(&[40.0, 40.0, 40.0]);
        assert!((score - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rising_series_is_clamped_to_ten() {
        let series: Vec<f64> = (0..12).map(|i| (i * 8) as f64).collect();
        assert_eq!(series_trending_score(&series), 10.0);
    }

    #[test]
    fn falling_series_is_clamped_to_zero() {
        let series: Vec<f64> = (0..12).map(|i| (100 - i * 8) as f64).collect();
        assert_eq!(series_trending_score(&series), 0.0);
    }

    #[test]
    fn hashed_score_stays_within_jittered_band() {
        for name in ["hydroponics", "a", "garden tools", ""] {
            let s = hashed_trending_score(name, &RandomSource::Entropy);
            assert!((1.0..9.0).contains(&s), "{name}: {s}");
        }
    }

    #[test]
    fn hashed_score_is_reproducible_when_seeded() {
        let src = RandomSource::Seeded(9);
        assert_eq!(
            hashed_trending_score("hydroponics", &src),
            hashed_trending_score("hydroponics", &src)
        );
    }

    #[tokio::test]
    async fn provider_error_is_neutral() {
        let scorer = TrendingScorer::new(
            Some(Arc::new(SeriesProvider(Err("timeout".to_string())))),
            RandomSource::Entropy,
        );
        assert_eq!(scorer.score("hydroponics").await, NEUTRAL_TRENDING_SCORE);
    }

    #[tokio::test]
    async fn provider_series_is_scored() {
        let scorer = TrendingScorer::new(
            Some(Arc::new(SeriesProvider(Ok(vec![40.0, 40.0])))),
            RandomSource::Entropy,
        );
        assert!((scorer.score("hydroponics").await - 2.0).abs() < 1e-12);
    }
}
