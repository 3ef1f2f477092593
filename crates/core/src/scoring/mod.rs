//! Weighted-sum heuristics that turn keyword signals into bounded scores.
//!
//! - Competition: 0–100, lower is easier to rank for.
//! - Monetization: 0–10, from CPC, volume and commercial-intent vocabulary.
//! - Trending: 0–10, from an interest series or a name hash.
//! - Domain names: 0–10, from length, TLD and spelling.

pub mod competition;
pub mod domain_name;
pub mod monetization;
pub mod trending;

pub use competition::CompetitionScorer;
pub use domain_name::{generate_domain_candidates, score_domain};
pub use monetization::{
    evaluate_monetization_potential, evaluate_monetization_potential_raw, monetization_breakdown,
    MonetizationBreakdown,
};
pub use trending::TrendingScorer;

pub const COMPETITION_MAX: f64 = 100.0;
pub const MONETIZATION_MAX: f64 = 10.0;
pub const TRENDING_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Candidates below this monetization score are dropped before ranking.
    pub min_monetization: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_monetization: 6.0,
        }
    }
}

impl ScoringConfig {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("NICHE_MIN_MONETIZATION") {
            if let Ok(n) = s.parse::<f64>() {
                out.min_monetization = n;
            }
        }

        out
    }
}

/// Clamp into `[lo, hi]`; NaN collapses to `lo`.
pub fn clamp_score(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        lo
    } else {
        v.clamp(lo, hi)
    }
}

/// `log10` with volumes below 1 treated as 1.
pub(crate) fn log10_floor1(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.max(1.0).log10()
    }
}
