use crate::domain::niche::CandidateNiche;
use crate::scoring::{clamp_score, log10_floor1, MONETIZATION_MAX};

/// Purchase-related vocabulary. Matching is case-sensitive.
pub const COMMERCIAL_TERMS: [&str; 10] = [
    "buy",
    "price",
    "review",
    "best",
    "top",
    "vs",
    "cheap",
    "affordable",
    "deal",
    "sale",
];

/// Points per dollar of CPC.
const CPC_WEIGHT: f64 = 2.0;
const CPC_FACTOR_MAX: f64 = 5.0;
/// Volumes below 10^VOLUME_OFFSET contribute negatively.
const VOLUME_OFFSET: f64 = 2.0;
const VOLUME_FACTOR_MAX: f64 = 3.0;
const COMMERCIAL_TERM_WEIGHT: f64 = 0.2;
const COMMERCIAL_FACTOR_MAX: f64 = 2.0;

/// Per-signal contributions to the monetization score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonetizationBreakdown {
    pub cpc_factor: f64,
    pub volume_factor: f64,
    pub commercial_factor: f64,
}

impl MonetizationBreakdown {
    /// Sum of the factors, capped at 10 but not floored.
    pub fn total(&self) -> f64 {
        (self.cpc_factor + self.volume_factor + self.commercial_factor).min(MONETIZATION_MAX)
    }
}

pub fn monetization_breakdown(niche: &CandidateNiche) -> MonetizationBreakdown {
    MonetizationBreakdown {
        cpc_factor: (niche.estimated_cpc * CPC_WEIGHT).min(CPC_FACTOR_MAX),
        volume_factor: (log10_floor1(niche.monthly_search_volume as f64) - VOLUME_OFFSET)
            .min(VOLUME_FACTOR_MAX),
        commercial_factor: commercial_intent_factor(niche),
    }
}

/// Capped at 10 but not floored; tiny volumes with no other signal go below 0.
pub fn evaluate_monetization_potential_raw(niche: &CandidateNiche) -> f64 {
    monetization_breakdown(niche).total()
}

/// The raw score floored at 0. This is what ranking and the minimum-monetization filter see.
pub fn evaluate_monetization_potential(niche: &CandidateNiche) -> f64 {
    clamp_score(evaluate_monetization_potential_raw(niche), 0.0, MONETIZATION_MAX)
}

/// +0.2 per distinct term found in the name or any related keyword, capped at 2.
pub fn commercial_intent_factor(niche: &CandidateNiche) -> f64 {
    let matched = COMMERCIAL_TERMS
        .iter()
        .filter(|term| niche.mentions(term))
        .count();
    (matched as f64 * COMMERCIAL_TERM_WEIGHT).min(COMMERCIAL_FACTOR_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn niche(volume: u64, cpc: f64, name: &str, related: &[&str]) -> CandidateNiche {
        CandidateNiche {
            name: name.to_string(),
            monthly_search_volume: volume,
            competition: 0.5,
            estimated_cpc: cpc,
            related_keywords: related.iter().map(|s| s.to_string()).collect(),
            top_competitors: Vec::new(),
        }
    }

    #[test]
    fn combines_cpc_volume_and_intent() {
        // cpc 1.5 -> 3.0, volume 10_000 -> 2.0, "best" + "review" -> 0.4
        let n = niche(10_000, 1.5, "best grow lights", &["grow light review"]);
        let score = evaluate_monetization_potential_raw(&n);
        assert!((score - 5.4).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn breakdown_reports_each_factor() {
        let n = niche(1_000_000, 4.0, "buy tents", &["tent price"]);
        let b = monetization_breakdown(&n);
        assert_eq!(b.cpc_factor, CPC_FACTOR_MAX);
        assert_eq!(b.volume_factor, VOLUME_FACTOR_MAX);
        assert!((b.commercial_factor - 0.4).abs() < 1e-9);
        assert!((b.total() - 8.4).abs() < 1e-9);
        assert_eq!(b.total(), evaluate_monetization_potential_raw(&n));
    }

    #[test]
    fn each_term_counts_once_across_keywords() {
        let n = niche(100, 0.0, "best tents", &["best lights", "best fans"]);
        assert!((commercial_intent_factor(&n) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn intent_matching_is_case_sensitive() {
        let n = niche(100, 0.0, "BEST tents", &["Cheap fans"]);
        assert_eq!(commercial_intent_factor(&n), 0.0);
    }

    #[test]
    fn commercial_factor_caps_at_two() {
        let all = COMMERCIAL_TERMS.join(" ");
        let n = niche(100, 0.0, &all, &[]);
        assert!((commercial_intent_factor(&n) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn caps_at_ten() {
        let all = COMMERCIAL_TERMS.join(" ");
        let n = niche(10_000_000, 50.0, &all, &[]);
        assert_eq!(evaluate_monetization_potential_raw(&n), 10.0);
    }

    #[test]
    fn raw_score_goes_negative_for_tiny_volume() {
        let n = niche(10, 0.0, "obscure hobby", &[]);
        let raw = evaluate_monetization_potential_raw(&n);
        assert!((raw - -1.0).abs() < 1e-9, "got {raw}");
    }

    #[test]
    fn clamped_score_floors_what_raw_leaves_negative() {
        let n = niche(0, 0.0, "obscure hobby", &[]);
        assert!((evaluate_monetization_potential_raw(&n) - -2.0).abs() < 1e-9);
        assert_eq!(evaluate_monetization_potential(&n), 0.0);
    }

    #[test]
    fn is_pure() {
        let n = niche(25_000, 2.4, "hydroponics", &["best hydroponics kit"]);
        let first = evaluate_monetization_potential(&n);
        for _ in 0..10 {
            assert_eq!(evaluate_monetization_potential(&n.clone()), first);
        }
    }
}
