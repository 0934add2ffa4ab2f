// Competition and opportunity scoring over a set of competitor listings.
use crate::model::{CompetitionReport, CompetitorListing, ReviewDistribution};
use crate::utils::{mean, median, round1, round2};

/// Computes descriptive market statistics plus the 0-100 competition and
/// opportunity scores.
pub struct CompetitionAnalyzer;

impl CompetitionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes a listing set. An empty set yields a fully zeroed report.
    pub fn analyze(&self, listings: &[CompetitorListing]) -> CompetitionReport {
        if listings.is_empty() {
            return CompetitionReport::default();
        }

        let total = listings.len();
        let prices: Vec<f64> = listings
            .iter()
            .filter_map(|l| l.price)
            .filter(|&p| p > 0.0)
            .collect();
        let ratings: Vec<f64> = listings.iter().filter_map(|l| l.rating).collect();
        let reviews: Vec<u32> = listings.iter().filter_map(|l| l.review_count).collect();
        let prime_count = listings.iter().filter(|l| l.is_prime).count();
        let demand_count = listings.iter().filter(|l| l.demand_signal.is_some()).count();

        let has_best_seller = listings.iter().any(|l| badge_is_best_seller(l.badge.as_deref()));
        let has_platform_choice = listings.iter().any(|l| badge_is_choice(l.badge.as_deref()));

        let price_min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let price_min = if price_min.is_finite() { price_min } else { 0.0 };
        let price_max = prices.iter().copied().fold(0.0_f64, f64::max);

        let avg_reviews = if reviews.is_empty() {
            0
        } else {
            (reviews.iter().map(|&r| r as f64).sum::<f64>() / reviews.len() as f64) as u64
        };
        let max_reviews = reviews.iter().copied().max().unwrap_or(0);

        let (suggested_min, suggested_max) = percentile_band(&prices);

        let competition_score = competition_score(
            total,
            &reviews,
            &ratings,
            has_best_seller,
            has_platform_choice,
        );
        let opportunity_score =
            opportunity_score(competition_score, avg_reviews, demand_count, total, &prices);

        CompetitionReport {
            total_competitors: total,
            price_min: round2(price_min),
            price_max: round2(price_max),
            price_median: round2(median(&prices)),
            price_mean: round2(mean(&prices)),
            avg_rating: round2(mean(&ratings)),
            avg_reviews,
            max_reviews,
            review_distribution: review_distribution(&reviews),
            prime_percentage: round1(prime_count as f64 / total as f64 * 100.0),
            has_best_seller,
            has_platform_choice,
            competition_score: round1(competition_score),
            opportunity_score: round1(opportunity_score),
            suggested_price_min: round2(suggested_min),
            suggested_price_max: round2(suggested_max),
        }
    }
}

impl Default for CompetitionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn badge_is_best_seller(badge: Option<&str>) -> bool {
    badge.is_some_and(|b| b.to_lowercase().contains("best seller"))
}

pub(crate) fn badge_is_choice(badge: Option<&str>) -> bool {
    badge.is_some_and(|b| b.to_lowercase().contains("choice"))
}

/// 0-100, higher = more competitive market.
fn competition_score(
    total: usize,
    reviews: &[u32],
    ratings: &[f64],
    has_best_seller: bool,
    has_choice: bool,
) -> f64 {
    if total == 0 {
        return 0.0;
    }

    // Factor 1: share of listings with 500+ reviews (0-40 pts).
    let established = reviews.iter().filter(|&&r| r >= 500).count();
    let f1 = established as f64 / total as f64 * 40.0;

    // Factor 2: share of rated listings at 4.0+ stars (0-25 pts).
    let high_rated = ratings.iter().filter(|&&r| r >= 4.0).count();
    let f2 = high_rated as f64 / ratings.len().max(1) as f64 * 25.0;

    // Factor 3: badge presence, additive flags (0-15 pts).
    let mut f3 = 0.0;
    if has_best_seller {
        f3 += 10.0;
    }
    if has_choice {
        f3 += 5.0;
    }

    // Factor 4: review maturity via the single max review count (0-20 pts).
    let max_rev = reviews.iter().copied().max().unwrap_or(0);
    let f4 = if max_rev >= 10_000 {
        20.0
    } else if max_rev >= 5_000 {
        15.0
    } else if max_rev >= 1_000 {
        10.0
    } else if max_rev >= 500 {
        5.0
    } else {
        0.0
    };

    (f1 + f2 + f3 + f4).clamp(0.0, 100.0)
}

/// 0-100, higher = better opening for a new entrant.
fn opportunity_score(
    competition_score: f64,
    avg_reviews: u64,
    demand_count: usize,
    total: usize,
    prices: &[f64],
) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let base = 100.0 - competition_score;

    let demand_bonus = demand_count as f64 / total as f64 * 15.0;

    // Moderate review counts mark a growing market; very mature ones do not.
    let maturity_bonus = if (50..=500).contains(&avg_reviews) {
        15.0
    } else if avg_reviews < 50 {
        10.0
    } else if avg_reviews <= 2000 {
        5.0
    } else {
        0.0
    };

    let spread_bonus = if prices.len() >= 2 {
        let spread = prices.iter().copied().fold(0.0_f64, f64::max)
            - prices.iter().copied().fold(f64::INFINITY, f64::min);
        let mean_p = mean(prices);
        if mean_p > 0.0 {
            (spread / mean_p * 10.0).min(10.0)
        } else {
            0.0
        }
    } else {
        0.0
    };

    (base * 0.6 + demand_bonus + maturity_bonus + spread_bonus).clamp(0.0, 100.0)
}

fn review_distribution(reviews: &[u32]) -> ReviewDistribution {
    let mut dist = ReviewDistribution::default();
    for &r in reviews {
        if r < 50 {
            dist.under_50 += 1;
        } else if r < 500 {
            dist.from_50_to_500 += 1;
        } else if r < 5000 {
            dist.from_500_to_5000 += 1;
        } else {
            dist.over_5000 += 1;
        }
    }
    dist
}

/// Suggested price band as the 25th/75th nearest-rank percentiles.
///
/// The index arithmetic is intentionally asymmetric (`floor(n*0.25)-1` vs
/// `floor(n*0.75)`); downstream consumers may depend on it, so it is kept
/// bit-for-bit rather than normalized to a textbook definition.
fn percentile_band(prices: &[f64]) -> (f64, f64) {
    if prices.is_empty() {
        return (0.0, 0.0);
    }
    let mut sorted = prices.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let q25_idx = ((n as f64 * 0.25) as usize).saturating_sub(1);
    let q75_idx = ((n as f64 * 0.75) as usize).min(n - 1);
    (sorted[q25_idx], sorted[q75_idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str) -> CompetitorListing {
        CompetitorListing {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// 20 listings, prices evenly spaced $10-$30, half established and
    /// high-rated, one Best Seller badge, max reviews 6000.
    fn scenario_a() -> Vec<CompetitorListing> {
        (0..20)
            .map(|i| {
                let mut l = listing(&format!("A{i}"));
                l.price = Some(10.0 + i as f64 * (20.0 / 19.0));
                l.rating = Some(if i < 10 { 4.5 } else { 3.5 });
                l.review_count = Some(if i < 10 { 600 } else { 30 });
                if i == 0 {
                    l.review_count = Some(6000);
                    l.badge = Some("Best Seller".to_string());
                }
                l
            })
            .collect()
    }

    #[test]
    fn scenario_a_competition_score_is_exact() {
        let report = CompetitionAnalyzer::new().analyze(&scenario_a());
        // f1 = 10/20*40 = 20, f2 = 10/20*25 = 12.5, f3 = 10, f4 = 15 (6000 reviews)
        assert_eq!(report.competition_score, 57.5);
    }

    #[test]
    fn empty_input_yields_zeroed_report() {
        let report = CompetitionAnalyzer::new().analyze(&[]);
        assert_eq!(report.total_competitors, 0);
        assert_eq!(report.competition_score, 0.0);
        assert_eq!(report.opportunity_score, 0.0);
        assert_eq!(report.review_distribution, ReviewDistribution::default());
        assert!(!report.has_best_seller);
    }

    #[test]
    fn scores_stay_in_range() {
        let mut listings = scenario_a();
        for l in &mut listings {
            l.review_count = Some(20_000);
            l.rating = Some(5.0);
            l.badge = Some("Best Seller, Amazon's Choice".to_string());
            l.demand_signal = Some("5K+ bought in past month".to_string());
        }
        let report = CompetitionAnalyzer::new().analyze(&listings);
        assert!((0.0..=100.0).contains(&report.competition_score));
        assert!((0.0..=100.0).contains(&report.opportunity_score));
    }

    #[test]
    fn percentile_band_uses_asymmetric_indices() {
        // 10 prices 1..=10: idx25 = max(2-1,0) = 1, idx75 = min(7, 9) = 7.
        let prices: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        assert_eq!(percentile_band(&prices), (2.0, 8.0));
        // Single price collapses to itself on both ends.
        assert_eq!(percentile_band(&[4.2]), (4.2, 4.2));
    }

    #[test]
    fn zero_prices_are_excluded_from_stats() {
        let mut a = listing("z1");
        a.price = Some(0.0);
        let mut b = listing("z2");
        b.price = Some(10.0);
        let report = CompetitionAnalyzer::new().analyze(&[a, b]);
        assert_eq!(report.price_min, 10.0);
        assert_eq!(report.price_mean, 10.0);
    }

    #[test]
    fn badge_flags_are_independent() {
        let mut a = listing("b1");
        a.badge = Some("Amazon's Choice".to_string());
        let report = CompetitionAnalyzer::new().analyze(&[a]);
        assert!(!report.has_best_seller);
        assert!(report.has_platform_choice);
    }
}
