// Viability aggregation: six weighted dimensions, composite score, verdict.
use std::collections::BTreeMap;

use chrono::Utc;

use crate::analyzer::brand_moat::compute_brand_concentration;
use crate::analyzer::competition::{badge_is_best_seller, badge_is_choice};
use crate::model::{
    CompetitorListing, ConcentrationLevel, DimensionScore, ScoreResult, Verdict,
};
use crate::utils::{mean, parse_demand, round1, sample_stddev};

/// Dimension weights; must sum to exactly 1.0.
const WEIGHTS: [(&str, f64); 6] = [
    ("demand", 0.25),
    ("competition", 0.25),
    ("profitability", 0.25),
    ("market_quality", 0.10),
    ("differentiation", 0.05),
    ("brand_moat", 0.10),
];

const EMPTY_RECOMMENDATION: &str = "Insufficient data to score.";

/// Combines the sub-analyses into one composite 0-10 score and a verdict.
pub struct ViabilityScorer;

impl ViabilityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Empty input yields composite 0.0, NO GO and an empty dimension map.
    pub fn calculate(
        &self,
        listings: &[CompetitorListing],
        reference_cost: Option<f64>,
    ) -> ScoreResult {
        if listings.is_empty() {
            return ScoreResult {
                composite: 0.0,
                verdict: Verdict::NoGo,
                dimensions: BTreeMap::new(),
                recommendation: EMPTY_RECOMMENDATION.to_string(),
                analyzed_at: Utc::now(),
            };
        }

        let scores: [(&str, (u8, String)); 6] = [
            ("demand", score_demand(listings)),
            ("competition", score_competition(listings)),
            ("profitability", score_profitability(listings, reference_cost)),
            ("market_quality", score_market_quality(listings)),
            ("differentiation", score_differentiation(listings)),
            ("brand_moat", score_brand_moat(listings)),
        ];

        let mut dimensions = BTreeMap::new();
        let mut composite = 0.0;
        for ((name, (score, details)), (_, weight)) in scores.into_iter().zip(WEIGHTS) {
            composite += score as f64 * weight;
            dimensions.insert(
                name.to_string(),
                DimensionScore {
                    score,
                    weight,
                    details,
                },
            );
        }
        let composite = round1(composite);

        ScoreResult {
            composite,
            verdict: verdict_for(composite),
            recommendation: build_recommendation(composite, &dimensions),
            dimensions,
            analyzed_at: Utc::now(),
        }
    }
}

impl Default for ViabilityScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn verdict_for(composite: f64) -> Verdict {
    if composite >= 8.0 {
        Verdict::StrongGo
    } else if composite >= 6.0 {
        Verdict::ConditionalGo
    } else if composite >= 4.0 {
        Verdict::Caution
    } else {
        Verdict::NoGo
    }
}

// ---------------------------------------------------------------------------
// Dimension scorers: each returns (score 1-10, details)
// ---------------------------------------------------------------------------

fn score_demand(listings: &[CompetitorListing]) -> (u8, String) {
    let total = listings.len();
    let bought: Vec<f64> = listings
        .iter()
        .filter_map(|l| l.demand_signal.as_deref().and_then(parse_demand))
        .filter(|&u| u > 0)
        .map(|u| u as f64)
        .collect();
    let prices: Vec<f64> = listings
        .iter()
        .filter_map(|l| l.price)
        .filter(|&p| p > 0.0)
        .collect();
    let avg_price = mean(&prices);
    let bought_ratio = bought.len() as f64 / total.max(1) as f64;
    let avg_bought = mean(&bought);

    let mut score: i32 = 1;
    let mut details = Vec::new();

    if total >= 15 {
        score += 2;
        details.push(format!("{total} competitors (proven market)"));
    } else if total >= 8 {
        score += 1;
        details.push(format!("{total} competitors"));
    } else {
        details.push(format!("Only {total} competitors"));
    }

    if bought_ratio >= 0.5 && avg_bought >= 100.0 {
        score += 4;
        details.push(format!("{} with sales data, avg {avg_bought:.0}/mo", bought.len()));
    } else if bought_ratio >= 0.3 && avg_bought >= 50.0 {
        score += 3;
        details.push(format!("{} with sales data", bought.len()));
    } else if bought_ratio >= 0.1 {
        score += 2;
        details.push("Some demand signals".to_string());
    } else {
        details.push("Limited demand data".to_string());
    }

    if avg_price >= 25.0 {
        score += 2;
        details.push(format!("Avg ${avg_price:.0} (healthy market)"));
    } else if avg_price >= 12.0 {
        score += 1;
        details.push(format!("Avg ${avg_price:.0}"));
    }

    (clamp_score(score), details.join("; "))
}

/// High competition maps to a LOW score.
fn score_competition(listings: &[CompetitorListing]) -> (u8, String) {
    let total = listings.len();
    if total == 0 {
        return (5, "No data".to_string());
    }

    let reviews: Vec<u32> = listings.iter().map(|l| l.review_count.unwrap_or(0)).collect();
    let mut top = reviews.clone();
    top.sort_unstable_by(|a, b| b.cmp(a));
    top.truncate(10);
    let avg_top = mean(&top.iter().map(|&r| r as f64).collect::<Vec<_>>());

    let has_best_seller = listings.iter().any(|l| badge_is_best_seller(l.badge.as_deref()));
    let has_choice = listings.iter().any(|l| badge_is_choice(l.badge.as_deref()));
    let established_pct =
        reviews.iter().filter(|&&r| r >= 500).count() as f64 / total as f64;

    let mut score: i32 = 10;
    let mut details = Vec::new();

    if avg_top >= 5000.0 {
        score -= 4;
        details.push(format!("Top 10 avg {avg_top:.0} reviews (very established)"));
    } else if avg_top >= 2000.0 {
        score -= 3;
        details.push(format!("Top 10 avg {avg_top:.0} reviews (established)"));
    } else if avg_top >= 500.0 {
        score -= 2;
        details.push(format!("Top 10 avg {avg_top:.0} reviews"));
    } else {
        details.push(format!("Top 10 avg {avg_top:.0} reviews (low barrier)"));
    }

    if has_best_seller && has_choice {
        score -= 2;
        details.push("Best Seller + platform Choice present".to_string());
    } else if has_best_seller || has_choice {
        score -= 1;
        let badge_name = if has_best_seller { "Best Seller" } else { "Platform Choice" };
        details.push(format!("{badge_name} present"));
    }

    if established_pct >= 0.5 {
        score -= 2;
        details.push(format!("{:.0}% have 500+ reviews", established_pct * 100.0));
    } else if established_pct >= 0.25 {
        score -= 1;
        details.push(format!("{:.0}% have 500+ reviews", established_pct * 100.0));
    }

    (clamp_score(score), details.join("; "))
}

fn score_profitability(
    listings: &[CompetitorListing],
    reference_cost: Option<f64>,
) -> (u8, String) {
    let prices: Vec<f64> = listings
        .iter()
        .filter_map(|l| l.price)
        .filter(|&p| p > 0.0)
        .collect();
    if prices.is_empty() {
        return (5, "No price data".to_string());
    }
    let avg_price = mean(&prices);

    let Some(cost) = reference_cost.filter(|&c| c > 0.0) else {
        return (
            5,
            format!("No reference cost; avg market price ${avg_price:.2} (neutral)"),
        );
    };

    // Assumed marketplace economics: ~15% referral fee plus flat fulfillment.
    let fees = avg_price * 0.15 + 4.0;
    let net = avg_price - fees - cost;
    let margin_pct = if avg_price > 0.0 { net / avg_price * 100.0 } else { 0.0 };

    let details = format!(
        "Est. margin {margin_pct:.0}% (avg ${avg_price:.2} - cost ${cost:.2} - fees ${fees:.2})"
    );

    let score = if margin_pct > 50.0 {
        10
    } else if margin_pct > 40.0 {
        9
    } else if margin_pct > 30.0 {
        8
    } else if margin_pct > 20.0 {
        6
    } else if margin_pct > 10.0 {
        4
    } else if margin_pct > 0.0 {
        2
    } else {
        1
    };
    (score, details)
}

fn score_market_quality(listings: &[CompetitorListing]) -> (u8, String) {
    let total = listings.len();
    let prices: Vec<f64> = listings
        .iter()
        .filter_map(|l| l.price)
        .filter(|&p| p > 0.0)
        .collect();
    if prices.is_empty() || total == 0 {
        return (5, "Insufficient data".to_string());
    }

    let price_min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let price_max = prices.iter().copied().fold(0.0_f64, f64::max);
    let price_mean = mean(&prices);
    let coeff_var = if prices.len() >= 2 && price_mean > 0.0 {
        sample_stddev(&prices) / price_mean
    } else {
        0.0
    };
    let prime_pct = listings.iter().filter(|l| l.is_prime).count() as f64 / total as f64;

    let mut score: i32 = 5;
    let mut details = Vec::new();

    if coeff_var >= 0.5 {
        score += 2;
        details.push(format!("Wide price spread (${price_min:.0}-${price_max:.0})"));
    } else if coeff_var >= 0.25 {
        score += 1;
        details.push(format!("Moderate spread (${price_min:.0}-${price_max:.0})"));
    } else {
        score -= 1;
        details.push(format!("Narrow spread (${price_min:.0}-${price_max:.0})"));
    }

    if prime_pct > 0.8 {
        score -= 1;
        details.push(format!("{:.0}% Prime (very mature)", prime_pct * 100.0));
    } else if prime_pct >= 0.4 {
        score += 1;
        details.push(format!("{:.0}% Prime (healthy)", prime_pct * 100.0));
    } else {
        details.push(format!("{:.0}% Prime", prime_pct * 100.0));
    }

    if total >= 15 && coeff_var >= 0.3 {
        score += 1;
        details.push("Diverse market".to_string());
    }

    (clamp_score(score), details.join("; "))
}

/// Rewards quality gaps a new listing could exploit.
fn score_differentiation(listings: &[CompetitorListing]) -> (u8, String) {
    let total = listings.len();
    if total == 0 {
        return (5, "No data".to_string());
    }

    let ratings: Vec<f64> = listings.iter().filter_map(|l| l.rating).collect();
    let avg_rating = mean(&ratings);

    let mut score: i32 = 5;
    let mut details = Vec::new();

    if avg_rating < 3.5 {
        score += 3;
        details.push(format!("Avg rating {avg_rating:.1} (high dissatisfaction)"));
    } else if avg_rating < 4.0 {
        score += 2;
        details.push(format!("Avg rating {avg_rating:.1} (some dissatisfaction)"));
    } else if avg_rating < 4.3 {
        score += 1;
        details.push(format!("Avg rating {avg_rating:.1}"));
    } else {
        details.push(format!("Avg rating {avg_rating:.1} (well-served)"));
    }

    // Few reviews but decent rating: new or weakly marketed, beatable.
    let weak = listings
        .iter()
        .filter(|l| l.review_count.unwrap_or(0) < 50 && l.rating.unwrap_or(0.0) >= 3.5)
        .count();
    let weak_pct = weak as f64 / total as f64;
    if weak_pct >= 0.3 {
        score += 2;
        details.push(format!("{weak} weak listings ({:.0}%)", weak_pct * 100.0));
    } else if weak_pct >= 0.15 {
        score += 1;
        details.push(format!("{weak} weak listings"));
    }

    let low_review_in_top = listings
        .iter()
        .filter(|l| l.position.unwrap_or(99) <= 10 && l.review_count.unwrap_or(0) < 100)
        .count();
    if low_review_in_top >= 3 {
        score += 1;
        details.push(format!("{low_review_in_top} low-review products in top 10"));
    }

    (clamp_score(score), details.join("; "))
}

fn score_brand_moat(listings: &[CompetitorListing]) -> (u8, String) {
    if listings.is_empty() {
        return (5, "No data".to_string());
    }
    let conc = compute_brand_concentration(listings);

    // Half-values round to even so a 65 moat maps to 6, not 7.
    let score = ((conc.brand_moat_score as f64 / 10.0).round_ties_even() as i32).clamp(1, 10) as u8;

    let level = match conc.concentration_level {
        ConcentrationLevel::Low => "low",
        ConcentrationLevel::Medium => "medium",
        ConcentrationLevel::High => "high",
    };
    let mut details = vec![format!("HHI {:.0} ({level} concentration)", conc.hhi)];
    if conc.has_platform_first_party {
        details.push(format!(
            "Platform first-party present ({})",
            conc.platform_first_party_count
        ));
    }
    if conc.low_cost_commodity_count > 0 {
        details.push(format!("{} low-cost commodity sellers", conc.low_cost_commodity_count));
    }
    if conc.private_label_count > 0 {
        details.push(format!("{} private labels", conc.private_label_count));
    }

    (score, details.join("; "))
}

fn clamp_score(score: i32) -> u8 {
    score.clamp(1, 10) as u8
}

// ---------------------------------------------------------------------------
// Recommendation text
// ---------------------------------------------------------------------------

fn dim_label(name: &str) -> &'static str {
    match name {
        "demand" => "demand",
        "competition" => "competition level",
        "profitability" => "profitability",
        "market_quality" => "market quality",
        "differentiation" => "differentiation opportunity",
        "brand_moat" => "brand moat",
        _ => "overall",
    }
}

fn build_recommendation(composite: f64, dimensions: &BTreeMap<String, DimensionScore>) -> String {
    // Ties resolve in declared dimension order: first max, last min.
    let mut strongest: Option<(&str, u8)> = None;
    let mut weakest: Option<(&str, u8)> = None;
    for (name, _) in WEIGHTS {
        let score = dimensions[name].score;
        if strongest.is_none_or(|(_, s)| score > s) {
            strongest = Some((name, score));
        }
        if weakest.is_none_or(|(_, w)| score <= w) {
            weakest = Some((name, score));
        }
    }
    let (strong_name, strong_score) = strongest.unwrap_or(("overall", 5));
    let (weak_name, weak_score) = weakest.unwrap_or(("overall", 5));

    if composite >= 8.0 {
        format!(
            "Strong opportunity. Best dimension: {} ({strong_score}/10). Consider fast market entry.",
            dim_label(strong_name)
        )
    } else if composite >= 6.0 {
        format!(
            "Promising product with good {} ({strong_score}/10). Watch {} ({weak_score}/10) closely.",
            dim_label(strong_name),
            dim_label(weak_name)
        )
    } else if composite >= 4.0 {
        format!(
            "Proceed with caution. {} is concerning ({weak_score}/10). Strongest aspect: {} ({strong_score}/10).",
            capitalize(dim_label(weak_name)),
            dim_label(strong_name)
        )
    } else {
        format!(
            "Not recommended. Key issue: {} ({weak_score}/10). Consider alternative products.",
            dim_label(weak_name)
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(n: usize) -> Vec<CompetitorListing> {
        (0..n)
            .map(|i| CompetitorListing {
                id: format!("v{i}"),
                title: Some(format!("Listing {i}")),
                price: Some(15.0 + i as f64),
                rating: Some(3.8 + (i % 10) as f64 / 10.0),
                review_count: Some((i as u32) * 120),
                demand_signal: if i % 2 == 0 {
                    Some("200+ bought in past month".to_string())
                } else {
                    None
                },
                is_prime: i % 2 == 0,
                position: Some(i as u32 + 1),
                brand: Some(format!("Brand{}", i % 5)),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn weights_sum_to_one() {
        let sum: f64 = WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_yields_no_go() {
        let result = ViabilityScorer::new().calculate(&[], None);
        assert_eq!(result.composite, 0.0);
        assert_eq!(result.verdict, Verdict::NoGo);
        assert!(result.dimensions.is_empty());
        assert_eq!(result.recommendation, EMPTY_RECOMMENDATION);
    }

    #[test]
    fn composite_is_weighted_sum_of_dimensions() {
        let result = ViabilityScorer::new().calculate(&market(20), Some(5.0));
        let expected: f64 = result
            .dimensions
            .values()
            .map(|d| d.score as f64 * d.weight)
            .sum();
        assert_eq!(result.composite, round1(expected));
        assert!((0.0..=10.0).contains(&result.composite));
        assert_eq!(result.dimensions.len(), 6);
        for d in result.dimensions.values() {
            assert!((1..=10).contains(&d.score));
        }
    }

    #[test]
    fn reference_cost_moves_only_profitability() {
        let listings = market(20);
        let scorer = ViabilityScorer::new();
        let without = scorer.calculate(&listings, None);
        let with = scorer.calculate(&listings, Some(3.0));

        for (name, _) in WEIGHTS {
            if name == "profitability" {
                continue;
            }
            assert_eq!(
                without.dimensions[name].score, with.dimensions[name].score,
                "{name} changed with reference_cost"
            );
        }
        assert_eq!(without.dimensions["profitability"].score, 5);
        assert_ne!(
            without.dimensions["profitability"].details,
            with.dimensions["profitability"].details
        );
    }

    #[test]
    fn verdict_thresholds() {
        assert_eq!(verdict_for(8.0), Verdict::StrongGo);
        assert_eq!(verdict_for(7.9), Verdict::ConditionalGo);
        assert_eq!(verdict_for(6.0), Verdict::ConditionalGo);
        assert_eq!(verdict_for(4.0), Verdict::Caution);
        assert_eq!(verdict_for(3.9), Verdict::NoGo);
    }

    #[test]
    fn recommendation_names_strongest_and_weakest() {
        let result = ViabilityScorer::new().calculate(&market(20), Some(5.0));
        let strongest = result
            .dimensions
            .values()
            .map(|d| d.score)
            .max()
            .unwrap();
        let has_label = WEIGHTS.iter().any(|(name, _)| {
            result.dimensions[*name].score == strongest
                && result.recommendation.contains(dim_label(name))
        });
        assert!(has_label, "recommendation: {}", result.recommendation);
    }

    #[test]
    fn profitability_bands_track_margin() {
        let cheap_market: Vec<CompetitorListing> = (0..5)
            .map(|i| CompetitorListing {
                id: format!("p{i}"),
                price: Some(100.0),
                ..Default::default()
            })
            .collect();
        // avg 100, fees 19, cost 10 -> net 71 -> 71% margin -> 10.
        let (score, _) = score_profitability(&cheap_market, Some(10.0));
        assert_eq!(score, 10);
        // cost 80 -> net 1 -> 1% margin -> 2.
        let (score, _) = score_profitability(&cheap_market, Some(80.0));
        assert_eq!(score, 2);
        // cost 95 -> negative margin -> 1.
        let (score, _) = score_profitability(&cheap_market, Some(95.0));
        assert_eq!(score, 1);
        // No cost: neutral with explanation.
        let (score, details) = score_profitability(&cheap_market, None);
        assert_eq!(score, 5);
        assert!(details.contains("No reference cost"));
    }

    #[test]
    fn brand_moat_dimension_rounds_half_to_even() {
        // Ten equal-revenue established brands: HHI 1000 -> moat 65.
        // 6.5 must round down to 6, matching the reference behavior.
        let listings: Vec<CompetitorListing> = (0..10)
            .map(|i| CompetitorListing {
                id: format!("e{i}"),
                brand: Some(format!("Vendor{i} Inc")),
                price: Some(10.0),
                position: Some(1),
                ..Default::default()
            })
            .collect();
        let (score, details) = score_brand_moat(&listings);
        assert_eq!(score, 6);
        assert!(details.contains("HHI 1000"));
    }

    #[test]
    fn all_null_fields_never_panic() {
        let bare: Vec<CompetitorListing> = (0..3)
            .map(|i| CompetitorListing {
                id: format!("n{i}"),
                ..Default::default()
            })
            .collect();
        let result = ViabilityScorer::new().calculate(&bare, None);
        assert!((0.0..=10.0).contains(&result.composite));
        assert_eq!(result.dimensions.len(), 6);
    }
}
