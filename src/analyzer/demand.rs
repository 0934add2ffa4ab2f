// Market demand estimation from per-listing purchase signals.
use crate::model::{CompetitorListing, DemandReport, MarketSize, TopSeller};
use crate::utils::{mean, parse_demand, round1, round2, sample_stddev};

/// Estimates total monthly demand and revenue for the market behind a
/// listing set, with a confidence score for how much data backs it.
pub struct DemandEstimator;

impl DemandEstimator {
    pub fn new() -> Self {
        Self
    }

    /// An empty set yields the zeroed default report.
    pub fn estimate(&self, listings: &[CompetitorListing]) -> DemandReport {
        if listings.is_empty() {
            return DemandReport::default();
        }

        let mut monthly_units: Vec<u64> = Vec::new();
        let mut monthly_revenues: Vec<f64> = Vec::new();
        let mut review_counts: Vec<f64> = Vec::new();

        for listing in listings {
            let units = listing
                .demand_signal
                .as_deref()
                .and_then(parse_demand)
                .filter(|&u| u > 0);
            if let Some(units) = units {
                monthly_units.push(units);
                if let Some(price) = listing.price.filter(|&p| p > 0.0) {
                    monthly_revenues.push(price * units as f64);
                }
            }
            if let Some(reviews) = listing.review_count {
                review_counts.push(reviews as f64);
            }
        }

        let total_units: u64 = monthly_units.iter().sum();
        let total_revenue: f64 = monthly_revenues.iter().sum();
        let sellers_with_data = monthly_revenues.len();
        let avg_revenue = if sellers_with_data > 0 {
            total_revenue / sellers_with_data as f64
        } else {
            0.0
        };

        DemandReport {
            total_monthly_units: total_units,
            total_monthly_revenue: round2(total_revenue),
            avg_monthly_revenue_per_seller: round2(avg_revenue),
            sellers_with_demand_data: sellers_with_data,
            market_size_category: categorize_market(total_revenue, total_units),
            demand_confidence: round1(confidence(listings, &monthly_units, &monthly_revenues)),
            // Assumes a ~12 month average listing age; a stated heuristic.
            review_velocity_avg: round1(mean(&review_counts) / 12.0),
            top_sellers: top_sellers(listings, 5),
        }
    }
}

impl Default for DemandEstimator {
    fn default() -> Self {
        Self::new()
    }
}

fn categorize_market(total_revenue: f64, total_units: u64) -> MarketSize {
    if total_revenue >= 500_000.0 || total_units >= 50_000 {
        MarketSize::Large
    } else if total_revenue >= 50_000.0 || total_units >= 5_000 {
        MarketSize::Medium
    } else {
        MarketSize::Small
    }
}

/// 0-100 confidence in the demand totals, from coverage, sample size and
/// revenue consistency.
fn confidence(listings: &[CompetitorListing], units: &[u64], revenues: &[f64]) -> f64 {
    let total = listings.len();
    if total == 0 {
        return 0.0;
    }

    let mut score = 0.0;

    // Factor 1: demand-data coverage (0-40 pts).
    score += units.len() as f64 / total as f64 * 40.0;

    // Factor 2: price-data coverage (0-25 pts).
    let priced = listings
        .iter()
        .filter(|l| l.price.is_some_and(|p| p > 0.0))
        .count();
    score += priced as f64 / total as f64 * 25.0;

    // Factor 3: sample size (0-20 pts).
    score += if total >= 20 {
        20.0
    } else if total >= 10 {
        15.0
    } else if total >= 5 {
        10.0
    } else {
        total as f64 * 2.0
    };

    // Factor 4: revenue consistency via coefficient of variation (0-15 pts).
    if revenues.len() >= 3 {
        let m = mean(revenues);
        let cv = if m > 0.0 { sample_stddev(revenues) / m } else { 0.0 };
        score += if cv < 1.0 {
            15.0
        } else if cv < 2.0 {
            10.0
        } else {
            5.0
        };
    } else if !revenues.is_empty() {
        score += 5.0;
    }

    score.min(100.0)
}

/// Top `limit` listings by estimated monthly revenue, descending.
fn top_sellers(listings: &[CompetitorListing], limit: usize) -> Vec<TopSeller> {
    let mut scored: Vec<TopSeller> = listings
        .iter()
        .filter_map(|l| {
            let units = l
                .demand_signal
                .as_deref()
                .and_then(parse_demand)
                .filter(|&u| u > 0)?;
            let price = l.price.filter(|&p| p > 0.0)?;
            let title: String = l.title.clone().unwrap_or_default().chars().take(80).collect();
            Some(TopSeller {
                id: l.id.clone(),
                title,
                price: round2(price),
                monthly_units: units,
                estimated_monthly_revenue: round2(price * units as f64),
            })
        })
        .collect();
    scored.sort_by(|a, b| b.estimated_monthly_revenue.total_cmp(&a.estimated_monthly_revenue));
    scored.truncate(limit);
    scored
}
