// Pricing strategy recommendations: percentile anchors, price clustering,
// demand-weighted unit estimates and price-gap detection.
use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::model::{CompetitorListing, PriceGap, PriceStrategy, PriceSummary, PricingReport, StrategyTier};
use crate::utils::{median, parse_demand, percentile_linear, round1, round2};

/// Partitions a sorted price list into up to `k` cluster centers.
/// Returns `None` when the algorithm cannot produce a stable result.
pub trait PriceClusterer {
    fn cluster(&self, sorted_prices: &[f64], k: usize) -> Option<Vec<f64>>;
}

/// 1-D k-means with k-means++ seeding. Fully deterministic: every restart
/// uses a fixed seed derived from the restart index.
pub struct KMeansClusterer {
    seed: u64,
    restarts: u32,
    max_iters: u32,
}

impl KMeansClusterer {
    pub fn new() -> Self {
        Self {
            seed: 42,
            restarts: 10,
            max_iters: 100,
        }
    }

    /// One seeded run. Returns converged centers and their inertia.
    fn run(&self, prices: &[f64], k: usize, seed: u64) -> Option<(Vec<f64>, f64)> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centers = Vec::with_capacity(k);
        centers.push(prices[rng.random_range(0..prices.len())]);

        // k-means++: next center drawn proportionally to squared distance.
        while centers.len() < k {
            let d2: Vec<f64> = prices
                .iter()
                .map(|p| {
                    centers
                        .iter()
                        .map(|c| (p - c).powi(2))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();
            let total: f64 = d2.iter().sum();
            if total <= 0.0 {
                // Every point already coincides with a center.
                centers.push(prices[rng.random_range(0..prices.len())]);
                continue;
            }
            let mut target = rng.random::<f64>() * total;
            let mut chosen = prices[prices.len() - 1];
            for (p, w) in prices.iter().zip(&d2) {
                target -= w;
                if target <= 0.0 {
                    chosen = *p;
                    break;
                }
            }
            centers.push(chosen);
        }

        for _ in 0..self.max_iters {
            let mut sums = vec![0.0_f64; k];
            let mut counts = vec![0_usize; k];
            for &p in prices {
                let nearest = nearest_center(&centers, p);
                sums[nearest] += p;
                counts[nearest] += 1;
            }
            let mut shift = 0.0_f64;
            for i in 0..k {
                if counts[i] > 0 {
                    let updated = sums[i] / counts[i] as f64;
                    shift = shift.max((updated - centers[i]).abs());
                    centers[i] = updated;
                }
            }
            if shift < 1e-6 {
                let inertia = prices
                    .iter()
                    .map(|&p| (p - centers[nearest_center(&centers, p)]).powi(2))
                    .sum();
                return Some((centers, inertia));
            }
        }
        None
    }
}

impl Default for KMeansClusterer {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceClusterer for KMeansClusterer {
    fn cluster(&self, sorted_prices: &[f64], k: usize) -> Option<Vec<f64>> {
        if sorted_prices.is_empty() || k == 0 {
            return None;
        }
        let k = k.min(sorted_prices.len());
        let mut best: Option<(Vec<f64>, f64)> = None;
        for restart in 0..self.restarts {
            if let Some((centers, inertia)) = self.run(sorted_prices, k, self.seed + restart as u64)
            {
                let better = best.as_ref().is_none_or(|(_, b)| inertia < *b);
                if better {
                    best = Some((centers, inertia));
                }
            }
        }
        best.map(|(mut centers, _)| {
            centers.sort_by(|a, b| a.total_cmp(b));
            centers
        })
    }
}

/// Deterministic fallback: means of the three tercile groups of the sorted
/// price list. Always succeeds.
pub struct TercileClusterer;

impl PriceClusterer for TercileClusterer {
    fn cluster(&self, sorted_prices: &[f64], _k: usize) -> Option<Vec<f64>> {
        if sorted_prices.is_empty() {
            return None;
        }
        let third = sorted_prices.len() / 3;
        if third == 0 {
            return Some(vec![crate::utils::mean(sorted_prices)]);
        }
        Some(vec![
            crate::utils::mean(&sorted_prices[..third]),
            crate::utils::mean(&sorted_prices[third..2 * third]),
            crate::utils::mean(&sorted_prices[2 * third..]),
        ])
    }
}

/// Recommends entry pricing for a new listing against observed competitors.
pub struct PriceRecommender {
    primary: Box<dyn PriceClusterer>,
    fallback: Box<dyn PriceClusterer>,
}

impl PriceRecommender {
    pub fn new() -> Self {
        Self {
            primary: Box::new(KMeansClusterer::new()),
            fallback: Box::new(TercileClusterer),
        }
    }

    /// Builds the three tier strategies plus clusters, gaps and summary stats.
    /// Zero priced listings yield an empty default report.
    pub fn recommend(
        &self,
        listings: &[CompetitorListing],
        reference_cost: Option<f64>,
    ) -> PricingReport {
        let mut prices: Vec<f64> = listings
            .iter()
            .filter_map(|l| l.price)
            .filter(|&p| p > 0.0)
            .collect();
        if prices.is_empty() {
            return PricingReport::default();
        }
        prices.sort_by(|a, b| a.total_cmp(b));
        let n = prices.len();

        let p10 = percentile_linear(&prices, 10.0);
        let p25 = percentile_linear(&prices, 25.0);
        let p50 = percentile_linear(&prices, 50.0);
        let p75 = percentile_linear(&prices, 75.0);
        let p90 = percentile_linear(&prices, 90.0);

        let clusters = self.compute_clusters(&prices);

        let demand_pairs: Vec<(f64, u64)> = listings
            .iter()
            .filter_map(|l| {
                let price = l.price.filter(|&p| p > 0.0)?;
                let units = parse_demand(l.demand_signal.as_deref()?)?;
                Some((price, units))
            })
            .collect();

        let mut strategies = BTreeMap::new();
        for (tier, price, rationale) in [
            (
                StrategyTier::Budget,
                p25,
                format!(
                    "Undercut 75% of the market. Positioned at the 25th percentile (${p25:.2}) to attract price-sensitive buyers."
                ),
            ),
            (
                StrategyTier::Competitive,
                p50,
                format!(
                    "Match the median market price (${p50:.2}). Balanced positioning to compete on value and features."
                ),
            ),
            (
                StrategyTier::Premium,
                p75,
                format!(
                    "Position as premium at the 75th percentile (${p75:.2}). Target quality-focused buyers willing to pay more."
                ),
            ),
        ] {
            let units = estimate_units_at_price(price, &demand_pairs);
            let mut strategy = PriceStrategy {
                price: round2(price),
                rationale,
                estimated_monthly_units: units,
                estimated_monthly_revenue: round2(price * units as f64),
                margin_pct: None,
                profit_per_unit: None,
            };
            if let Some(cost) = reference_cost.filter(|&c| c > 0.0) {
                if strategy.price > 0.0 {
                    strategy.margin_pct =
                        Some(round1((strategy.price - cost) / strategy.price * 100.0));
                }
                strategy.profit_per_unit = Some(round2(strategy.price - cost));
            }
            strategies.insert(tier, strategy);
        }

        PricingReport {
            strategies,
            price_clusters: clusters,
            price_gap_opportunities: find_price_gaps(&prices),
            summary_stats: PriceSummary {
                p10: round2(p10),
                p25: round2(p25),
                p50: round2(p50),
                p75: round2(p75),
                p90: round2(p90),
                min: round2(prices[0]),
                max: round2(prices[n - 1]),
                count: n,
            },
        }
    }

    /// Up to three ascending cluster centers. Fewer than three prices are
    /// their own centers; a non-converging primary routes to the fallback.
    fn compute_clusters(&self, sorted_prices: &[f64]) -> Vec<f64> {
        if sorted_prices.len() < 3 {
            return sorted_prices.iter().map(|&p| round2(p)).collect();
        }
        let k = 3.min(sorted_prices.len());
        let centers = match self.primary.cluster(sorted_prices, k) {
            Some(centers) => centers,
            None => {
                warn!("Price clustering did not converge; using tercile means");
                self.fallback
                    .cluster(sorted_prices, k)
                    .unwrap_or_default()
            }
        };
        centers.into_iter().map(round2).collect()
    }
}

impl Default for PriceRecommender {
    fn default() -> Self {
        Self::new()
    }
}

fn nearest_center(centers: &[f64], price: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &c) in centers.iter().enumerate() {
        let d = (price - c).abs();
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Inverse-distance-weighted unit estimate at a target price.
/// Floored at 1 whenever any observation exists.
fn estimate_units_at_price(target: f64, pairs: &[(f64, u64)]) -> u64 {
    if pairs.is_empty() {
        return 0;
    }
    let mut total_weight = 0.0;
    let mut weighted_units = 0.0;
    for &(price, units) in pairs {
        let weight = 1.0 / ((price - target).abs() + 1.0);
        total_weight += weight;
        weighted_units += weight * units as f64;
    }
    if total_weight <= 0.0 {
        return 0;
    }
    ((weighted_units / total_weight).round() as u64).max(1)
}

/// Adjacent deltas on the sorted price axis that exceed the significance
/// threshold, largest first.
fn find_price_gaps(sorted_prices: &[f64]) -> Vec<PriceGap> {
    if sorted_prices.len() < 2 {
        return Vec::new();
    }
    let threshold = (median(sorted_prices) * 0.20).max(5.0);
    let mut gaps: Vec<PriceGap> = sorted_prices
        .windows(2)
        .filter(|w| w[1] - w[0] >= threshold)
        .map(|w| PriceGap {
            low: round2(w[0]),
            high: round2(w[1]),
            gap_size: round2(w[1] - w[0]),
            midpoint: round2((w[0] + w[1]) / 2.0),
        })
        .collect();
    gaps.sort_by(|a, b| b.gap_size.total_cmp(&a.gap_size));
    gaps
}
