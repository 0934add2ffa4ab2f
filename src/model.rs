// Core structs: CompetitorListing plus the report types produced by the analyzers.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One competitor listing as seen on a marketplace search page.
///
/// Everything except `id` is optional: scraped records are noisy and partial,
/// and missing data degrades the relevant sub-score instead of failing a call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitorListing {
    pub id: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    /// Free-text purchase hint, e.g. "1K+ bought in past month".
    pub demand_signal: Option<String>,
    #[serde(default)]
    pub is_prime: bool,
    pub badge: Option<String>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub seller: Option<String>,
    pub seller_country: Option<String>,
    pub position: Option<u32>,
    #[serde(default)]
    pub is_sponsored: bool,
    /// Relevance to the candidate product (0-100), set by the match scorer.
    pub match_score: Option<f64>,
}

/// Categorical recommendation derived from the composite viability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    StrongGo,
    ConditionalGo,
    Caution,
    NoGo,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::StrongGo => "STRONG GO",
            Verdict::ConditionalGo => "CONDITIONAL GO",
            Verdict::Caution => "CAUTION",
            Verdict::NoGo => "NO GO",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionScore {
    /// 1-10, never 0.
    pub score: u8,
    pub weight: f64,
    pub details: String,
}

/// Aggregated viability verdict across the six weighted dimensions.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub composite: f64,
    pub verdict: Verdict,
    pub dimensions: BTreeMap<String, DimensionScore>,
    pub recommendation: String,
    pub analyzed_at: DateTime<Utc>,
}

/// One pricing tier recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct PriceStrategy {
    pub price: f64,
    pub rationale: String,
    pub estimated_monthly_units: u64,
    pub estimated_monthly_revenue: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_per_unit: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyTier {
    Budget,
    Competitive,
    Premium,
}

/// A stretch of the sorted price axis with no competitor in it.
#[derive(Debug, Clone, Serialize)]
pub struct PriceGap {
    pub low: f64,
    pub high: f64,
    pub gap_size: f64,
    pub midpoint: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceSummary {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PricingReport {
    pub strategies: BTreeMap<StrategyTier, PriceStrategy>,
    pub price_clusters: Vec<f64>,
    pub price_gap_opportunities: Vec<PriceGap>,
    pub summary_stats: PriceSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewDistribution {
    pub under_50: usize,
    pub from_50_to_500: usize,
    pub from_500_to_5000: usize,
    pub over_5000: usize,
}

/// Descriptive market statistics plus the two headline scores.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompetitionReport {
    pub total_competitors: usize,
    pub price_min: f64,
    pub price_max: f64,
    pub price_median: f64,
    pub price_mean: f64,
    pub avg_rating: f64,
    pub avg_reviews: u64,
    pub max_reviews: u32,
    pub review_distribution: ReviewDistribution,
    pub prime_percentage: f64,
    pub has_best_seller: bool,
    pub has_platform_choice: bool,
    /// 0-100, higher = more competitive.
    pub competition_score: f64,
    /// 0-100, higher = better opportunity for a new entrant.
    pub opportunity_score: f64,
    pub suggested_price_min: f64,
    pub suggested_price_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSize {
    #[default]
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopSeller {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub monthly_units: u64,
    pub estimated_monthly_revenue: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DemandReport {
    pub total_monthly_units: u64,
    pub total_monthly_revenue: f64,
    pub avg_monthly_revenue_per_seller: f64,
    pub sellers_with_demand_data: usize,
    pub market_size_category: MarketSize,
    /// 0-100, data-quality confidence in the totals above.
    pub demand_confidence: f64,
    pub review_velocity_avg: f64,
    pub top_sellers: Vec<TopSeller>,
}

/// Who is actually selling in this market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerCategory {
    PlatformFirstParty,
    EstablishedBrand,
    PrivateLabel,
    LowCostCommodity,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcentrationLevel {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandConcentration {
    /// Herfindahl-Hirschman Index over per-brand revenue shares.
    pub hhi: f64,
    pub platform_first_party_count: usize,
    pub established_brand_count: usize,
    pub private_label_count: usize,
    pub low_cost_commodity_count: usize,
    pub unknown_count: usize,
    pub concentration_level: ConcentrationLevel,
    pub has_platform_first_party: bool,
    /// 0-100, higher = more room for a new entrant.
    pub brand_moat_score: u8,
}

impl Default for BrandConcentration {
    fn default() -> Self {
        Self {
            hhi: 0.0,
            platform_first_party_count: 0,
            established_brand_count: 0,
            private_label_count: 0,
            low_cost_commodity_count: 0,
            unknown_count: 0,
            concentration_level: ConcentrationLevel::Low,
            has_platform_first_party: false,
            // Neutral when there is nothing to concentrate.
            brand_moat_score: 50,
        }
    }
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no usable identifier")]
    MissingIdentifier,
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("embedding call failed: {0}")]
    CallFailed(String),
}
