//! Scoring core for marketplace niche research: turns noisy, partially
//! missing competitor listings into pricing strategies, demand estimates,
//! brand-concentration metrics and a single weighted viability verdict.
//!
//! Every public entry point is pure, synchronous and total: degenerate
//! input (empty sets, all-null fields) produces zeroed or neutral defaults,
//! never an error.

pub mod analyzer;
pub mod config;
pub mod model;
pub mod normalizer;
pub mod utils;

pub use analyzer::{
    classify_seller, compute_brand_concentration, CompetitionAnalyzer, DemandEstimator, Embedder,
    MatchScorer, PriceRecommender, ViabilityScorer,
};
pub use model::{
    BrandConcentration, CompetitionReport, CompetitorListing, DemandReport, PricingReport,
    ScoreResult, Verdict,
};
pub use normalizer::{normalize_all, normalize_record};
pub use utils::parse_demand;
