// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod brand_moat;
pub mod competition;
pub mod demand;
pub mod match_scorer;
pub mod pricing;
pub mod viability;

// Re-export the main entry points for ease of use.
pub use brand_moat::{classify_seller, compute_brand_concentration};
pub use competition::CompetitionAnalyzer;
pub use demand::DemandEstimator;
pub use match_scorer::{Embedder, MatchScorer};
pub use pricing::{KMeansClusterer, PriceClusterer, PriceRecommender, TercileClusterer};
pub use viability::ViabilityScorer;
