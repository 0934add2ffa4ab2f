use std::fs;

use serde::Serialize;
use tracing::{error, info};

use niche_sniper::analyzer::{
    CompetitionAnalyzer, DemandEstimator, MatchScorer, PriceRecommender, ViabilityScorer,
};
use niche_sniper::config::load_config;
use niche_sniper::model::{
    BrandConcentration, CompetitionReport, CompetitorListing, DemandReport, PricingReport,
    ScoreResult,
};
use niche_sniper::normalizer::normalize_all;

/// Everything the pipeline produces for one candidate product, ready to
/// serialize for whoever consumes it.
#[derive(Serialize)]
struct NicheReport {
    product_name: String,
    listings_analyzed: usize,
    viability: ScoreResult,
    competition: CompetitionReport,
    pricing: PricingReport,
    demand: DemandReport,
    brand_concentration: BrandConcentration,
    ranked_matches: Vec<CompetitorListing>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    info!("Loading listings from {}...", config.listings_path);
    let raw = match fs::read_to_string(&config.listings_path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read listings file: {}", e);
            return;
        }
    };
    let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            error!("Listings file is not a JSON array: {}", e);
            return;
        }
    };

    let listings = normalize_all(&records);
    info!("Normalized {} of {} records", listings.len(), records.len());

    info!("Scoring listing relevance...");
    // No embedding backend is wired into the CLI; the scorer uses its
    // lexical path. Hosts with a model inject it via MatchScorer::new.
    let ranked_matches = MatchScorer::lexical_only().score_matches(&config.product_name, &listings);

    info!("Analyzing competition...");
    let competition = CompetitionAnalyzer::new().analyze(&listings);
    info!(
        "Competition score: {:.1} | Opportunity score: {:.1}",
        competition.competition_score, competition.opportunity_score
    );

    info!("Recommending pricing...");
    let pricing = PriceRecommender::new().recommend(&listings, config.reference_cost);

    info!("Estimating demand...");
    let demand = DemandEstimator::new().estimate(&listings);
    info!(
        "Estimated {} units/mo (${:.2} revenue, {:?} market)",
        demand.total_monthly_units, demand.total_monthly_revenue, demand.market_size_category
    );

    info!("Measuring brand concentration...");
    let brand_concentration = niche_sniper::compute_brand_concentration(&listings);
    info!(
        "HHI {:.0} | moat score {}",
        brand_concentration.hhi, brand_concentration.brand_moat_score
    );

    info!("Calculating viability...");
    let viability = ViabilityScorer::new().calculate(&listings, config.reference_cost);
    info!("Verdict: {} ({:.1}/10)", viability.verdict, viability.composite);

    let report = NicheReport {
        product_name: config.product_name.clone(),
        listings_analyzed: listings.len(),
        viability,
        competition,
        pricing,
        demand,
        brand_concentration,
        ranked_matches,
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Failed to serialize report: {}", e),
    }
}
