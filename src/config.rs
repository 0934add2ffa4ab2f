use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Candidate product name, used for relevance scoring.
    pub product_name: String,
    /// Unit cost at the supplier, for margin and profitability scoring.
    pub reference_cost: Option<f64>,
    /// Path to a JSON array of scraped competitor records.
    pub listings_path: String,
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
