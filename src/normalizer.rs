// Ingestion boundary: raw scraped JSON records become CompetitorListing exactly once.
use serde_json::Value;
use tracing::warn;

use crate::model::{CompetitorListing, NormalizeError};

/// Converts a batch of raw records, skipping (and logging) the unusable ones.
pub fn normalize_all(records: &[Value]) -> Vec<CompetitorListing> {
    records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| match normalize_record(record) {
            Ok(listing) => Some(listing),
            Err(e) => {
                warn!("Skipping record {}: {}", i, e);
                None
            }
        })
        .collect()
}

/// Converts one arbitrary external payload into a `CompetitorListing`.
///
/// Field-level noise never fails the record: out-of-range or unparsable
/// values become `None`. Only a missing identifier rejects the record.
pub fn normalize_record(record: &Value) -> Result<CompetitorListing, NormalizeError> {
    let obj = record.as_object().ok_or(NormalizeError::NotAnObject)?;

    let id = get_string(obj, &["id", "asin", "identifier"])
        .ok_or(NormalizeError::MissingIdentifier)?;

    let price = get_f64(obj, "price").filter(|p| p.is_finite() && *p >= 0.0);
    let rating = get_f64(obj, "rating").filter(|r| r.is_finite() && (0.0..=5.0).contains(r));
    let review_count = get_f64(obj, "review_count")
        .filter(|r| r.is_finite() && *r >= 0.0)
        .map(|r| r as u32);
    let position = get_f64(obj, "position")
        .or_else(|| get_f64(obj, "search_position"))
        .filter(|p| p.is_finite() && *p >= 1.0)
        .map(|p| p as u32);

    Ok(CompetitorListing {
        id,
        title: get_string(obj, &["title"]),
        price,
        rating,
        review_count,
        demand_signal: get_demand_signal(obj),
        is_prime: get_bool(obj, "is_prime"),
        badge: get_string(obj, &["badge"]),
        brand: get_string(obj, &["brand"]),
        manufacturer: get_string(obj, &["manufacturer"]),
        seller: get_string(obj, &["seller"]),
        seller_country: get_string(obj, &["seller_country"]),
        position,
        is_sponsored: get_bool(obj, "is_sponsored"),
        match_score: None,
    })
}

fn get_string(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Numeric field that may arrive as a JSON number or a numeric string.
/// Anything unparsable is treated as unknown, never rejected.
fn get_f64(obj: &serde_json::Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn get_bool(obj: &serde_json::Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Demand signals are free text; numeric payloads pass through stringified so
/// `utils::parse_demand` stays the only interpreter.
fn get_demand_signal(obj: &serde_json::Map<String, Value>) -> Option<String> {
    for key in ["demand_signal", "bought_last_month"] {
        match obj.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}
