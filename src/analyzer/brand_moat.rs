// Seller classification and brand-concentration (HHI) analysis.
use std::collections::HashMap;

use crate::model::{BrandConcentration, CompetitorListing, ConcentrationLevel, SellerCategory};
use crate::utils::{parse_demand, round1};

const PLATFORM_SELLER_MARKERS: [&str; 2] = ["amazon", "amzn"];
const LOW_COST_ORIGIN_COUNTRIES: [&str; 2] = ["CN", "HK"];
const CORPORATE_SUFFIXES: [&str; 8] = ["llc", "inc", "ltd", "corp", "co.", "gmbh", "s.a.", "pty"];
const GENERIC_BRANDS: [&str; 5] = ["unknown", "generic", "unbranded", "n/a", "-"];

/// Classifies a seller into one of five categories via a fixed-priority
/// cascade; first match wins. Total and deterministic.
pub fn classify_seller(
    brand: Option<&str>,
    manufacturer: Option<&str>,
    seller: Option<&str>,
    seller_country: Option<&str>,
) -> SellerCategory {
    let brand_l = brand.unwrap_or("").trim().to_lowercase();
    let seller_l = seller.unwrap_or("").trim().to_lowercase();
    let mfr_l = manufacturer.unwrap_or("").trim().to_lowercase();
    let country = seller_country.unwrap_or("").trim().to_uppercase();

    // 1. Platform-owned seller accounts.
    if PLATFORM_SELLER_MARKERS.iter().any(|m| seller_l.contains(m)) {
        return SellerCategory::PlatformFirstParty;
    }

    // 2. Low-cost-origin seller with no brand identity at all.
    if LOW_COST_ORIGIN_COUNTRIES.contains(&country.as_str()) && brand_l.is_empty() {
        return SellerCategory::LowCostCommodity;
    }

    // 3. Corporate suffixes or domain-like brand text mark an established brand.
    let combined = format!("{brand_l} {mfr_l}");
    if combined.contains(".com")
        || combined.contains(".co")
        || CORPORATE_SUFFIXES.iter().any(|s| combined.contains(s))
    {
        return SellerCategory::EstablishedBrand;
    }

    // 4. Any other non-trivial brand string is a private label.
    if !brand_l.is_empty() && !GENERIC_BRANDS.contains(&brand_l.as_str()) {
        return SellerCategory::PrivateLabel;
    }

    SellerCategory::Unknown
}

/// Computes HHI over per-brand revenue shares plus the 0-100 moat score.
/// An empty set yields the neutral default.
pub fn compute_brand_concentration(listings: &[CompetitorListing]) -> BrandConcentration {
    if listings.is_empty() {
        return BrandConcentration::default();
    }

    let mut counts: HashMap<SellerCategory, usize> = HashMap::new();
    let mut brand_revenues: HashMap<String, f64> = HashMap::new();

    for listing in listings {
        let category = classify_seller(
            listing.brand.as_deref(),
            listing.manufacturer.as_deref(),
            listing.seller.as_deref(),
            listing.seller_country.as_deref(),
        );
        *counts.entry(category).or_insert(0) += 1;

        let brand_key = listing
            .brand
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or("Unknown")
            .to_string();
        *brand_revenues.entry(brand_key).or_insert(0.0) += revenue_proxy(listing);
    }

    let total_rev: f64 = brand_revenues.values().sum();
    let mut hhi = 0.0;
    if total_rev > 0.0 {
        for rev in brand_revenues.values() {
            let share_pct = rev / total_rev * 100.0;
            hhi += share_pct * share_pct;
        }
    }

    let concentration_level = if hhi >= 2500.0 {
        ConcentrationLevel::High
    } else if hhi >= 1500.0 {
        ConcentrationLevel::Medium
    } else {
        ConcentrationLevel::Low
    };

    let count = |c: SellerCategory| counts.get(&c).copied().unwrap_or(0);
    let platform_count = count(SellerCategory::PlatformFirstParty);

    BrandConcentration {
        hhi: round1(hhi),
        platform_first_party_count: platform_count,
        established_brand_count: count(SellerCategory::EstablishedBrand),
        private_label_count: count(SellerCategory::PrivateLabel),
        low_cost_commodity_count: count(SellerCategory::LowCostCommodity),
        unknown_count: count(SellerCategory::Unknown),
        concentration_level,
        has_platform_first_party: platform_count > 0,
        brand_moat_score: moat_score(
            hhi,
            listings.len(),
            platform_count,
            count(SellerCategory::LowCostCommodity),
            count(SellerCategory::PrivateLabel),
        ),
    }
}

/// Monthly revenue for one listing: parsed demand x price when both are
/// known, else the rank-weighted proxy `price * (100 / max(position, 1))`.
/// The proxy is an un-derived heuristic kept as-is.
fn revenue_proxy(listing: &CompetitorListing) -> f64 {
    let price = listing.price.unwrap_or(0.0);
    if price > 0.0 {
        if let Some(units) = listing.demand_signal.as_deref().and_then(parse_demand) {
            if units > 0 {
                return price * units as f64;
            }
        }
    }
    let position = listing.position.unwrap_or(1).max(1);
    price * (100.0 / position as f64)
}

/// 0-100 moat score: high fragmentation and weak incumbents read as
/// opportunity, concentration and platform presence as threat.
fn moat_score(
    hhi: f64,
    total: usize,
    platform_count: usize,
    low_cost_count: usize,
    private_label_count: usize,
) -> u8 {
    let mut score: f64 = 50.0;

    score += if hhi < 1000.0 {
        25.0
    } else if hhi < 1500.0 {
        15.0
    } else if hhi < 2500.0 {
        0.0
    } else if hhi < 4000.0 {
        -15.0
    } else {
        -25.0
    };

    let total_f = total.max(1) as f64;
    let platform_pct = platform_count as f64 / total_f;
    if platform_pct > 0.1 {
        score -= 20.0;
    } else if platform_count > 0 {
        score -= 10.0;
    }

    let low_cost_pct = low_cost_count as f64 / total_f;
    if low_cost_pct > 0.3 {
        score += 15.0;
    } else if low_cost_pct > 0.1 {
        score += 8.0;
    }

    let pl_pct = private_label_count as f64 / total_f;
    if pl_pct > 0.5 {
        score += 10.0;
    } else if pl_pct > 0.3 {
        score += 5.0;
    }

    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branded(id: &str, brand: &str, price: f64) -> CompetitorListing {
        CompetitorListing {
            id: id.to_string(),
            brand: Some(brand.to_string()),
            price: Some(price),
            position: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn cascade_priority_first_match_wins() {
        assert_eq!(
            classify_seller(Some("SomeBrand"), None, Some("Amazon.com"), Some("US")),
            SellerCategory::PlatformFirstParty
        );
        assert_eq!(
            classify_seller(None, None, Some("Shenzhen Trading"), Some("CN")),
            SellerCategory::LowCostCommodity
        );
        assert_eq!(
            classify_seller(Some("Acme Inc"), None, None, None),
            SellerCategory::EstablishedBrand
        );
        assert_eq!(
            classify_seller(None, Some("example.com"), None, None),
            SellerCategory::EstablishedBrand
        );
        assert_eq!(
            classify_seller(Some("CozyNest"), None, None, None),
            SellerCategory::PrivateLabel
        );
        assert_eq!(
            classify_seller(Some("generic"), None, None, None),
            SellerCategory::Unknown
        );
        assert_eq!(classify_seller(None, None, None, None), SellerCategory::Unknown);
    }

    #[test]
    fn classify_is_deterministic() {
        let args = (Some("Acme Ltd"), Some("Acme"), Some("acme store"), Some("DE"));
        let first = classify_seller(args.0, args.1, args.2, args.3);
        for _ in 0..10 {
            assert_eq!(classify_seller(args.0, args.1, args.2, args.3), first);
        }
    }

    #[test]
    fn low_cost_origin_with_brand_is_not_commodity() {
        assert_eq!(
            classify_seller(Some("BrandName"), None, None, Some("CN")),
            SellerCategory::PrivateLabel
        );
    }

    #[test]
    fn single_brand_market_hits_exact_hhi_ceiling() {
        let listings = vec![branded("h1", "Solo", 10.0), branded("h2", "Solo", 20.0)];
        let conc = compute_brand_concentration(&listings);
        assert_eq!(conc.hhi, 10_000.0);
        assert_eq!(conc.concentration_level, ConcentrationLevel::High);
    }

    #[test]
    fn empty_input_yields_neutral_default() {
        let conc = compute_brand_concentration(&[]);
        assert_eq!(conc.hhi, 0.0);
        assert_eq!(conc.brand_moat_score, 50);
        assert!(!conc.has_platform_first_party);
    }

    #[test]
    fn moat_score_bands_at_hhi_boundaries() {
        // Boundary values land on the closed side of each band and the
        // result always stays inside [0, 100].
        assert_eq!(moat_score(999.9, 10, 0, 0, 0), 75);
        assert_eq!(moat_score(1000.0, 10, 0, 0, 0), 65);
        assert_eq!(moat_score(1500.0, 10, 0, 0, 0), 50);
        assert_eq!(moat_score(2500.0, 10, 0, 0, 0), 35);
        assert_eq!(moat_score(4000.0, 10, 0, 0, 0), 25);
        // Stacked penalties cannot push below 0.
        assert_eq!(moat_score(10_000.0, 10, 10, 0, 0), 5);
        assert!(moat_score(10_000.0, 1, 1, 0, 0) <= 100);
    }

    #[test]
    fn revenue_proxy_prefers_real_demand_data() {
        let mut with_demand = branded("r1", "A", 10.0);
        with_demand.demand_signal = Some("1K+".to_string());
        assert_eq!(revenue_proxy(&with_demand), 10_000.0);

        let mut rank_only = branded("r2", "A", 10.0);
        rank_only.position = Some(4);
        assert_eq!(revenue_proxy(&rank_only), 250.0);

        // Missing position falls back to rank 1.
        let mut no_pos = branded("r3", "A", 10.0);
        no_pos.position = None;
        assert_eq!(revenue_proxy(&no_pos), 1000.0);
    }

    #[test]
    fn fragmented_private_label_market_scores_high() {
        let listings: Vec<_> = (0..10)
            .map(|i| branded(&format!("f{i}"), &format!("Brand{i}"), 10.0))
            .collect();
        let conc = compute_brand_concentration(&listings);
        // HHI = 10 * 10^2 = 1000 -> +15; all private label -> +10.
        assert_eq!(conc.hhi, 1000.0);
        assert_eq!(conc.brand_moat_score, 75);
        assert_eq!(conc.private_label_count, 10);
    }
}
