// Shared helpers: the demand-signal parser and small numeric functions.

/// Parses a free-text demand signal ("1K+ bought in past month", "1,234", …)
/// into a unit count. Returns `None` for empty or non-numeric input.
///
/// This is the single demand parser in the crate; every analyzer and the
/// ingestion boundary must go through it.
pub fn parse_demand(raw: &str) -> Option<u64> {
    let cleaned = raw.to_lowercase().replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    // "1K+", "10k bought" style: numeric prefix before the first 'k', x1000.
    if let Some((prefix, _)) = cleaned.split_once('k') {
        let num = prefix.trim().trim_end_matches('+').trim();
        return match num.parse::<f64>() {
            Ok(v) if v >= 0.0 && v.is_finite() => Some((v * 1000.0) as u64),
            _ => None,
        };
    }

    // Otherwise take the first run of digits, if any.
    let digits: String = cleaned
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median, 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n-1 denominator), 0.0 when fewer than 2 values.
pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Linear-interpolation percentile over an ascending-sorted slice.
/// `p` is in [0, 100]. Returns 0.0 for an empty slice.
pub fn percentile_linear(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Rounds to 2 decimal places (cents).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Rounds to 1 decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
