// Listing relevance scoring: embedding cosine similarity with a lexical
// n-gram fallback, plus a brand-overlap boost.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use tracing::warn;

use crate::model::{CompetitorListing, EmbedError};
use crate::utils::round1;

/// Text embedding backend. Implementations wrap whatever model the host
/// process loaded; this crate only needs the vectors.
pub trait Embedder: Send + Sync {
    /// Embeds each input text into a fixed-dimension vector.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Scores how relevant each listing title is to the candidate product name,
/// 0-100. Never fails: a broken embedding backend degrades to the lexical
/// path with a warning.
pub struct MatchScorer {
    embedder: Option<Arc<dyn Embedder>>,
}

impl MatchScorer {
    /// The embedder is an explicitly injected service object; construct it
    /// once at process start and share it via `Arc`.
    pub fn new(embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self { embedder }
    }

    /// Scorer that skips the embedding path entirely.
    pub fn lexical_only() -> Self {
        Self::new(None)
    }

    /// Returns scored clones sorted by `match_score` descending; the input
    /// listings are never mutated. Empty input yields an empty vec; a blank
    /// product name zeroes every score with no boost.
    pub fn score_matches(
        &self,
        product_name: &str,
        listings: &[CompetitorListing],
    ) -> Vec<CompetitorListing> {
        if listings.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<CompetitorListing> = listings.to_vec();

        if product_name.trim().is_empty() {
            for listing in &mut scored {
                listing.match_score = Some(0.0);
            }
            return scored;
        }

        let titles: Vec<String> = scored
            .iter()
            .map(|l| l.title.clone().unwrap_or_default())
            .collect();

        let raw = self
            .embedding_scores(product_name, &titles)
            .unwrap_or_else(|| lexical_scores(product_name, &titles));

        let query_tokens = tokens(product_name);
        for (listing, base) in scored.iter_mut().zip(raw) {
            let boosted = apply_brand_boost(base, listing.brand.as_deref(), &query_tokens);
            listing.match_score = Some(round1(boosted.clamp(0.0, 100.0)));
        }

        scored.sort_by(|a, b| {
            b.match_score
                .unwrap_or(0.0)
                .total_cmp(&a.match_score.unwrap_or(0.0))
        });
        scored
    }

    /// `None` routes the caller to the lexical fallback.
    fn embedding_scores(&self, product_name: &str, titles: &[String]) -> Option<Vec<f64>> {
        let embedder = self.embedder.as_ref()?;
        let mut texts = Vec::with_capacity(titles.len() + 1);
        texts.push(product_name.to_string());
        texts.extend_from_slice(titles);

        let vectors = match embedder.embed(&texts) {
            Ok(v) => v,
            Err(e) => {
                warn!("Embedding backend failed, using lexical fallback: {}", e);
                return None;
            }
        };
        if vectors.len() != texts.len() {
            warn!(
                "Embedding backend returned {} vectors for {} texts, using lexical fallback",
                vectors.len(),
                texts.len()
            );
            return None;
        }

        let query = &vectors[0];
        Some(
            vectors[1..]
                .iter()
                .map(|v| (cosine_f32(query, v) * 100.0).max(0.0))
                .collect(),
        )
    }
}

/// TF-weighted 1-2 gram cosine similarity against each title, scaled 0-100.
fn lexical_scores(product_name: &str, titles: &[String]) -> Vec<f64> {
    let query = ngram_counts(product_name);
    titles
        .iter()
        .map(|title| (cosine_counts(&query, &ngram_counts(title)) * 100.0).max(0.0))
        .collect()
}

fn apply_brand_boost(score: f64, brand: Option<&str>, query_tokens: &HashSet<String>) -> f64 {
    let Some(brand) = brand else {
        return score;
    };
    let shared = tokens(brand).intersection(query_tokens).count();
    let factor = match shared {
        0 => 1.0,
        1 => 1.10,
        _ => 1.15,
    };
    (score * factor).min(100.0)
}

/// Lowercased non-stopword tokens of at least two characters.
fn tokens(text: &str) -> HashSet<String> {
    token_list(text).into_iter().collect()
}

fn token_list(text: &str) -> Vec<String> {
    let stops = stopwords();
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2 && !stops.contains(t))
        .map(str::to_string)
        .collect()
}

/// Term-frequency counts over unigrams and consecutive bigrams.
fn ngram_counts(text: &str) -> HashMap<String, f64> {
    let toks = token_list(text);
    let mut counts: HashMap<String, f64> = HashMap::new();
    for t in &toks {
        *counts.entry(t.clone()).or_insert(0.0) += 1.0;
    }
    for pair in toks.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0.0) += 1.0;
    }
    counts
}

fn cosine_counts(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(k, &va)| b.get(k).map(|&vb| va * vb))
        .sum();
    let norm_a: f64 = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn cosine_f32(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn stopwords() -> &'static HashSet<&'static str> {
    static STOPWORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOPWORDS.get_or_init(|| {
        [
            "a", "about", "above", "after", "again", "all", "am", "an", "and", "any", "are", "as",
            "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
            "by", "can", "did", "do", "does", "down", "during", "each", "few", "for", "from",
            "further", "had", "has", "have", "he", "her", "here", "him", "his", "how", "i", "if",
            "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
            "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over",
            "own", "same", "she", "so", "some", "such", "than", "that", "the", "their", "them",
            "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
            "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while",
            "who", "why", "will", "with", "you", "your",
        ]
        .into_iter()
        .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubEmbedder {
        vectors: Vec<Vec<f32>>,
    }

    impl Embedder for StubEmbedder {
        fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(self.vectors.clone())
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Err(EmbedError::BackendUnavailable("model not loaded".into()))
        }
    }

    fn titled(id: &str, title: &str) -> CompetitorListing {
        CompetitorListing {
            id: id.to_string(),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_listings_yield_empty_result() {
        assert!(MatchScorer::lexical_only().score_matches("garlic press", &[]).is_empty());
    }

    #[test]
    fn blank_product_name_zeroes_all_scores_on_both_paths() {
        let listings = vec![titled("a", "Stainless Steel Garlic Press")];
        for scorer in [
            MatchScorer::lexical_only(),
            MatchScorer::new(Some(Arc::new(StubEmbedder {
                vectors: vec![vec![1.0, 0.0], vec![1.0, 0.0]],
            }))),
        ] {
            let scored = scorer.score_matches("   ", &listings);
            assert_eq!(scored[0].match_score, Some(0.0));
        }
    }

    #[test]
    fn lexical_scores_rank_relevant_titles_first() {
        let listings = vec![
            titled("far", "Wooden Dog Leash Hook"),
            titled("near", "Stainless Steel Garlic Press Crusher"),
        ];
        let scored = MatchScorer::lexical_only().score_matches("stainless steel garlic press", &listings);
        assert_eq!(scored[0].id, "near");
        let top = scored[0].match_score.unwrap();
        let bottom = scored[1].match_score.unwrap();
        assert!(top > bottom);
        assert!((0.0..=100.0).contains(&top));
        assert_eq!(bottom, 0.0);
    }

    #[test]
    fn embedder_errors_degrade_to_lexical() {
        let listings = vec![titled("x", "Garlic Press")];
        let failing = MatchScorer::new(Some(Arc::new(FailingEmbedder)));
        let lexical = MatchScorer::lexical_only();
        let a = failing.score_matches("garlic press", &listings);
        let b = lexical.score_matches("garlic press", &listings);
        assert_eq!(a[0].match_score, b[0].match_score);
    }

    #[test]
    fn wrong_vector_count_degrades_to_lexical() {
        let listings = vec![titled("x", "Garlic Press")];
        let bad_shape = MatchScorer::new(Some(Arc::new(StubEmbedder {
            vectors: vec![vec![1.0, 0.0]],
        })));
        let scored = bad_shape.score_matches("garlic press", &listings);
        assert_eq!(scored[0].match_score, Some(100.0));
    }

    #[test]
    fn embedding_path_drives_scores() {
        let listings = vec![titled("aligned", "anything"), titled("opposed", "anything")];
        let scorer = MatchScorer::new(Some(Arc::new(StubEmbedder {
            vectors: vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![-1.0, 0.0]],
        })));
        let scored = scorer.score_matches("query", &listings);
        assert_eq!(scored[0].id, "aligned");
        assert_eq!(scored[0].match_score, Some(100.0));
        // Negative similarity clamps to zero instead of going below range.
        assert_eq!(scored[1].match_score, Some(0.0));
    }

    #[test]
    fn brand_overlap_boosts_and_caps() {
        let mut one_shared = titled("b1", "Garlic Press");
        one_shared.brand = Some("Garlic Kings".to_string());
        let mut two_shared = titled("b2", "Garlic Press");
        two_shared.brand = Some("Garlic Press Co".to_string());

        let plain = titled("b0", "Garlic Press");
        let scorer = MatchScorer::lexical_only();
        let base = scorer.score_matches("garlic press", &[plain])[0]
            .match_score
            .unwrap();
        let boosted_one = scorer.score_matches("garlic press", &[one_shared])[0]
            .match_score
            .unwrap();
        let boosted_two = scorer.score_matches("garlic press", &[two_shared])[0]
            .match_score
            .unwrap();

        assert_eq!(base, 100.0);
        // Already at ceiling: boost cannot push past 100.
        assert_eq!(boosted_one, 100.0);
        assert_eq!(boosted_two, 100.0);

        // On a partial match the multipliers are visible.
        let mut partial = titled("b3", "Garlic Press Set");
        partial.brand = Some("Garlic Kings".to_string());
        let unboosted = scorer.score_matches("garlic press", &[titled("b4", "Garlic Press Set")])
            [0]
        .match_score
        .unwrap();
        let boosted = scorer.score_matches("garlic press", &[partial])[0]
            .match_score
            .unwrap();
        assert!(boosted > unboosted);
        // Boost multiplies the unrounded base, so allow rounding slack.
        assert!((boosted - unboosted * 1.10).abs() < 0.2);
    }

    #[test]
    fn inputs_are_never_mutated() {
        let listings = vec![titled("keep", "Garlic Press")];
        let _ = MatchScorer::lexical_only().score_matches("garlic press", &listings);
        assert!(listings[0].match_score.is_none());
    }
}
