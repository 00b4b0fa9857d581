//! Term weighting used to rank keyword hits.

use std::fmt::Debug;

use crate::index::payload::TermPayload;

/// Components of a term's contribution to a document score.
///
/// A matching term scores
/// `tf(freq) * idf(df, n)^2 * query_boost * length_norm(len) * payload(bytes).boost`
/// and a document's sum is multiplied by `coord(matched, total)`.
pub trait Similarity: Send + Sync + Debug {
    /// Weight of a term occurring `frequency` times in a field.
    fn tf(&self, frequency: f32) -> f32;

    /// Rarity of a term found in `doc_freq` of `num_docs` documents.
    fn idf(&self, doc_freq: usize, num_docs: usize) -> f32;

    /// Normalization for a field holding `num_terms` terms.
    fn length_norm(&self, num_terms: u32) -> f32;

    /// Share of the query terms a document matched.
    fn coord(&self, matched: usize, total: usize) -> f32;

    /// Boost and document score recorded in a posting's payload.
    fn payload(&self, payload: &[u8]) -> TermPayload;

    /// Get the name of this similarity.
    fn name(&self) -> &'static str;
}

/// TF-IDF weighting with payload boosts and coordination.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicSimilarity;

impl ClassicSimilarity {
    pub fn new() -> Self {
        ClassicSimilarity
    }
}

impl Similarity for ClassicSimilarity {
    fn tf(&self, frequency: f32) -> f32 {
        frequency.sqrt()
    }

    fn idf(&self, doc_freq: usize, num_docs: usize) -> f32 {
        (num_docs as f32 / (doc_freq as f32 + 1.0)).ln() + 1.0
    }

    fn length_norm(&self, num_terms: u32) -> f32 {
        if num_terms == 0 {
            1.0
        } else {
            1.0 / (num_terms as f32).sqrt()
        }
    }

    fn coord(&self, matched: usize, total: usize) -> f32 {
        if total == 0 {
            0.0
        } else {
            matched as f32 / total as f32
        }
    }

    fn payload(&self, payload: &[u8]) -> TermPayload {
        // postings written without a payload count as unboosted and unscored
        TermPayload::decode(payload).unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "classic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formulas() {
        let sim = ClassicSimilarity::new();
        assert_eq!(sim.tf(4.0), 2.0);
        assert!((sim.idf(1, 2) - 1.0).abs() < 1e-6);
        assert!((sim.idf(0, 10) - (10f32.ln() + 1.0)).abs() < 1e-6);
        assert_eq!(sim.length_norm(4), 0.5);
        assert_eq!(sim.coord(1, 4), 0.25);
        assert_eq!(sim.payload(&TermPayload::new(1.1, 9).encode()), TermPayload::new(1.1, 9));
        assert_eq!(sim.payload(&[]), TermPayload::new(1.0, 0));
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let sim = ClassicSimilarity::new();
        assert!(sim.idf(1, 100) > sim.idf(50, 100));
    }
}
