//! Text similarity for repeated-entry and history-reference matching
//!
//! Signatures are compared with plain Jaccard overlap. History references
//! use a hybrid score that favours containment of the (short) candidate
//! phrase in the (longer) logged description, with typo tolerance.

use crate::config::HybridConfig;
use crate::matching::normalize::{normalize, Signature};
use std::collections::HashSet;

/// Jaccard similarity: |intersection| / |union| of token sets
pub fn jaccard_similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let set_a: HashSet<&str> = a.iter().map(|s| s.as_str()).collect();
    let set_b: HashSet<&str> = b.iter().map(|s| s.as_str()).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();

    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Jaccard similarity of two signatures
pub fn jaccard(a: &Signature, b: &Signature) -> f64 {
    jaccard_similarity(a.tokens(), b.tokens())
}

/// Jaccard similarity of two rendered signature strings (split on whitespace, not re-normalized)
pub fn signature_jaccard(a: &str, b: &str) -> f64 {
    jaccard(&Signature::parse(a), &Signature::parse(b))
}

/// Normalize both texts, then compare their signatures
pub fn text_similarity(a: &str, b: &str) -> f64 {
    jaccard(&normalize(a), &normalize(b))
}

/// Exact match, or within the edit-distance budget once the longer word
/// reaches `min_fuzzy_len` ("chiken" ~ "chicken", but "ham" !~ "jam").
pub fn fuzzy_word_match(a: &str, b: &str, config: &HybridConfig) -> bool {
    if a == b {
        return true;
    }
    let longest = a.chars().count().max(b.chars().count());
    if longest < config.min_fuzzy_len || config.max_edit_distance == 0 {
        return false;
    }
    strsim::levenshtein(a, b) <= config.max_edit_distance
}

/// Hybrid score with default weighting
pub fn hybrid_score(candidate_words: &[String], target_text: &str) -> f64 {
    hybrid_score_with(candidate_words, target_text, &HybridConfig::default())
}

/// Weighted containment + Jaccard score of candidate words against a target text.
///
/// Each candidate counts as found if the target's signature contains it
/// exactly or fuzzily. Containment is found / candidates; the Jaccard part
/// also penalizes words only present in the target. Returns 0 for an
/// empty candidate list or an empty target.
pub fn hybrid_score_with(candidate_words: &[String], target_text: &str, config: &HybridConfig) -> f64 {
    let candidates: HashSet<&str> = candidate_words
        .iter()
        .map(|w| w.as_str())
        .filter(|w| !w.is_empty())
        .collect();
    if candidates.is_empty() {
        return 0.0;
    }

    let target_sig = normalize(target_text);
    let target: HashSet<&str> = target_sig.tokens().iter().map(|s| s.as_str()).collect();
    if target.is_empty() {
        return 0.0;
    }

    let found = candidates
        .iter()
        .filter(|c| target.contains(*c) || target.iter().any(|t| fuzzy_word_match(c, t, config)))
        .count();

    let containment = found as f64 / candidates.len() as f64;
    let union = candidates.len() + target.len() - found.min(target.len());
    let overlap = found as f64 / union as f64;

    let total_weight = config.containment_weight + config.jaccard_weight;
    if total_weight <= 0.0 {
        return containment;
    }
    (config.containment_weight * containment + config.jaccard_weight * overlap) / total_weight
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_jaccard_identical() {
        let a = normalize("hello world");
        assert!((jaccard(&a, &a) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_jaccard_empty_cases() {
        assert!((signature_jaccard("", "") - 1.0).abs() < EPS);
        assert!(signature_jaccard("a", "").abs() < EPS);
        assert!(signature_jaccard("", "a").abs() < EPS);
    }

    #[test]
    fn test_jaccard_half_overlap() {
        let sim = signature_jaccard("chicken breast grilled", "chicken breast fried");
        assert!((sim - 0.5).abs() < EPS, "got {sim}");
    }

    #[test]
    fn test_jaccard_completely_different() {
        assert!(text_similarity("oatmeal with berries", "steak fries").abs() < EPS);
    }

    #[test]
    fn test_text_similarity_ignores_quantities() {
        assert!((text_similarity("2 eggs and toast", "3 eggs with toast") - 1.0).abs() < EPS);
    }

    #[test]
    fn test_fuzzy_word_match() {
        let config = HybridConfig::default();
        assert!(fuzzy_word_match("chiken", "chicken", &config));
        assert!(fuzzy_word_match("eggs", "egg", &config));
        assert!(!fuzzy_word_match("ham", "jam", &config));
        assert!(!fuzzy_word_match("chicken", "kitchen", &config));
    }

    #[test]
    fn test_hybrid_empty_candidates() {
        assert_eq!(hybrid_score(&[], "grilled chicken"), 0.0);
        assert_eq!(hybrid_score(&words(&["pizza"]), ""), 0.0);
    }

    #[test]
    fn test_hybrid_full_containment() {
        // 1 of 1 contained, jaccard 1/3 → 0.7 + 0.1
        let score = hybrid_score(&words(&["pizza"]), "Pepperoni pizza slice");
        assert!((score - 0.8).abs() < EPS, "got {score}");
    }

    #[test]
    fn test_hybrid_favours_containment_over_jaccard() {
        let candidates = words(&["chicken", "salad"]);
        let target = "grilled chicken caesar salad with croutons";
        let hybrid = hybrid_score(&candidates, target);
        let plain = jaccard_similarity(&candidates, normalize(target).tokens());
        assert!(hybrid > plain);
    }

    #[test]
    fn test_hybrid_tolerates_typos() {
        let score = hybrid_score(&words(&["chiken"]), "chicken");
        assert!((score - 1.0).abs() < EPS, "got {score}");
    }

    #[test]
    fn test_hybrid_no_overlap() {
        assert_eq!(hybrid_score(&words(&["sushi"]), "beef burrito"), 0.0);
    }
}
