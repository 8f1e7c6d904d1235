//! Matching Module
//!
//! Pure, synchronous detectors over free-text food and exercise logs:
//! - Text normalization into order-independent signatures
//! - Jaccard and hybrid (containment + typo-tolerant) similarity
//! - History-reference detection ("same as yesterday", "leftover pizza")
//! - Repeated-entry detection for save-as-meal/routine suggestions
//! - Saved-template matching with per-exercise deltas
//!
//! Nothing here performs I/O; malformed input degrades to "no match".

pub mod history_reference;
pub mod normalize;
pub mod repeated;
pub mod similarity;
pub mod template;
pub mod types;

// Re-export main entry points
pub use history_reference::{
    detect_history_reference, find_history_match, similarity_threshold, ConfidenceTier,
    HistoryCandidate, HistoryMatch, HistoryReference,
};
pub use normalize::{extract_candidate_words, normalize, Signature};
pub use repeated::{
    detect_repeated_food_entry, detect_repeated_food_entry_with, detect_repeated_weight_entry,
    detect_repeated_weight_entry_with, suggestion_hash,
};
pub use similarity::{hybrid_score, jaccard, jaccard_similarity, signature_jaccard};
pub use template::{
    find_matching_saved_meal, find_matching_saved_meal_with, find_matching_saved_routine,
    find_matching_saved_routine_with,
};
pub use types::*;
