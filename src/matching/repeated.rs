//! Repeated-entry detection
//!
//! Scans recent history for organic repeats of a just-logged food entry or
//! workout and proposes saving it as a meal/routine once it has been logged
//! often enough. Entries that came from a saved template are never counted.

use crate::config::MatchingConfig;
use crate::matching::normalize::{normalize_all, Signature};
use crate::matching::similarity::{jaccard, jaccard_similarity};
use crate::matching::types::{
    total_calories, ExerciseEntry, ExerciseSet, FoodEntry, FoodItem, RepeatSuggestion,
    TemplateKind,
};
use sha2::{Digest, Sha256};

/// Items shown in a suggested name before it is cut off
const NAME_ITEM_LIMIT: usize = 3;

/// Signature over every item description of an entry
pub fn food_signature(items: &[FoodItem]) -> Signature {
    normalize_all(items.iter().map(|i| i.description.as_str()))
}

/// Sorted, de-duplicated exercise keys of a workout
pub fn exercise_key_set(exercises: &[ExerciseSet]) -> Vec<String> {
    let mut keys: Vec<String> = exercises
        .iter()
        .map(|e| e.key())
        .filter(|k| !k.is_empty())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Content hash of a suggestion, stable across sessions
pub fn suggestion_hash(kind: TemplateKind, signature: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(signature.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// Whether `candidate` is within `tolerance` (relative) of `reference` calories.
/// A zero reference only matches another zero.
pub fn calories_within(reference: f64, candidate: f64, tolerance: f64) -> bool {
    if reference <= 0.0 {
        return candidate <= 0.0;
    }
    (candidate - reference).abs() / reference <= tolerance
}

fn suggested_name(labels: Vec<String>) -> String {
    let mut labels: Vec<String> = labels.into_iter().filter(|l| !l.is_empty()).collect();
    labels.dedup();
    let extra = labels.len().saturating_sub(NAME_ITEM_LIMIT);
    labels.truncate(NAME_ITEM_LIMIT);
    let mut name = labels.join(" + ");
    if extra > 0 {
        name.push_str(&format!(" + {} more", extra));
    }
    name
}

/// Food variant with default thresholds
pub fn detect_repeated_food_entry(
    new_items: &[FoodItem],
    history: &[FoodEntry],
) -> Option<RepeatSuggestion> {
    detect_repeated_food_entry_with(new_items, history, &MatchingConfig::default())
}

/// Suggest saving a food entry as a meal when it has been logged manually
/// at least `min_history_matches` times before.
///
/// A past entry qualifies when its signature Jaccard reaches
/// `food_similarity_threshold` and its calories are within
/// `calorie_tolerance` of the new entry's. The reported count includes the
/// new entry itself.
pub fn detect_repeated_food_entry_with(
    new_items: &[FoodItem],
    history: &[FoodEntry],
    config: &MatchingConfig,
) -> Option<RepeatSuggestion> {
    if new_items.is_empty() || history.is_empty() {
        return None;
    }

    let signature = food_signature(new_items);
    if signature.is_empty() {
        return None;
    }
    let new_calories = total_calories(new_items);

    let matched: Vec<&FoodEntry> = history
        .iter()
        .filter(|entry| !entry.from_saved_meal())
        .filter(|entry| {
            let sim = jaccard(&signature, &food_signature(&entry.items));
            sim >= config.food_similarity_threshold
                && calories_within(new_calories, entry.total_calories(), config.calorie_tolerance)
        })
        .collect();

    tracing::debug!(
        "Food repeat scan for '{}': {} of {} history entries match",
        signature,
        matched.len(),
        history.len()
    );

    if matched.len() < config.min_history_matches {
        return None;
    }

    let rendered = signature.to_string();
    Some(RepeatSuggestion {
        kind: TemplateKind::Meal,
        hash: suggestion_hash(TemplateKind::Meal, &rendered),
        signature: rendered,
        suggested_name: suggested_name(
            new_items.iter().map(|i| i.description.trim().to_string()).collect(),
        ),
        match_count: matched.len() + 1,
        matched_entry_ids: matched.iter().map(|e| e.id.clone()).collect(),
    })
}

/// Exercise variant with default thresholds
pub fn detect_repeated_weight_entry(
    new_exercises: &[ExerciseSet],
    history: &[ExerciseEntry],
) -> Option<RepeatSuggestion> {
    detect_repeated_weight_entry_with(new_exercises, history, &MatchingConfig::default())
}

/// Suggest saving a workout as a routine when the same set of exercises has
/// been logged manually at least `min_history_matches` times before.
///
/// Only exercise identity counts here; sets, reps and weight may differ.
pub fn detect_repeated_weight_entry_with(
    new_exercises: &[ExerciseSet],
    history: &[ExerciseEntry],
    config: &MatchingConfig,
) -> Option<RepeatSuggestion> {
    if history.is_empty() {
        return None;
    }

    let keys = exercise_key_set(new_exercises);
    if keys.is_empty() {
        return None;
    }

    let matched: Vec<&ExerciseEntry> = history
        .iter()
        .filter(|entry| !entry.from_saved_routine())
        .filter(|entry| {
            jaccard_similarity(&keys, &exercise_key_set(&entry.exercises))
                >= config.exercise_similarity_threshold
        })
        .collect();

    tracing::debug!(
        "Workout repeat scan for [{}]: {} of {} history entries match",
        keys.join(", "),
        matched.len(),
        history.len()
    );

    if matched.len() < config.min_history_matches {
        return None;
    }

    let rendered = keys.join(",");
    Some(RepeatSuggestion {
        kind: TemplateKind::Routine,
        hash: suggestion_hash(TemplateKind::Routine, &rendered),
        signature: rendered,
        suggested_name: suggested_name(new_exercises.iter().map(|e| e.display_name()).collect()),
        match_count: matched.len() + 1,
        matched_entry_ids: matched.iter().map(|e| e.id.clone()).collect(),
    })
}
