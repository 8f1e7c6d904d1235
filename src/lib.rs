//! Replog - fuzzy history-reference and repeated-entry detection for food and exercise logs
//!
//! This crate provides the matching core behind a food/workout logger:
//! - Text normalization and similarity scoring
//! - Detection of phrases that refer to past entries ("same as yesterday")
//! - "Save as meal/routine" suggestions for organically repeated entries
//! - Matching new workouts against saved routines, with deltas
//! - Durable tracking of dismissed suggestions
//!
//! # Usage
//!
//! ```ignore
//! use replog::{Config, Engine};
//!
//! let engine = Engine::new(Config::load_or_default(Config::default_path())).unwrap();
//! if let Some(suggestion) = engine.suggest_meal(&new_items, &recent_history) {
//!     // offer "save as meal"; on decline:
//!     engine.dismiss(&suggestion.hash);
//! }
//! ```

pub mod config;
pub mod dismissal;
pub mod error;
pub mod matching;

// Re-export main types for convenience
pub use config::Config;
pub use dismissal::{DismissalStore, DismissalTracker};
pub use error::{EngineError, Result};
pub use matching::{
    detect_history_reference, detect_repeated_food_entry, detect_repeated_weight_entry,
    find_matching_saved_routine, hybrid_score, jaccard, normalize, ConfidenceTier,
    HistoryReference, RepeatSuggestion, RoutineMatch, Signature,
};

use matching::{
    ExerciseEntry, ExerciseSet, FoodEntry, FoodItem, HistoryCandidate, HistoryMatch, MealMatch,
    SavedMeal, SavedRoutine,
};
use std::sync::Arc;

/// Host-facing façade: detectors configured from `Config`, with suggestion
/// suppression through the dismissal store.
pub struct Engine {
    /// Configuration
    pub config: Config,

    dismissals: DismissalTracker,
}

impl Engine {
    /// Create an engine with the dismissal store selected in the config
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let dismissals = DismissalTracker::open(&config)?;
        tracing::debug!(
            "Engine ready ({:?} dismissal storage)",
            config.dismissal.storage
        );
        Ok(Engine { config, dismissals })
    }

    /// Create an engine over a host-supplied dismissal store
    pub fn with_store(config: Config, store: Arc<dyn DismissalStore>) -> Self {
        let dismissals = DismissalTracker::new(store, config.dismissal.opt_out_threshold);
        Engine { config, dismissals }
    }

    pub fn detect_history_reference(&self, text: &str) -> HistoryReference {
        matching::detect_history_reference(text)
    }

    /// Past entry a history-referencing phrase most likely means
    pub fn find_history_match(
        &self,
        text: &str,
        candidates: &[HistoryCandidate],
    ) -> Option<HistoryMatch> {
        matching::find_history_match(text, candidates, &self.config.matching)
    }

    fn visible(&self, suggestion: RepeatSuggestion) -> Option<RepeatSuggestion> {
        if !self.config.suggestions.enabled {
            return None;
        }
        if self.dismissals.is_dismissed(&suggestion.hash) {
            tracing::debug!(
                "Suppressing dismissed {} suggestion {}",
                suggestion.kind.as_str(),
                suggestion.hash
            );
            return None;
        }
        Some(suggestion)
    }

    /// "Save as meal" suggestion, unless disabled or already dismissed
    pub fn suggest_meal(
        &self,
        new_items: &[FoodItem],
        history: &[FoodEntry],
    ) -> Option<RepeatSuggestion> {
        let suggestion =
            matching::detect_repeated_food_entry_with(new_items, history, &self.config.matching)?;
        self.visible(suggestion)
    }

    /// "Save as routine" suggestion, unless disabled or already dismissed
    pub fn suggest_routine(
        &self,
        new_exercises: &[ExerciseSet],
        history: &[ExerciseEntry],
    ) -> Option<RepeatSuggestion> {
        let suggestion = matching::detect_repeated_weight_entry_with(
            new_exercises,
            history,
            &self.config.matching,
        )?;
        self.visible(suggestion)
    }

    pub fn match_saved_routine(
        &self,
        new_exercises: &[ExerciseSet],
        saved_routines: &[SavedRoutine],
    ) -> Option<RoutineMatch> {
        matching::find_matching_saved_routine_with(
            new_exercises,
            saved_routines,
            &self.config.matching,
        )
    }

    pub fn match_saved_meal(
        &self,
        new_items: &[FoodItem],
        saved_meals: &[SavedMeal],
    ) -> Option<MealMatch> {
        matching::find_matching_saved_meal_with(new_items, saved_meals, &self.config.matching)
    }

    pub fn is_dismissed(&self, hash: &str) -> bool {
        self.dismissals.is_dismissed(hash)
    }

    /// Record that the user declined a suggestion
    pub fn dismiss(&self, hash: &str) -> bool {
        self.dismissals.dismiss(hash)
    }

    pub fn dismissal_count(&self) -> u32 {
        self.dismissals.dismissal_count()
    }

    pub fn should_show_opt_out_link(&self) -> bool {
        self.dismissals.should_show_opt_out_link()
    }

    /// Get the dismissal tracker
    pub fn dismissals(&self) -> &DismissalTracker {
        &self.dismissals
    }
}
