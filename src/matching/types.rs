//! Input projections and verdict types for the matching engine
//!
//! The host app owns the full food/exercise entities; these structs carry
//! only what the detectors read. Numeric fields deserialize leniently from
//! numbers or strings, and anything unparsable becomes 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Lenient numbers
// ============================================================================

/// Parse a user-entered quantity, reading the leading number ("135 lbs" → 135).
/// Returns 0.0 when no finite number can be read.
pub fn parse_quantity(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    match trimmed[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => parse_quantity(&s),
        _ => 0.0,
    })
}

// ============================================================================
// Food
// ============================================================================

/// A single logged food item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodItem {
    pub description: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub calories: f64,
}

impl FoodItem {
    pub fn new(description: impl Into<String>, calories: f64) -> Self {
        FoodItem {
            description: description.into(),
            calories,
        }
    }
}

/// A previously logged food entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub logged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<FoodItem>,
    /// Set when the entry was logged by reusing a saved meal
    #[serde(default)]
    pub saved_meal_id: Option<String>,
}

impl FoodEntry {
    pub fn total_calories(&self) -> f64 {
        total_calories(&self.items)
    }

    pub fn from_saved_meal(&self) -> bool {
        self.saved_meal_id.is_some()
    }
}

pub fn total_calories(items: &[FoodItem]) -> f64 {
    items.iter().map(|i| i.calories).sum()
}

/// A user-saved meal template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedMeal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<FoodItem>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub use_count: u32,
}

// ============================================================================
// Exercise
// ============================================================================

/// One exercise within a workout entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseSet {
    /// Stable categorical identity, e.g. "bench_press"
    pub exercise_key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sets: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub reps: f64,
    /// Weight in lbs
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration_minutes: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub distance: f64,
}

impl ExerciseSet {
    pub fn new(exercise_key: impl Into<String>, sets: f64, reps: f64, weight: f64) -> Self {
        ExerciseSet {
            exercise_key: exercise_key.into(),
            sets,
            reps,
            weight,
            ..Default::default()
        }
    }

    /// Canonical key used for set comparison
    pub fn key(&self) -> String {
        self.exercise_key.trim().to_lowercase()
    }

    /// Human label, falling back to the key ("bench_press" → "Bench Press")
    pub fn display_name(&self) -> String {
        if !self.name.trim().is_empty() {
            return self.name.trim().to_string();
        }
        self.key()
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A previously logged workout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub logged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercises: Vec<ExerciseSet>,
    /// Set when the entry was logged by reusing a saved routine
    #[serde(default)]
    pub saved_routine_id: Option<String>,
}

impl ExerciseEntry {
    pub fn from_saved_routine(&self) -> bool {
        self.saved_routine_id.is_some()
    }
}

/// A user-saved workout routine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedRoutine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseSet>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub use_count: u32,
}

// ============================================================================
// Verdicts
// ============================================================================

/// Kind of reusable template a suggestion proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Meal,
    Routine,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Meal => "meal",
            TemplateKind::Routine => "routine",
        }
    }
}

/// "Save this as a meal/routine" proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatSuggestion {
    pub kind: TemplateKind,
    /// Content hash used for dismissal tracking
    pub hash: String,
    /// Signature (meals) or comma-joined key set (routines) the hash covers
    pub signature: String,
    pub suggested_name: String,
    /// Matching history entries plus the new entry itself
    pub match_count: usize,
    pub matched_entry_ids: Vec<String>,
}

/// Per-exercise difference between a new workout and a saved routine.
/// Unchanged fields are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDelta {
    pub exercise_key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl ExerciseDelta {
    pub fn is_unchanged(&self) -> bool {
        self.sets.is_none() && self.reps.is_none() && self.weight.is_none()
    }

    /// Render as "+1 set, +35 lbs"
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(d) = self.sets {
            parts.push(signed(d, "set", "sets"));
        }
        if let Some(d) = self.reps {
            parts.push(signed(d, "rep", "reps"));
        }
        if let Some(d) = self.weight {
            parts.push(signed(d, "lb", "lbs"));
        }
        parts.join(", ")
    }
}

fn signed(delta: f64, singular: &str, plural: &str) -> String {
    let unit = if delta.abs() == 1.0 { singular } else { plural };
    let sign = if delta > 0.0 { "+" } else { "-" };
    let magnitude = delta.abs();
    if magnitude.fract() == 0.0 {
        format!("{}{} {}", sign, magnitude as i64, unit)
    } else {
        format!("{}{:.1} {}", sign, magnitude, unit)
    }
}

/// Best saved routine for a new workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineMatch {
    pub routine_id: String,
    pub routine_name: String,
    pub similarity: f64,
    pub deltas: Vec<ExerciseDelta>,
}

/// Best saved meal for a new food entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealMatch {
    pub meal_id: String,
    pub meal_name: String,
    pub similarity: f64,
}
