//! Saved-template matching
//!
//! Finds the saved routine (or meal) a new entry most resembles, so the
//! caller can offer "update your saved routine" with per-exercise deltas.

use crate::config::MatchingConfig;
use crate::matching::repeated::{exercise_key_set, food_signature};
use crate::matching::similarity::{jaccard, jaccard_similarity};
use crate::matching::types::{
    ExerciseDelta, ExerciseSet, FoodItem, MealMatch, RoutineMatch, SavedMeal, SavedRoutine,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Higher similarity wins; ties go to the most recently used template,
/// with never-used templates ranked older than any timestamp.
fn rank(
    a_sim: f64,
    a_used: &Option<DateTime<Utc>>,
    b_sim: f64,
    b_used: &Option<DateTime<Utc>>,
) -> Ordering {
    a_sim.total_cmp(&b_sim).then_with(|| a_used.cmp(b_used))
}

/// Routine variant with default thresholds
pub fn find_matching_saved_routine(
    new_exercises: &[ExerciseSet],
    saved_routines: &[SavedRoutine],
) -> Option<RoutineMatch> {
    find_matching_saved_routine_with(new_exercises, saved_routines, &MatchingConfig::default())
}

/// Best saved routine whose exercise-key set overlaps the new workout by at
/// least `routine_similarity_threshold`.
pub fn find_matching_saved_routine_with(
    new_exercises: &[ExerciseSet],
    saved_routines: &[SavedRoutine],
    config: &MatchingConfig,
) -> Option<RoutineMatch> {
    let keys = exercise_key_set(new_exercises);
    if keys.is_empty() || saved_routines.is_empty() {
        return None;
    }

    let (routine, similarity) = saved_routines
        .iter()
        .map(|r| (r, jaccard_similarity(&keys, &exercise_key_set(&r.exercises))))
        .filter(|(_, sim)| *sim >= config.routine_similarity_threshold)
        .max_by(|(a, sa), (b, sb)| rank(*sa, &a.last_used_at, *sb, &b.last_used_at))?;

    tracing::debug!(
        "Workout matches saved routine '{}' ({:.2})",
        routine.name,
        similarity
    );

    Some(RoutineMatch {
        routine_id: routine.id.clone(),
        routine_name: routine.name.clone(),
        similarity,
        deltas: exercise_deltas(new_exercises, &routine.exercises),
    })
}

fn delta(new: f64, saved: f64) -> Option<f64> {
    let d = new - saved;
    if d.abs() < f64::EPSILON {
        None
    } else {
        Some(d)
    }
}

/// Signed sets/reps/weight differences (new minus saved) for every exercise
/// present in both, in the new workout's order. Exercises with no change are
/// left out.
pub fn exercise_deltas(new_exercises: &[ExerciseSet], saved: &[ExerciseSet]) -> Vec<ExerciseDelta> {
    let saved_by_key: HashMap<String, &ExerciseSet> = saved
        .iter()
        .map(|e| (e.key(), e))
        .filter(|(k, _)| !k.is_empty())
        .collect();

    new_exercises
        .iter()
        .filter_map(|new| {
            let old = saved_by_key.get(&new.key())?;
            let d = ExerciseDelta {
                exercise_key: new.key(),
                name: new.display_name(),
                sets: delta(new.sets, old.sets),
                reps: delta(new.reps, old.reps),
                weight: delta(new.weight, old.weight),
            };
            (!d.is_unchanged()).then_some(d)
        })
        .collect()
}

/// Meal variant with default thresholds
pub fn find_matching_saved_meal(new_items: &[FoodItem], saved_meals: &[SavedMeal]) -> Option<MealMatch> {
    find_matching_saved_meal_with(new_items, saved_meals, &MatchingConfig::default())
}

/// Best saved meal whose item signature overlaps the new entry's by at least
/// `meal_similarity_threshold`.
pub fn find_matching_saved_meal_with(
    new_items: &[FoodItem],
    saved_meals: &[SavedMeal],
    config: &MatchingConfig,
) -> Option<MealMatch> {
    let signature = food_signature(new_items);
    if signature.is_empty() {
        return None;
    }

    let (meal, similarity) = saved_meals
        .iter()
        .map(|m| (m, jaccard(&signature, &food_signature(&m.items))))
        .filter(|(_, sim)| *sim >= config.meal_similarity_threshold)
        .max_by(|(a, sa), (b, sb)| rank(*sa, &a.last_used_at, *sb, &b.last_used_at))?;

    Some(MealMatch {
        meal_id: meal.id.clone(),
        meal_name: meal.name.clone(),
        similarity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn routine(id: &str, keys: &[&str], last_used_day: Option<u32>) -> SavedRoutine {
        SavedRoutine {
            id: id.to_string(),
            name: format!("Routine {}", id),
            exercises: keys.iter().map(|k| ExerciseSet::new(*k, 3.0, 10.0, 100.0)).collect(),
            last_used_at: last_used_day.map(|d| Utc.with_ymd_and_hms(2026, 5, d, 8, 0, 0).unwrap()),
            use_count: 1,
        }
    }

    fn push_day() -> Vec<ExerciseSet> {
        vec![
            ExerciseSet::new("bench_press", 3.0, 10.0, 100.0),
            ExerciseSet::new("overhead_press", 3.0, 10.0, 100.0),
            ExerciseSet::new("dips", 3.0, 10.0, 100.0),
        ]
    }

    #[test]
    fn test_below_threshold_is_none() {
        // 1 shared of 5 keys
        let routines = vec![routine("a", &["bench_press", "squat", "deadlift"], Some(1))];
        assert!(find_matching_saved_routine(&push_day(), &routines).is_none());
        assert!(find_matching_saved_routine(&push_day(), &[]).is_none());
        assert!(find_matching_saved_routine(&[], &routines).is_none());
    }

    #[test]
    fn test_tie_prefers_recently_used() {
        let keys = ["bench_press", "overhead_press", "dips"];
        let routines = vec![
            routine("older", &keys, Some(2)),
            routine("newer", &keys, Some(20)),
            routine("never", &keys, None),
        ];
        let m = find_matching_saved_routine(&push_day(), &routines).unwrap();
        assert_eq!(m.routine_id, "newer");
        assert!((m.similarity - 1.0).abs() < f64::EPSILON);
        assert!(m.deltas.is_empty());
    }

    #[test]
    fn test_never_used_ranks_oldest() {
        let keys = ["bench_press", "overhead_press", "dips"];
        let routines = vec![routine("never", &keys, None), routine("used", &keys, Some(1))];
        let m = find_matching_saved_routine(&push_day(), &routines).unwrap();
        assert_eq!(m.routine_id, "used");
    }

    #[test]
    fn test_higher_similarity_beats_recency() {
        let routines = vec![
            routine("exact", &["bench_press", "overhead_press", "dips"], Some(1)),
            routine(
                "close",
                &["bench_press", "overhead_press", "dips", "lateral_raise"],
                Some(28),
            ),
        ];
        let m = find_matching_saved_routine(&push_day(), &routines).unwrap();
        assert_eq!(m.routine_id, "exact");
    }

    #[test]
    fn test_signed_deltas_omit_unchanged_fields() {
        let mut new = push_day();
        new[0].sets = 4.0;
        new[0].weight = 135.0;
        new[1].reps = 8.0;

        let routines = vec![routine("a", &["bench_press", "overhead_press", "dips"], Some(1))];
        let m = find_matching_saved_routine(&new, &routines).unwrap();

        assert_eq!(m.deltas.len(), 2);
        let bench = &m.deltas[0];
        assert_eq!(bench.exercise_key, "bench_press");
        assert_eq!(bench.sets, Some(1.0));
        assert_eq!(bench.reps, None);
        assert_eq!(bench.weight, Some(35.0));
        assert_eq!(bench.summary(), "+1 set, +35 lbs");

        let ohp = &m.deltas[1];
        assert_eq!(ohp.exercise_key, "overhead_press");
        assert_eq!(ohp.sets, None);
        assert_eq!(ohp.reps, Some(-2.0));
        assert_eq!(ohp.weight, None);
    }

    #[test]
    fn test_deltas_skip_exercises_not_in_routine() {
        let new = vec![
            ExerciseSet::new("bench_press", 3.0, 10.0, 100.0),
            ExerciseSet::new("curl", 3.0, 12.0, 30.0),
        ];
        let saved = vec![ExerciseSet::new("bench_press", 3.0, 10.0, 90.0)];
        let deltas = exercise_deltas(&new, &saved);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].weight, Some(10.0));
    }

    #[test]
    fn test_saved_meal_match() {
        let meals = vec![
            SavedMeal {
                id: "m1".to_string(),
                name: "Usual breakfast".to_string(),
                items: vec![FoodItem::new("scrambled eggs", 180.0), FoodItem::new("toast", 90.0)],
                ..Default::default()
            },
            SavedMeal {
                id: "m2".to_string(),
                name: "Lunch bowl".to_string(),
                items: vec![FoodItem::new("rice and beans", 500.0)],
                ..Default::default()
            },
        ];
        let new = vec![FoodItem::new("3 Scrambled Eggs", 270.0), FoodItem::new("toast", 90.0)];
        let m = find_matching_saved_meal(&new, &meals).unwrap();
        assert_eq!(m.meal_id, "m1");

        let other = vec![FoodItem::new("steak", 700.0)];
        assert!(find_matching_saved_meal(&other, &meals).is_none());
    }
}
