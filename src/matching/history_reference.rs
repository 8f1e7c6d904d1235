//! History-reference detection
//!
//! Decides whether a logged phrase points back at something logged before
//! ("same as yesterday", "the other half of the burrito") and how strong that
//! evidence is. Patterns live in a registry of (name, tier, matcher) entries;
//! tiers are scanned High → Medium → Low and the first tier with any hit wins.
//!
//! The tier then picks the similarity bar a historical candidate must clear:
//! strong evidence accepts a looser text match, weak evidence a stricter one.

use crate::config::{MatchingConfig, TierThresholds};
use crate::matching::normalize::extract_candidate_words;
use crate::matching::similarity::hybrid_score_with;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ============================================================================
// Types
// ============================================================================

/// Strength of the linguistic evidence for a history reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Scan order
    pub const ORDER: [ConfidenceTier; 3] =
        [ConfidenceTier::High, ConfidenceTier::Medium, ConfidenceTier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }

    /// Minimum similarity score for this tier
    pub fn threshold(&self, thresholds: &TierThresholds) -> f64 {
        match self {
            ConfidenceTier::High => thresholds.high,
            ConfidenceTier::Medium => thresholds.medium,
            ConfidenceTier::Low => thresholds.low,
        }
    }
}

/// Verdict of `detect_history_reference`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryReference {
    pub has_reference: bool,
    /// `None` when nothing matched
    pub confidence: Option<ConfidenceTier>,
    /// Every pattern that hit within the winning tier
    pub matched_patterns: Vec<&'static str>,
}

impl HistoryReference {
    fn none() -> Self {
        HistoryReference {
            has_reference: false,
            confidence: None,
            matched_patterns: Vec::new(),
        }
    }
}

/// A past entry the caller may auto-fill from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryCandidate {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub logged_at: Option<DateTime<Utc>>,
}

/// Best historical candidate for a history-referencing phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMatch {
    pub candidate_id: String,
    pub score: f64,
    pub confidence: ConfidenceTier,
    pub threshold: f64,
}

// ============================================================================
// Pattern registry
// ============================================================================

/// Returns true when a raw regex hit should be discarded
type RejectFn = fn(text: &str, hit: &regex::Captures) -> bool;

struct Pattern {
    name: &'static str,
    tier: ConfidenceTier,
    regex: Regex,
    reject: Option<RejectFn>,
}

impl Pattern {
    fn is_match(&self, text: &str) -> bool {
        match self.reject {
            None => self.regex.is_match(text),
            Some(reject) => self
                .regex
                .captures_iter(text)
                .any(|caps| !reject(text, &caps)),
        }
    }
}

const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";
const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december";
const MONTHS_SHORT: &str = "jan|feb|mar|apr|may|jun|jul|aug|sept|sep|oct|nov|dec";

/// Words that turn "1/2" into a portion instead of a date
const PORTION_UNITS: &[&str] = &[
    "cup", "cups", "c", "tbsp", "tablespoon", "tablespoons", "tsp", "teaspoon", "teaspoons",
    "oz", "ounce", "ounces", "lb", "lbs", "pound", "pounds", "g", "gram", "grams", "ml",
    "slice", "slices", "serving", "servings", "piece", "pieces", "portion", "can", "bar",
    "scoop", "scoops", "bowl", "plate", "of", "an", "a",
];

/// Bare "m/d" forms read as portions unless a date word precedes them
const COMMON_FRACTIONS: &[(u32, u32)] = &[(1, 2), (1, 3), (2, 3), (1, 4), (3, 4)];

const DATE_PREPOSITIONS: &[&str] = &["from", "on", "since"];

/// Reject "1/2 cup", "3/4 of", bare common fractions like "1/3", and impossible dates
fn reject_numeric_date(text: &str, caps: &regex::Captures) -> bool {
    let first: u32 = caps[1].parse().unwrap_or(0);
    let second: u32 = caps[2].parse().unwrap_or(0);
    if !(1..=12).contains(&first) || !(1..=31).contains(&second) {
        return true;
    }
    if caps.get(3).is_some() {
        // Explicit year: a date, whatever follows
        return false;
    }
    let (start, end) = caps
        .get(0)
        .map(|m| (m.start(), m.end()))
        .unwrap_or((0, text.len()));
    let next_word = text[end..]
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .unwrap_or("");
    if PORTION_UNITS.contains(&next_word) {
        return true;
    }
    let prev_word = text[..start]
        .rsplit(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .unwrap_or("");
    if DATE_PREPOSITIONS.contains(&prev_word) {
        return false;
    }
    COMMON_FRACTIONS.contains(&(first, second))
}

/// "earlier today" belongs to the Low tier, not "earlier"
fn reject_earlier_today(text: &str, caps: &regex::Captures) -> bool {
    let end = caps.get(0).map(|m| m.end()).unwrap_or(text.len());
    text[end..].trim_start().starts_with("today")
}

fn pattern(name: &'static str, tier: ConfidenceTier, re: &str) -> Pattern {
    Pattern {
        name,
        tier,
        regex: Regex::new(re).unwrap(),
        reject: None,
    }
}

fn pattern_with_reject(name: &'static str, tier: ConfidenceTier, re: &str, reject: RejectFn) -> Pattern {
    Pattern {
        reject: Some(reject),
        ..pattern(name, tier, re)
    }
}

static REGISTRY: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    use ConfidenceTier::*;

    vec![
        // High: explicit dates and portion continuation
        pattern("day_of_week", High, &format!(r"\b(?:{})(?:'s)?\b", WEEKDAYS)),
        pattern("yesterday", High, r"\byesterday(?:'s)?\b"),
        pattern("day_before_yesterday", High, r"\bday before yesterday\b"),
        pattern(
            "month_day",
            High,
            &format!(
                r"\b(?:{}|{})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?\b",
                MONTHS, MONTHS_SHORT
            ),
        ),
        pattern_with_reject(
            "numeric_date",
            High,
            r"\b(\d{1,2})/(\d{1,2})(/\d{2,4})?\b",
            reject_numeric_date,
        ),
        pattern("other_half", High, r"\bother half\b"),
        pattern("rest_of", High, r"\brest of\b"),
        pattern("leftover", High, r"\bleftovers?\b"),
        pattern("remaining", High, r"\bremaining\b"),
        pattern("finished", High, r"\bfinished\b"),
        // Medium: vague past and repetition cues
        pattern("the_other_day", Medium, r"\bthe other day\b"),
        pattern_with_reject("earlier", Medium, r"\bearlier\b", reject_earlier_today),
        pattern("recently", Medium, r"\brecently\b"),
        pattern("last_time", Medium, r"\blast time\b"),
        pattern("last_week", Medium, r"\blast week\b"),
        pattern(
            "days_ago",
            Medium,
            r"\b(?:a\s+)?(?:few|couple(?:\s+of)?|\d+|two|three|four|five)\s+days?\s+ago\b",
        ),
        pattern("a_while_ago", Medium, r"\ba while (?:ago|back)\b"),
        pattern("had_before", Medium, r"\b(?:had|ate|eaten|made)\b.*\bbefore\b"),
        pattern(
            "in_month",
            Medium,
            &format!(r"\b(?:back\s+)?in\s+(?:{}|{})\b", MONTHS, MONTHS_SHORT),
        ),
        pattern("same_thing", Medium, r"\bsame thing\b"),
        pattern("same_as", Medium, r"\bsame as\b"),
        pattern("that_again", Medium, r"\bthat again\b"),
        pattern("another", Medium, r"\banother(?:\s+one)?\b"),
        pattern("repeat", Medium, r"\brepeat(?:ed|ing)?\b"),
        pattern("more_of", Medium, r"\bmore of (?:the|that|those|my)\b"),
        // Low: could just say when a new food was eaten
        pattern("from_meal", Low, r"\bfrom (?:breakfast|lunch|dinner|brunch)\b"),
        pattern("this_morning", Low, r"\bthis morning\b"),
        pattern("earlier_today", Low, r"\bearlier today\b"),
        pattern("last_night", Low, r"\blast night\b"),
    ]
});

// ============================================================================
// Detection
// ============================================================================

/// Detect whether text implies a reference to a previously logged entry
pub fn detect_history_reference(text: &str) -> HistoryReference {
    let lower = text.to_lowercase();
    if lower.trim().is_empty() {
        return HistoryReference::none();
    }

    for tier in ConfidenceTier::ORDER {
        let matched: Vec<&'static str> = REGISTRY
            .iter()
            .filter(|p| p.tier == tier && p.is_match(&lower))
            .map(|p| p.name)
            .collect();

        if !matched.is_empty() {
            tracing::debug!(
                "History reference ({}) in {:?}: {:?}",
                tier.as_str(),
                text,
                matched
            );
            return HistoryReference {
                has_reference: true,
                confidence: Some(tier),
                matched_patterns: matched,
            };
        }
    }

    HistoryReference::none()
}

/// Minimum similarity for a tier using the default threshold table
pub fn similarity_threshold(tier: ConfidenceTier) -> f64 {
    tier.threshold(&TierThresholds::default())
}

/// Resolve a history-referencing phrase to the best past entry.
///
/// Returns `None` without a detected reference, without any describing
/// words left after removing history vocabulary, or when no candidate
/// clears the tier's threshold. Equal scores prefer the most recent entry.
pub fn find_history_match(
    text: &str,
    candidates: &[HistoryCandidate],
    config: &MatchingConfig,
) -> Option<HistoryMatch> {
    let reference = detect_history_reference(text);
    let tier = reference.confidence?;

    let words = extract_candidate_words(text);
    if words.is_empty() || candidates.is_empty() {
        return None;
    }

    let threshold = tier.threshold(&config.tiers);
    let best = candidates
        .iter()
        .map(|c| (c, hybrid_score_with(&words, &c.description, &config.hybrid)))
        .filter(|(_, score)| *score >= threshold)
        .max_by(|(a, sa), (b, sb)| {
            sa.total_cmp(sb).then_with(|| a.logged_at.cmp(&b.logged_at))
        })?;

    tracing::debug!(
        "History match {} (score {:.2} >= {:.2}, {})",
        best.0.id,
        best.1,
        threshold,
        tier.as_str()
    );

    Some(HistoryMatch {
        candidate_id: best.0.id.clone(),
        score: best.1,
        confidence: tier,
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tier_of(text: &str) -> Option<ConfidenceTier> {
        detect_history_reference(text).confidence
    }

    #[test]
    fn test_yesterday_is_high() {
        let r = detect_history_reference("the pizza from yesterday");
        assert!(r.has_reference);
        assert_eq!(r.confidence, Some(ConfidenceTier::High));
        assert_eq!(r.matched_patterns, vec!["yesterday"]);
    }

    #[test]
    fn test_another_is_medium() {
        assert_eq!(tier_of("another tilapia"), Some(ConfidenceTier::Medium));
        assert_eq!(tier_of("Another one please"), Some(ConfidenceTier::Medium));
    }

    #[test]
    fn test_from_breakfast_is_low() {
        assert_eq!(tier_of("from breakfast"), Some(ConfidenceTier::Low));
        assert_eq!(tier_of("toast last night"), Some(ConfidenceTier::Low));
    }

    #[test]
    fn test_plain_food_has_no_reference() {
        let r = detect_history_reference("2 eggs and toast");
        assert!(!r.has_reference);
        assert_eq!(r.confidence, None);
        assert!(r.matched_patterns.is_empty());
        assert!(!detect_history_reference("").has_reference);
    }

    #[test]
    fn test_high_dates() {
        assert_eq!(tier_of("Tuesday's chili"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("soup from Feb 1"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("same salad as January 15th"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("tacos on 2/1"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("stew 3/14/2024"), Some(ConfidenceTier::High));
    }

    #[test]
    fn test_fractions_are_not_dates() {
        assert!(!detect_history_reference("1/2 cup rice").has_reference);
        assert!(!detect_history_reference("3/4 of a bagel").has_reference);
        assert!(!detect_history_reference("ate 1/3 pizza").has_reference);
        assert!(!detect_history_reference("13/45 bars").has_reference);
        assert!(!detect_history_reference("tacos on 1/4 cup salsa").has_reference);
    }

    #[test]
    fn test_numeric_dates_with_small_day() {
        assert_eq!(tier_of("chili from 3/5"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("pasta from 2/6"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("tacos on 1/4"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("soup since 1/2"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("oatmeal 4/7"), Some(ConfidenceTier::High));
    }

    #[test]
    fn test_in_month_accepts_short_names() {
        assert_eq!(tier_of("that stew back in feb"), Some(ConfidenceTier::Medium));
        assert_eq!(tier_of("the roast in sept"), Some(ConfidenceTier::Medium));
        let reference = detect_history_reference("back in feb");
        assert_eq!(reference.matched_patterns, vec!["in_month"]);
    }

    #[test]
    fn test_portion_continuation_is_high() {
        assert_eq!(tier_of("the other half of the burrito"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("leftover lasagna"), Some(ConfidenceTier::High));
        assert_eq!(tier_of("rest of the cake"), Some(ConfidenceTier::High));
    }

    #[test]
    fn test_all_patterns_in_winning_tier_reported() {
        let r = detect_history_reference("leftovers from the day before yesterday");
        assert_eq!(r.confidence, Some(ConfidenceTier::High));
        assert!(r.matched_patterns.contains(&"leftover"));
        assert!(r.matched_patterns.contains(&"yesterday"));
        assert!(r.matched_patterns.contains(&"day_before_yesterday"));
    }

    #[test]
    fn test_higher_tier_wins_and_lower_not_reported() {
        // "another" (medium) and "from lunch" (low): medium wins alone
        let r = detect_history_reference("another sandwich from lunch");
        assert_eq!(r.confidence, Some(ConfidenceTier::Medium));
        assert_eq!(r.matched_patterns, vec!["another"]);
    }

    #[test]
    fn test_earlier_today_is_low_not_medium() {
        assert_eq!(tier_of("salad earlier today"), Some(ConfidenceTier::Low));
        assert_eq!(tier_of("the salad from earlier"), Some(ConfidenceTier::Medium));
    }

    #[test]
    fn test_medium_cues() {
        for text in [
            "the curry I had the other day",
            "same thing as last time",
            "couple days ago burger",
            "pasta I ate before",
            "back in march",
            "more of that soup",
            "repeat",
        ] {
            assert_eq!(tier_of(text), Some(ConfidenceTier::Medium), "{text}");
        }
    }

    #[test]
    fn test_thresholds_increase_from_high_to_low() {
        let high = similarity_threshold(ConfidenceTier::High);
        let medium = similarity_threshold(ConfidenceTier::Medium);
        let low = similarity_threshold(ConfidenceTier::Low);
        assert!(high < medium && medium < low);
    }

    fn candidate(id: &str, description: &str, day: u32) -> HistoryCandidate {
        HistoryCandidate {
            id: id.to_string(),
            description: description.to_string(),
            logged_at: Some(Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_find_history_match_picks_best() {
        let candidates = vec![
            candidate("1", "Pepperoni pizza, 2 slices", 1),
            candidate("2", "Caesar salad", 2),
        ];
        let m = find_history_match("the pizza from yesterday", &candidates, &MatchingConfig::default())
            .unwrap();
        assert_eq!(m.candidate_id, "1");
        assert_eq!(m.confidence, ConfidenceTier::High);
        assert!(m.score >= m.threshold);
    }

    #[test]
    fn test_find_history_match_tie_prefers_recent() {
        let candidates = vec![
            candidate("old", "leftover chili", 1),
            candidate("new", "leftover chili", 5),
        ];
        let m = find_history_match("leftover chili", &candidates, &MatchingConfig::default()).unwrap();
        assert_eq!(m.candidate_id, "new");
    }

    #[test]
    fn test_find_history_match_low_tier_is_strict() {
        // Only "toast" of "jam toast" is found: fine for high evidence, not for low
        let candidates = vec![candidate("1", "avocado toast with poached egg", 1)];
        let config = MatchingConfig::default();
        assert!(find_history_match("toast yesterday", &candidates, &config).is_some());
        assert!(find_history_match("toast with jam this morning", &candidates, &config).is_none());
    }

    #[test]
    fn test_find_history_match_requires_reference_and_words() {
        let candidates = vec![candidate("1", "pizza", 1)];
        let config = MatchingConfig::default();
        assert!(find_history_match("pizza", &candidates, &config).is_none());
        assert!(find_history_match("same as yesterday", &candidates, &config).is_none());
        assert!(find_history_match("pizza yesterday", &[], &config).is_none());
    }
}
