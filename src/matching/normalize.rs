//! Text normalization for food and exercise descriptions
//!
//! Turns free text into an order-independent token signature:
//! lowercase → multi-word abbreviations → punctuation → digits →
//! single-word abbreviations → stop words → alphabetical sort.
//!
//! Example: "2 tbsp PB on toast" → "butter peanut tablespoon toast"

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

/// Phrase abbreviations, replaced literally before punctuation is stripped.
/// Longer dotted forms come first so "fl. oz." is not half-consumed by "fl. oz".
const MULTI_WORD_ABBREVIATIONS: &[(&str, &str)] = &[
    ("fl. oz.", "fluid ounce"),
    ("fl. oz", "fluid ounce"),
    ("fl oz", "fluid ounce"),
    ("pb&j", "peanut butter jelly"),
    ("pb & j", "peanut butter jelly"),
    ("mac & cheese", "macaroni cheese"),
    ("mac n cheese", "macaroni cheese"),
    ("mac 'n cheese", "macaroni cheese"),
];

/// Whole-word abbreviations, applied once punctuation and digits are gone
const SINGLE_WORD_ABBREVIATIONS: &[(&str, &str)] = &[
    ("pb", "peanut butter"),
    ("pbj", "peanut butter jelly"),
    ("tbsp", "tablespoon"),
    ("tbs", "tablespoon"),
    ("tsp", "teaspoon"),
    ("oz", "ounce"),
    ("lb", "pound"),
    ("lbs", "pounds"),
    ("g", "gram"),
    ("ml", "milliliter"),
    ("pc", "piece"),
    ("pcs", "pieces"),
    ("med", "medium"),
    ("lg", "large"),
    ("sm", "small"),
    ("oj", "orange juice"),
    ("bbq", "barbecue"),
    ("choc", "chocolate"),
    ("w", "with"),
];

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "with", "of", "from", "and", "or", "in", "on", "at", "for", "to", "my",
    "our", "your", "his", "her", "their", "its", "s", "some",
];

/// Words that only say *when* or *that* something was eaten or done.
/// Removed by `extract_candidate_words` so a history reference compares
/// on what was eaten, not on "yesterday" or "leftover".
const HISTORY_VOCABULARY: &[&str] = &[
    // time
    "yesterday", "today", "tonight", "morning", "afternoon", "evening", "night", "day", "days",
    "week", "weeks", "month", "ago", "before", "earlier", "recently", "last", "while", "time",
    "few", "couple", "back", "when",
    // weekdays
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    // months
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
    // meals
    "breakfast", "lunch", "dinner", "brunch", "supper",
    // repetition and portions
    "another", "same", "again", "leftover", "leftovers", "rest", "remaining", "half", "other",
    "finished", "more", "repeat", "thing", "one", "that", "this", "those", "these", "as",
    // actions
    "had", "have", "ate", "eat", "eaten", "made", "make", "cooked", "just", "like", "did",
    "i", "we", "me",
];

static UNIT_EXPANSIONS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SINGLE_WORD_ABBREVIATIONS.iter().copied().collect());

static SINGLE_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = SINGLE_WORD_ABBREVIATIONS
        .iter()
        .map(|(abbr, _)| regex::escape(abbr))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b({})\b", alternation)).unwrap()
});

static PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

static HISTORY_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HISTORY_VOCABULARY.iter().copied().collect());

/// Normalized, alphabetically sorted token sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature(Vec<String>);

impl Signature {
    /// Build from tokens that are already normalized; only sorts them
    pub fn from_tokens(mut tokens: Vec<String>) -> Self {
        tokens.sort();
        Signature(tokens)
    }

    /// Read a previously rendered signature string without re-normalizing it
    pub fn parse(rendered: &str) -> Self {
        Self::from_tokens(rendered.split_whitespace().map(str::to_string).collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

/// Normalize free text into a comparable signature.
///
/// Deterministic and idempotent: normalizing a rendered signature yields it unchanged.
pub fn normalize(text: &str) -> Signature {
    let mut s = text.to_lowercase();

    for (phrase, expansion) in MULTI_WORD_ABBREVIATIONS {
        if s.contains(phrase) {
            s = s.replace(phrase, &format!(" {} ", expansion));
        }
    }

    let s = PUNCTUATION_RE.replace_all(&s, " ");
    // Digits go first so "5g" and "pb2" leave a bare abbreviation behind
    let s = DIGITS_RE.replace_all(&s, "");
    let s = SINGLE_WORD_RE.replace_all(&s, |caps: &regex::Captures| {
        UNIT_EXPANSIONS.get(&caps[1]).copied().unwrap_or("").to_string()
    });

    let tokens = s
        .split_whitespace()
        .filter(|t| !STOP_WORD_SET.contains(t))
        .map(str::to_string)
        .collect();

    Signature::from_tokens(tokens)
}

/// Signature over several fields at once (e.g. all item descriptions of an entry)
pub fn normalize_all<'a, I>(texts: I) -> Signature
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = texts.into_iter().collect::<Vec<_>>().join(" ");
    normalize(&joined)
}

/// Food/exercise-describing words of a history-referencing phrase.
///
/// Normalizes, then drops time, meal, repetition and action vocabulary.
/// Tokens are de-duplicated and keep signature order.
pub fn extract_candidate_words(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    normalize(text)
        .0
        .into_iter()
        .filter(|t| !HISTORY_WORD_SET.contains(t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
