//! Configuration management for Replog
//!
//! Loads matching thresholds and dismissal storage settings from a TOML
//! file at ~/.replog/config.toml

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (defaults to ~/.replog)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Similarity thresholds and scoring weights
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Save-as-template suggestion settings
    #[serde(default)]
    pub suggestions: SuggestionsConfig,

    /// Dismissal store settings
    #[serde(default)]
    pub dismissal: DismissalConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".replog"))
        .unwrap_or_else(|| PathBuf::from(".replog"))
}

fn default_true() -> bool {
    true
}

/// Thresholds used by the repeated-entry detectors and template matchers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum signature Jaccard for a past food entry to count as a repeat
    #[serde(default = "default_food_similarity")]
    pub food_similarity_threshold: f64,

    /// Maximum relative calorie difference between repeats (0.4 = 40%)
    #[serde(default = "default_calorie_tolerance")]
    pub calorie_tolerance: f64,

    /// Qualifying history entries needed before suggesting a template
    #[serde(default = "default_min_history_matches")]
    pub min_history_matches: usize,

    /// Minimum exercise-key Jaccard for a past workout to count as a repeat
    #[serde(default = "default_template_similarity")]
    pub exercise_similarity_threshold: f64,

    /// Minimum exercise-key Jaccard against a saved routine
    #[serde(default = "default_template_similarity")]
    pub routine_similarity_threshold: f64,

    /// Minimum signature Jaccard against a saved meal
    #[serde(default = "default_template_similarity")]
    pub meal_similarity_threshold: f64,

    /// Similarity bar per history-reference confidence tier
    #[serde(default)]
    pub tiers: TierThresholds,

    /// Hybrid score weighting
    #[serde(default)]
    pub hybrid: HybridConfig,
}

fn default_food_similarity() -> f64 {
    0.6
}

fn default_calorie_tolerance() -> f64 {
    0.4
}

fn default_min_history_matches() -> usize {
    2
}

fn default_template_similarity() -> f64 {
    0.7
}

impl Default for MatchingConfig {
    fn default() -> Self {
        MatchingConfig {
            food_similarity_threshold: default_food_similarity(),
            calorie_tolerance: default_calorie_tolerance(),
            min_history_matches: default_min_history_matches(),
            exercise_similarity_threshold: default_template_similarity(),
            routine_similarity_threshold: default_template_similarity(),
            meal_similarity_threshold: default_template_similarity(),
            tiers: TierThresholds::default(),
            hybrid: HybridConfig::default(),
        }
    }
}

/// Minimum hybrid score per confidence tier.
/// Strong evidence of a history reference tolerates a looser text match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_high_tier")]
    pub high: f64,
    #[serde(default = "default_medium_tier")]
    pub medium: f64,
    #[serde(default = "default_low_tier")]
    pub low: f64,
}

fn default_high_tier() -> f64 {
    0.3
}

fn default_medium_tier() -> f64 {
    0.5
}

fn default_low_tier() -> f64 {
    0.7
}

impl Default for TierThresholds {
    fn default() -> Self {
        TierThresholds {
            high: default_high_tier(),
            medium: default_medium_tier(),
            low: default_low_tier(),
        }
    }
}

/// Weights and fuzzy budget for `hybrid_score`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridConfig {
    /// Weight of candidate-in-target containment
    #[serde(default = "default_containment_weight")]
    pub containment_weight: f64,

    /// Weight of symmetric Jaccard overlap
    #[serde(default = "default_jaccard_weight")]
    pub jaccard_weight: f64,

    /// Edit distance tolerated for a fuzzy token hit
    #[serde(default = "default_max_edit_distance")]
    pub max_edit_distance: usize,

    /// Shorter words must match exactly
    #[serde(default = "default_min_fuzzy_len")]
    pub min_fuzzy_len: usize,
}

fn default_containment_weight() -> f64 {
    0.7
}

fn default_jaccard_weight() -> f64 {
    0.3
}

fn default_max_edit_distance() -> usize {
    1
}

fn default_min_fuzzy_len() -> usize {
    4
}

impl Default for HybridConfig {
    fn default() -> Self {
        HybridConfig {
            containment_weight: default_containment_weight(),
            jaccard_weight: default_jaccard_weight(),
            max_edit_distance: default_max_edit_distance(),
            min_fuzzy_len: default_min_fuzzy_len(),
        }
    }
}

/// Save-as-template suggestion toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsConfig {
    /// Whether save-as-meal/routine suggestions are offered at all
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        SuggestionsConfig { enabled: true }
    }
}

/// Dismissal storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Sqlite,
    Json,
    Memory,
}

impl std::str::FromStr for StorageKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "db" => Ok(StorageKind::Sqlite),
            "json" | "file" => Ok(StorageKind::Json),
            "memory" | "ephemeral" => Ok(StorageKind::Memory),
            other => Err(EngineError::Config(format!(
                "Unknown dismissal storage: {}",
                other
            ))),
        }
    }
}

/// Dismissal store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DismissalConfig {
    /// Where dismissed suggestion hashes are persisted
    #[serde(default = "default_storage")]
    pub storage: StorageKind,

    /// Dismissals after which the opt-out link is offered
    #[serde(default = "default_opt_out_threshold")]
    pub opt_out_threshold: u32,
}

fn default_storage() -> StorageKind {
    StorageKind::Sqlite
}

fn default_opt_out_threshold() -> u32 {
    3
}

impl Default for DismissalConfig {
    fn default() -> Self {
        DismissalConfig {
            storage: default_storage(),
            opt_out_threshold: default_opt_out_threshold(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            matching: MatchingConfig::default(),
            suggestions: SuggestionsConfig::default(),
            dismissal: DismissalConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(EngineError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file or use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Falling back to default config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".replog").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".replog/config.toml"))
    }

    /// Get the data directory, expanding ~ if present
    pub fn data_dir(&self) -> PathBuf {
        expand_path(&self.data_dir)
    }

    /// Reject threshold tables that would make the detectors misbehave
    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;
        let unit = [
            ("food_similarity_threshold", m.food_similarity_threshold),
            ("calorie_tolerance", m.calorie_tolerance),
            ("exercise_similarity_threshold", m.exercise_similarity_threshold),
            ("routine_similarity_threshold", m.routine_similarity_threshold),
            ("meal_similarity_threshold", m.meal_similarity_threshold),
            ("tiers.high", m.tiers.high),
            ("tiers.medium", m.tiers.medium),
            ("tiers.low", m.tiers.low),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Validation(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if !(m.tiers.high < m.tiers.medium && m.tiers.medium < m.tiers.low) {
            return Err(EngineError::Validation(format!(
                "tier thresholds must increase from high to low, got {} / {} / {}",
                m.tiers.high, m.tiers.medium, m.tiers.low
            )));
        }

        let weights = m.hybrid.containment_weight + m.hybrid.jaccard_weight;
        if m.hybrid.containment_weight < 0.0 || m.hybrid.jaccard_weight < 0.0 || weights <= 0.0
        {
            return Err(EngineError::Validation(
                "hybrid weights must be non-negative with a positive sum".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("REPLOG_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(storage) = std::env::var("REPLOG_DISMISSAL_STORAGE") {
            match storage.parse() {
                Ok(kind) => self.dismissal.storage = kind,
                Err(e) => tracing::warn!("Ignoring REPLOG_DISMISSAL_STORAGE: {}", e),
            }
        }
        if let Ok(enabled) = std::env::var("REPLOG_SUGGESTIONS_ENABLED") {
            self.suggestions.enabled = enabled == "true" || enabled == "1";
        }
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# Replog Configuration

# data_dir = "~/.replog"

[matching]
# Signature overlap needed for a past food entry to count as a repeat
food_similarity_threshold = 0.6
# Repeats must be within 40% of the new entry's calories
calorie_tolerance = 0.4
# Past repeats needed before suggesting "save as meal/routine"
min_history_matches = 2
exercise_similarity_threshold = 0.7
routine_similarity_threshold = 0.7
meal_similarity_threshold = 0.7

[matching.tiers]
# Minimum text match per history-reference confidence tier
high = 0.3
medium = 0.5
low = 0.7

[matching.hybrid]
containment_weight = 0.7
jaccard_weight = 0.3
max_edit_distance = 1
min_fuzzy_len = 4

[suggestions]
enabled = true

[dismissal]
# "sqlite", "json" or "memory"
storage = "sqlite"
opt_out_threshold = 3
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
