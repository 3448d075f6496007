use crate::models::geometry::Strategy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fuzzy matching cut-offs. Similarities are fractions in `[0, 1]`;
/// `commander_score` is on the 0-100 fuzzy scale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimilarityThresholds {
    pub label_match: f64,
    pub ui_keyword: f64,
    pub civilization: f64,
    pub name_ui_keyword: f64,
    pub duplicate_name: f64,
    pub item_title: f64,
    pub commander_score: u32,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            label_match: 0.85,
            ui_keyword: 0.82,
            civilization: 0.75,
            name_ui_keyword: 0.80,
            duplicate_name: 0.80,
            item_title: 0.85,
            commander_score: 83,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts per extractor call, each excluding the previous source node
    pub extractor_attempts: u32,
    /// Confidence (0-100) above which the first attempt is accepted outright
    pub accept_confidence: f64,
    pub repair_iterations: u32,
    pub profile_passes: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            extractor_attempts: 3,
            accept_confidence: 85.0,
            repair_iterations: 2,
            profile_passes: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepairPolicy {
    /// Number nodes read below this confidence are re-scanned
    pub number_confidence_floor: f64,
    pub strategies: Vec<Strategy>,
    /// Re-scanned readings below this confidence are ignored
    pub candidate_min_confidence: f64,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self {
            number_confidence_floor: 0.85,
            strategies: vec![
                Strategy::HighContrastBinary,
                Strategy::Sharpen,
                Strategy::InvertedBinary,
            ],
            candidate_min_confidence: 0.60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergePolicy {
    /// Confidence gap (0-100) within which the larger quantity wins
    pub confidence_tie_band: f64,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            confidence_tie_band: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognizerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: SimilarityThresholds,
    pub retry: RetryPolicy,
    pub repair: RepairPolicy,
    pub merge: MergePolicy,
    pub recognizer: RecognizerConfig,
    /// Directory holding `commanders.json` and `npcs.json`
    pub vocabulary_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        let t = &self.thresholds;
        let fractions = [
            ("label_match", t.label_match),
            ("ui_keyword", t.ui_keyword),
            ("civilization", t.civilization),
            ("name_ui_keyword", t.name_ui_keyword),
            ("duplicate_name", t.duplicate_name),
            ("item_title", t.item_title),
            ("number_confidence_floor", self.repair.number_confidence_floor),
            ("candidate_min_confidence", self.repair.candidate_min_confidence),
        ];

        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within 0.0-1.0, got {}", name, value));
            }
        }

        if t.commander_score > 100 {
            return Err(format!("commander_score must be within 0-100, got {}", t.commander_score));
        }

        if self.retry.extractor_attempts == 0 {
            return Err("extractor_attempts must be at least 1".to_string());
        }

        if self.retry.profile_passes == 0 {
            return Err("profile_passes must be at least 1".to_string());
        }

        if self.repair.strategies.is_empty() {
            return Err("At least one repair strategy is required".to_string());
        }

        if self.merge.confidence_tie_band < 0.0 {
            return Err("confidence_tie_band cannot be negative".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();

        assert_eq!(config.thresholds.label_match, 0.85);
        assert_eq!(config.thresholds.ui_keyword, 0.82);
        assert_eq!(config.thresholds.civilization, 0.75);
        assert_eq!(config.thresholds.commander_score, 83);

        assert_eq!(config.retry.extractor_attempts, 3);
        assert_eq!(config.retry.accept_confidence, 85.0);
        assert_eq!(config.retry.repair_iterations, 2);

        assert_eq!(config.repair.strategies.len(), 3);
        assert_eq!(config.merge.confidence_tie_band, 5.0);
        assert_eq!(config.recognizer.base_url, "http://127.0.0.1:8000");
        assert!(config.vocabulary_dir.is_none());

        assert!(config.validate().is_ok(), "Defaults must validate");
    }

    #[test]
    fn test_engine_config_serialization() {
        let config = EngineConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();

        let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_engine_config_partial_json_fills_defaults() {
        let json = r#"{ "thresholds": { "civilization": 0.7 }, "retry": { "repair_iterations": 1 } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.thresholds.civilization, 0.7);
        assert_eq!(config.thresholds.label_match, 0.85, "Unspecified fields keep defaults");
        assert_eq!(config.retry.repair_iterations, 1);
        assert_eq!(config.retry.extractor_attempts, 3);
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = EngineConfig::default();
        config.thresholds.ui_keyword = 1.3;

        let err = config.validate().unwrap_err();
        assert!(err.contains("ui_keyword"), "Error should name the field: {}", err);
    }

    #[test]
    fn test_validate_rejects_zero_attempts_and_empty_strategies() {
        let mut config = EngineConfig::default();
        config.retry.extractor_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.repair.strategies.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strategy_list_serialization() {
        let json = serde_json::to_string(&RepairPolicy::default().strategies).unwrap();
        assert_eq!(json, r#"["HighContrastBinary","Sharpen","InvertedBinary"]"#);
    }
}
