use crate::models::config::SimilarityThresholds;
use crate::models::{Canvas, Detection, NodeArena, NodeType};
use crate::services::cognitive::numbers::is_bar_status;
use crate::services::cognitive::similarity::{contains_ignore_case, matches_any, similarity};
use crate::services::vocabulary::Vocabulary;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static ID_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(ID|1D|ld)?\s*:?\s*\d{7,12}").unwrap());

static PURE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[KM]?$").unwrap());

static ALLIANCE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[|\[[^\]]*\]").unwrap());

static DATE_OR_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}:\d{2}|UTC|\d{2}/\d{2}").unwrap());

pub(crate) static COORDINATES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)X:?\s*(\d+).*Y:?\s*(\d+)").unwrap());

/// Which screen the detections came from. Selects the vocabulary the
/// classifier matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Profile,
    Report,
    Inventory,
}

/// Ordered rule cascade assigning one [`NodeType`] per detection.
///
/// Classification is a pure function of the text and the active vocabulary.
#[derive(Debug, Clone)]
pub struct Classifier {
    screen: ScreenKind,
    labels: Vec<(NodeType, Vec<String>)>,
    civilizations: Vec<String>,
    ui_fuzzy: Vec<String>,
    ui_substring: Vec<String>,
    thresholds: SimilarityThresholds,
}

impl Classifier {
    pub fn new(vocabulary: &Vocabulary, thresholds: &SimilarityThresholds, screen: ScreenKind) -> Self {
        let war = &vocabulary.war;

        let (labels, civilizations, ui_fuzzy, ui_substring) = match screen {
            ScreenKind::Report => {
                let mut status = war.victory.clone();
                status.extend(war.defeat.iter().cloned());

                let labels = vec![
                    (NodeType::UnitsLabel, war.units.clone()),
                    (NodeType::DeadLabel, war.dead.clone()),
                    (NodeType::SevereWoundedLabel, war.severely_wounded.clone()),
                    (NodeType::SlightlyWoundedLabel, war.slightly_wounded.clone()),
                    (NodeType::RemainingLabel, war.remaining.clone()),
                    (NodeType::HealedLabel, war.healed.clone()),
                    (NodeType::WatchtowerLabel, war.watchtower.clone()),
                    (NodeType::KillPointsLabel, war.kill_points.clone()),
                    (NodeType::StatusResult, status),
                ];

                let mut blacklist = war.global_blacklist.clone();
                blacklist.extend(war.ui_blacklist.iter().cloned());

                (labels, Vec::new(), Vec::new(), blacklist)
            }
            ScreenKind::Profile => {
                let fuzzy: Vec<String> = vocabulary
                    .ui_keywords
                    .iter()
                    .chain(&vocabulary.status_labels)
                    .chain(&vocabulary.governor_labels)
                    .chain(&vocabulary.alliance_labels)
                    .chain(&vocabulary.power_labels)
                    .chain(&vocabulary.kill_points_labels)
                    .chain(&vocabulary.civilization_labels)
                    .cloned()
                    .collect();

                (Vec::new(), vocabulary.civilizations.clone(), fuzzy, Vec::new())
            }
            ScreenKind::Inventory => (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
        };

        Self {
            screen,
            labels,
            civilizations,
            ui_fuzzy,
            ui_substring,
            thresholds: thresholds.clone(),
        }
    }

    pub fn screen(&self) -> ScreenKind {
        self.screen
    }

    /// First matching rule wins
    pub fn classify(&self, raw: &str) -> NodeType {
        let text = raw.trim();
        if text.is_empty() {
            return NodeType::Unknown;
        }

        if let Some(kind) = self.match_label(text) {
            return kind;
        }

        if is_bar_status(text) {
            return NodeType::BarStatus;
        }

        // Identifiers only live on the profile screen; elsewhere long runs are counts
        if self.screen == ScreenKind::Profile && ID_TOKEN.is_match(&text.replace(['l', 'I'], "1")) {
            return NodeType::Id;
        }

        if is_pure_number(text) {
            return NodeType::Number;
        }

        if self.is_civilization(text) {
            return NodeType::Civilization;
        }

        if ALLIANCE_TAG.is_match(text) {
            return NodeType::AllianceTagFragment;
        }

        if DATE_OR_TIME.is_match(text) || COORDINATES.is_match(text) {
            return NodeType::DateOrTime;
        }

        if self.is_ui_noise(text) {
            return NodeType::UiNoise;
        }

        NodeType::Unknown
    }

    /// Classify every detection into a fresh arena, in input order
    pub fn build_arena(&self, canvas: Canvas, detections: Vec<Detection>) -> NodeArena {
        let mut arena = NodeArena::new(canvas);
        self.extend_arena(&mut arena, detections);
        arena
    }

    /// Append newly acquired detections to an existing arena
    pub fn extend_arena(&self, arena: &mut NodeArena, detections: Vec<Detection>) {
        let mut counts: HashMap<NodeType, usize> = HashMap::new();
        for detection in detections {
            let kind = self.classify(&detection.text);
            *counts.entry(kind).or_default() += 1;
            arena.push(detection, kind);
        }

        debug!(screen = ?self.screen, total = arena.len(), ?counts, "Classified detections");
    }

    fn match_label(&self, text: &str) -> Option<NodeType> {
        self.labels
            .iter()
            .find(|(_, vocabulary)| matches_any(text, vocabulary, self.thresholds.label_match))
            .map(|(kind, _)| *kind)
    }

    fn is_civilization(&self, text: &str) -> bool {
        matches_any(text, &self.civilizations, self.thresholds.civilization)
    }

    fn is_ui_noise(&self, text: &str) -> bool {
        self.ui_substring.iter().any(|entry| contains_ignore_case(text, entry))
            || self
                .ui_fuzzy
                .iter()
                .any(|entry| similarity(text, entry) > self.thresholds.ui_keyword)
    }
}

fn is_pure_number(text: &str) -> bool {
    let clean: String = text
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | ' ' | '+'))
        .collect();
    PURE_NUMBER.is_match(&clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(screen: ScreenKind) -> Classifier {
        Classifier::new(&Vocabulary::builtin(), &SimilarityThresholds::default(), screen)
    }

    #[test]
    fn test_report_metric_labels_win_first() {
        let c = classifier(ScreenKind::Report);
        assert_eq!(c.classify("Dead"), NodeType::DeadLabel);
        assert_eq!(c.classify("Severely Wounded"), NodeType::SevereWoundedLabel);
        assert_eq!(c.classify("Remaning"), NodeType::RemainingLabel, "One dropped glyph still matches");
        assert_eq!(c.classify("Kill Points 1,200"), NodeType::KillPointsLabel, "Substring match beats number");
        assert_eq!(c.classify("Victory"), NodeType::StatusResult);
    }

    #[test]
    fn test_bar_status_and_numbers() {
        let c = classifier(ScreenKind::Inventory);
        assert_eq!(c.classify("875/1,000"), NodeType::BarStatus);
        assert_eq!(c.classify("1,234,567"), NodeType::Number);
        assert_eq!(c.classify("+350"), NodeType::Number);
        assert_eq!(c.classify("12K"), NodeType::Number);
        assert_eq!(c.classify("12 apples"), NodeType::Unknown);
    }

    #[test]
    fn test_profile_identifier_tolerates_confusions() {
        let c = classifier(ScreenKind::Profile);
        assert_eq!(c.classify("ID: 12345678"), NodeType::Id);
        assert_eq!(c.classify("(lD: l2345678)"), NodeType::Id);
        assert_eq!(c.classify("45,000,000"), NodeType::Number, "Grouped digits are not an identifier");
    }

    #[test]
    fn test_report_long_counts_stay_numbers() {
        let c = classifier(ScreenKind::Report);
        assert_eq!(c.classify("12345678"), NodeType::Number);
    }

    #[test]
    fn test_profile_civilization_and_ui() {
        let c = classifier(ScreenKind::Profile);
        assert_eq!(c.classify("Britain"), NodeType::Civilization);
        assert_eq!(c.classify("gChina"), NodeType::Civilization, "Containment catches leading noise");
        assert_eq!(c.classify("Power"), NodeType::UiNoise);
        assert_eq!(c.classify("Settings"), NodeType::UiNoise);
        assert_eq!(c.classify("Aethelred"), NodeType::Unknown);
    }

    #[test]
    fn test_tags_dates_and_blacklist() {
        let c = classifier(ScreenKind::Report);
        assert_eq!(c.classify("[ABC]Player"), NodeType::AllianceTagFragment);
        assert_eq!(c.classify("[ABC"), NodeType::AllianceTagFragment);
        assert_eq!(c.classify("12:45 UTC"), NodeType::DateOrTime);
        assert_eq!(c.classify("2024/05/12"), NodeType::DateOrTime);
        assert_eq!(c.classify("05/12 14:30"), NodeType::DateOrTime, "Short dates are not bars");
        assert_eq!(c.classify("X:512 Y:770"), NodeType::DateOrTime);
        assert_eq!(c.classify("Battle Report"), NodeType::UiNoise);
        assert_eq!(c.classify("   "), NodeType::Unknown);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier(ScreenKind::Report);
        for text in ["Dead 12", "[X]Y", "4,500", "Someone", "Morto", "UTC"] {
            assert_eq!(c.classify(text), c.classify(text), "Same text must classify identically: {}", text);
        }
    }

    #[test]
    fn test_build_arena_preserves_order() {
        let c = classifier(ScreenKind::Report);
        let arena = c.build_arena(
            Canvas::new(1000.0, 1000.0),
            vec![
                Detection::from_rect("Dead", 0.9, 10.0, 10.0, 50.0, 20.0),
                Detection::from_rect("1,200", 0.9, 80.0, 10.0, 50.0, 20.0),
            ],
        );

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.nodes()[0].kind, NodeType::DeadLabel);
        assert_eq!(arena.nodes()[1].kind, NodeType::Number);
    }
}
