use super::{available, Extractor};
use crate::models::profile::UNSET;
use crate::models::{Anchor, Anchors, ClassifiedNode, ExtractionResult, NodeId, NodeType};
use crate::services::cognitive::numbers::digits_only;
use crate::services::cognitive::similarity::{contains_ignore_case, similarity};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static NAME_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s\-\[\]]").unwrap());

const BASE_SCORE: f64 = 100.0;
const REJECTED: f64 = -999.0;

// Pixel distances measured from the identifier's center
const MAX_ABOVE: f64 = 20.0;
const MAX_BELOW: f64 = 200.0;
const FAR_SIDEWAYS: f64 = 300.0;
const GOLDEN_BELOW: f64 = 120.0;
const GOLDEN_SIDEWAYS: f64 = 150.0;
const BAR_ROW: f64 = 30.0;
const BAR_SIDEWAYS: f64 = 450.0;

/// Governor name on the profile screen, located relative to the identifier
#[derive(Debug, Clone)]
pub struct NameExtractor<'v> {
    ui_keywords: &'v [String],
    ui_threshold: f64,
}

impl<'v> NameExtractor<'v> {
    pub fn new(ui_keywords: &'v [String], ui_threshold: f64) -> Self {
        Self {
            ui_keywords,
            ui_threshold,
        }
    }

    fn score(&self, candidate: &ClassifiedNode, id_anchor: &ClassifiedNode, id_value: i64, nodes: &[ClassifiedNode]) -> f64 {
        let center = candidate.center();
        let anchor = id_anchor.center();
        let dy = center.y - anchor.y;
        let dx = (center.x - anchor.x).abs();

        if !(-MAX_ABOVE..=MAX_BELOW).contains(&dy) {
            return REJECTED;
        }

        let mut score = BASE_SCORE;
        if dx > FAR_SIDEWAYS {
            score -= 50.0;
        }

        if id_value > 0 && candidate.text().contains(&id_value.to_string()) {
            return REJECTED;
        }

        if self.is_ui_keyword(candidate.text()) {
            return REJECTED;
        }

        let beside_bar = nodes.iter().any(|other| {
            other.kind == NodeType::BarStatus
                && (other.center().y - center.y).abs() < BAR_ROW
                && (other.center().x - center.x).abs() < BAR_SIDEWAYS
        });
        if beside_bar {
            return REJECTED;
        }

        if dy > 0.0 && dy < GOLDEN_BELOW && dx < GOLDEN_SIDEWAYS {
            score += 50.0;
        }

        score
    }

    fn is_ui_keyword(&self, text: &str) -> bool {
        self.ui_keywords
            .iter()
            .any(|key| similarity(text, key) > self.ui_threshold || contains_ignore_case(text, key))
    }
}

impl Extractor for NameExtractor<'_> {
    type Output = String;

    fn name(&self) -> &'static str {
        "name"
    }

    fn extract(&self, nodes: &[ClassifiedNode], anchors: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<String> {
        let Some(id_anchor) = anchors.node(Anchor::Id, nodes) else {
            return ExtractionResult::absent(UNSET.to_string());
        };
        let id_value = digits_only(id_anchor.text());

        let winner = available(nodes, blacklist)
            .filter(|node| node.id != id_anchor.id)
            .filter(|node| matches!(node.kind, NodeType::Unknown | NodeType::AllianceTagFragment))
            .filter(|node| node.text().chars().count() >= 3)
            .map(|node| (self.score(node, id_anchor, id_value, nodes), node))
            .filter(|(score, _)| *score > 0.0)
            .max_by(|a, b| a.0.total_cmp(&b.0));

        match winner {
            Some((score, node)) => {
                let cleaned = clean_name(node.text());
                if cleaned.is_empty() {
                    ExtractionResult::absent(UNSET.to_string())
                } else {
                    ExtractionResult::new(cleaned, score, Some(node.id))
                }
            }
            None => ExtractionResult::absent(UNSET.to_string()),
        }
    }
}

/// Drop punctuation OCR tends to hallucinate around names
pub(crate) fn clean_name(text: &str) -> String {
    NAME_NOISE.replace_all(text, "").trim().to_string()
}
