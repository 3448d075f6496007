use super::Extractor;
use crate::models::report::{CommanderEntry, Side};
use crate::models::{Anchors, ClassifiedNode, ExtractionResult, NodeId, NodeType};
use crate::services::cognitive::similarity::{fuzzy_score, normalize};
use crate::services::cognitive::{Direction, TopologyIndex};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

static LEVEL_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[LN]v\.?\s*\d+").unwrap());

static LEVEL_STRIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)([LN]v\.?|Nível)\s*\d+").unwrap());

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s*").unwrap());

const ZONE_Y: (f64, f64) = (0.05, 0.70);
const NEIGHBOR_REACH: f64 = 0.35;
const MAX_PER_SIDE: usize = 2;

/// Commanders (or NPC bosses) of one side, ordered top to bottom
#[derive(Debug, Clone)]
pub struct CommanderExtractor<'v> {
    side: Side,
    entries: &'v [CommanderEntry],
    min_score: u32,
}

impl<'v> CommanderExtractor<'v> {
    pub fn new(side: Side, entries: &'v [CommanderEntry], min_score: u32) -> Self {
        Self {
            side,
            entries,
            min_score,
        }
    }

    /// Best canonical entry for a reading, if any label clears the threshold
    pub fn match_entry(&self, raw: &str) -> Option<(&'v CommanderEntry, u32)> {
        let query = normalize(raw);
        if query.is_empty() {
            return None;
        }

        let needle = query.as_str();
        let best = self
            .entries
            .iter()
            .flat_map(|entry| entry.labels.iter().map(move |label| (entry, fuzzy_score(needle, &normalize(label)))))
            .max_by_key(|(_, score)| *score);

        debug!(input = raw, normalized = %query, best = ?best.map(|(e, s)| (&e.canonical_name, s)), "Commander lookup");

        best.filter(|(_, score)| *score >= self.min_score)
    }

    fn raw_name(&self, index: &TopologyIndex<'_>, anchor: &ClassifiedNode) -> String {
        let mut clean = LEVEL_STRIP.replace_all(anchor.text(), "").trim().to_string();

        if clean.is_empty() {
            if let Some(neighbor) = index.neighbor(anchor, Direction::Right, NEIGHBOR_REACH) {
                if neighbor.kind == NodeType::Unknown {
                    clean = neighbor.text().to_string();
                }
            }
        }

        LEADING_NUMBER.replace(&clean, "").trim().to_string()
    }
}

impl Extractor for CommanderExtractor<'_> {
    type Output = Vec<CommanderEntry>;

    fn name(&self) -> &'static str {
        "commander"
    }

    /// Confidence is the mean fuzzy score of the accepted matches
    fn extract(&self, nodes: &[ClassifiedNode], _anchors: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<Vec<CommanderEntry>> {
        if self.entries.is_empty() {
            return ExtractionResult::absent(Vec::new());
        }

        let index = TopologyIndex::new(nodes);
        let (min_x, max_x) = self.side.x_range();

        let mut found: Vec<(&CommanderEntry, u32, f64)> = index
            .region(min_x, max_x, ZONE_Y.0, ZONE_Y.1)
            .into_iter()
            .filter(|node| !blacklist.contains(&node.id))
            .filter(|node| node.kind != NodeType::UiNoise && LEVEL_TOKEN.is_match(node.text()))
            .filter_map(|anchor| {
                let raw = self.raw_name(&index, anchor);
                self.match_entry(&raw)
                    .map(|(entry, score)| (entry, score, anchor.normalized_center().y))
            })
            .collect();

        found.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut seen = HashSet::new();
        found.retain(|(entry, _, _)| seen.insert(entry.id.clone()));
        found.truncate(MAX_PER_SIDE);

        if found.is_empty() {
            return ExtractionResult::absent(Vec::new());
        }

        let confidence = found.iter().map(|(_, score, _)| *score as f64).sum::<f64>() / found.len() as f64;
        let entries = found.into_iter().map(|(entry, _, _)| entry.clone()).collect();

        ExtractionResult::new(entries, confidence, None)
    }
}
