use super::{available, Extractor};
use crate::models::{Anchor, Anchors, ClassifiedNode, ExtractionResult, NodeId, NodeType};
use crate::services::cognitive::numbers::parse_grouped;
use std::collections::HashSet;

/// Power and kill points below this are stray counts, not stats
const MIN_STAT: i64 = 1000;

/// Numeric stat read next to its label, e.g. power or kill points
#[derive(Debug, Clone, Copy)]
pub struct StatExtractor {
    anchor: Anchor,
    exclude_value: Option<i64>,
}

impl StatExtractor {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            exclude_value: None,
        }
    }

    /// Skip a value another stat already claimed
    pub fn excluding(mut self, value: i64) -> Self {
        self.exclude_value = Some(value);
        self
    }
}

impl Extractor for StatExtractor {
    type Output = i64;

    fn name(&self) -> &'static str {
        match self.anchor {
            Anchor::PowerLabel => "power",
            Anchor::KillPointsLabel => "kill_points",
            _ => "stat",
        }
    }

    fn extract(&self, nodes: &[ClassifiedNode], anchors: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<i64> {
        let Some(label) = anchors.node(self.anchor, nodes) else {
            return ExtractionResult::absent(0);
        };
        let origin = label.center();

        let winner = available(nodes, blacklist)
            .filter(|node| node.kind == NodeType::Number)
            .map(|node| (parse_grouped(node.text()), node))
            .filter(|(value, _)| Some(*value) != self.exclude_value)
            .filter(|(value, _)| *value > MIN_STAT)
            .min_by(|a, b| {
                origin
                    .distance(&a.1.center())
                    .total_cmp(&origin.distance(&b.1.center()))
            });

        match winner {
            Some((value, node)) => ExtractionResult::new(value, 85.0, Some(node.id)),
            None => ExtractionResult::absent(0),
        }
    }
}
