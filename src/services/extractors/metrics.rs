use super::Extractor;
use crate::models::report::Side;
use crate::models::{Anchors, ClassifiedNode, ExtractionResult, NodeId, NodeType};
use crate::services::cognitive::numbers::parse_metric;
use crate::services::cognitive::{Direction, TopologyIndex};
use std::collections::HashSet;

const VALUE_REACH: f64 = 0.45;

/// One ledger value (units, dead, healed, ...) of one report side.
///
/// The value is read inline from the label when it carries one, else from
/// the label's right-hand neighbour.
#[derive(Debug, Clone)]
pub struct MetricExtractor<'v> {
    side: Side,
    label: NodeType,
    min_y: f64,
    labels: &'v [String],
}

impl<'v> MetricExtractor<'v> {
    /// `labels` is every metric label string, stripped before parsing
    pub fn new(side: Side, label: NodeType, min_y: f64, labels: &'v [String]) -> Self {
        Self {
            side,
            label,
            min_y,
            labels,
        }
    }
}

impl Extractor for MetricExtractor<'_> {
    type Output = i64;

    fn name(&self) -> &'static str {
        "metric"
    }

    fn extract(&self, nodes: &[ClassifiedNode], _anchors: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<i64> {
        let index = TopologyIndex::new(nodes);
        let (min_x, max_x) = self.side.x_range();

        let Some(label) = index
            .region(min_x, max_x, self.min_y, 1.0)
            .into_iter()
            .find(|node| node.kind == self.label && !blacklist.contains(&node.id))
        else {
            return ExtractionResult::absent(0);
        };

        let inline = parse_metric(label.text(), self.labels);
        if inline > 1 {
            return ExtractionResult::new(inline, 90.0, Some(label.id));
        }

        match index.neighbor_excluding(label, Direction::Right, VALUE_REACH, blacklist) {
            Some(value_node) => {
                let value = parse_metric(value_node.text(), self.labels);
                let confidence = if value_node.kind == NodeType::Number { 90.0 } else { 70.0 };
                ExtractionResult::new(value, confidence, Some(value_node.id))
            }
            None => ExtractionResult::absent(0),
        }
    }
}
