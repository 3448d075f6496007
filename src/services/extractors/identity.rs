use super::{available, Extractor};
use crate::models::{Anchors, ClassifiedNode, ExtractionResult, NodeId, NodeType};
use crate::services::cognitive::numbers::parse_governor_id;
use crate::services::cognitive::similarity::contains_ignore_case;
use std::collections::HashSet;

/// Normalized height above which an identifier may appear
const UPPER_REGION: f64 = 0.55;
const MIN_ID: i64 = 1_000_000;
const MAX_ID: i64 = 2_000_000_000;

/// Governor identifier
#[derive(Debug, Clone, Copy, Default)]
pub struct IdExtractor;

impl Extractor for IdExtractor {
    type Output = i64;

    fn name(&self) -> &'static str {
        "id"
    }

    fn extract(&self, nodes: &[ClassifiedNode], _anchors: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<i64> {
        let typed = available(nodes, blacklist)
            .filter(|node| node.kind == NodeType::Id)
            .find_map(|node| parse_governor_id(node.text()).map(|id| (id, node.id)));

        if let Some((id, source)) = typed {
            return ExtractionResult::new(id, 95.0, Some(source));
        }

        let mut fallback: Vec<(i64, &ClassifiedNode)> = available(nodes, blacklist)
            .filter(|node| matches!(node.kind, NodeType::Unknown | NodeType::Number))
            .filter(|node| node.normalized_center().y < UPPER_REGION)
            .filter_map(|node| parse_governor_id(node.text()).map(|id| (id, node)))
            .filter(|(id, _)| *id > MIN_ID && *id < MAX_ID)
            .collect();

        // Stable sort keeps reading order among equals
        fallback.sort_by_key(|(_, node)| !contains_ignore_case(node.text(), "ID"));

        match fallback.first() {
            Some((id, node)) => ExtractionResult::new(*id, 70.0, Some(node.id)),
            None => ExtractionResult::absent(0),
        }
    }
}
