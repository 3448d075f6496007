use super::node::{ClassifiedNode, NodeId};
use serde::Serialize;
use std::collections::HashMap;

/// Confidence above which an extraction counts as a success
pub const SUCCESS_CONFIDENCE: f64 = 60.0;

/// Typed value produced by an extractor.
///
/// `confidence` is on a 0-100 scale. `source` names the node the value was
/// read from, if any, so a retry can exclude it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult<T> {
    pub value: T,
    pub confidence: f64,
    pub source: Option<NodeId>,
}

impl<T> ExtractionResult<T> {
    pub fn new(value: T, confidence: f64, source: Option<NodeId>) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 100.0) };
        Self {
            value,
            confidence,
            source,
        }
    }

    /// Nothing found: the default value with zero confidence
    pub fn absent(value: T) -> Self {
        Self::new(value, 0.0, None)
    }

    pub fn is_success(&self) -> bool {
        self.confidence > SUCCESS_CONFIDENCE
    }
}

/// Fixed reference points extractors measure from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Id,
    PowerLabel,
    KillPointsLabel,
    AllianceLabel,
    CivilizationLabel,
}

#[derive(Debug, Clone, Default)]
pub struct Anchors {
    map: HashMap<Anchor, NodeId>,
}

impl Anchors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, anchor: Anchor, node: NodeId) {
        self.map.insert(anchor, node);
    }

    /// Resolve an anchor against the node slice it was built from
    pub fn node<'n>(&self, anchor: Anchor, nodes: &'n [ClassifiedNode]) -> Option<&'n ClassifiedNode> {
        self.map.get(&anchor).and_then(|id| nodes.get(id.0))
    }
}
