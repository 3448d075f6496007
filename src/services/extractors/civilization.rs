use super::{available, Extractor};
use crate::models::profile::UNSET;
use crate::models::{Anchors, ClassifiedNode, ExtractionResult, NodeId, NodeType};
use crate::services::cognitive::similarity::{contains_ignore_case, similarity};
use std::collections::HashSet;

/// Civilization, mapped back to its canonical table spelling
#[derive(Debug, Clone)]
pub struct CivilizationExtractor<'v> {
    civilizations: &'v [String],
    threshold: f64,
}

impl<'v> CivilizationExtractor<'v> {
    pub fn new(civilizations: &'v [String], threshold: f64) -> Self {
        Self {
            civilizations,
            threshold,
        }
    }

    fn canonical(&self, text: &str) -> String {
        self.civilizations
            .iter()
            .find(|civ| similarity(text, civ) > self.threshold || contains_ignore_case(text, civ))
            .cloned()
            .unwrap_or_else(|| text.trim().to_string())
    }
}

impl Extractor for CivilizationExtractor<'_> {
    type Output = String;

    fn name(&self) -> &'static str {
        "civilization"
    }

    fn extract(&self, nodes: &[ClassifiedNode], _anchors: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<String> {
        match available(nodes, blacklist).find(|node| node.kind == NodeType::Civilization) {
            Some(node) => ExtractionResult::new(self.canonical(node.text()), 90.0, Some(node.id)),
            None => ExtractionResult::absent(UNSET.to_string()),
        }
    }
}
