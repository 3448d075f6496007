//! Field extractors: one typed value per call, read from classified nodes.
//!
//! Every extractor is pure given its inputs. The orchestrators wrap each call
//! in [`run_with_retry`] so a false-positive source node can be excluded and
//! the extraction re-run.

pub mod alliance;
pub mod civilization;
pub mod commander;
pub mod identity;
pub mod inventory;
pub mod metrics;
pub mod name;
pub mod pve;
pub mod side_name;
pub mod stats;

use crate::models::config::RetryPolicy;
use crate::models::{Anchors, ClassifiedNode, ExtractionResult, NodeId};
use std::collections::HashSet;
use tracing::debug;

pub use alliance::{AllianceExtractor, AllianceInfo};
pub use civilization::CivilizationExtractor;
pub use commander::CommanderExtractor;
pub use identity::IdExtractor;
pub use metrics::MetricExtractor;
pub use name::NameExtractor;
pub use pve::extract_pve;
pub use side_name::{GovernorNameExtractor, SideTagExtractor};
pub use stats::StatExtractor;

pub trait Extractor {
    type Output: Clone;

    fn name(&self) -> &'static str;

    /// Never reads a node in `blacklist`, never modifies it
    fn extract(
        &self,
        nodes: &[ClassifiedNode],
        anchors: &Anchors,
        blacklist: &HashSet<NodeId>,
    ) -> ExtractionResult<Self::Output>;
}

/// Bounded local retry around one extractor.
///
/// A result above `accept_confidence` returns at once. Otherwise its source
/// node joins a private copy of `used` and the extractor runs again, up to
/// `extractor_attempts` calls. The best result seen is returned; a result
/// without a source ends the loop since nothing is left to exclude.
pub fn run_with_retry<E: Extractor>(
    extractor: &E,
    nodes: &[ClassifiedNode],
    anchors: &Anchors,
    used: &HashSet<NodeId>,
    default: E::Output,
    policy: &RetryPolicy,
) -> ExtractionResult<E::Output> {
    let mut blacklist = used.clone();
    let mut best: Option<ExtractionResult<E::Output>> = None;

    for attempt in 1..=policy.extractor_attempts.max(1) {
        let result = extractor.extract(nodes, anchors, &blacklist);
        debug!(
            extractor = extractor.name(),
            attempt,
            confidence = result.confidence,
            source = ?result.source,
            "Extractor attempt"
        );

        if result.confidence > policy.accept_confidence {
            return result;
        }

        let source = result.source;
        if best.as_ref().map_or(true, |b| result.confidence > b.confidence) {
            best = Some(result);
        }

        match source {
            Some(id) => {
                blacklist.insert(id);
            }
            None => break,
        }
    }

    match best {
        Some(result) if result.confidence > 0.0 => result,
        _ => ExtractionResult::absent(default),
    }
}

/// Nodes not excluded by `blacklist`
pub(crate) fn available<'n>(
    nodes: &'n [ClassifiedNode],
    blacklist: &'n HashSet<NodeId>,
) -> impl Iterator<Item = &'n ClassifiedNode> + 'n {
    nodes.iter().filter(move |node| !blacklist.contains(&node.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Canvas, Detection, NodeArena, NodeType};
    use std::cell::RefCell;

    /// Hands back scripted results in order, recording each blacklist it saw
    struct Scripted {
        results: Vec<(f64, Option<NodeId>)>,
        calls: RefCell<Vec<HashSet<NodeId>>>,
    }

    impl Scripted {
        fn new(results: Vec<(f64, Option<NodeId>)>) -> Self {
            Self {
                results,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Extractor for Scripted {
        type Output = f64;

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn extract(&self, _: &[ClassifiedNode], _: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<f64> {
            let mut calls = self.calls.borrow_mut();
            let (confidence, source) = self.results[calls.len().min(self.results.len() - 1)];
            calls.push(blacklist.clone());
            ExtractionResult::new(confidence, confidence, source)
        }
    }

    fn nodes() -> NodeArena {
        let mut arena = NodeArena::new(Canvas::new(100.0, 100.0));
        for i in 0..3 {
            arena.push(Detection::from_rect("n", 0.9, i as f64, 0.0, 1.0, 1.0), NodeType::Unknown);
        }
        arena
    }

    #[test]
    fn test_retry_accepts_confident_first_attempt() {
        let arena = nodes();
        let scripted = Scripted::new(vec![(95.0, Some(NodeId(0)))]);

        let result = run_with_retry(&scripted, arena.nodes(), &Anchors::new(), &HashSet::new(), -1.0, &RetryPolicy::default());

        assert_eq!(result.confidence, 95.0);
        assert_eq!(scripted.calls.borrow().len(), 1, "No retry above the accept threshold");
    }

    #[test]
    fn test_retry_keeps_best_and_blacklists_sources() {
        let arena = nodes();
        let scripted = Scripted::new(vec![(70.0, Some(NodeId(0))), (40.0, Some(NodeId(1))), (65.0, Some(NodeId(2)))]);

        let result = run_with_retry(&scripted, arena.nodes(), &Anchors::new(), &HashSet::new(), -1.0, &RetryPolicy::default());

        assert_eq!(result.confidence, 70.0, "Best attempt wins, never a later worse one");
        assert_eq!(result.source, Some(NodeId(0)));

        let calls = scripted.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].contains(&NodeId(0)));
        assert!(calls[2].contains(&NodeId(0)) && calls[2].contains(&NodeId(1)));
    }

    #[test]
    fn test_retry_stops_without_source() {
        let arena = nodes();
        let scripted = Scripted::new(vec![(0.0, None), (90.0, Some(NodeId(1)))]);

        let result = run_with_retry(&scripted, arena.nodes(), &Anchors::new(), &HashSet::new(), -1.0, &RetryPolicy::default());

        assert_eq!(scripted.calls.borrow().len(), 1);
        assert_eq!(result.value, -1.0, "Zero confidence falls back to the default");
        assert!(result.source.is_none());
    }

    #[test]
    fn test_retry_does_not_touch_callers_set() {
        let arena = nodes();
        let used: HashSet<NodeId> = [NodeId(2)].into_iter().collect();
        let scripted = Scripted::new(vec![(50.0, Some(NodeId(0))), (50.0, Some(NodeId(1)))]);

        run_with_retry(&scripted, arena.nodes(), &Anchors::new(), &used, 0.0, &RetryPolicy::default());

        assert_eq!(used.len(), 1, "Caller's used set is untouched");
        assert!(scripted.calls.borrow()[0].contains(&NodeId(2)), "Used nodes are excluded from the start");
    }
}
