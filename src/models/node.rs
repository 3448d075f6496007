use super::detection::{clamp_fraction, Detection, Point};
use serde::{Deserialize, Serialize};

/// Semantic role assigned to a detection by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Unknown,
    Id,
    Number,
    UiNoise,
    Civilization,
    AllianceTagFragment,
    DateOrTime,
    BarStatus,
    UnitsLabel,
    DeadLabel,
    SevereWoundedLabel,
    SlightlyWoundedLabel,
    RemainingLabel,
    HealedLabel,
    WatchtowerLabel,
    KillPointsLabel,
    StatusResult,
}


/// Stable handle of a node inside a [`NodeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Pixel dimensions of the screen the detections were read from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    /// Zero or negative sides fall back to 1 so normalization never divides by zero.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: if width > 0.0 { width } else { 1.0 },
            height: if height > 0.0 { height } else { 1.0 },
        }
    }

    pub fn normalize(&self, point: Point) -> Point {
        Point::new(point.x / self.width, point.y / self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedNode {
    pub id: NodeId,
    pub detection: Detection,
    pub kind: NodeType,
    canvas: Canvas,
}

impl ClassifiedNode {
    pub fn text(&self) -> &str {
        &self.detection.text
    }

    pub fn confidence(&self) -> f64 {
        self.detection.confidence
    }

    pub fn center(&self) -> Point {
        self.detection.center()
    }

    pub fn normalized_center(&self) -> Point {
        self.canvas.normalize(self.center())
    }

    pub fn normalized_top_left(&self) -> Point {
        self.canvas.normalize(self.detection.top_left())
    }
}

/// Owns every classified node of one request.
///
/// Extractors hold `NodeId`s, never references into the arena, so a repair
/// pass can replace a node's reading in place without invalidating them.
#[derive(Debug, Clone)]
pub struct NodeArena {
    canvas: Canvas,
    nodes: Vec<ClassifiedNode>,
}

impl NodeArena {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            nodes: Vec::new(),
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn push(&mut self, detection: Detection, kind: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ClassifiedNode {
            id,
            detection,
            kind,
            canvas: self.canvas,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&ClassifiedNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[ClassifiedNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Replace the reading of an existing node after a successful re-scan.
    /// This is the only place a detection changes after classification.
    pub fn replace_reading(&mut self, id: NodeId, text: String, confidence: f64, kind: NodeType) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.detection.text = text;
                node.detection.confidence = clamp_fraction(confidence);
                node.kind = kind;
                true
            }
            None => false,
        }
    }
}
