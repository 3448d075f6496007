pub mod analysis;
pub mod config;
pub mod detection;
pub mod extraction;
pub mod geometry;
pub mod inventory;
pub mod node;
pub mod profile;
pub mod report;

pub use analysis::Analysis;
pub use detection::{Detection, Point};
pub use extraction::{Anchor, Anchors, ExtractionResult};
pub use geometry::{CropBox, Strategy};
pub use node::{Canvas, ClassifiedNode, NodeArena, NodeId, NodeType};
