//! Text interpretation primitives: similarity, classification, layout queries
//! and numeric parsing.

pub mod classifier;
pub mod numbers;
pub mod similarity;
pub mod topology;

pub use classifier::{Classifier, ScreenKind};
pub use topology::{Direction, TopologyIndex};
