//! End-to-end readers for each supported screen.
//!
//! One [`Engine`] holds the read-only vocabulary, the configuration and the
//! recognizer. Every `analyze_*` call is independent and returns an
//! [`Analysis`](crate::models::Analysis); OCR trouble shows up as warnings,
//! never as an error.

pub mod inventory;
pub mod profile;
pub mod report;

use crate::models::config::EngineConfig;
use crate::models::Canvas;
use crate::services::cognitive::{Classifier, ScreenKind};
use crate::services::ocr::{Recognition, Recognizer};
use crate::services::reacquire::Reacquirer;
use crate::services::vocabulary::Vocabulary;
use image::DynamicImage;
use std::sync::Arc;

pub use profile::{interpret_profile, ProfileReading};
pub use report::{interpret_report, ReportReading};

pub struct Engine {
    config: EngineConfig,
    vocabulary: Arc<Vocabulary>,
    recognizer: Arc<dyn Recognizer>,
}

impl Engine {
    pub fn new(config: EngineConfig, vocabulary: Arc<Vocabulary>, recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            config,
            vocabulary,
            recognizer,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn classifier(&self, screen: ScreenKind) -> Classifier {
        Classifier::new(&self.vocabulary, &self.config.thresholds, screen)
    }

    fn reacquirer<'a>(&'a self, image: &'a DynamicImage) -> Reacquirer<'a> {
        Reacquirer::new(self.recognizer.as_ref(), image)
    }
}

/// Canvas of the reading: the isolated paper when the server cut one out,
/// else the full screenshot.
fn canvas_for(recognition: &Recognition, image: &DynamicImage) -> Canvas {
    match recognition.canvas {
        Some((width, height)) if width > 0.0 && height > 0.0 => Canvas::new(width, height),
        _ => Canvas::new(image.width() as f64, image.height() as f64),
    }
}
