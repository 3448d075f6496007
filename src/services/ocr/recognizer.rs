//! Interface to the external text recognizer.

use crate::models::{CropBox, Detection, Strategy};
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR server error ({code}): {body}")]
    Status { code: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Recognizer unavailable: {0}")]
    Unavailable(String),
}

/// Full-screen reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recognition {
    pub detections: Vec<Detection>,
    pub full_text: String,
    /// Size of the isolated paper when the server cropped one out
    pub canvas: Option<(f64, f64)>,
    pub isolated: bool,
}

/// One region of a batch re-scan, tagged with a caller-chosen id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRequest {
    pub id: String,
    #[serde(rename = "box")]
    pub region: CropBox,
    pub strategy: Strategy,
}

impl RegionRequest {
    pub fn new(id: impl Into<String>, region: CropBox, strategy: Strategy) -> Self {
        Self {
            id: id.into(),
            region,
            strategy,
        }
    }
}

/// Result of one region of a batch re-scan
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchReading {
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Fraction in `[0, 1]`
    #[serde(rename = "conf", default)]
    pub confidence: f64,
    #[serde(default)]
    pub strategy: String,
}

#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, image: &DynamicImage) -> Result<Recognition, RecognizerError>;

    /// Re-read one region. Detections come back in region-local pixels.
    async fn recognize_region(
        &self,
        image: &DynamicImage,
        region: CropBox,
        strategy: Strategy,
    ) -> Result<Vec<Detection>, RecognizerError>;

    async fn recognize_batch(
        &self,
        image: &DynamicImage,
        regions: &[RegionRequest],
    ) -> Result<Vec<BatchReading>, RecognizerError>;
}
