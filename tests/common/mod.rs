//! Scripted recognizer shared by the integration tests.

use async_trait::async_trait;
use image::DynamicImage;
use rok_ocr_lib::models::{CropBox, Detection, Strategy};
use rok_ocr_lib::services::ocr::{BatchReading, Recognition, Recognizer, RecognizerError, RegionRequest};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Answers full-screen calls from a queue; re-scans read nothing
#[derive(Default)]
pub struct ScriptedRecognizer {
    screens: Mutex<VecDeque<Result<Recognition, String>>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(self, detections: Vec<Detection>) -> Self {
        let recognition = Recognition {
            full_text: detections.iter().map(|d| d.text.clone()).collect::<Vec<_>>().join("\n"),
            detections,
            canvas: Some((1000.0, 1000.0)),
            isolated: true,
        };
        self.screens.lock().unwrap().push_back(Ok(recognition));
        self
    }

    pub fn failure(self, message: &str) -> Self {
        self.screens.lock().unwrap().push_back(Err(message.to_string()));
        self
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn recognize(&self, _image: &DynamicImage) -> Result<Recognition, RecognizerError> {
        match self.screens.lock().unwrap().pop_front() {
            Some(Ok(recognition)) => Ok(recognition),
            Some(Err(message)) => Err(RecognizerError::Unavailable(message)),
            None => Ok(Recognition::default()),
        }
    }

    async fn recognize_region(
        &self,
        _image: &DynamicImage,
        _region: CropBox,
        _strategy: Strategy,
    ) -> Result<Vec<Detection>, RecognizerError> {
        Ok(Vec::new())
    }

    async fn recognize_batch(
        &self,
        _image: &DynamicImage,
        _regions: &[RegionRequest],
    ) -> Result<Vec<BatchReading>, RecognizerError> {
        Ok(Vec::new())
    }
}

pub fn blank_images(count: usize) -> Vec<DynamicImage> {
    (0..count).map(|_| DynamicImage::new_rgb8(1000, 1000)).collect()
}
