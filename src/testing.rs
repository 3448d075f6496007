//! Scripted recognizer for unit tests.

use crate::models::{CropBox, Detection, Strategy};
use crate::services::ocr::{BatchReading, Recognition, Recognizer, RecognizerError, RegionRequest};
use async_trait::async_trait;
use image::DynamicImage;
use std::collections::VecDeque;
use std::sync::Mutex;

type RegionHandler = Box<dyn Fn(CropBox, Strategy) -> Vec<Detection> + Send + Sync>;
type BatchHandler = Box<dyn Fn(&RegionRequest) -> Option<(String, f64)> + Send + Sync>;

/// Replays queued full-image readings in call order; region and batch
/// calls are answered by handlers and recorded.
pub struct MockRecognizer {
    recognitions: Mutex<VecDeque<Result<Recognition, String>>>,
    region_handler: RegionHandler,
    batch_handler: BatchHandler,
    failing_strategies: Vec<Strategy>,
    batch_failure: Option<String>,
    region_calls: Mutex<Vec<(CropBox, Strategy)>>,
    batch_calls: Mutex<Vec<Vec<RegionRequest>>>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            recognitions: Mutex::new(VecDeque::new()),
            region_handler: Box::new(|_, _| Vec::new()),
            batch_handler: Box::new(|_| None),
            failing_strategies: Vec::new(),
            batch_failure: None,
            region_calls: Mutex::new(Vec::new()),
            batch_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_recognition(self, recognition: Recognition) -> Self {
        self.recognitions.lock().unwrap().push_back(Ok(recognition));
        self
    }

    /// The next full-image call fails as if the server were down
    pub fn with_failure(self, message: &str) -> Self {
        self.recognitions.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn with_region_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(CropBox, Strategy) -> Vec<Detection> + Send + Sync + 'static,
    {
        self.region_handler = Box::new(handler);
        self
    }

    pub fn with_batch_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RegionRequest) -> Option<(String, f64)> + Send + Sync + 'static,
    {
        self.batch_handler = Box::new(handler);
        self
    }

    /// Region calls with this strategy error out
    pub fn with_failing_strategy(mut self, strategy: Strategy) -> Self {
        self.failing_strategies.push(strategy);
        self
    }

    /// Every batch call errors out
    pub fn with_batch_failure(mut self, message: &str) -> Self {
        self.batch_failure = Some(message.to_string());
        self
    }

    pub fn region_calls(&self) -> Vec<(CropBox, Strategy)> {
        self.region_calls.lock().unwrap().clone()
    }

    pub fn batch_calls(&self) -> Vec<Vec<RegionRequest>> {
        self.batch_calls.lock().unwrap().clone()
    }
}

/// Recognition of a plain 1000x1000 screen
pub fn recognition(detections: Vec<Detection>) -> Recognition {
    Recognition {
        full_text: detections.iter().map(|d| d.text.as_str()).collect::<Vec<_>>().join("\n"),
        detections,
        canvas: Some((1000.0, 1000.0)),
        isolated: true,
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn recognize(&self, _image: &DynamicImage) -> Result<Recognition, RecognizerError> {
        match self.recognitions.lock().unwrap().pop_front() {
            Some(Ok(recognition)) => Ok(recognition),
            Some(Err(message)) => Err(RecognizerError::Unavailable(message)),
            None => Ok(Recognition::default()),
        }
    }

    async fn recognize_region(
        &self,
        _image: &DynamicImage,
        region: CropBox,
        strategy: Strategy,
    ) -> Result<Vec<Detection>, RecognizerError> {
        self.region_calls.lock().unwrap().push((region, strategy));
        if self.failing_strategies.contains(&strategy) {
            return Err(RecognizerError::Unavailable(format!("{} filter crashed", strategy)));
        }
        Ok((self.region_handler)(region, strategy))
    }

    async fn recognize_batch(
        &self,
        _image: &DynamicImage,
        regions: &[RegionRequest],
    ) -> Result<Vec<BatchReading>, RecognizerError> {
        self.batch_calls.lock().unwrap().push(regions.to_vec());
        if let Some(message) = &self.batch_failure {
            return Err(RecognizerError::Unavailable(message.clone()));
        }

        Ok(regions
            .iter()
            .filter_map(|request| {
                (self.batch_handler)(request).map(|(text, confidence)| BatchReading {
                    id: request.id.clone(),
                    text,
                    confidence,
                    strategy: request.strategy.to_string(),
                })
            })
            .collect())
    }
}
