use super::recognizer::{BatchReading, Recognition, Recognizer, RecognizerError, RegionRequest};
use crate::models::config::RecognizerConfig;
use crate::models::{CropBox, Detection, Point, Strategy};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Boxes overlapping more than this are the same text read twice
const NMS_IOU_THRESHOLD: f64 = 0.3;

/// HTTP client for the Python OCR server
#[derive(Clone)]
pub struct HttpOcrClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    #[serde(rename = "imageBase64")]
    image_base64: &'a str,
}

#[derive(Serialize)]
struct RegionPayload<'a> {
    #[serde(rename = "imageBase64")]
    image_base64: &'a str,
    #[serde(rename = "box")]
    region: CropBox,
    strategy: Strategy,
}

#[derive(Serialize)]
struct BatchPayload<'a> {
    #[serde(rename = "imageBase64")]
    image_base64: &'a str,
    regions: &'a [RegionRequest],
}

/// Single text box, corners as `[[x, y], ...]`
#[derive(Deserialize, Clone, Debug)]
struct TextBox {
    #[serde(rename = "box", default)]
    bbox: Vec<Vec<f64>>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    conf: f64,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CanvasSize {
    width: f64,
    height: f64,
}

#[derive(Deserialize, Debug)]
struct Container {
    #[serde(default)]
    is_isolated: bool,
    canvas_size: Option<CanvasSize>,
}

#[derive(Deserialize, Debug)]
struct OcrResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    full_text: String,
    #[serde(default)]
    blocks: Vec<TextBox>,
    container: Option<Container>,
    detail: Option<String>,
}

#[derive(Deserialize, Debug)]
struct BatchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    results: Vec<BatchReading>,
}

impl TextBox {
    /// `None` when the box is too malformed to place on the canvas
    fn into_detection(self) -> Option<Detection> {
        let points: Vec<Point> = self
            .bbox
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| Point::new(p[0], p[1]))
            .collect();

        let quad = match points.len() {
            4 => [points[0], points[1], points[2], points[3]],
            n if n >= 2 => {
                let x_min = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
                let x_max = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
                let y_min = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
                let y_max = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
                [
                    Point::new(x_min, y_min),
                    Point::new(x_max, y_min),
                    Point::new(x_max, y_max),
                    Point::new(x_min, y_max),
                ]
            }
            _ => {
                debug!(text = %self.text, "Dropping text box without geometry");
                return None;
            }
        };

        let mut detection = Detection::new(self.text, self.conf, quad);
        detection.color = self.color.filter(|c| !c.is_empty() && c != "Unknown");
        Some(detection)
    }
}

/// Remove duplicate readings of the same text, keeping the larger box
/// whenever two overlap beyond `iou_threshold`.
pub fn filter_overlapping(detections: Vec<Detection>, iou_threshold: f64) -> Vec<Detection> {
    let mut remaining = detections;
    remaining.sort_by(|a, b| a.area().total_cmp(&b.area()));

    let mut kept = Vec::new();
    while let Some(current) = remaining.pop() {
        remaining.retain(|other| current.iou(other) <= iou_threshold);
        kept.push(current);
    }

    kept
}

fn to_detections(blocks: Vec<TextBox>) -> Vec<Detection> {
    let detections = blocks.into_iter().filter_map(TextBox::into_detection).collect();
    filter_overlapping(detections, NMS_IOU_THRESHOLD)
}

impl HttpOcrClient {
    pub fn new(config: &RecognizerConfig) -> Result<Self, RecognizerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check if server is healthy
    pub async fn health_check(&self) -> Result<(), RecognizerError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(RecognizerError::Unavailable(format!("Health check returned {}", response.status())));
        }
        Ok(())
    }

    /// PNG-encode the image as base64
    fn encode_image(image: &DynamicImage) -> Result<String, RecognizerError> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|e| RecognizerError::Encode(e.to_string()))?;
        Ok(general_purpose::STANDARD.encode(&buffer))
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R, RecognizerError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RecognizerError::Status {
                code: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| RecognizerError::Decode(e.to_string()))
    }

    fn check_success(response: &OcrResponse) -> Result<(), RecognizerError> {
        if response.success {
            return Ok(());
        }

        let detail = response.detail.clone().unwrap_or_else(|| "OCR server reported failure".to_string());
        warn!(detail = %detail, "OCR request unsuccessful");
        Err(RecognizerError::Unavailable(detail))
    }
}

#[async_trait]
impl Recognizer for HttpOcrClient {
    async fn recognize(&self, image: &DynamicImage) -> Result<Recognition, RecognizerError> {
        let encoded = Self::encode_image(image)?;
        let response: OcrResponse = self
            .post("/ocr/analyze", &ImageRequest { image_base64: &encoded })
            .await?;
        Self::check_success(&response)?;

        let (isolated, canvas) = match &response.container {
            Some(container) => (
                container.is_isolated,
                container.canvas_size.as_ref().map(|size| (size.width, size.height)),
            ),
            None => (false, None),
        };

        let detections = to_detections(response.blocks);
        debug!(count = detections.len(), isolated, "Full image recognized");

        Ok(Recognition {
            detections,
            full_text: response.full_text,
            canvas,
            isolated,
        })
    }

    async fn recognize_region(
        &self,
        image: &DynamicImage,
        region: CropBox,
        strategy: Strategy,
    ) -> Result<Vec<Detection>, RecognizerError> {
        let encoded = Self::encode_image(image)?;
        let payload = RegionPayload {
            image_base64: &encoded,
            region,
            strategy,
        };

        let response: OcrResponse = self.post("/ocr/region", &payload).await?;
        Self::check_success(&response)?;

        Ok(to_detections(response.blocks))
    }

    async fn recognize_batch(
        &self,
        image: &DynamicImage,
        regions: &[RegionRequest],
    ) -> Result<Vec<BatchReading>, RecognizerError> {
        if regions.is_empty() {
            return Ok(Vec::new());
        }

        let encoded = Self::encode_image(image)?;
        let response: BatchResponse = self
            .post(
                "/batch/process",
                &BatchPayload {
                    image_base64: &encoded,
                    regions,
                },
            )
            .await?;

        if !response.success {
            return Err(RecognizerError::Unavailable("Batch processing reported failure".to_string()));
        }

        Ok(response.results)
    }
}
