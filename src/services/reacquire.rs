//! Self-healing re-acquisition: crop a region around a weak or missing
//! reading and ask the recognizer to read it again with a denoising filter.

use crate::models::config::RepairPolicy;
use crate::models::inventory::InventoryItem;
use crate::models::{CropBox, Detection, NodeArena, NodeId, NodeType, Strategy};
use crate::services::cognitive::numbers::digits_only;
use crate::services::cognitive::Classifier;
use crate::services::extractors::inventory::round2;
use crate::services::ocr::{Recognizer, RecognizerError, RegionRequest};
use futures_util::future::join_all;
use image::DynamicImage;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static NUMERIC_READING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d.,]+$").unwrap());

/// Crops smaller than this on either side are not worth a call
const MIN_CROP_SIDE: u32 = 10;
const DEFAULT_UNIT_HEIGHT: f64 = 20.0;
/// Joined text of a hunt must reach this many characters to count as a hit
const MIN_HUNT_TEXT: usize = 3;

/// Profile fields that can be hunted for around their anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HuntField {
    Civilization,
    Power,
    Name,
}

impl HuntField {
    /// Search region as `(x, y, w, h)` relative to the anchor box, scaled by
    /// the pass-wide unit height
    fn region(&self, anchor: &Detection, unit: f64) -> (f64, f64, f64, f64) {
        let origin = anchor.top_left();
        let width = anchor.width();

        match self {
            HuntField::Civilization => (origin.x - 20.0, origin.y - unit * 0.75, width + unit * 40.0, unit * 15.0),
            HuntField::Power => (origin.x - 20.0, origin.y + unit * 0.5, width + unit * 15.0, unit * 15.0),
            HuntField::Name => (origin.x - unit * 7.5, origin.y + unit, width + unit * 25.0, unit * 15.0),
        }
    }

    fn strategies(&self) -> &'static [Strategy] {
        match self {
            HuntField::Civilization => &[Strategy::InvertedBinary, Strategy::Sharpen],
            HuntField::Power => &[Strategy::HighContrastBinary, Strategy::Sharpen],
            HuntField::Name => &[Strategy::Sharpen],
        }
    }
}

/// One field to hunt for, anchored at the detection it is laid out against
#[derive(Debug, Clone)]
pub struct FieldHunt {
    pub field: HuntField,
    pub anchor: Detection,
}

/// Raise a pending or weak item reading, never lower it.
///
/// Pending takes any reading; a larger quantity replaces a smaller one; an
/// equal quantity only lifts the confidence.
pub fn improve_quantity(item: &mut InventoryItem, quantity: i64, confidence: f64) -> bool {
    if item.is_pending() || quantity > item.quantity {
        item.quantity = quantity;
        item.confidence = confidence;
        return true;
    }

    if quantity == item.quantity && confidence > item.confidence {
        item.confidence = confidence;
        return true;
    }

    false
}

/// Issues re-scans against one screenshot
pub struct Reacquirer<'a> {
    recognizer: &'a dyn Recognizer,
    image: &'a DynamicImage,
}

impl<'a> Reacquirer<'a> {
    pub fn new(recognizer: &'a dyn Recognizer, image: &'a DynamicImage) -> Self {
        Self { recognizer, image }
    }

    fn clamp(&self, x: f64, y: f64, width: f64, height: f64) -> Option<CropBox> {
        CropBox::from_f64(x, y, width, height)
            .clamp_to(self.image.width(), self.image.height())
            .filter(|crop| crop.width > MIN_CROP_SIDE && crop.height > MIN_CROP_SIDE)
    }

    /// Run every hunt concurrently and wait for all of them.
    ///
    /// Each hunt tries its strategies in order and stops at the first one
    /// that reads enough text. Detections come back in canvas coordinates.
    pub async fn hunt_fields(&self, hunts: &[FieldHunt]) -> Vec<(HuntField, Result<Vec<Detection>, RecognizerError>)> {
        if hunts.is_empty() {
            return Vec::new();
        }

        let unit = median(hunts.iter().map(|hunt| hunt.anchor.height()));
        info!(hunts = hunts.len(), unit, "Dispatching field hunts");

        let results = join_all(hunts.iter().map(|hunt| self.hunt(hunt, unit))).await;

        hunts.iter().map(|hunt| hunt.field).zip(results).collect()
    }

    async fn hunt(&self, hunt: &FieldHunt, unit: f64) -> Result<Vec<Detection>, RecognizerError> {
        let (x, y, width, height) = hunt.field.region(&hunt.anchor, unit);
        let Some(crop) = self.clamp(x, y, width, height) else {
            debug!(field = ?hunt.field, "Hunt region falls off the canvas");
            return Ok(Vec::new());
        };

        let mut last_error = None;
        let mut failures_only = true;

        for strategy in hunt.field.strategies() {
            let detections = match self.recognizer.recognize_region(self.image, crop, *strategy).await {
                Ok(detections) => detections,
                Err(e) => {
                    warn!(field = ?hunt.field, %strategy, error = %e, "Hunt strategy failed");
                    last_error = Some(e);
                    continue;
                }
            };
            failures_only = false;
            let text = detections
                .iter()
                .map(|d| d.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            debug!(field = ?hunt.field, %strategy, text = %text.trim(), "Hunt reading");

            if !detections.is_empty() && text.trim().chars().count() >= MIN_HUNT_TEXT {
                return Ok(detections
                    .into_iter()
                    .map(|d| d.translated(crop.x as f64, crop.y as f64))
                    .collect());
            }
        }

        match last_error {
            Some(e) if failures_only => Err(e),
            _ => Ok(Vec::new()),
        }
    }

    /// Two re-scans below each pending item's value label, applied with
    /// [`improve_quantity`]. Returns how many items changed.
    pub async fn magnify_pending(&self, items: &mut [InventoryItem]) -> Result<usize, RecognizerError> {
        let targets: Vec<(usize, Detection)> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_pending())
            .filter_map(|(index, item)| item.anchor.clone().map(|anchor| (index, anchor)))
            .collect();

        if targets.is_empty() {
            return Ok(0);
        }

        let unit = median(targets.iter().map(|(_, anchor)| anchor.height()));
        let mut requests = Vec::new();

        for (index, anchor) in &targets {
            let center_x = anchor.center().x;
            let (_, _, _, bottom) = anchor.bounds();
            let crop_y = bottom - unit * 0.2;
            let crop_h = unit * 4.5;

            let wide = unit * 10.0;
            let shots = [
                ("wide", center_x - wide / 2.0, wide),
                ("right", center_x, unit * 6.0),
            ];

            for (shot, x, width) in shots {
                if let Some(crop) = self.clamp(x, crop_y, width, crop_h) {
                    requests.push(RegionRequest::new(format!("{}:{}", index, shot), crop, Strategy::WhiteIsolation));
                }
            }
        }

        info!(sub_tasks = requests.len(), items = targets.len(), "Magnifying pending items");
        let readings = self.recognizer.recognize_batch(self.image, &requests).await?;

        let mut changed = 0;
        for reading in readings {
            let Some(index) = correlation_index(&reading.id) else {
                continue;
            };
            let Some(item) = items.get_mut(index) else {
                continue;
            };

            let quantity = digits_only(&reading.text);
            if quantity <= 0 {
                continue;
            }

            // Short counts are easy to miss, so they get a lower bar
            let threshold = if quantity < 10 { 0.15 } else { 0.40 };
            if reading.confidence > threshold && improve_quantity(item, quantity, round2(reading.confidence * 100.0)) {
                debug!(item = %item.item_id, quantity, "Magnifier improved item");
                changed += 1;
            }
        }

        Ok(changed)
    }

    /// Re-read every weak number node with each repair strategy in one
    /// batch, then replace the readings that came back cleaner.
    pub async fn repair_numbers(
        &self,
        arena: &mut NodeArena,
        classifier: &Classifier,
        policy: &RepairPolicy,
    ) -> Result<usize, RecognizerError> {
        let targets: Vec<(NodeId, CropBox)> = arena
            .nodes()
            .iter()
            .filter(|node| node.kind == NodeType::Number && node.confidence() < policy.number_confidence_floor)
            .filter_map(|node| {
                let (x_min, y_min, x_max, y_max) = node.detection.bounds();
                let x = (x_min - 10.0).max(0.0);
                let y = (y_min - 8.0).max(0.0);
                let crop = CropBox::from_f64(x, y, x_max - x_min + 25.0, y_max - y_min + 16.0)
                    .clamp_to(self.image.width(), self.image.height())?;
                Some((node.id, crop))
            })
            .collect();

        if targets.is_empty() {
            return Ok(0);
        }

        let requests: Vec<RegionRequest> = targets
            .iter()
            .flat_map(|(id, crop)| {
                policy
                    .strategies
                    .iter()
                    .map(move |strategy| RegionRequest::new(format!("{}:{}", id.0, strategy), *crop, *strategy))
            })
            .collect();

        info!(sub_tasks = requests.len(), nodes = targets.len(), "Sending repair batch");
        let readings = self.recognizer.recognize_batch(self.image, &requests).await?;

        let mut best: HashMap<NodeId, (String, f64)> = HashMap::new();
        for reading in readings {
            let Some(id) = correlation_index(&reading.id).map(NodeId) else {
                continue;
            };
            let Some(node) = arena.get(id) else {
                continue;
            };

            let text = reading.text.trim();
            let numeric = NUMERIC_READING.is_match(text) && text.chars().any(|c| c.is_ascii_digit());
            if !numeric || reading.confidence <= policy.candidate_min_confidence || reading.confidence <= node.confidence() {
                continue;
            }

            let better = best.get(&id).map_or(true, |(_, conf)| reading.confidence > *conf);
            if better {
                best.insert(id, (text.to_string(), reading.confidence));
            }
        }

        let mut replaced = 0;
        for (id, (text, confidence)) in best {
            let old = arena.get(id).map(|node| node.text().to_string()).unwrap_or_default();
            let kind = classifier.classify(&text);
            if arena.replace_reading(id, text.clone(), confidence, kind) {
                info!(node = id.0, old = %old, new = %text, confidence, "Repaired number reading");
                replaced += 1;
            }
        }

        Ok(replaced)
    }
}

/// Index before the `:` of a correlation id such as `"12:Sharpen"`
fn correlation_index(id: &str) -> Option<usize> {
    id.split(':').next().and_then(|head| head.parse().ok())
}

/// Median of a set of box heights, the robust scale for crop geometry
fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.collect();
    if values.is_empty() {
        return DEFAULT_UNIT_HEIGHT;
    }
    values.sort_by(f64::total_cmp);
    values[values.len() / 2]
}
