use super::{canvas_for, Engine};
use crate::models::inventory::{BarStatus, InventoryItem, InventoryKind, InventoryRecord};
use crate::models::profile::UNSET;
use crate::models::Analysis;
use crate::services::cognitive::ScreenKind;
use crate::services::extractors::inventory::{read_action_bar, ActionPointReader, ExperienceGridReader};
use crate::services::merge::ItemTracker;
use image::DynamicImage;
use tracing::{debug, error, info, warn};

/// Quantities at or below this repeat too often between books to call a ghost
const GHOST_MIN_QUANTITY: i64 = 150;

/// What one screenshot contributed
#[derive(Debug, Default)]
struct ImageReading {
    bar: Option<BarStatus>,
    items: Vec<InventoryItem>,
    warnings: Vec<String>,
}

/// Drop readings that copy a more confident sibling's large quantity.
///
/// The magnifier can read a neighbour's count into a pending book; the
/// neighbour keeps it and the copy is discarded.
fn discard_ghosts(items: Vec<InventoryItem>, warnings: &mut Vec<String>) -> Vec<InventoryItem> {
    let ghosts: Vec<bool> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            items.iter().enumerate().any(|(other_index, other)| {
                other_index != index
                    && other.quantity == item.quantity
                    && other.quantity > GHOST_MIN_QUANTITY
                    && other.confidence > item.confidence
            })
        })
        .collect();

    items
        .into_iter()
        .zip(ghosts)
        .filter_map(|(item, ghost)| {
            if ghost {
                warnings.push(format!(
                    "[Sanity Check] Discarded {} with value {} because it duplicates a higher confidence neighbor (Ghost Read).",
                    item.item_id, item.quantity
                ));
                None
            } else {
                Some(item)
            }
        })
        .collect()
}

fn mean_confidence(items: &[InventoryItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().map(|item| item.confidence).sum::<f64>() / items.len() as f64
}

impl Engine {
    /// Merge action point bar and recovery items over several screenshots
    pub async fn analyze_action_points(&self, images: &[DynamicImage]) -> Analysis<InventoryRecord> {
        self.analyze_inventory(images, InventoryKind::ActionPoints).await
    }

    /// Merge experience book counts over several screenshots
    pub async fn analyze_experience(&self, images: &[DynamicImage]) -> Analysis<InventoryRecord> {
        self.analyze_inventory(images, InventoryKind::Experience).await
    }

    /// Images are processed one after another. A failing image becomes a
    /// warning and the rest of the batch still counts.
    async fn analyze_inventory(&self, images: &[DynamicImage], kind: InventoryKind) -> Analysis<InventoryRecord> {
        let mut tracker = ItemTracker::new(self.config.merge.clone());
        let mut bar: Option<BarStatus> = None;
        let mut warnings = Vec::new();

        for (index, image) in images.iter().enumerate() {
            let number = index + 1;

            let reading = match self.read_inventory_image(image, number, kind).await {
                Ok(reading) => reading,
                Err(e) => {
                    error!(image = number, error = %e, "Failed to process inventory image");
                    warnings.push(format!("[System Error] Failed to process image {}: {}", number, e));
                    continue;
                }
            };

            warnings.extend(reading.warnings);

            if let Some(new) = reading.bar {
                match bar {
                    None => bar = Some(new),
                    Some(previous) if previous != new => {
                        warn!(image = number, "Action point bar diverged");
                        warnings.push(format!(
                            "[AP Bar] Divergence detected in image {}. Previous: {}/{}, New: {}/{}. Kept previous value.",
                            number, previous.current, previous.max, new.current, new.max
                        ));
                    }
                    Some(_) => {}
                }
            }

            tracker.observe_all(reading.items);
        }

        let (items, conflicts) = tracker.finish();
        warnings.extend(conflicts);

        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            if item.is_pending() {
                warnings.push(format!(
                    "[Ignored] Could not read quantity for {} (Color: {}).",
                    item.item_id,
                    item.color.as_deref().unwrap_or(UNSET)
                ));
            } else {
                resolved.push(item);
            }
        }

        let record = InventoryRecord { bar, items: resolved };
        info!(
            ?kind,
            images = images.len(),
            items = record.items.len(),
            total = record.grand_total(),
            warnings = warnings.len(),
            "Inventory merged"
        );

        let confidence = mean_confidence(&record.items);
        Analysis::new(record, warnings, confidence)
    }

    async fn read_inventory_image(
        &self,
        image: &DynamicImage,
        number: usize,
        kind: InventoryKind,
    ) -> Result<ImageReading, String> {
        let recognition = self.recognizer.recognize(image).await.map_err(|e| e.to_string())?;
        if recognition.detections.is_empty() {
            debug!(image = number, "No text on inventory image");
            return Ok(ImageReading::default());
        }

        let classifier = self.classifier(ScreenKind::Inventory);
        let arena = classifier.build_arena(canvas_for(&recognition, image), recognition.detections);
        let vocabulary = &self.vocabulary;
        let mut reading = ImageReading::default();

        match kind {
            InventoryKind::ActionPoints => {
                let reader = ActionPointReader::new(
                    &vocabulary.action_point_items,
                    &vocabulary.ownership_keywords,
                    self.config.thresholds.item_title,
                )?;
                reading.bar = read_action_bar(arena.nodes());
                reading.items = reader.read(arena.nodes());
            }
            InventoryKind::Experience => {
                let mut items = ExperienceGridReader::new(&vocabulary.experience_books).read(arena.nodes());

                if items.iter().any(InventoryItem::is_pending) {
                    match self.reacquirer(image).magnify_pending(&mut items).await {
                        Ok(changed) => debug!(image = number, changed, "Magnifier pass done"),
                        Err(e) => {
                            warn!(image = number, error = %e, "Magnifier failed");
                            reading
                                .warnings
                                .push(format!("[Re-acquisition] Magnifier failed on image {}: {}", number, e));
                        }
                    }
                }

                reading.items = discard_ghosts(items, &mut reading.warnings);
            }
        }

        debug!(image = number, items = reading.items.len(), bar = ?reading.bar, "Inventory image read");
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::EngineConfig;
    use crate::models::Detection;
    use crate::services::vocabulary::Vocabulary;
    use crate::testing::{recognition, MockRecognizer};
    use std::sync::Arc;

    fn engine(mock: MockRecognizer) -> (Engine, Arc<MockRecognizer>) {
        let mock = Arc::new(mock);
        let engine = Engine::new(EngineConfig::default(), Arc::new(Vocabulary::builtin()), mock.clone());
        (engine, mock)
    }

    fn images(count: usize) -> Vec<DynamicImage> {
        (0..count).map(|_| DynamicImage::new_rgb8(1000, 1000)).collect()
    }

    fn book(text: &str, x: f64, y: f64, color: &str) -> Detection {
        Detection::from_rect(text, 0.9, x, y, 60.0, 20.0).with_color(color)
    }

    fn xp(item_id: &str, quantity: i64, confidence: f64) -> InventoryItem {
        let mut item = InventoryItem::new(item_id, item_id, 1000);
        item.quantity = quantity;
        item.confidence = confidence;
        item
    }

    #[test]
    fn test_discard_ghosts() {
        let mut warnings = Vec::new();
        let items = vec![xp("XP_1000", 1092, 92.0), xp("XP_5000", 1092, 70.0), xp("XP_100", 3, 90.0), xp("XP_500", 3, 50.0)];

        let kept = discard_ghosts(items, &mut warnings);
        let ids: Vec<&str> = kept.iter().map(|i| i.item_id.as_str()).collect();

        assert_eq!(ids, vec!["XP_1000", "XP_100", "XP_500"], "Small repeated counts are legitimate");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("XP_5000") && warnings[0].contains("Ghost Read"));
    }

    #[test]
    fn test_mean_confidence() {
        assert_eq!(mean_confidence(&[]), 0.0);
        assert_eq!(mean_confidence(&[xp("a", 1, 80.0), xp("b", 2, 90.0)]), 85.0);
    }

    #[tokio::test]
    async fn test_action_points_merge_and_bar_divergence() {
        let first = recognition(vec![
            Detection::from_rect("875/1,000", 0.9, 400.0, 40.0, 80.0, 20.0),
            Detection::from_rect("Basic Action Point Recovery", 0.96, 300.0, 200.0, 300.0, 20.0),
            Detection::from_rect("Owned: 1,250", 0.90, 320.0, 240.0, 120.0, 20.0),
        ]);
        let second = recognition(vec![
            Detection::from_rect("900/1,000", 0.9, 400.0, 40.0, 80.0, 20.0),
            Detection::from_rect("Basic Action Point Recovery", 0.96, 300.0, 200.0, 300.0, 20.0),
            Detection::from_rect("Owned: 1,250", 0.94, 320.0, 240.0, 120.0, 20.0),
            Detection::from_rect("Advanced Action Point Recovery", 0.95, 300.0, 400.0, 300.0, 20.0),
            Detection::from_rect("Owned: 7", 0.90, 320.0, 440.0, 80.0, 20.0),
        ]);
        let (engine, _) = engine(MockRecognizer::new().with_recognition(first).with_recognition(second));

        let analysis = engine.analyze_action_points(&images(2)).await;
        let record = &analysis.record;

        assert_eq!(record.bar, Some(BarStatus { current: 875, max: 1000 }), "First bar reading is kept");
        assert_eq!(analysis.warnings.len(), 1, "Warnings: {:?}", analysis.warnings);
        assert!(analysis.warnings[0].contains("image 2"));

        let ids: Vec<&str> = record.items.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["AP_100", "AP_1000"], "Sorted by unit value");
        assert_eq!(record.items[0].confidence, 95.0, "Equal counts keep the more confident reading");
        assert_eq!(record.grand_total(), 1250 * 100 + 7 * 1000);
    }

    #[tokio::test]
    async fn test_experience_magnifier_resolves_pending_book() {
        let screen = recognition(vec![
            book("1,000", 100.0, 100.0, "Purple"),
            Detection::from_rect("37", 0.8, 105.0, 160.0, 30.0, 20.0),
            book("10,000", 300.0, 100.0, "Gold"),
        ]);
        let mock = MockRecognizer::new()
            .with_recognition(screen)
            .with_batch_handler(|_| Some(("42".to_string(), 0.9)));
        let (engine, mock) = engine(mock);

        let analysis = engine.analyze_experience(&images(1)).await;

        let ten_thousand = analysis.record.items.iter().find(|i| i.item_id == "XP_10000").unwrap();
        assert_eq!(ten_thousand.quantity, 42);
        assert_eq!(ten_thousand.confidence, 90.0);
        assert_eq!(mock.batch_calls().len(), 1, "All pending books go out in one batch");
        assert_eq!(mock.batch_calls()[0].len(), 2, "Two shots per pending book");
        assert!(analysis.warnings.is_empty(), "Warnings: {:?}", analysis.warnings);
        assert_eq!(analysis.record.grand_total(), 37 * 1000 + 42 * 10000);
    }

    #[tokio::test]
    async fn test_experience_unresolved_book_is_ignored() {
        let screen = recognition(vec![book("10,000", 300.0, 100.0, "Gold")]);
        let (engine, _) = engine(MockRecognizer::new().with_recognition(screen));

        let analysis = engine.analyze_experience(&images(1)).await;

        assert!(analysis.record.items.is_empty());
        assert_eq!(analysis.warnings, vec!["[Ignored] Could not read quantity for XP_10000 (Color: Gold).".to_string()]);
        assert_eq!(analysis.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_pending_in_one_image_resolved_by_another() {
        let pending = recognition(vec![book("10,000", 300.0, 100.0, "Gold")]);
        let resolved = recognition(vec![
            book("10,000", 300.0, 100.0, "Gold"),
            Detection::from_rect("5", 0.9, 310.0, 160.0, 20.0, 20.0),
        ]);
        let (engine, _) = engine(MockRecognizer::new().with_recognition(pending).with_recognition(resolved));

        let analysis = engine.analyze_experience(&images(2)).await;

        assert_eq!(analysis.record.items.len(), 1);
        assert_eq!(analysis.record.items[0].quantity, 5);
        assert!(analysis.warnings.is_empty(), "Warnings: {:?}", analysis.warnings);
    }
}
