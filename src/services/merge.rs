use crate::models::config::MergePolicy;
use crate::models::inventory::InventoryItem;
use std::collections::HashMap;
use tracing::warn;

/// Folds observations of the same items taken from several screenshots
/// into one reading per item.
#[derive(Debug, Clone)]
pub struct ItemTracker {
    policy: MergePolicy,
    items: HashMap<String, InventoryItem>,
    warnings: Vec<String>,
}

impl ItemTracker {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            items: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn observe_all(&mut self, items: impl IntoIterator<Item = InventoryItem>) {
        for item in items {
            self.observe(item);
        }
    }

    pub fn observe(&mut self, incoming: InventoryItem) {
        let Some(current) = self.items.get(&incoming.item_id) else {
            self.items.insert(incoming.item_id.clone(), incoming);
            return;
        };

        // A pending entry yields to any resolved reading, never the reverse
        if current.is_pending() || incoming.is_pending() {
            if current.is_pending() && !incoming.is_pending() {
                self.items.insert(incoming.item_id.clone(), incoming);
            }
            return;
        }

        if current.quantity == incoming.quantity {
            if incoming.confidence > current.confidence {
                self.items.insert(incoming.item_id.clone(), incoming);
            }
            return;
        }

        let gap = (incoming.confidence - current.confidence).abs();
        let incoming_wins = if gap > self.policy.confidence_tie_band {
            incoming.confidence > current.confidence
        } else {
            // Occlusion undercounts, it never invents units
            incoming.quantity > current.quantity
        };

        let chosen = if incoming_wins { incoming.quantity } else { current.quantity };
        let message = format!(
            "[Item Conflict] '{}' diverged between images. Values: {} vs {}. System chose: {} (Conf: {:.1}% vs {:.1}%).",
            current.name, current.quantity, incoming.quantity, chosen, current.confidence, incoming.confidence
        );
        warn!(item = %current.item_id, "{}", message);
        self.warnings.push(message);

        if incoming_wins {
            self.items.insert(incoming.item_id.clone(), incoming);
        }
    }

    /// Merged items ordered by unit value, with the accumulated warnings
    pub fn finish(self) -> (Vec<InventoryItem>, Vec<String>) {
        let mut items: Vec<InventoryItem> = self.items.into_values().collect();
        items.sort_by(|a, b| a.unit_value.cmp(&b.unit_value).then_with(|| a.item_id.cmp(&b.item_id)));
        (items, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(quantity: i64, confidence: f64) -> InventoryItem {
        let mut item = InventoryItem::new("AP_100", "Basic Action Point Recovery", 100);
        item.quantity = quantity;
        item.confidence = confidence;
        item
    }

    fn merged(first: InventoryItem, second: InventoryItem) -> (i64, usize) {
        let mut tracker = ItemTracker::new(MergePolicy::default());
        tracker.observe(first);
        tracker.observe(second);
        let (items, warnings) = tracker.finish();
        (items[0].quantity, warnings.len())
    }

    #[test]
    fn test_close_confidence_prefers_larger_quantity() {
        assert_eq!(merged(reading(50, 90.0), reading(80, 94.0)), (80, 1));
        assert_eq!(merged(reading(80, 94.0), reading(50, 90.0)), (80, 1), "Order does not matter");
    }

    #[test]
    fn test_clear_confidence_gap_wins() {
        assert_eq!(merged(reading(50, 90.0), reading(80, 97.0)), (80, 1));
        assert_eq!(merged(reading(50, 97.0), reading(80, 90.0)), (50, 1));
    }

    #[test]
    fn test_equal_quantity_keeps_higher_confidence_silently() {
        let mut tracker = ItemTracker::new(MergePolicy::default());
        tracker.observe(reading(40, 80.0));
        tracker.observe(reading(40, 95.0));

        let (items, warnings) = tracker.finish();
        assert_eq!(items[0].confidence, 95.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_pending_is_replaced_but_never_replaces() {
        let pending = InventoryItem::new("AP_100", "Basic Action Point Recovery", 100);

        assert_eq!(merged(pending.clone(), reading(7, 50.0)), (7, 0));
        assert_eq!(merged(reading(7, 50.0), pending), (7, 0));
    }

    #[test]
    fn test_finish_sorts_by_unit_value() {
        let mut tracker = ItemTracker::new(MergePolicy::default());
        let mut big = InventoryItem::new("AP_1000", "Advanced Action Point Recovery", 1000);
        big.quantity = 1;
        let mut small = InventoryItem::new("AP_50", "Emergency Action Point Recovery", 50);
        small.quantity = 3;
        tracker.observe_all(vec![big, small, reading(2, 70.0)]);

        let (items, warnings) = tracker.finish();
        let ids: Vec<&str> = items.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["AP_50", "AP_100", "AP_1000"]);
        assert!(warnings.is_empty());
    }
}
