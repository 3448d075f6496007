use super::detection::Detection;
use serde::{Deserialize, Serialize};

/// Quantity of an item whose count has not been read yet
pub const PENDING_QUANTITY: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryKind {
    ActionPoints,
    Experience,
}

/// `current / max` reading of a status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarStatus {
    pub current: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_id: String,
    pub name: String,
    pub unit_value: i64,
    pub quantity: i64,
    /// 0-100 scale
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Detection the item was located from; kept for re-scans only
    #[serde(skip)]
    pub anchor: Option<Detection>,
}

impl InventoryItem {
    pub fn new(item_id: impl Into<String>, name: impl Into<String>, unit_value: i64) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            unit_value,
            quantity: PENDING_QUANTITY,
            confidence: 0.0,
            color: None,
            anchor: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.quantity < 0
    }

    /// Pending items contribute nothing
    pub fn total_value(&self) -> i64 {
        if self.is_pending() {
            0
        } else {
            self.quantity * self.unit_value
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub bar: Option<BarStatus>,
    pub items: Vec<InventoryItem>,
}

impl InventoryRecord {
    /// Always summed from the current items
    pub fn grand_total(&self) -> i64 {
        self.items.iter().map(InventoryItem::total_value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_defaults_to_pending() {
        let item = InventoryItem::new("XP_1000", "Tome of Knowledge", 1000);
        assert!(item.is_pending());
        assert_eq!(item.total_value(), 0, "Pending items are worth nothing");
    }

    #[test]
    fn test_grand_total_recomputed_from_items() {
        let mut record = InventoryRecord::default();
        let mut small = InventoryItem::new("AP_50", "Emergency", 50);
        small.quantity = 4;
        let mut large = InventoryItem::new("AP_1000", "Advanced", 1000);
        large.quantity = 2;
        record.items = vec![small, large];

        assert_eq!(record.grand_total(), 2200);

        record.items[1].quantity = 3;
        assert_eq!(record.grand_total(), 3200, "Total follows item changes");

        record.items.push(InventoryItem::new("AP_100", "Basic", 100));
        assert_eq!(record.grand_total(), 3200, "Pending items add nothing");
    }
}
