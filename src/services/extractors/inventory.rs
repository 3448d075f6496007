//! Readers for the item inventory screens: the action point bar and item
//! list, and the experience book grid.

use crate::models::inventory::{BarStatus, InventoryItem};
use crate::models::{ClassifiedNode, NodeId};
use crate::services::cognitive::numbers::{digits_only, parse_bar_status};
use crate::services::cognitive::similarity::similarity;
use crate::services::vocabulary::ItemDefinition;
use regex::Regex;
use std::collections::HashSet;

/// Nodes nearest the top of the screen that may hold the bar
const BAR_SCAN_DEPTH: usize = 10;

/// `current/max` of the action point bar, from the topmost readings
pub fn read_action_bar(nodes: &[ClassifiedNode]) -> Option<BarStatus> {
    let mut top: Vec<&ClassifiedNode> = nodes.iter().collect();
    top.sort_by(|a, b| a.detection.top_left().y.total_cmp(&b.detection.top_left().y));

    top.into_iter()
        .take(BAR_SCAN_DEPTH)
        .filter(|node| node.text().contains('/'))
        .find_map(|node| parse_bar_status(node.text()))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Action point recovery items: a title line with an "Owned: n" line below it
#[derive(Debug, Clone)]
pub struct ActionPointReader<'v> {
    items: &'v [ItemDefinition],
    title_threshold: f64,
    ownership: Regex,
}

impl<'v> ActionPointReader<'v> {
    pub fn new(items: &'v [ItemDefinition], ownership_keywords: &[String], title_threshold: f64) -> Result<Self, String> {
        let alternatives: Vec<String> = ownership_keywords.iter().map(|k| regex::escape(k)).collect();
        let pattern = format!(r"(?i)(?:{}).*?(\d[\d.,]*)", alternatives.join("|"));
        let ownership = Regex::new(&pattern).map_err(|e| format!("Invalid ownership pattern: {}", e))?;

        Ok(Self {
            items,
            title_threshold,
            ownership,
        })
    }

    pub fn read(&self, nodes: &[ClassifiedNode]) -> Vec<InventoryItem> {
        self.items
            .iter()
            .filter_map(|definition| {
                let title = nodes
                    .iter()
                    .filter(|node| similarity(node.text(), &definition.name) > self.title_threshold)
                    .max_by(|a, b| a.confidence().total_cmp(&b.confidence()))?;

                let quantity_node = self.quantity_below(title, nodes)?;
                let quantity = self.parse_quantity(quantity_node.text());
                if quantity <= 0 {
                    return None;
                }

                let mut item = InventoryItem::new(definition.id.clone(), definition.name.clone(), definition.unit_value);
                item.quantity = quantity;
                item.confidence = round2((title.confidence() + quantity_node.confidence()) / 2.0 * 100.0);
                item.anchor = Some(title.detection.clone());
                Some(item)
            })
            .collect()
    }

    /// Search window below the title, scaled by the title's own height
    fn quantity_below<'n>(&self, title: &ClassifiedNode, nodes: &'n [ClassifiedNode]) -> Option<&'n ClassifiedNode> {
        let (left, _, right, bottom) = title.detection.bounds();
        let height = title.detection.height();
        let y_max = bottom + height * 4.5;
        let x_min = left - height * 2.0;
        let x_max = right + height * 2.0;

        nodes
            .iter()
            .filter(|node| node.id != title.id)
            .filter(|node| {
                let c = node.center();
                c.y > bottom && c.y < y_max && c.x >= x_min && c.x <= x_max
            })
            .filter(|node| self.ownership.is_match(node.text()))
            .min_by(|a, b| a.center().y.total_cmp(&b.center().y))
    }

    fn parse_quantity(&self, text: &str) -> i64 {
        let Some(caps) = self.ownership.captures(text) else {
            return 0;
        };

        let clean: String = caps[1]
            .chars()
            .filter(|c| !matches!(c, '.' | ','))
            .map(|c| match c {
                'l' | 'I' => '1',
                'O' => '0',
                other => other,
            })
            .collect();

        clean.parse().unwrap_or(0)
    }
}

/// Experience books laid out in a grid: a value label on the icon with the
/// owned count below it.
#[derive(Debug, Clone)]
pub struct ExperienceGridReader<'v> {
    books: &'v [ItemDefinition],
}

struct BookAnchor<'n, 'v> {
    node: &'n ClassifiedNode,
    book: &'v ItemDefinition,
}

impl<'v> ExperienceGridReader<'v> {
    pub fn new(books: &'v [ItemDefinition]) -> Self {
        Self { books }
    }

    /// Resolved items first, then one pending item per unmatched anchor
    pub fn read(&self, nodes: &[ClassifiedNode]) -> Vec<InventoryItem> {
        let anchors: Vec<BookAnchor<'_, 'v>> = nodes
            .iter()
            .filter_map(|node| {
                let value = digits_only(node.text());
                let color = node.detection.color.as_deref()?;
                self.books
                    .iter()
                    .find(|book| book.unit_value == value && book.colors.iter().any(|c| c == color))
                    .map(|book| BookAnchor { node, book })
            })
            .collect();

        if anchors.is_empty() {
            return Vec::new();
        }

        let unit = median_height(anchors.iter().map(|a| a.node));
        let search_radius = unit * 5.5;
        let max_column_drift = unit * 2.0;

        let anchor_ids: HashSet<NodeId> = anchors.iter().map(|a| a.node.id).collect();
        let quantities: Vec<&ClassifiedNode> = nodes
            .iter()
            .filter(|node| !anchor_ids.contains(&node.id))
            .filter(|node| digits_only(node.text()) > 0 && node.text().chars().count() < 9)
            .collect();

        let mut candidates: Vec<(usize, &ClassifiedNode, f64)> = Vec::new();
        for (index, anchor) in anchors.iter().enumerate() {
            let origin = anchor.node.center();
            for quantity in &quantities {
                let target = quantity.center();
                if target.y <= origin.y || (target.x - origin.x).abs() > max_column_drift {
                    continue;
                }

                // Another anchor of the same column sits between them
                let blocked = anchors.iter().any(|other| {
                    let c = other.node.center();
                    other.node.id != anchor.node.id
                        && c.y > origin.y
                        && c.y < target.y
                        && (c.x - origin.x).abs() < max_column_drift
                });
                if blocked {
                    continue;
                }

                let distance = origin.distance(&target);
                if distance < search_radius {
                    candidates.push((index, *quantity, distance));
                }
            }
        }

        candidates.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut matched_anchors = HashSet::new();
        let mut used_quantities = HashSet::new();
        let mut items = Vec::new();

        for (index, quantity, _) in candidates {
            if matched_anchors.contains(&index) || used_quantities.contains(&quantity.id) {
                continue;
            }
            let anchor = &anchors[index];

            let mut item = self.item_for(anchor);
            item.quantity = digits_only(quantity.text());
            item.confidence = round2((anchor.node.confidence() + quantity.confidence()) / 2.0 * 100.0);
            items.push(item);

            matched_anchors.insert(index);
            used_quantities.insert(quantity.id);
        }

        for (index, anchor) in anchors.iter().enumerate() {
            if !matched_anchors.contains(&index) {
                items.push(self.item_for(anchor));
            }
        }

        items
    }

    fn item_for(&self, anchor: &BookAnchor<'_, 'v>) -> InventoryItem {
        let mut item = InventoryItem::new(anchor.book.id.clone(), anchor.book.name.clone(), anchor.book.unit_value);
        item.color = anchor.node.detection.color.clone();
        item.anchor = Some(anchor.node.detection.clone());
        item
    }
}

/// Median box height, the robust scale for grid geometry
pub(crate) fn median_height<'n>(nodes: impl Iterator<Item = &'n ClassifiedNode>) -> f64 {
    let mut heights: Vec<f64> = nodes.map(|node| node.detection.height()).collect();
    if heights.is_empty() {
        return 20.0;
    }
    heights.sort_by(f64::total_cmp);
    heights[heights.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Canvas, Detection, NodeArena, NodeType};
    use crate::services::vocabulary::Vocabulary;

    #[test]
    fn test_read_action_bar_from_top_nodes() {
        let mut arena = NodeArena::new(Canvas::new(1000.0, 1000.0));
        arena.push(Detection::from_rect("Owned: 5", 0.9, 100.0, 800.0, 80.0, 20.0), NodeType::Unknown);
        arena.push(Detection::from_rect("875/1,000", 0.9, 400.0, 40.0, 80.0, 20.0), NodeType::BarStatus);

        assert_eq!(read_action_bar(arena.nodes()), Some(BarStatus { current: 875, max: 1000 }));
    }

    #[test]
    fn test_action_point_items() {
        let vocab = Vocabulary::builtin();
        let reader = ActionPointReader::new(&vocab.action_point_items, &vocab.ownership_keywords, 0.85).unwrap();

        let mut arena = NodeArena::new(Canvas::new(1000.0, 1000.0));
        arena.push(Detection::from_rect("Basic Action Point Recovery", 0.96, 300.0, 200.0, 300.0, 20.0), NodeType::Unknown);
        arena.push(Detection::from_rect("Owned: 1,250", 0.90, 320.0, 240.0, 120.0, 20.0), NodeType::Unknown);
        arena.push(Detection::from_rect("Advanced Action Point Recovery", 0.95, 300.0, 500.0, 300.0, 20.0), NodeType::Unknown);

        let items = reader.read(arena.nodes());
        assert_eq!(items.len(), 1, "Advanced has no quantity line");
        assert_eq!(items[0].item_id, "AP_100");
        assert_eq!(items[0].quantity, 1250);
        assert_eq!(items[0].confidence, 93.0);
    }

    fn book(arena: &mut NodeArena, text: &str, x: f64, y: f64, color: &str) -> NodeId {
        arena.push(Detection::from_rect(text, 0.9, x, y, 60.0, 20.0).with_color(color), NodeType::Number)
    }

    #[test]
    fn test_experience_grid_auction() {
        let vocab = Vocabulary::builtin();
        let reader = ExperienceGridReader::new(&vocab.experience_books);

        let mut arena = NodeArena::new(Canvas::new(1000.0, 1000.0));
        book(&mut arena, "1,000", 100.0, 100.0, "Purple");
        arena.push(Detection::from_rect("37", 0.8, 105.0, 160.0, 30.0, 20.0), NodeType::Number);
        book(&mut arena, "5,000", 300.0, 100.0, "Purple");
        arena.push(Detection::from_rect("12", 0.9, 300.0, 165.0, 30.0, 20.0), NodeType::Number);
        // Wrong colour for a 100 book, so not an anchor
        book(&mut arena, "100", 500.0, 100.0, "Gold");

        let items = reader.read(arena.nodes());
        assert_eq!(items.len(), 2);

        let thousand = items.iter().find(|i| i.item_id == "XP_1000").unwrap();
        assert_eq!(thousand.quantity, 37);
        assert_eq!(thousand.confidence, 85.0);

        let five = items.iter().find(|i| i.item_id == "XP_5000").unwrap();
        assert_eq!(five.quantity, 12);
    }

    #[test]
    fn test_experience_grid_blocked_column_leaves_pending() {
        let vocab = Vocabulary::builtin();
        let reader = ExperienceGridReader::new(&vocab.experience_books);

        let mut arena = NodeArena::new(Canvas::new(1000.0, 1000.0));
        book(&mut arena, "10,000", 100.0, 100.0, "Gold");
        book(&mut arena, "500", 100.0, 150.0, "Blue");
        arena.push(Detection::from_rect("8", 0.9, 110.0, 190.0, 20.0, 20.0), NodeType::Number);

        let items = reader.read(arena.nodes());
        let upper = items.iter().find(|i| i.item_id == "XP_10000").unwrap();
        let lower = items.iter().find(|i| i.item_id == "XP_500").unwrap();

        assert_eq!(lower.quantity, 8);
        assert!(upper.is_pending(), "Line of sight is blocked by the lower anchor");
        assert_eq!(upper.color.as_deref(), Some("Gold"));
        assert!(upper.anchor.is_some());
    }

    #[test]
    fn test_median_height() {
        let mut arena = NodeArena::new(Canvas::new(100.0, 100.0));
        for h in [10.0, 30.0, 20.0] {
            arena.push(Detection::from_rect("x", 0.9, 0.0, 0.0, 5.0, h), NodeType::Unknown);
        }
        assert_eq!(median_height(arena.nodes().iter()), 20.0);
        assert_eq!(median_height(std::iter::empty::<&ClassifiedNode>()), 20.0);
    }
}
