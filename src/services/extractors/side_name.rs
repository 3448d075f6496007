//! Header of one battle report side: the alliance tag and the governor name.

use super::Extractor;
use crate::models::profile::UNSET;
use crate::models::report::Side;
use crate::models::{Anchors, ClassifiedNode, ExtractionResult, NodeId, NodeType};
use crate::services::cognitive::classifier::COORDINATES;
use crate::services::cognitive::similarity::contains_ignore_case;
use crate::services::cognitive::{Direction, TopologyIndex};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

static CLOSED_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[(?<tag>[^\]]{2,6})\](?<name>.*)").unwrap());

static LOST_OPEN_BRACKET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?<tag>.{3,5})\](?<name>.*)").unwrap());

static FULL_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}/\d{2}/\d{2}").unwrap());

static CLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2}:\d{2}").unwrap());

/// Header zone holding tags, normalized
const HEADER_MAX_Y: f64 = 0.4;
const NEIGHBOR_REACH: f64 = 0.35;
const NAME_ZONE_Y: (f64, f64) = (0.08, 0.28);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagReading {
    pub tag: String,
    /// Text glued after the closing bracket, possibly the governor name
    pub suffix: String,
}

/// Alliance tag in one side's header
#[derive(Debug, Clone, Copy)]
pub struct SideTagExtractor {
    side: Side,
}

impl SideTagExtractor {
    pub fn new(side: Side) -> Self {
        Self { side }
    }
}

impl Extractor for SideTagExtractor {
    type Output = TagReading;

    fn name(&self) -> &'static str {
        "side_tag"
    }

    fn extract(&self, nodes: &[ClassifiedNode], _anchors: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<TagReading> {
        let (min_x, max_x) = self.side.x_range();
        let index = TopologyIndex::new(nodes);

        let best = index
            .region(min_x, max_x, 0.0, HEADER_MAX_Y)
            .into_iter()
            .filter(|node| !blacklist.contains(&node.id))
            .filter(|node| node.kind != NodeType::UiNoise)
            .filter(|node| node.text().contains('[') || node.text().contains(']'))
            .max_by(|a, b| a.confidence().total_cmp(&b.confidence()));

        match best {
            Some(node) => ExtractionResult::new(parse_rigid_tag(node.text()), node.confidence() * 100.0, Some(node.id)),
            None => ExtractionResult::absent(TagReading {
                tag: UNSET.to_string(),
                suffix: String::new(),
            }),
        }
    }
}

/// Tag parse for report headers, which are rendered in a fixed style
pub fn parse_rigid_tag(raw: &str) -> TagReading {
    let text = raw.trim();

    if let Some(caps) = CLOSED_TAG.captures(text).or_else(|| LOST_OPEN_BRACKET.captures(text)) {
        return TagReading {
            tag: caps["tag"].to_string(),
            suffix: caps["name"].to_string(),
        };
    }

    if let Some(content) = text.strip_prefix('[') {
        let chars: Vec<char> = content.chars().collect();
        if chars.len() >= 4 {
            return TagReading {
                tag: chars[..4].iter().collect(),
                suffix: chars[4..].iter().collect(),
            };
        }
    }

    TagReading {
        tag: text.replace(['[', ']'], "").trim().chars().take(5).collect(),
        suffix: String::new(),
    }
}

/// Governor name of one side. Tries the suffix glued to the tag, then the
/// node right of the tag, then the fixed name zone of the header.
#[derive(Debug, Clone)]
pub struct GovernorNameExtractor<'v> {
    side: Side,
    tag_node: Option<NodeId>,
    suffix: String,
    ui_blacklist: &'v [String],
    excluded_terms: &'v [String],
}

impl<'v> GovernorNameExtractor<'v> {
    pub fn new(side: Side, ui_blacklist: &'v [String], excluded_terms: &'v [String]) -> Self {
        Self {
            side,
            tag_node: None,
            suffix: String::new(),
            ui_blacklist,
            excluded_terms,
        }
    }

    pub fn after_tag(mut self, tag_node: Option<NodeId>, suffix: &str) -> Self {
        self.tag_node = tag_node;
        self.suffix = suffix.to_string();
        self
    }

    fn is_valid_player_name(&self, text: &str) -> bool {
        if text.trim().chars().count() < 2 {
            return false;
        }

        if FULL_DATE.is_match(text) || CLOCK.is_match(text) || COORDINATES.is_match(text) {
            return false;
        }

        !self
            .excluded_terms
            .iter()
            .chain(self.ui_blacklist)
            .any(|term| contains_ignore_case(text, term))
    }

    fn name_zone(&self) -> (f64, f64) {
        match self.side {
            Side::Attacker => (0.22, 0.48),
            Side::Defender => (0.55, 0.88),
        }
    }
}

impl Extractor for GovernorNameExtractor<'_> {
    type Output = String;

    fn name(&self) -> &'static str {
        "governor_name"
    }

    fn extract(&self, nodes: &[ClassifiedNode], _anchors: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<String> {
        if self.is_valid_player_name(&self.suffix) {
            return ExtractionResult::new(clean_governor_name(&self.suffix), 90.0, self.tag_node);
        }

        let index = TopologyIndex::new(nodes);

        if let Some(tag) = self.tag_node.and_then(|id| nodes.get(id.0)) {
            if let Some(neighbor) = index.neighbor_excluding(tag, Direction::Right, NEIGHBOR_REACH, blacklist) {
                if self.is_valid_player_name(neighbor.text()) {
                    return ExtractionResult::new(clean_governor_name(neighbor.text()), 80.0, Some(neighbor.id));
                }
            }
        }

        let (min_x, max_x) = self.name_zone();
        let candidate = nodes
            .iter()
            .filter(|node| !blacklist.contains(&node.id))
            .filter(|node| node.kind == NodeType::Unknown)
            .filter(|node| {
                let p = node.normalized_center();
                p.x >= min_x && p.x <= max_x && p.y > NAME_ZONE_Y.0 && p.y < NAME_ZONE_Y.1
            })
            .filter(|node| self.is_valid_player_name(node.text()))
            .min_by(|a, b| a.normalized_center().y.total_cmp(&b.normalized_center().y));

        match candidate {
            Some(node) => ExtractionResult::new(clean_governor_name(node.text()), 70.0, Some(node.id)),
            None => ExtractionResult::absent(UNSET.to_string()),
        }
    }
}

fn clean_governor_name(text: &str) -> String {
    text.replace(['[', ']'], "").trim().to_string()
}
