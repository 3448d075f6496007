use super::{available, Extractor};
use crate::models::profile::UNSET;
use crate::models::{Anchor, Anchors, ClassifiedNode, ExtractionResult, NodeId, NodeType};
use crate::services::cognitive::similarity::contains_ignore_case;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

static TAG_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^a-zA-Z0-9\-_."':!@#$%&*+=<>?]"#).unwrap());

static ALLIANCE_NAME_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-\[\]\x{4e00}-\x{9fa5}]").unwrap());

/// Vertical pixel tolerance for a name sitting right of its tag
const SAME_ROW: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceInfo {
    pub tag: String,
    pub name: String,
}

impl Default for AllianceInfo {
    fn default() -> Self {
        Self {
            tag: UNSET.to_string(),
            name: UNSET.to_string(),
        }
    }
}

impl AllianceInfo {
    fn has_tag(&self) -> bool {
        self.tag.chars().count() >= 2 && self.tag != UNSET
    }
}

/// Alliance tag and name from the profile screen
#[derive(Debug, Clone, Copy, Default)]
pub struct AllianceExtractor;

impl Extractor for AllianceExtractor {
    type Output = AllianceInfo;

    fn name(&self) -> &'static str {
        "alliance"
    }

    fn extract(&self, nodes: &[ClassifiedNode], anchors: &Anchors, blacklist: &HashSet<NodeId>) -> ExtractionResult<AllianceInfo> {
        if let Some(tag_node) = available(nodes, blacklist).find(|node| node.kind == NodeType::AllianceTagFragment) {
            let mut parsed = parse_alliance_text(tag_node.text());

            if parsed.name.is_empty() {
                if let Some(neighbor) = closest_right(tag_node, nodes) {
                    parsed.name = clean_alliance_name(neighbor.text());
                }
            }

            if parsed.has_tag() {
                return ExtractionResult::new(parsed, 95.0, Some(tag_node.id));
            }
        }

        if let Some(label) = anchors.node(Anchor::AllianceLabel, nodes) {
            let origin = label.center();
            let mut nearby: Vec<&ClassifiedNode> = available(nodes, blacklist)
                .filter(|node| node.kind == NodeType::Unknown)
                .collect();
            nearby.sort_by(|a, b| origin.distance(&a.center()).total_cmp(&origin.distance(&b.center())));

            for candidate in nearby.into_iter().take(3) {
                if contains_ignore_case(candidate.text(), "Alianca") || contains_ignore_case(candidate.text(), "Alliance") {
                    continue;
                }

                let parsed = parse_alliance_text(candidate.text());
                if parsed.has_tag() {
                    return ExtractionResult::new(parsed, 80.0, Some(candidate.id));
                }
            }
        }

        ExtractionResult::absent(AllianceInfo::default())
    }
}

fn closest_right<'n>(target: &ClassifiedNode, nodes: &'n [ClassifiedNode]) -> Option<&'n ClassifiedNode> {
    let origin = target.center();
    nodes
        .iter()
        .filter(|node| node.kind == NodeType::Unknown)
        .filter(|node| node.center().x > origin.x && (node.center().y - origin.y).abs() < SAME_ROW)
        .min_by(|a, b| (a.center().x - origin.x).total_cmp(&(b.center().x - origin.x)))
}

/// Split a reading into tag and name, trying in order:
/// closed bracket `[TAG]Name`, open bracket with a length heuristic,
/// a loose two-token split, and finally the bare text as a name.
/// An empty name means none was found inline.
pub fn parse_alliance_text(raw: &str) -> AllianceInfo {
    let text = raw.trim();

    if let Some(close) = text.find(']').filter(|&i| i > 0) {
        let tag = smart_clean_tag(&text[..close].replace('[', ""));
        let name = clean_alliance_name(&text[close + 1..]);
        return AllianceInfo { tag, name };
    }

    if let Some(rest) = text.strip_prefix('[') {
        let chars: Vec<char> = rest.chars().collect();
        let split = match chars.iter().position(|c| *c == ' ') {
            Some(space) if space > 0 && space <= 5 => (space, space + 1),
            _ => {
                let cut = chars.len().min(4);
                (cut, cut)
            }
        };

        let tag: String = chars[..split.0].iter().collect();
        let name: String = chars[split.1.min(chars.len())..].iter().collect();
        return AllianceInfo {
            tag: smart_clean_tag(&tag),
            name: clean_alliance_name(&name),
        };
    }

    if let Some((first, rest)) = text.split_once(' ') {
        let tag = smart_clean_tag(first);
        if (2..=5).contains(&tag.chars().count()) {
            return AllianceInfo {
                tag,
                name: clean_alliance_name(rest),
            };
        }
    }

    AllianceInfo {
        tag: UNSET.to_string(),
        name: clean_alliance_name(text),
    }
}

fn smart_clean_tag(raw: &str) -> String {
    TAG_NOISE.replace_all(raw, "").trim().to_string()
}

fn clean_alliance_name(text: &str) -> String {
    ALLIANCE_NAME_NOISE.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Canvas, Detection, NodeArena};

    #[test]
    fn test_parse_closed_bracket() {
        let info = parse_alliance_text("[AB1]Lions Den");
        assert_eq!(info.tag, "AB1");
        assert_eq!(info.name, "Lions Den");
    }

    #[test]
    fn test_parse_open_bracket() {
        let spaced = parse_alliance_text("[WOLF Pack Rising");
        assert_eq!(spaced.tag, "WOLF");
        assert_eq!(spaced.name, "Pack Rising");

        let glued = parse_alliance_text("[K9XXNorth");
        assert_eq!(glued.tag, "K9XX", "Cut at four characters");
        assert_eq!(glued.name, "North");
    }

    #[test]
    fn test_parse_loose_and_bare() {
        let loose = parse_alliance_text("ROK Legends");
        assert_eq!(loose.tag, "ROK");
        assert_eq!(loose.name, "Legends");

        let bare = parse_alliance_text("Nameless");
        assert_eq!(bare.tag, "--");
        assert_eq!(bare.name, "Nameless");
    }

    #[test]
    fn test_extract_tag_with_right_neighbor_name() {
        let mut arena = NodeArena::new(Canvas::new(1920.0, 1080.0));
        arena.push(Detection::from_rect("[AB1]", 0.9, 600.0, 400.0, 80.0, 30.0), NodeType::AllianceTagFragment);
        arena.push(Detection::from_rect("Lions Den", 0.9, 700.0, 405.0, 160.0, 30.0), NodeType::Unknown);

        let result = AllianceExtractor.extract(arena.nodes(), &Anchors::new(), &HashSet::new());
        assert_eq!(result.value.tag, "AB1");
        assert_eq!(result.value.name, "Lions Den");
        assert_eq!(result.confidence, 95.0);
    }

    #[test]
    fn test_extract_from_label_neighbourhood() {
        let mut arena = NodeArena::new(Canvas::new(1920.0, 1080.0));
        let label = arena.push(Detection::from_rect("Alliance", 0.9, 600.0, 400.0, 120.0, 30.0), NodeType::UiNoise);
        arena.push(Detection::from_rect("Alliance Info", 0.9, 600.0, 440.0, 120.0, 30.0), NodeType::Unknown);
        arena.push(Detection::from_rect("XYZ The Band", 0.9, 740.0, 400.0, 200.0, 30.0), NodeType::Unknown);

        let mut anchors = Anchors::new();
        anchors.insert(Anchor::AllianceLabel, label);

        let result = AllianceExtractor.extract(arena.nodes(), &anchors, &HashSet::new());
        assert_eq!(result.value.tag, "XYZ");
        assert_eq!(result.value.name, "The Band");
        assert_eq!(result.confidence, 80.0);
    }

    #[test]
    fn test_extract_nothing() {
        let arena = NodeArena::new(Canvas::new(100.0, 100.0));
        let result = AllianceExtractor.extract(arena.nodes(), &Anchors::new(), &HashSet::new());
        assert_eq!(result.value, AllianceInfo::default());
        assert_eq!(result.confidence, 0.0);
    }
}
