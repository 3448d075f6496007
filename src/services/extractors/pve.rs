use crate::models::report::{PveDetails, ReportKind, Side};
use crate::models::ClassifiedNode;
use crate::services::cognitive::numbers::{first_integer, parse_percentage};

/// Damage percentage and entity level of an NPC side.
///
/// The percentage comes from the first `%` reading on that half of the
/// report, the level from the first number in the entity's name.
pub fn extract_pve(nodes: &[ClassifiedNode], side: Side, entity_name: &str, kind: ReportKind) -> PveDetails {
    let damage_received_percentage = nodes
        .iter()
        .filter(|node| node.text().contains('%'))
        .find(|node| {
            let x = node.normalized_center().x;
            match side {
                Side::Defender => x > 0.5,
                Side::Attacker => x < 0.5,
            }
        })
        .and_then(|node| parse_percentage(node.text()))
        .unwrap_or(0.0);

    PveDetails {
        damage_received_percentage,
        entity_level: first_integer(entity_name).unwrap_or(0),
        entity_type: format!("{:?}", kind),
    }
}
