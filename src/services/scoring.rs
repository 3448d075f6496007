use crate::models::profile::UNSET;
use crate::models::report::BattleReport;
use crate::models::ClassifiedNode;

const SOUNDNESS_POINTS: f64 = 50.0;
const PARTIAL_SOUNDNESS_POINTS: f64 = 25.0;
const OCR_QUALITY_WEIGHT: f64 = 0.20;
const FIELD_POINTS: f64 = 5.0;
const ISOLATION_POINTS: f64 = 10.0;
const MISSING_NAME_PENALTY: f64 = 20.0;
const IDENTITY_PENALTY: f64 = 40.0;

/// Final quality estimate of a battle report, clamped to `[0, 100]`.
///
/// `consumed` are the nodes the extractors actually read values from.
pub fn score_report(report: &BattleReport, consumed: &[&ClassifiedNode], isolated: bool, warnings: &[String]) -> f64 {
    let attacker = &report.attacker;
    let mut score = 0.0;

    if report.is_mathematically_sound() {
        score += SOUNDNESS_POINTS;
    } else {
        let diff = (attacker.expected_units() - attacker.accounted_units()).abs() as f64;
        let relative_error = if attacker.total_units > 0 {
            diff / attacker.total_units as f64
        } else {
            0.0
        };
        score += (PARTIAL_SOUNDNESS_POINTS * (1.0 - relative_error)).max(0.0);
    }

    if !consumed.is_empty() {
        let mean = consumed.iter().map(|node| node.confidence()).sum::<f64>() / consumed.len() as f64;
        score += mean * 100.0 * OCR_QUALITY_WEIGHT;
    }

    let fields = [
        attacker.governor_name != UNSET,
        attacker.alliance_tag != UNSET,
        attacker.primary_commander.is_some(),
        report.defender.governor_name != UNSET,
    ];
    score += fields.iter().filter(|set| **set).count() as f64 * FIELD_POINTS;

    if isolated {
        score += ISOLATION_POINTS;
    }

    if attacker.governor_name == UNSET {
        score -= MISSING_NAME_PENALTY;
    }

    if warnings
        .iter()
        .any(|w| w.contains("DUPLICATE_NAMES") || w.contains("HEADER_READ"))
    {
        score -= IDENTITY_PENALTY;
    }

    score.clamp(0.0, 100.0)
}
