use crate::models::report::{BattleReport, ReportKind, Side};
use tracing::debug;

/// Troop arithmetic check for both sides of a report.
///
/// Sides without a total are skipped since there is nothing to balance, and
/// a barbarian defender carries no ledger at all.
pub fn audit(report: &BattleReport) -> Vec<String> {
    let mut warnings = Vec::new();

    for side in [Side::Attacker, Side::Defender] {
        if side == Side::Defender && report.kind == ReportKind::Barbarian {
            continue;
        }

        let data = report.side(side);
        if data.total_units <= 0 {
            continue;
        }

        let diff = data.expected_units() - data.accounted_units();
        if diff.abs() > 1 {
            debug!(side = side.label(), expected = data.expected_units(), accounted = data.accounted_units(), "Ledger does not balance");
            warnings.push(format!("[Math Mismatch] {}: Difference of {} units.", side.label(), diff));
        }
    }

    warnings
}
