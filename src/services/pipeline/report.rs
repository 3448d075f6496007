use super::{canvas_for, Engine};
use crate::models::config::EngineConfig;
use crate::models::profile::UNSET;
use crate::models::report::{BattleReport, BattleSide, CommanderEntry, ReportKind, Side};
use crate::models::{Analysis, Anchors, ClassifiedNode, NodeId, NodeType};
use crate::services::audit::audit;
use crate::services::cognitive::similarity::{contains_ignore_case, similarity};
use crate::services::cognitive::ScreenKind;
use crate::services::extractors::side_name::TagReading;
use crate::services::extractors::{
    extract_pve, run_with_retry, CommanderExtractor, GovernorNameExtractor, MetricExtractor, SideTagExtractor,
};
use crate::services::scoring::score_report;
use crate::services::vocabulary::Vocabulary;
use chrono::{Datelike, NaiveDate};
use image::DynamicImage;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};

static DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{2,4}[/\-]\d{2}(?:[/\-]\d{2,4})?)").unwrap());

static MAP_COORDINATES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)X:?\s*(\d+)\D*Y:?\s*(\d+)").unwrap());

/// Ledger start when no victory/defeat banner was read
const DEFAULT_LEDGER_Y: f64 = 0.4;
const NPC_FALLBACK_NAME: &str = "NPC_Entity";

const LEDGER: [NodeType; 8] = [
    NodeType::UnitsLabel,
    NodeType::HealedLabel,
    NodeType::DeadLabel,
    NodeType::SevereWoundedLabel,
    NodeType::SlightlyWoundedLabel,
    NodeType::RemainingLabel,
    NodeType::KillPointsLabel,
    NodeType::WatchtowerLabel,
];

/// One extractor pass over a battle report
#[derive(Debug, Clone)]
pub struct ReportReading {
    pub report: BattleReport,
    /// Nodes any extractor read a value from
    pub consumed: Vec<NodeId>,
}

/// Barbarian when any node names a barbarian, else player versus player
pub fn detect_report_kind(nodes: &[ClassifiedNode], vocabulary: &Vocabulary, threshold: f64) -> ReportKind {
    let barbarian = nodes.iter().any(|node| {
        vocabulary
            .war
            .barbarian
            .iter()
            .any(|key| similarity(node.text(), key) > threshold || contains_ignore_case(node.text(), key))
    });

    if barbarian {
        ReportKind::Barbarian
    } else {
        ReportKind::Pvp
    }
}

/// Normalized y where the troop ledger starts: the result banner if read
fn ledger_start(nodes: &[ClassifiedNode], vocabulary: &Vocabulary) -> f64 {
    let war = &vocabulary.war;
    nodes
        .iter()
        .find(|node| {
            node.kind == NodeType::StatusResult
                || war
                    .victory
                    .iter()
                    .chain(&war.defeat)
                    .any(|term| contains_ignore_case(node.text(), term))
        })
        .map_or(DEFAULT_LEDGER_Y, |node| node.normalized_center().y)
}

fn metric_slot(side: &mut BattleSide, label: NodeType) -> Option<&mut i64> {
    match label {
        NodeType::UnitsLabel => Some(&mut side.total_units),
        NodeType::HealedLabel => Some(&mut side.healed),
        NodeType::DeadLabel => Some(&mut side.dead),
        NodeType::SevereWoundedLabel => Some(&mut side.severely_wounded),
        NodeType::SlightlyWoundedLabel => Some(&mut side.slightly_wounded),
        NodeType::RemainingLabel => Some(&mut side.remaining),
        NodeType::KillPointsLabel => Some(&mut side.kill_points),
        NodeType::WatchtowerLabel => Some(&mut side.watchtower_damage),
        _ => None,
    }
}

/// Extractor state shared by both sides of one pass
struct SideReader<'a> {
    nodes: &'a [ClassifiedNode],
    vocabulary: &'a Vocabulary,
    config: &'a EngineConfig,
    metric_labels: Vec<String>,
    ledger_y: f64,
    anchors: Anchors,
    consumed: Vec<NodeId>,
}

impl<'a> SideReader<'a> {
    fn consume(&mut self, source: Option<NodeId>) {
        if let Some(id) = source {
            if !self.consumed.contains(&id) {
                self.consumed.push(id);
            }
        }
    }

    fn header(&mut self, side: Side, data: &mut BattleSide, used: &mut HashSet<NodeId>) {
        let retry = &self.config.retry;
        let war = &self.vocabulary.war;
        let (nodes, anchors) = (self.nodes, &self.anchors);

        let unset = TagReading {
            tag: UNSET.to_string(),
            suffix: String::new(),
        };
        let tag = run_with_retry(&SideTagExtractor::new(side), nodes, anchors, used, unset, retry);
        data.alliance_tag = tag.value.tag.clone();
        used.extend(tag.source);

        let name = GovernorNameExtractor::new(side, &war.ui_blacklist, &war.pve_terms).after_tag(tag.source, &tag.value.suffix);
        let name = run_with_retry(&name, nodes, anchors, used, UNSET.to_string(), retry);
        data.governor_name = name.value.clone();
        used.extend(name.source);

        self.consume(tag.source);
        self.consume(name.source);
    }

    fn ledger(&mut self, side: Side, data: &mut BattleSide, used: &mut HashSet<NodeId>) {
        for label in LEDGER {
            let extractor = MetricExtractor::new(side, label, self.ledger_y, &self.metric_labels);
            let result = run_with_retry(&extractor, self.nodes, &self.anchors, used, 0, &self.config.retry);

            if let Some(slot) = metric_slot(data, label) {
                *slot = result.value;
            }
            used.extend(result.source);
            self.consume(result.source);
        }
    }

    fn commanders(&self, side: Side, data: &mut BattleSide, table: &[CommanderEntry], used: &HashSet<NodeId>) {
        let extractor = CommanderExtractor::new(side, table, self.config.thresholds.commander_score);
        let found = run_with_retry(&extractor, self.nodes, &self.anchors, used, Vec::new(), &self.config.retry);

        let mut found = found.value.into_iter();
        data.primary_commander = found.next();
        data.secondary_commander = found.next();
    }
}

/// Read both sides of a battle report from classified nodes.
///
/// The attacker is read first. A barbarian defender takes its name from the
/// barbarian text and its commanders from the NPC table.
pub fn interpret_report(
    nodes: &[ClassifiedNode],
    vocabulary: &Vocabulary,
    config: &EngineConfig,
    kind: ReportKind,
) -> ReportReading {
    let mut reader = SideReader {
        nodes,
        vocabulary,
        config,
        metric_labels: vocabulary.war.all_metric_labels().cloned().collect(),
        ledger_y: ledger_start(nodes, vocabulary),
        anchors: Anchors::new(),
        consumed: Vec::new(),
    };
    let mut report = BattleReport {
        kind,
        ..BattleReport::default()
    };

    let mut used = HashSet::new();
    reader.header(Side::Attacker, &mut report.attacker, &mut used);
    reader.ledger(Side::Attacker, &mut report.attacker, &mut used);
    reader.commanders(Side::Attacker, &mut report.attacker, &vocabulary.commanders, &used);

    let mut used = HashSet::new();
    if kind == ReportKind::Barbarian {
        let defender = &mut report.defender;
        defender.is_npc = true;
        defender.alliance_tag = UNSET.to_string();
        defender.governor_name = nodes
            .iter()
            .find(|node| vocabulary.war.barbarian.iter().any(|key| contains_ignore_case(node.text(), key)))
            .map_or_else(|| NPC_FALLBACK_NAME.to_string(), |node| node.text().trim().to_string());

        reader.commanders(Side::Defender, defender, &vocabulary.npcs, &used);
        reader.ledger(Side::Defender, defender, &mut used);
        defender.pve = Some(extract_pve(nodes, Side::Defender, &defender.governor_name, kind));
    } else {
        reader.header(Side::Defender, &mut report.defender, &mut used);
        reader.ledger(Side::Defender, &mut report.defender, &mut used);
        reader.commanders(Side::Defender, &mut report.defender, &vocabulary.commanders, &used);
    }

    for data in [&mut report.attacker, &mut report.defender] {
        if data.governor_name.trim().is_empty() {
            data.governor_name = UNSET.to_string();
        }
    }

    // A commander caption misread as the governor
    if let Some(commander) = &report.attacker.primary_commander {
        if report.attacker.governor_name.contains(&commander.canonical_name) {
            report.attacker.governor_name = UNSET.to_string();
        }
    }

    ReportReading {
        report,
        consumed: reader.consumed,
    }
}

/// A bare `MM/DD` date is placed in `current_year`
fn parse_report_date(date: &str, current_year: i32) -> Option<NaiveDate> {
    let date = if date.len() <= 5 { format!("{}/{}", current_year, date) } else { date.to_string() };
    ["%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&date, format).ok())
}

/// Battle date and map coordinates. The date comes from the first node that
/// parses as one; coordinates from the first node carrying them.
pub fn read_metadata(nodes: &[ClassifiedNode], report: &mut BattleReport, current_year: i32) {
    report.timestamp = nodes
        .iter()
        .filter_map(|node| DATE.captures(node.text()).map(|caps| caps[1].replace('-', "/")))
        .find_map(|date| parse_report_date(&date, current_year));

    report.map_coordinates = nodes
        .iter()
        .find_map(|node| MAP_COORDINATES.captures(node.text()))
        .map(|caps| format!("X:{} Y:{}", &caps[1], &caps[2]));
}

/// Plausibility checks on the final reading
pub fn sanity_warnings(report: &BattleReport, isolated: bool, duplicate_threshold: f64) -> Vec<String> {
    let attacker = &report.attacker;
    let mut warnings = Vec::new();

    if !isolated {
        warnings.push(
            "WARN_IMAGE_NOT_ISOLATED: The report paper was not automatically isolated. Results may be inaccurate."
                .to_string(),
        );
    }

    if attacker.alliance_tag != UNSET && attacker.governor_name == UNSET {
        warnings.push("WARN_UNSUPPORTED_CHARACTERS: Alliance tag detected, but governor name is empty.".to_string());
    }

    if !report.is_mathematically_sound() {
        if attacker.total_units == 0 {
            warnings.push("WARN_DATA_MISSING_TOTAL_UNITS: 'Total Units' field missing.".to_string());
        } else {
            warnings.push("WARN_MATH_MISMATCH: Troop sums do not match totals.".to_string());
        }
    }

    if attacker.governor_name == UNSET && attacker.total_units > 0 {
        warnings.push("WARN_NAME_IDENTIFICATION_FAILED: Metrics read, but name not identified.".to_string());
    }

    if attacker.governor_name != UNSET
        && similarity(&attacker.governor_name, &report.defender.governor_name) > duplicate_threshold
    {
        warnings.push("WARN_DUPLICATE_NAMES: Attacker and Defender names are identical.".to_string());
    }

    let tag = attacker.alliance_tag.trim();
    if tag != UNSET && !tag.is_empty() && attacker.governor_name.contains(tag) {
        warnings.push("WARN_HEADER_READ_AS_NAME: Name contains tag residues.".to_string());
    }

    warnings
}

impl Engine {
    /// Read a battle report screenshot.
    ///
    /// While the troop ledger does not balance, weak number readings are
    /// re-scanned in one batch and the whole pass is re-run, at most
    /// `repair_iterations` times.
    pub async fn analyze_report(&self, image: &DynamicImage) -> Analysis<BattleReport> {
        let recognition = match self.recognizer.recognize(image).await {
            Ok(recognition) => recognition,
            Err(e) => {
                error!(error = %e, "Report recognition failed");
                return Analysis::failed(format!("[System Error] Failed to recognize report: {}", e));
            }
        };

        let isolated = recognition.isolated;
        let classifier = self.classifier(ScreenKind::Report);
        let mut arena = classifier.build_arena(canvas_for(&recognition, image), recognition.detections);
        let kind = detect_report_kind(arena.nodes(), &self.vocabulary, self.config.thresholds.label_match);
        let reacquirer = self.reacquirer(image);

        let mut warnings = Vec::new();
        let mut repairs = 0;

        let (mut reading, audit_warnings) = loop {
            let reading = interpret_report(arena.nodes(), &self.vocabulary, &self.config, kind);
            let audit_warnings = audit(&reading.report);

            if reading.report.is_mathematically_sound() || repairs >= self.config.retry.repair_iterations {
                break (reading, audit_warnings);
            }

            match reacquirer.repair_numbers(&mut arena, &classifier, &self.config.repair).await {
                Ok(0) => {
                    debug!("No weak numbers left to repair");
                    break (reading, audit_warnings);
                }
                Ok(replaced) => {
                    repairs += 1;
                    info!(replaced, iteration = repairs, "Re-running report pass after repair");
                }
                Err(e) => {
                    warn!(error = %e, "Repair batch failed");
                    warnings.push(format!("[Re-acquisition] Repair batch failed: {}", e));
                    break (reading, audit_warnings);
                }
            }
        };

        read_metadata(arena.nodes(), &mut reading.report, chrono::Local::now().year());

        warnings.extend(audit_warnings);
        warnings.extend(sanity_warnings(&reading.report, isolated, self.config.thresholds.duplicate_name));

        let consumed: Vec<&ClassifiedNode> = reading.consumed.iter().filter_map(|id| arena.get(*id)).collect();
        let confidence = score_report(&reading.report, &consumed, isolated, &warnings);

        Analysis::new(reading.report, warnings, confidence)
    }
}
